// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! The directory's long-term signing primitive: thin wrappers over Ed25519
//! keeping the byte-level surface (64-byte signatures, 32-byte public keys)
//! explicit, since both sizes are encoded into the directory's policies.

use crate::verify::VerificationError;

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
#[cfg(feature = "rand")]
use rand::{CryptoRng, Rng};

/// The number of bytes in a signature
pub const SIGNATURE_BYTES: usize = 64;
/// The number of bytes in a public key
pub const PUBLIC_KEY_BYTES: usize = 32;

/// The directory's long-term private signing key
#[derive(Debug, Clone)]
pub struct PrivateKey(SigningKey);

/// The directory's public verification key, distributed to clients out of
/// band
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PublicKey(VerifyingKey);

impl PrivateKey {
    /// Generate a fresh signing key
    #[cfg(feature = "rand")]
    pub fn generate<R: CryptoRng + Rng>(rng: &mut R) -> Self {
        Self(SigningKey::generate(rng))
    }

    /// Reconstruct a signing key from its 32 secret bytes
    pub fn from_bytes(bytes: &[u8; 32]) -> Self {
        Self(SigningKey::from_bytes(bytes))
    }

    /// Export the 32 secret bytes for key-file storage
    pub fn to_bytes(&self) -> [u8; 32] {
        self.0.to_bytes()
    }

    /// Sign a message, returning the fixed-size signature bytes
    pub fn sign(&self, message: &[u8]) -> Vec<u8> {
        self.0.sign(message).to_bytes().to_vec()
    }

    /// The verification key matching this signing key
    pub fn public(&self) -> PublicKey {
        PublicKey(self.0.verifying_key())
    }
}

impl PublicKey {
    /// Export the public key bytes for inclusion in policies
    pub fn to_bytes(&self) -> [u8; PUBLIC_KEY_BYTES] {
        self.0.to_bytes()
    }

    /// Import a public key from its canonical bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, VerificationError> {
        let arr: &[u8; PUBLIC_KEY_BYTES] = bytes
            .try_into()
            .map_err(|_| VerificationError::MalformedDirectoryMessage)?;
        VerifyingKey::from_bytes(arr)
            .map(Self)
            .map_err(|_| VerificationError::MalformedDirectoryMessage)
    }

    /// Verify a signature over a message. Returns false on any mismatch,
    /// including a signature of the wrong size.
    pub fn verify(&self, message: &[u8], signature: &[u8]) -> bool {
        let Ok(bytes) = <&[u8; SIGNATURE_BYTES]>::try_from(signature) else {
            return false;
        };
        self.0.verify(message, &Signature::from_bytes(bytes)).is_ok()
    }
}
