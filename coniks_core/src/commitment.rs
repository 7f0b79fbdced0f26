// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Salted commitments to directory bindings.
//!
//! The directory never hashes a `(username, key)` binding into the tree
//! directly. It stores a commitment `H("commit" || salt || username || key)`
//! with a fresh 32-byte salt per binding, which hides the binding from
//! anyone who has not been shown `(salt, username, key)` while binding the
//! directory to exactly one value per leaf.

use crate::hash::{digest, Digest};
#[cfg(feature = "serde_serialization")]
use crate::utils::serde_helpers::{bytes_deserialize_hex, bytes_serialize_hex};

#[cfg(feature = "rand")]
use rand::{CryptoRng, Rng};
use subtle::ConstantTimeEq;

/// The number of bytes of salt drawn for each commitment
pub const SALT_BYTES: usize = 32;

// Domain separator prefixed to every commitment input.
const COMMITMENT_IDENTIFIER: &[u8] = b"commit";

/// A hiding, binding commitment to a single `(username, key)` pair
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde_serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Commitment {
    /// The salt the commitment was computed with. Revealed to the binding's
    /// owner inside lookup proofs so the commitment can be re-derived.
    #[cfg_attr(
        feature = "serde_serialization",
        serde(serialize_with = "bytes_serialize_hex")
    )]
    #[cfg_attr(
        feature = "serde_serialization",
        serde(deserialize_with = "bytes_deserialize_hex")
    )]
    pub salt: [u8; SALT_BYTES],
    /// `H("commit" || salt || username || key)`
    #[cfg_attr(
        feature = "serde_serialization",
        serde(serialize_with = "bytes_serialize_hex")
    )]
    #[cfg_attr(
        feature = "serde_serialization",
        serde(deserialize_with = "bytes_deserialize_hex")
    )]
    pub value: Digest,
}

impl Commitment {
    /// Commit to a `(username, key)` binding under a freshly drawn salt
    #[cfg(feature = "rand")]
    pub fn new<R: CryptoRng + Rng>(rng: &mut R, label: &[u8], value: &[u8]) -> Self {
        let mut salt = [0u8; SALT_BYTES];
        rng.fill_bytes(&mut salt);
        Self::with_salt(salt, label, value)
    }

    /// Commit to a `(username, key)` binding under the supplied salt
    pub fn with_salt(salt: [u8; SALT_BYTES], label: &[u8], value: &[u8]) -> Self {
        let commitment = digest(&[COMMITMENT_IDENTIFIER, &salt[..], label, value]);
        Self {
            salt,
            value: commitment,
        }
    }

    /// Re-derive the commitment from its salt and the supplied binding and
    /// compare in constant time
    pub fn verify(&self, label: &[u8], value: &[u8]) -> bool {
        let expected = digest(&[COMMITMENT_IDENTIFIER, &self.salt[..], label, value]);
        expected[..].ct_eq(&self.value[..]).into()
    }
}
