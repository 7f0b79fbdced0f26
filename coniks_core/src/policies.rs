// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! The directory's policy block: the operating parameters a client must
//! know to interpret the directory's proofs, serialized opaquely into every
//! signed tree root so that a policy change is itself part of the signed
//! history.

use crate::hash;
use crate::verify::VerificationError;

/// The protocol version advertised in policies
pub const PROTOCOL_VERSION: &str = "1.0";

/// The directory policies in force at an epoch
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde_serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Policies {
    /// The protocol version the directory speaks
    pub version: String,
    /// The stable name of the hash function the tree is built with
    pub hash_id: String,
    /// The public key of the directory's VRF
    pub vrf_public_key: Vec<u8>,
    /// The deadline, in seconds, by which the directory promises to seal
    /// the next epoch
    pub epoch_deadline: u64,
}

impl Policies {
    /// Policies for the configured hasher and current protocol version
    pub fn new(vrf_public_key: Vec<u8>, epoch_deadline: u64) -> Self {
        Self {
            version: PROTOCOL_VERSION.to_string(),
            hash_id: hash::hash_id().to_string(),
            vrf_public_key,
            epoch_deadline,
        }
    }

    /// The canonical, deterministic serialization embedded in signed tree
    /// roots
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            4 * 3 + 8 + self.version.len() + self.hash_id.len() + self.vrf_public_key.len(),
        );
        write_len_prefixed(&mut out, self.version.as_bytes());
        write_len_prefixed(&mut out, self.hash_id.as_bytes());
        write_len_prefixed(&mut out, &self.vrf_public_key);
        out.extend_from_slice(&self.epoch_deadline.to_be_bytes());
        out
    }

    /// Parse a policy block out of a signed tree root
    pub fn deserialize(bytes: &[u8]) -> Result<Self, VerificationError> {
        let mut reader = crate::proto::Reader::new(bytes);
        let version = String::from_utf8(reader.read_len_prefixed()?.to_vec())
            .map_err(|_| VerificationError::MalformedDirectoryMessage)?;
        let hash_id = String::from_utf8(reader.read_len_prefixed()?.to_vec())
            .map_err(|_| VerificationError::MalformedDirectoryMessage)?;
        let vrf_public_key = reader.read_len_prefixed()?.to_vec();
        let epoch_deadline = reader.read_u64()?;
        reader.finish()?;
        Ok(Self {
            version,
            hash_id,
            vrf_public_key,
            epoch_deadline,
        })
    }
}

fn write_len_prefixed(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    out.extend_from_slice(bytes);
}
