// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! This module contains the specifics of [Index] only: the fixed-width
//! bitstring that positions a binding in the tree, with the bit arithmetic
//! the tree and the verifier share.

use crate::types::Direction;
#[cfg(feature = "serde_serialization")]
use crate::utils::serde_helpers::{bytes_deserialize_hex, bytes_serialize_hex};

#[cfg(feature = "rand")]
use rand::{CryptoRng, Rng};

#[cfg(test)]
mod tests;

/// The number of bytes in an index
pub const INDEX_BYTES: usize = 32;
/// The number of addressable bits in an index, which bounds the tree depth
pub const INDEX_BITS: u32 = (INDEX_BYTES * 8) as u32;

/// The position of a binding in the tree: the output of the directory's
/// VRF over the username, treated as an opaque uniformly random bitstring.
/// Bits are addressed most-significant first, so bit 0 decides the branch
/// taken at the root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde_serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct Index(
    #[cfg_attr(
        feature = "serde_serialization",
        serde(serialize_with = "bytes_serialize_hex")
    )]
    #[cfg_attr(
        feature = "serde_serialization",
        serde(deserialize_with = "bytes_deserialize_hex")
    )]
    pub [u8; INDEX_BYTES],
);

impl Index {
    /// The all-zero index, used as the prefix fingerprint of a brand-new
    /// tree's root leaf
    pub const ZERO: Index = Index([0u8; INDEX_BYTES]);

    /// Wraps raw VRF output bytes as an index
    pub fn new(value: [u8; INDEX_BYTES]) -> Self {
        Self(value)
    }

    /// The raw bytes of the index
    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    /// The branch taken at depth `depth` when descending for this index.
    /// Out-of-range depths read as zero bits.
    pub fn direction_at(&self, depth: u32) -> Direction {
        let byte_index = (depth / 8) as usize;
        if byte_index >= INDEX_BYTES {
            return Direction::Left;
        }
        let bit_index = (depth % 8) as usize;
        match (self.0[byte_index] >> (7 - bit_index)) & 1 {
            0 => Direction::Left,
            _ => Direction::Right,
        }
    }

    /// Whether this index and `other` agree on their first `len` bits
    pub fn shares_prefix(&self, other: &Index, len: u32) -> bool {
        let len = len.min(INDEX_BITS) as usize;
        let full_bytes = len / 8;
        let remainder = len % 8;
        if self.0[..full_bytes] != other.0[..full_bytes] {
            return false;
        }
        if remainder == 0 {
            return true;
        }
        let mask = 0xffu8 << (8 - remainder);
        (self.0[full_bytes] ^ other.0[full_bytes]) & mask == 0
    }

    /// The sibling prefix of a specified length: the first `len` bits of
    /// this index with the last of them flipped, padded with zeroes. For
    /// instance `010100...` with `len = 3` becomes `011000...`. This is the
    /// prefix fingerprint of the empty subtree passed over when a descent
    /// takes the other branch at depth `len - 1`.
    pub fn sibling_prefix(&self, len: u32) -> Index {
        let len = len.clamp(1, INDEX_BITS);
        let bit = (len - 1) as usize;
        let byte_index = bit / 8;
        let bit_index = bit % 8;

        let mut out = [0u8; INDEX_BYTES];
        out[..byte_index].copy_from_slice(&self.0[..byte_index]);
        let flipped = self.0[byte_index] ^ (0x80 >> bit_index);
        out[byte_index] = (flipped >> (7 - bit_index)) << (7 - bit_index);
        Index(out)
    }

    /// Gets a random index
    #[cfg(feature = "rand")]
    pub fn random<R: CryptoRng + Rng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; INDEX_BYTES];
        rng.fill_bytes(&mut bytes);
        Self(bytes)
    }
}

impl From<[u8; INDEX_BYTES]> for Index {
    fn from(value: [u8; INDEX_BYTES]) -> Self {
        Self(value)
    }
}

impl core::convert::TryFrom<&[u8]> for Index {
    type Error = String;

    fn try_from(value: &[u8]) -> Result<Self, Self::Error> {
        if value.len() != INDEX_BYTES {
            return Err(format!(
                "Failed to parse Index. Expected {} bytes but the value has {} bytes",
                INDEX_BYTES,
                value.len()
            ));
        }
        let mut bytes = [0u8; INDEX_BYTES];
        bytes.copy_from_slice(value);
        Ok(Self(bytes))
    }
}

impl core::fmt::Display for Index {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}
