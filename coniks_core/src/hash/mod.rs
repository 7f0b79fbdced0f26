// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! This module contains all the hashing utilities needed for the directory
//! tree and for proof verification.
//!
//! The three tree constructors are domain separated: interior nodes hash
//! their children directly, while occupied and empty leaves are tagged with
//! the identifier bytes `'L'` and `'E'` so that no empty subtree can be
//! confused with a placed binding. Leaf hashes additionally mix in the
//! tree's nonce, the leaf's index, and its depth.

/// A hash digest of a specified number of bytes
pub type Digest = [u8; DIGEST_BYTES];
/// Represents an empty digest, with no data contained
pub const EMPTY_DIGEST: [u8; DIGEST_BYTES] = [0u8; DIGEST_BYTES];

/// The number of bytes in a tree nonce
pub const NONCE_BYTES: usize = 32;

// =========================================
// ========== Sha2 settings ================
// =========================================
#[cfg(feature = "sha2")]
pub mod sha2;
#[cfg(feature = "sha2")]
pub use crate::hash::sha2::digest;
#[cfg(feature = "sha2")]
pub use crate::hash::sha2::hash;
#[cfg(feature = "sha2")]
pub use crate::hash::sha2::DIGEST_BYTES;
#[cfg(feature = "sha2")]
use crate::hash::sha2::HASH_ID;

// =========================================
// ========== Sha3 settings ================
// =========================================
#[cfg(feature = "sha3")]
pub mod sha3;
#[cfg(all(feature = "sha3", not(feature = "sha2")))]
pub use crate::hash::sha3::digest;
#[cfg(all(feature = "sha3", not(feature = "sha2")))]
pub use crate::hash::sha3::hash;
#[cfg(all(feature = "sha3", not(feature = "sha2")))]
pub use crate::hash::sha3::DIGEST_BYTES;
#[cfg(all(feature = "sha3", not(feature = "sha2")))]
use crate::hash::sha3::HASH_ID;


// Identifier bytes for the two leaf variants. These provide the domain
// separation between occupied and empty subtrees and must never change.
const LEAF_IDENTIFIER: &[u8] = b"L";
const EMPTY_IDENTIFIER: &[u8] = b"E";

/// A stable string naming the configured hash function, included in the
/// serialized directory policies so that clients can detect a hasher
/// mismatch before verifying anything.
pub fn hash_id() -> &'static str {
    HASH_ID
}

/// Try and parse a digest from an unknown length of bytes. Helpful for
/// converting a `Vec<u8>` to a [Digest]
pub fn try_parse_digest(value: &[u8]) -> Result<Digest, String> {
    if value.len() != DIGEST_BYTES {
        Err(format!(
            "Failed to parse Digest. Expected {} bytes but the value has {} bytes",
            DIGEST_BYTES,
            value.len()
        ))
    } else {
        let mut arr = EMPTY_DIGEST;
        arr.copy_from_slice(value);
        Ok(arr)
    }
}

/// Computes the hash of an interior node from its two children:
/// `H(left || right)`
pub fn hash_interior(left: &Digest, right: &Digest) -> Digest {
    digest(&[&left[..], &right[..]])
}

/// Computes the hash of an occupied leaf node:
/// `H('L' || nonce || index || level || commitment)`
pub fn hash_leaf(nonce: &[u8], index: &[u8], level: u32, commitment: &Digest) -> Digest {
    let level_bytes = level.to_be_bytes();
    digest(&[
        LEAF_IDENTIFIER,
        nonce,
        index,
        &level_bytes[..],
        &commitment[..],
    ])
}

/// Computes the hash of an empty leaf node:
/// `H('E' || nonce || index || level)`
pub fn hash_empty(nonce: &[u8], index: &[u8], level: u32) -> Digest {
    let level_bytes = level.to_be_bytes();
    digest(&[EMPTY_IDENTIFIER, nonce, index, &level_bytes[..]])
}
