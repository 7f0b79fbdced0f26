// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! This module contains hashing utilities for SHA-512/256 hashing, the
//! standard directory hasher

use sha2::{Digest, Sha512_256};

/// The number of bytes in a SHA-512/256 digest
pub const DIGEST_BYTES: usize = 32;

pub(crate) const HASH_ID: &str = "SHA-512/256";

/// Hash a single byte array
pub fn hash(item: &[u8]) -> crate::hash::Digest {
    Sha512_256::digest(item).into()
}

/// Hash the concatenation of the passed byte arrays without materializing
/// the concatenation
pub fn digest(items: &[&[u8]]) -> crate::hash::Digest {
    let mut hasher = Sha512_256::new();
    for item in items {
        hasher.update(item);
    }
    hasher.finalize().into()
}
