// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! This module contains hashing utilities for SHA3-256 hashing

use sha3::{Digest, Sha3_256};

/// The number of bytes in a SHA3-256 digest
pub const DIGEST_BYTES: usize = 32;

#[allow(dead_code)]
pub(crate) const HASH_ID: &str = "SHA3-256";

/// Hash a single byte array
pub fn hash(item: &[u8]) -> [u8; DIGEST_BYTES] {
    Sha3_256::digest(item).into()
}

/// Hash the concatenation of the passed byte arrays without materializing
/// the concatenation
pub fn digest(items: &[&[u8]]) -> [u8; DIGEST_BYTES] {
    let mut hasher = Sha3_256::new();
    for item in items {
        hasher.update(item);
    }
    hasher.finalize().into()
}
