// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! The verifiable-random-function collaborator interface.
//!
//! The directory maps usernames to tree positions through a VRF so that the
//! index of a binding reveals nothing about the username, while clients can
//! (with a real VRF) verify the mapping against the VRF public key in the
//! directory's policies. The tree itself only requires the interface below:
//! it treats indices as opaque uniformly random bitstrings, and remains
//! structurally correct even for a collaborator that violates uniformity.

use crate::hash::{digest, hash};
use crate::types::{ConiksLabel, Index, INDEX_BYTES};

#[cfg(feature = "rand")]
use rand::{CryptoRng, Rng};

/// The index derivation the directory is built over
pub trait VrfEvaluator {
    /// Derive the tree index for a username. Must be deterministic for the
    /// lifetime of the directory.
    fn compute(&self, label: &ConiksLabel) -> Index;

    /// The public key material advertised in the directory's policies
    fn public_key(&self) -> Vec<u8>;
}

/// A keyed-hash index derivation for deployments that choose to run without
/// the overhead of VRF computation, and for tests. It produces uniformly
/// distributed indices from a secret key but offers no public
/// verifiability: the value returned by [VrfEvaluator::public_key] merely
/// identifies the key, it cannot be used to check an index.
#[derive(Debug, Clone)]
pub struct KeyedVrf {
    secret: [u8; 32],
}

const INDEX_DOMAIN: &[u8] = b"vrf-index";

impl KeyedVrf {
    /// Build an evaluator over an existing secret
    pub fn new(secret: [u8; 32]) -> Self {
        Self { secret }
    }

    /// Draw a fresh secret
    #[cfg(feature = "rand")]
    pub fn generate<R: CryptoRng + Rng>(rng: &mut R) -> Self {
        let mut secret = [0u8; 32];
        rng.fill_bytes(&mut secret);
        Self { secret }
    }
}

impl VrfEvaluator for KeyedVrf {
    fn compute(&self, label: &ConiksLabel) -> Index {
        let bytes: [u8; INDEX_BYTES] = digest(&[INDEX_DOMAIN, &self.secret[..], label.as_slice()]);
        Index::new(bytes)
    }

    fn public_key(&self) -> Vec<u8> {
        hash(&self.secret).to_vec()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compute_is_deterministic() {
        let vrf = KeyedVrf::new([5u8; 32]);
        let label: ConiksLabel = "alice".into();
        assert_eq!(vrf.compute(&label), vrf.compute(&label));
    }

    #[test]
    fn test_distinct_labels_get_distinct_indices() {
        let vrf = KeyedVrf::new([5u8; 32]);
        assert_ne!(vrf.compute(&"alice".into()), vrf.compute(&"bob".into()));
    }

    #[test]
    fn test_distinct_keys_get_distinct_indices() {
        let a = KeyedVrf::new([5u8; 32]);
        let b = KeyedVrf::new([6u8; 32]);
        let label: ConiksLabel = "alice".into();
        assert_ne!(a.compute(&label), b.compute(&label));
        assert_ne!(a.public_key(), b.public_key());
    }
}
