// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Shared fixtures for in-crate tests

use crate::pad::Pad;

use coniks_core::policies::Policies;
use coniks_core::sign::{PrivateKey, PublicKey};
use coniks_core::vrf::{KeyedVrf, VrfEvaluator};

use rand::rngs::StdRng;
use rand::SeedableRng;

/// A deterministic RNG so that test trees are reproducible
pub(crate) fn seeded_rng() -> StdRng {
    StdRng::seed_from_u64(0x0c0_1145)
}

/// A directory over a deterministic VRF and a throwaway signing key,
/// returning the public key clients would hold
pub(crate) fn test_directory(retention: usize) -> (Pad<KeyedVrf>, PublicKey) {
    let mut rng = seeded_rng();
    let vrf = KeyedVrf::generate(&mut rng);
    let signer = PrivateKey::generate(&mut rng);
    let public = signer.public();
    let policies = Policies::new(vrf.public_key(), 3600);
    (Pad::new(vrf, signer, policies, retention), public)
}
