// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! An implementation of a key-transparency directory.
//!
//! The directory publishes a signed, append-only history of
//! username-to-public-key bindings. Each epoch it seals a snapshot of a
//! sparse Merkle prefix tree whose leaves sit at VRF-derived indices and
//! hold hiding commitments to the bindings, and signs the snapshot's root
//! into a [SignedTreeRoot] chained onto the previous epoch's. Clients
//! verify, without trusting the directory, that their own binding is
//! present and that everyone is being shown the same history.
//!
//! The two building blocks here are:
//!
//! - [MerkleTree] — the sparse prefix tree with insertion, lookup, and
//!   authentication-path extraction. Sealed snapshots share unchanged
//!   subtrees, so keeping several epochs around is cheap.
//! - [Pad] — the persistent authenticated dictionary: the epoch-indexed
//!   chain of `(signed tree root, tree)` snapshots with bounded retention
//!   and a mutable pending tree that accumulates writes for the next epoch.
//!
//! Proof verification lives in [`coniks_core`] so that clients need not
//! depend on any of the server-side machinery.
//!
//! # Example
//!
//! ```
//! use coniks::pad::Pad;
//! use coniks::{ConiksLabel, ConiksValue, ProofType};
//! use coniks_core::policies::Policies;
//! use coniks_core::sign::PrivateKey;
//! use coniks_core::vrf::{KeyedVrf, VrfEvaluator};
//! use rand::rngs::OsRng;
//!
//! let vrf = KeyedVrf::generate(&mut OsRng);
//! let signer = PrivateKey::generate(&mut OsRng);
//! let policies = Policies::new(vrf.public_key(), 3600);
//! let mut pad = Pad::new(vrf, signer.clone(), policies, 10);
//!
//! let alice: ConiksLabel = "alice".into();
//! let key: ConiksValue = "alice-key".into();
//! pad.insert(alice.clone(), key.clone()).unwrap();
//! pad.update();
//!
//! let (proof, root) = pad.lookup(&alice).unwrap();
//! assert_eq!(ProofType::Inclusion, proof.proof_type());
//! root.verify_signature(&signer.public()).unwrap();
//! proof.verify(&alice, Some(&key), &root.tree_hash).unwrap();
//! ```

#![warn(missing_docs)]

pub mod errors;
pub mod merkle_tree;
pub mod pad;

mod tree_node;

#[cfg(test)]
mod test_utils;

pub use coniks_core::{
    AuthPath, Commitment, ConiksLabel, ConiksValue, Direction, Index, ProofNode, ProofType,
    SignedTreeRoot, VerificationError,
};
pub use errors::{PadError, TreeError};
pub use merkle_tree::MerkleTree;
pub use pad::Pad;
