// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Core utilities for the `coniks` key-transparency directory and its
//! clients. Mainly contains (1) the domain-separated hashing utilities the
//! Merkle prefix tree is built on, (2) type definitions for indices,
//! bindings, and proofs, (3) client-side proof verification, and (4) the
//! canonical wire encodings for proofs and signed tree roots.
//!
//! # Bindings, commitments, and indices
//!
//! A directory maps a username ([ConiksLabel]) to a public key blob
//! ([ConiksValue]). The position of a binding in the tree is an [Index]:
//! the 256-bit output of a verifiable random function evaluated over the
//! username, treated here as an opaque uniformly random bitstring (see
//! [vrf]). The binding itself is never hashed into the tree directly;
//! instead the directory stores a salted [Commitment] to
//! `(username, key)`, which hides the binding from other clients while
//! allowing its owner to verify it.
//!
//! # Proofs
//!
//! For any lookup index, the directory produces an [AuthPath]: the leaf
//! reached by descending the tree along the index bits together with the
//! sibling hash at every interior node on the way down. Folding the
//! sibling hashes back up from the leaf reconstructs the root, which must
//! equal the `tree_hash` committed in a [SignedTreeRoot]. The path proves
//! inclusion when the leaf carries the queried index, and absence
//! otherwise. [AuthPath::verify] performs the whole check on the client.

#![warn(missing_docs)]

pub mod commitment;
pub mod hash;
pub mod policies;
pub mod proto;
pub mod sign;
pub mod signed_tree_root;
pub mod utils;
pub mod verify;
pub mod vrf;

pub mod types;
pub use types::*;

pub use commitment::Commitment;
pub use signed_tree_root::SignedTreeRoot;
pub use verify::VerificationError;
