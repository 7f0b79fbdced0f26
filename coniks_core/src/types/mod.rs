// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! This module contains the structs which need to be constructed to verify
//! directory proofs: bindings, indices, and authentication paths.

use crate::commitment::Commitment;
use crate::hash::{Digest, NONCE_BYTES};
#[cfg(feature = "serde_serialization")]
use crate::utils::serde_helpers::{bytes_deserialize_hex, bytes_serialize_hex};

#[cfg(feature = "rand")]
use rand::{CryptoRng, Rng};

pub mod index;
pub use index::*;

// ============================================
// Typedefs and constants
// ============================================

/// This type is used to indicate a direction for a particular node relative
/// to its parent: descending on a 0 bit goes left, on a 1 bit goes right.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
#[cfg_attr(
    feature = "serde_serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
#[repr(u8)]
pub enum Direction {
    /// Left
    Left = 0u8,
    /// Right
    Right = 1u8,
}

impl Direction {
    /// Returns the opposite of the direction
    pub fn other(&self) -> Self {
        match self {
            Direction::Left => Direction::Right,
            Direction::Right => Direction::Left,
        }
    }
}

/// Whether an authentication path demonstrates that a binding is present or
/// that no binding exists at the lookup index
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash)]
pub enum ProofType {
    /// The path terminates in a user leaf carrying the lookup index
    Inclusion,
    /// The path terminates in a leaf that merely shares a prefix with the
    /// lookup index
    Absence,
}

/// The label of a particular entry in the directory (the username)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde_serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct ConiksLabel(
    #[cfg_attr(
        feature = "serde_serialization",
        serde(serialize_with = "bytes_serialize_hex")
    )]
    #[cfg_attr(
        feature = "serde_serialization",
        serde(deserialize_with = "bytes_deserialize_hex")
    )]
    pub Vec<u8>,
);

impl core::ops::Deref for ConiksLabel {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl core::ops::DerefMut for ConiksLabel {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl core::convert::From<&str> for ConiksLabel {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl core::convert::From<Vec<u8>> for ConiksLabel {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl ConiksLabel {
    /// Gets a random label
    #[cfg(feature = "rand")]
    pub fn random<R: CryptoRng + Rng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        Self(bytes.to_vec())
    }
}

/// The value bound to an entry in the directory (the user's public key blob)
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(
    feature = "serde_serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct ConiksValue(
    #[cfg_attr(
        feature = "serde_serialization",
        serde(serialize_with = "bytes_serialize_hex")
    )]
    #[cfg_attr(
        feature = "serde_serialization",
        serde(deserialize_with = "bytes_deserialize_hex")
    )]
    pub Vec<u8>,
);

impl core::ops::Deref for ConiksValue {
    type Target = Vec<u8>;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl core::ops::DerefMut for ConiksValue {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.0
    }
}

impl core::convert::From<&str> for ConiksValue {
    fn from(s: &str) -> Self {
        Self(s.as_bytes().to_vec())
    }
}

impl core::convert::From<Vec<u8>> for ConiksValue {
    fn from(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }
}

impl ConiksValue {
    /// Gets a random value
    #[cfg(feature = "rand")]
    pub fn random<R: CryptoRng + Rng>(rng: &mut R) -> Self {
        let mut bytes = [0u8; 32];
        rng.fill_bytes(&mut bytes);
        Self(bytes.to_vec())
    }
}

// ============================================
// Structs
// ============================================

/// The leaf carried inside an authentication path.
///
/// For a proof of inclusion the leaf is the full user leaf: its index,
/// depth, commitment, and the plaintext binding. For a proof of absence
/// that terminates at a user leaf, `label` and `value` are masked to `None`
/// while the commitment is retained; the commitment alone reveals nothing
/// about the other user's binding but is still needed to recompute the leaf
/// hash. An empty leaf carries neither commitment nor binding.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde_serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct ProofNode {
    /// The index stored in the leaf. For an empty leaf only the first
    /// `level` bits are meaningful.
    pub index: Index,
    /// The leaf's depth below the root
    pub level: u32,
    /// The commitment stored in the leaf, present iff the leaf is occupied
    pub commitment: Option<Commitment>,
    /// The username bound at the leaf, masked on proofs of absence
    pub label: Option<ConiksLabel>,
    /// The key blob bound at the leaf, masked on proofs of absence
    pub value: Option<ConiksValue>,
}

/// An authentication path: everything a client needs to recompute the tree
/// root committed by a signed tree root for one lookup index.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde_serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct AuthPath {
    /// The index the lookup was performed for
    pub lookup_index: Index,
    /// The tree's nonce, which feeds every leaf hash
    #[cfg_attr(
        feature = "serde_serialization",
        serde(serialize_with = "bytes_serialize_hex")
    )]
    #[cfg_attr(
        feature = "serde_serialization",
        serde(deserialize_with = "bytes_deserialize_hex")
    )]
    pub tree_nonce: [u8; NONCE_BYTES],
    /// The leaf the descent terminated in
    pub leaf: ProofNode,
    /// Sibling hashes along the descent, ordered root to leaf. The length
    /// always equals `leaf.level`.
    pub siblings: Vec<Digest>,
}

impl AuthPath {
    /// Whether this path proves inclusion or absence of the lookup index
    pub fn proof_type(&self) -> ProofType {
        if self.leaf.index == self.lookup_index && self.leaf.commitment.is_some() {
            ProofType::Inclusion
        } else {
            ProofType::Absence
        }
    }
}
