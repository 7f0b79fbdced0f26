// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Client-side verification of authentication paths.
//!
//! Verification never trusts the directory: every hash on the path from the
//! claimed leaf to the root is recomputed locally and compared against the
//! root committed in the signed tree root the client already validated.

use crate::hash::{hash_empty, hash_interior, hash_leaf, Digest};
use crate::types::{AuthPath, ConiksLabel, ConiksValue, Direction, ProofType};

use subtle::ConstantTimeEq;

/// Proof verification error types.
///
/// Every variant is reported to the caller verbatim; verification failures
/// are never collapsed into a generic error.
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum VerificationError {
    /// The binding carried by the proof disagrees with the supplied
    /// `(username, key)` pair
    BindingsDiffer,
    /// The leaf's commitment does not re-derive from the supplied binding
    UnverifiableCommitment,
    /// An absence proof's leaf index disagrees with the lookup index on the
    /// leaf's prefix
    IndicesMismatch,
    /// The root recomputed from the path differs from the expected tree hash
    UnequalTreeHashes,
    /// A signed tree root's signature or chain linkage did not verify
    BadStr,
    /// A directory response could not be decoded
    MalformedDirectoryMessage,
    /// A client request could not be decoded
    MalformedClientMessage,
}

impl core::fmt::Display for VerificationError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let code = match &self {
            VerificationError::BindingsDiffer => "bindings differ",
            VerificationError::UnverifiableCommitment => "commitment could not be verified",
            VerificationError::IndicesMismatch => "indices mismatch",
            VerificationError::UnequalTreeHashes => "unequal tree hashes",
            VerificationError::BadStr => "signed tree root did not verify",
            VerificationError::MalformedDirectoryMessage => "malformed directory message",
            VerificationError::MalformedClientMessage => "malformed client message",
        };
        write!(f, "Verification error: {code}")
    }
}

impl AuthPath {
    /// Verify this path against the supplied binding and the tree hash
    /// committed by the epoch's signed tree root.
    ///
    /// For a lookup that is expected to succeed, `value` is the key blob the
    /// caller believes is bound to `label`. For a lookup expected to show
    /// absence, `value` must be `None`. The checks, in order:
    ///
    /// 1. The binding claimed by the proof must match the supplied one
    ///    ([VerificationError::BindingsDiffer]).
    /// 2. On inclusion, the leaf's commitment must re-derive from the
    ///    supplied binding ([VerificationError::UnverifiableCommitment]).
    /// 3. On absence, the leaf must actually cover the lookup index: its
    ///    first `level` bits must agree with the lookup index
    ///    ([VerificationError::IndicesMismatch]).
    /// 4. The root recomputed by folding the sibling hashes must equal
    ///    `expected_tree_hash` ([VerificationError::UnequalTreeHashes]).
    pub fn verify(
        &self,
        label: &ConiksLabel,
        value: Option<&ConiksValue>,
        expected_tree_hash: &Digest,
    ) -> Result<(), VerificationError> {
        match self.proof_type() {
            ProofType::Inclusion => {
                let supplied = match value {
                    Some(supplied) => supplied,
                    None => return Err(VerificationError::BindingsDiffer),
                };
                match (&self.leaf.label, &self.leaf.value) {
                    (Some(leaf_label), Some(leaf_value))
                        if leaf_label == label && leaf_value == supplied => {}
                    _ => return Err(VerificationError::BindingsDiffer),
                }
                let commitment_ok = self
                    .leaf
                    .commitment
                    .as_ref()
                    .map(|commitment| commitment.verify(label, supplied))
                    .unwrap_or(false);
                if !commitment_ok {
                    return Err(VerificationError::UnverifiableCommitment);
                }
            }
            ProofType::Absence => {
                if self.leaf.value.is_some() || value.is_some() {
                    return Err(VerificationError::BindingsDiffer);
                }
                if !self
                    .leaf
                    .index
                    .shares_prefix(&self.lookup_index, self.leaf.level)
                {
                    return Err(VerificationError::IndicesMismatch);
                }
            }
        }

        self.verify_path(expected_tree_hash)
    }

    // Recompute the root from the leaf and the sibling hashes and compare
    // against the expected tree hash.
    fn verify_path(&self, expected_tree_hash: &Digest) -> Result<(), VerificationError> {
        if self.siblings.len() != self.leaf.level as usize {
            return Err(VerificationError::MalformedDirectoryMessage);
        }

        let mut current = match &self.leaf.commitment {
            Some(commitment) => hash_leaf(
                &self.tree_nonce,
                self.leaf.index.as_bytes(),
                self.leaf.level,
                &commitment.value,
            ),
            None => hash_empty(
                &self.tree_nonce,
                self.leaf.index.as_bytes(),
                self.leaf.level,
            ),
        };

        for depth in (0..self.leaf.level).rev() {
            let sibling = &self.siblings[depth as usize];
            current = match self.lookup_index.direction_at(depth) {
                Direction::Left => hash_interior(&current, sibling),
                Direction::Right => hash_interior(sibling, &current),
            };
        }

        if current[..].ct_eq(&expected_tree_hash[..]).into() {
            Ok(())
        } else {
            Err(VerificationError::UnequalTreeHashes)
        }
    }
}
