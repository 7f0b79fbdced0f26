// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! The node variants of the sparse Merkle prefix tree.
//!
//! Nodes are held behind `Arc` so that sealed snapshots and the pending
//! tree share every subtree that no write has touched. Leaves are immutable
//! once placed; an interior node carries a hash cache that is cleared along
//! the write path and refilled by the next recompute pass.

use coniks_core::hash::{self, Digest, NONCE_BYTES};
use coniks_core::{Commitment, ConiksLabel, ConiksValue, Index};

use std::sync::Arc;

/// There are three kinds of nodes: interior, occupied leaf, and empty leaf.
#[derive(Debug, Clone)]
pub(crate) enum TreeNode {
    Interior(InteriorNode),
    Leaf(UserLeafNode),
    Empty(EmptyNode),
}

/// An interior branching node. `hash` is `None` while any descendant has
/// been mutated since the last recompute pass.
#[derive(Debug, Clone)]
pub(crate) struct InteriorNode {
    pub(crate) left: Arc<TreeNode>,
    pub(crate) right: Arc<TreeNode>,
    pub(crate) level: u32,
    pub(crate) hash: Option<Digest>,
}

/// A placed binding. Its position is fixed by the first `level` bits of
/// `index`.
#[derive(Debug, Clone)]
pub(crate) struct UserLeafNode {
    pub(crate) index: Index,
    pub(crate) level: u32,
    pub(crate) commitment: Commitment,
    pub(crate) label: ConiksLabel,
    pub(crate) value: ConiksValue,
}

/// A subtree known to contain no binding. `index` is the prefix
/// fingerprint of the subtree; bits beyond `level` are zero padding.
#[derive(Debug, Clone)]
pub(crate) struct EmptyNode {
    pub(crate) index: Index,
    pub(crate) level: u32,
}

impl TreeNode {
    /// The node's current hash: computed on demand for leaves, read from
    /// the cache for interior nodes. `None` means a dirty interior node.
    pub(crate) fn cached_hash(&self, nonce: &[u8; NONCE_BYTES]) -> Option<Digest> {
        match self {
            TreeNode::Interior(interior) => interior.hash,
            TreeNode::Leaf(leaf) => Some(leaf.hash(nonce)),
            TreeNode::Empty(empty) => Some(empty.hash(nonce)),
        }
    }
}

impl UserLeafNode {
    pub(crate) fn hash(&self, nonce: &[u8; NONCE_BYTES]) -> Digest {
        hash::hash_leaf(
            nonce,
            self.index.as_bytes(),
            self.level,
            &self.commitment.value,
        )
    }
}

impl EmptyNode {
    pub(crate) fn hash(&self, nonce: &[u8; NONCE_BYTES]) -> Digest {
        hash::hash_empty(nonce, self.index.as_bytes(), self.level)
    }
}
