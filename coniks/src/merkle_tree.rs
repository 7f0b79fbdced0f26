// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! The sparse Merkle prefix tree.
//!
//! The tree is keyed by [Index] bitstrings: descending from the root, bit
//! `i` of the index picks the branch at depth `i`. At any time the leaves
//! partition the whole index space between occupied leaves (placed
//! bindings) and empty leaves (prefixes known to hold nothing), so the tree
//! can prove absence as readily as inclusion.
//!
//! Mutation and hashing are separate passes: [MerkleTree::set] only
//! restructures nodes and invalidates the hash caches along the write path,
//! and [MerkleTree::recompute_root_hash] refills them in one post-order
//! sweep. Authentication paths are only served from a recomputed tree.
//!
//! [MerkleTree::clone] is a snapshot: nodes are shared until a later `set`
//! copies the nodes along its write path, so retaining the trees of past
//! epochs costs only the paths that changed since.

use crate::errors::TreeError;
use crate::tree_node::{EmptyNode, InteriorNode, TreeNode, UserLeafNode};

use coniks_core::hash::{self, Digest, NONCE_BYTES};
use coniks_core::{AuthPath, Commitment, ConiksLabel, ConiksValue, Direction, Index, ProofNode};

use rand::{CryptoRng, Rng};
use std::sync::Arc;

/// A mutable sparse Merkle prefix tree with copy-on-write snapshots
#[derive(Debug, Clone)]
pub struct MerkleTree {
    nonce: [u8; NONCE_BYTES],
    root: Arc<TreeNode>,
    root_hash: Option<Digest>,
}

impl MerkleTree {
    /// Creates an empty tree: a single empty leaf at level 0 covering the
    /// whole index space, under a freshly drawn nonce. The nonce feeds
    /// every leaf hash and stays fixed for the tree's lifetime, snapshots
    /// included.
    pub fn new<R: CryptoRng + Rng>(rng: &mut R) -> Self {
        let mut nonce = [0u8; NONCE_BYTES];
        rng.fill_bytes(&mut nonce);
        Self {
            nonce,
            root: Arc::new(TreeNode::Empty(EmptyNode {
                index: Index::ZERO,
                level: 0,
            })),
            root_hash: None,
        }
    }

    /// The tree's nonce
    pub fn nonce(&self) -> &[u8; NONCE_BYTES] {
        &self.nonce
    }

    /// The root hash as of the last [MerkleTree::recompute_root_hash], or
    /// `None` if the tree has been mutated since
    pub fn root_hash(&self) -> Option<Digest> {
        self.root_hash
    }

    /// Place (or overwrite) the binding `(label, value)` at `index`,
    /// committing to it under a fresh salt.
    ///
    /// Writing to an index that already holds a binding replaces it in
    /// place with a fresh commitment; this is the re-registration path.
    /// Writing to a fresh index grows the tree by the minimal chain of
    /// interior nodes separating it from the leaf it collided with. No
    /// hashes are computed here.
    pub fn set<R: CryptoRng + Rng>(
        &mut self,
        rng: &mut R,
        index: Index,
        label: ConiksLabel,
        value: ConiksValue,
    ) {
        let commitment = Commitment::new(rng, &label, &value);
        self.set_with_commitment(index, label, value, commitment);
    }

    /// As [MerkleTree::set], with a caller-supplied commitment
    pub(crate) fn set_with_commitment(
        &mut self,
        index: Index,
        label: ConiksLabel,
        value: ConiksValue,
        commitment: Commitment,
    ) {
        self.root_hash = None;
        Self::insert_at(&mut self.root, index, label, value, commitment);
    }

    // Descend to the leaf covering `index`, copying shared nodes and
    // clearing interior hash caches along the way.
    fn insert_at(
        slot: &mut Arc<TreeNode>,
        index: Index,
        label: ConiksLabel,
        value: ConiksValue,
        commitment: Commitment,
    ) {
        let replacement = match Arc::make_mut(slot) {
            TreeNode::Interior(interior) => {
                interior.hash = None;
                let child = match index.direction_at(interior.level) {
                    Direction::Left => &mut interior.left,
                    Direction::Right => &mut interior.right,
                };
                Self::insert_at(child, index, label, value, commitment);
                return;
            }
            TreeNode::Empty(empty) => Arc::new(TreeNode::Leaf(UserLeafNode {
                index,
                level: empty.level,
                commitment,
                label,
                value,
            })),
            TreeNode::Leaf(existing) => {
                if existing.index == index {
                    // re-registration: overwrite in place
                    existing.commitment = commitment;
                    existing.label = label;
                    existing.value = value;
                    return;
                }
                let level = existing.level;
                let incoming = UserLeafNode {
                    index,
                    level,
                    commitment,
                    label,
                    value,
                };
                Self::split_leaves(existing.clone(), incoming, level)
            }
        };
        *slot = replacement;
    }

    // Two leaves collided at `level`. Build the chain of interior nodes
    // down to their first divergent bit, filling the passed-over branches
    // with empty leaves, and hang both leaves below the divergence.
    fn split_leaves(existing: UserLeafNode, incoming: UserLeafNode, level: u32) -> Arc<TreeNode> {
        let existing_branch = existing.index.direction_at(level);
        let incoming_branch = incoming.index.direction_at(level);
        if existing_branch != incoming_branch {
            let mut existing = existing;
            let mut incoming = incoming;
            existing.level = level + 1;
            incoming.level = level + 1;
            let (left, right) = match incoming_branch {
                Direction::Left => (incoming, existing),
                Direction::Right => (existing, incoming),
            };
            Arc::new(TreeNode::Interior(InteriorNode {
                left: Arc::new(TreeNode::Leaf(left)),
                right: Arc::new(TreeNode::Leaf(right)),
                level,
                hash: None,
            }))
        } else {
            let empty = EmptyNode {
                index: incoming.index.sibling_prefix(level + 1),
                level: level + 1,
            };
            let below = Self::split_leaves(existing, incoming, level + 1);
            let (left, right) = match incoming_branch {
                Direction::Left => (below, Arc::new(TreeNode::Empty(empty))),
                Direction::Right => (Arc::new(TreeNode::Empty(empty)), below),
            };
            Arc::new(TreeNode::Interior(InteriorNode {
                left,
                right,
                level,
                hash: None,
            }))
        }
    }

    /// Recompute and cache the interior hashes invalidated by writes since
    /// the last pass, in a single post-order traversal, and return the
    /// fresh root hash. Subtrees whose caches are intact are not visited.
    pub fn recompute_root_hash(&mut self) -> Digest {
        let nonce = self.nonce;
        let root_hash = Self::compute_hash(&mut self.root, &nonce);
        self.root_hash = Some(root_hash);
        root_hash
    }

    fn compute_hash(node: &mut Arc<TreeNode>, nonce: &[u8; NONCE_BYTES]) -> Digest {
        if let Some(hash) = node.cached_hash(nonce) {
            return hash;
        }
        match Arc::make_mut(node) {
            TreeNode::Interior(interior) => {
                let left = Self::compute_hash(&mut interior.left, nonce);
                let right = Self::compute_hash(&mut interior.right, nonce);
                let hash = hash::hash_interior(&left, &right);
                interior.hash = Some(hash);
                hash
            }
            // leaves always answer from cached_hash above
            TreeNode::Leaf(leaf) => leaf.hash(nonce),
            TreeNode::Empty(empty) => empty.hash(nonce),
        }
    }

    /// Extract the authentication path for `lookup_index`: the leaf its
    /// descent terminates in plus the sibling hash at every interior node
    /// passed on the way down.
    ///
    /// The tree must be in recomputed state, since sibling hashes are
    /// captured eagerly from the interior caches; otherwise
    /// [TreeError::StaleRoot] is returned.
    ///
    /// When the descent ends at another user's leaf (a proof of absence)
    /// the leaf's binding is masked from the path; its commitment alone is
    /// enough to recompute the leaf hash and reveals nothing.
    pub fn get(&self, lookup_index: &Index) -> Result<AuthPath, TreeError> {
        if self.root_hash.is_none() {
            return Err(TreeError::StaleRoot);
        }
        let mut siblings = Vec::new();
        let mut node = &self.root;
        loop {
            match &**node {
                TreeNode::Interior(interior) => {
                    let (next, other) = match lookup_index.direction_at(interior.level) {
                        Direction::Left => (&interior.left, &interior.right),
                        Direction::Right => (&interior.right, &interior.left),
                    };
                    siblings.push(other.cached_hash(&self.nonce).ok_or(TreeError::StaleRoot)?);
                    node = next;
                }
                TreeNode::Leaf(leaf) => {
                    let included = leaf.index == *lookup_index;
                    return Ok(AuthPath {
                        lookup_index: *lookup_index,
                        tree_nonce: self.nonce,
                        leaf: ProofNode {
                            index: leaf.index,
                            level: leaf.level,
                            commitment: Some(leaf.commitment.clone()),
                            label: included.then(|| leaf.label.clone()),
                            value: included.then(|| leaf.value.clone()),
                        },
                        siblings,
                    });
                }
                TreeNode::Empty(empty) => {
                    return Ok(AuthPath {
                        lookup_index: *lookup_index,
                        tree_nonce: self.nonce,
                        leaf: ProofNode {
                            index: empty.index,
                            level: empty.level,
                            commitment: None,
                            label: None,
                            value: None,
                        },
                        siblings,
                    });
                }
            }
        }
    }

    /// The binding currently placed at `index`, if any
    pub fn binding_at(&self, index: &Index) -> Option<(&ConiksLabel, &ConiksValue)> {
        let mut node = &self.root;
        loop {
            match &**node {
                TreeNode::Interior(interior) => {
                    node = match index.direction_at(interior.level) {
                        Direction::Left => &interior.left,
                        Direction::Right => &interior.right,
                    };
                }
                TreeNode::Leaf(leaf) if leaf.index == *index => {
                    return Some((&leaf.label, &leaf.value));
                }
                _ => return None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::TreeError;
    use crate::test_utils::seeded_rng;

    use coniks_core::commitment::SALT_BYTES;
    use coniks_core::{ProofType, VerificationError, INDEX_BYTES};

    // Creates an index of 32 bytes from a u64, placing the bits at the
    // front of the byte array (big-endian).
    fn index_from_u64(input_int: u64) -> Index {
        let mut output_arr = [0u8; INDEX_BYTES];
        output_arr[..8].clone_from_slice(&input_int.to_be_bytes());
        Index::new(output_arr)
    }

    fn recomputed(tree: &mut MerkleTree) -> Digest {
        tree.recompute_root_hash()
    }

    #[test]
    fn test_empty_tree_proves_absence_with_no_siblings() {
        let mut rng = seeded_rng();
        let mut tree = MerkleTree::new(&mut rng);
        let root = recomputed(&mut tree);

        let lookup = Index::random(&mut rng);
        let proof = tree.get(&lookup).unwrap();
        assert_eq!(ProofType::Absence, proof.proof_type());
        assert!(proof.leaf.commitment.is_none());
        assert!(proof.siblings.is_empty());
        assert_eq!(Ok(()), proof.verify(&"alice".into(), None, &root));
    }

    #[test]
    fn test_single_insert_proves_inclusion() {
        let mut rng = seeded_rng();
        let mut tree = MerkleTree::new(&mut rng);
        let index = Index::random(&mut rng);
        let label: ConiksLabel = "alice".into();
        let value: ConiksValue = "alice-key".into();
        tree.set(&mut rng, index, label.clone(), value.clone());
        let root = recomputed(&mut tree);

        let proof = tree.get(&index).unwrap();
        assert_eq!(ProofType::Inclusion, proof.proof_type());
        assert_eq!(Ok(()), proof.verify(&label, Some(&value), &root));
    }

    #[test]
    fn test_absence_shares_prefix_with_user_leaf() {
        let mut rng = seeded_rng();
        let mut tree = MerkleTree::new(&mut rng);
        // one placed binding; the whole index space collapses onto its leaf
        let placed = index_from_u64(0b1010u64 << 60);
        tree.set(&mut rng, placed, "alice".into(), "alice-key".into());
        let root = recomputed(&mut tree);

        let absent = index_from_u64(0b1100u64 << 60);
        let proof = tree.get(&absent).unwrap();
        assert_eq!(ProofType::Absence, proof.proof_type());
        // the descent ended at alice's leaf, with her binding masked
        assert_eq!(placed, proof.leaf.index);
        assert!(proof.leaf.commitment.is_some());
        assert!(proof.leaf.label.is_none());
        assert!(proof.leaf.value.is_none());
        // the leaf covers the lookup's whole prefix
        assert!(proof.leaf.index.shares_prefix(&absent, proof.leaf.level));
        assert_eq!(Ok(()), proof.verify(&"bob".into(), None, &root));
    }

    #[test]
    fn test_splitting_collided_leaves() {
        let mut rng = seeded_rng();
        let mut tree = MerkleTree::new(&mut rng);
        // indices sharing their first two bits, diverging on the third
        let first = index_from_u64(0b110u64 << 61);
        let second = index_from_u64(0b111u64 << 61);
        tree.set(&mut rng, first, "alice".into(), "alice-key".into());
        tree.set(&mut rng, second, "bob".into(), "bob-key".into());
        let root = recomputed(&mut tree);

        let first_proof = tree.get(&first).unwrap();
        assert_eq!(3, first_proof.leaf.level);
        assert_eq!(3, first_proof.siblings.len());
        assert_eq!(
            Ok(()),
            first_proof.verify(&"alice".into(), Some(&"alice-key".into()), &root)
        );
        let second_proof = tree.get(&second).unwrap();
        assert_eq!(
            Ok(()),
            second_proof.verify(&"bob".into(), Some(&"bob-key".into()), &root)
        );

        // an index diverging inside the shared prefix lands on one of the
        // passed-over empty leaves
        let absent = index_from_u64(0b10u64 << 62);
        let proof = tree.get(&absent).unwrap();
        assert_eq!(ProofType::Absence, proof.proof_type());
        assert!(proof.leaf.commitment.is_none());
        assert_eq!(2, proof.leaf.level);
        assert_eq!(Ok(()), proof.verify(&"carol".into(), None, &root));
    }

    #[test]
    fn test_mutated_proofs_are_detected() {
        let mut rng = seeded_rng();
        let mut tree = MerkleTree::new(&mut rng);
        let indices: Vec<Index> = (0..3).map(|_| Index::random(&mut rng)).collect();
        for (i, index) in indices.iter().enumerate() {
            tree.set(
                &mut rng,
                *index,
                format!("user-{i}").as_str().into(),
                format!("key-{i}").as_str().into(),
            );
        }
        let root = recomputed(&mut tree);

        let label: ConiksLabel = "user-0".into();
        let value: ConiksValue = "key-0".into();
        let mut proof = tree.get(&indices[0]).unwrap();
        assert_eq!(Ok(()), proof.verify(&label, Some(&value), &root));

        // flip a bit of the bound value
        if let Some(leaf_value) = proof.leaf.value.as_mut() {
            leaf_value[0] ^= 1;
        }
        assert_eq!(
            Err(VerificationError::BindingsDiffer),
            proof.verify(&label, Some(&value), &root)
        );
        if let Some(leaf_value) = proof.leaf.value.as_mut() {
            leaf_value[0] ^= 1;
        }

        // flip a bit of the commitment salt
        if let Some(commitment) = proof.leaf.commitment.as_mut() {
            commitment.salt[0] ^= 1;
        }
        assert_eq!(
            Err(VerificationError::UnverifiableCommitment),
            proof.verify(&label, Some(&value), &root)
        );
        if let Some(commitment) = proof.leaf.commitment.as_mut() {
            commitment.salt[0] ^= 1;
        }

        // flip a bit of the expected root
        let mut bad_root = root;
        bad_root[0] ^= 1;
        assert_eq!(
            Err(VerificationError::UnequalTreeHashes),
            proof.verify(&label, Some(&value), &bad_root)
        );

        // intact again
        assert_eq!(Ok(()), proof.verify(&label, Some(&value), &root));
    }

    #[test]
    fn test_absence_proof_with_corrupted_leaf_index() {
        let mut rng = seeded_rng();
        let mut tree = MerkleTree::new(&mut rng);
        let first = index_from_u64(0b00u64 << 62);
        let second = index_from_u64(0b01u64 << 62);
        tree.set(&mut rng, first, "alice".into(), "alice-key".into());
        tree.set(&mut rng, second, "bob".into(), "bob-key".into());
        let root = recomputed(&mut tree);

        // descends to alice's leaf at level 2
        let absent = index_from_u64(0b0010u64 << 60);
        let mut proof = tree.get(&absent).unwrap();
        assert_eq!(ProofType::Absence, proof.proof_type());
        assert_eq!(2, proof.leaf.level);

        // corrupt the claimed leaf index within its covering prefix
        proof.leaf.index.0[0] |= 0x80;
        assert_eq!(
            Err(VerificationError::IndicesMismatch),
            proof.verify(&"carol".into(), None, &root)
        );
    }

    #[test]
    fn test_reregistration_overwrites_in_place() {
        let mut rng = seeded_rng();
        let mut tree = MerkleTree::new(&mut rng);
        let index = Index::random(&mut rng);
        let label: ConiksLabel = "alice".into();
        let old_value: ConiksValue = "old-key".into();
        let new_value: ConiksValue = "new-key".into();

        tree.set(&mut rng, index, label.clone(), old_value.clone());
        tree.set(&mut rng, index, label.clone(), new_value.clone());
        let root = recomputed(&mut tree);

        let proof = tree.get(&index).unwrap();
        assert_eq!(Ok(()), proof.verify(&label, Some(&new_value), &root));
        assert_eq!(
            Err(VerificationError::BindingsDiffer),
            proof.verify(&label, Some(&old_value), &root)
        );
    }

    #[test]
    fn test_proofs_require_recomputed_hashes() {
        let mut rng = seeded_rng();
        let mut tree = MerkleTree::new(&mut rng);
        let index = Index::random(&mut rng);
        assert_eq!(Err(TreeError::StaleRoot), tree.get(&index));

        tree.set(&mut rng, index, "alice".into(), "alice-key".into());
        assert_eq!(Err(TreeError::StaleRoot), tree.get(&index));
        assert!(tree.root_hash().is_none());

        recomputed(&mut tree);
        assert!(tree.get(&index).is_ok());

        // mutation invalidates the cache again
        let bob = Index::random(&mut rng);
        tree.set(&mut rng, bob, "bob".into(), "key".into());
        assert_eq!(Err(TreeError::StaleRoot), tree.get(&index));
    }

    #[test]
    fn test_clone_snapshots_are_isolated() {
        let mut rng = seeded_rng();
        let mut tree = MerkleTree::new(&mut rng);
        let alice = Index::random(&mut rng);
        tree.set(&mut rng, alice, "alice".into(), "alice-key".into());
        let sealed_root = recomputed(&mut tree);
        let sealed = tree.clone();

        // writes against the original leave the snapshot untouched
        let bob = Index::random(&mut rng);
        tree.set(&mut rng, bob, "bob".into(), "bob-key".into());
        let new_root = recomputed(&mut tree);
        assert_ne!(sealed_root, new_root);
        assert_eq!(Some(sealed_root), sealed.root_hash());
        assert_eq!(sealed.nonce(), tree.nonce());

        let proof = sealed.get(&alice).unwrap();
        assert_eq!(
            Ok(()),
            proof.verify(&"alice".into(), Some(&"alice-key".into()), &sealed_root)
        );
        let absent = sealed.get(&bob).unwrap();
        assert_eq!(ProofType::Absence, absent.proof_type());
        assert_eq!(Ok(()), absent.verify(&"bob".into(), None, &sealed_root));

        // while the original sees both bindings
        let proof = tree.get(&bob).unwrap();
        assert_eq!(
            Ok(()),
            proof.verify(&"bob".into(), Some(&"bob-key".into()), &new_root)
        );
    }

    #[test]
    fn test_root_is_insertion_order_independent() {
        let mut rng = seeded_rng();
        let mut forward = MerkleTree::new(&mut rng);
        let mut backward = forward.clone();

        let bindings: Vec<(Index, ConiksLabel, ConiksValue, Commitment)> = (0..8)
            .map(|i| {
                let label: ConiksLabel = format!("user-{i}").as_str().into();
                let value: ConiksValue = format!("key-{i}").as_str().into();
                let commitment =
                    Commitment::with_salt([i as u8; SALT_BYTES], &label, &value);
                (Index::random(&mut rng), label, value, commitment)
            })
            .collect();

        for (index, label, value, commitment) in bindings.iter() {
            forward.set_with_commitment(
                *index,
                label.clone(),
                value.clone(),
                commitment.clone(),
            );
        }
        for (index, label, value, commitment) in bindings.iter().rev() {
            backward.set_with_commitment(
                *index,
                label.clone(),
                value.clone(),
                commitment.clone(),
            );
        }

        assert_eq!(
            forward.recompute_root_hash(),
            backward.recompute_root_hash()
        );
    }

    #[test]
    fn test_binding_at() {
        let mut rng = seeded_rng();
        let mut tree = MerkleTree::new(&mut rng);
        let index = Index::random(&mut rng);
        assert!(tree.binding_at(&index).is_none());

        tree.set(&mut rng, index, "alice".into(), "alice-key".into());
        let (label, value) = tree.binding_at(&index).unwrap();
        assert_eq!(&ConiksLabel::from("alice"), label);
        assert_eq!(&ConiksValue::from("alice-key"), value);
        assert!(tree.binding_at(&Index::random(&mut rng)).is_none());
    }

    #[test]
    fn test_every_inserted_binding_remains_provable() {
        let mut rng = seeded_rng();
        let mut tree = MerkleTree::new(&mut rng);
        let bindings: Vec<(Index, ConiksLabel, ConiksValue)> = (0..32)
            .map(|_| {
                (
                    Index::random(&mut rng),
                    ConiksLabel::random(&mut rng),
                    ConiksValue::random(&mut rng),
                )
            })
            .collect();
        for (index, label, value) in bindings.iter() {
            tree.set(&mut rng, *index, label.clone(), value.clone());
        }
        let root = recomputed(&mut tree);

        for (index, label, value) in bindings.iter() {
            let proof = tree.get(index).unwrap();
            assert_eq!(ProofType::Inclusion, proof.proof_type());
            assert_eq!(Ok(()), proof.verify(label, Some(value), &root));
        }
        // and indices never inserted still prove absence
        for _ in 0..8 {
            let lookup = Index::random(&mut rng);
            let proof = tree.get(&lookup).unwrap();
            assert_eq!(ProofType::Absence, proof.proof_type());
            assert_eq!(Ok(()), proof.verify(&"nobody".into(), None, &root));
        }
    }
}
