// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! The persistent authenticated dictionary: the directory's epoch-indexed
//! chain of signed tree snapshots.
//!
//! Writes accumulate on a mutable pending tree that descends, copy on
//! write, from the last sealed snapshot. [Pad::update] seals the pending
//! tree into the next epoch: it recomputes the root, signs a
//! [SignedTreeRoot] chained onto the previous epoch's, and retains the
//! `(root, tree)` snapshot for the most recent `retention` epochs. Sealed
//! snapshots are immutable, so lookups against any retained epoch are
//! unaffected by concurrent progress of the pending tree.
//!
//! The PAD is a single-writer, multi-reader object: `insert`, `change_key`,
//! and `update` must be serialized by the caller, while lookups and root
//! accessors only need shared access.

use crate::errors::PadError;
use crate::merkle_tree::MerkleTree;

use coniks_core::policies::Policies;
use coniks_core::sign::PrivateKey;
use coniks_core::vrf::VrfEvaluator;
use coniks_core::{AuthPath, ConiksLabel, ConiksValue, SignedTreeRoot};

use log::{debug, info};
use rand::rngs::OsRng;
use std::collections::VecDeque;
use std::sync::Arc;

/// One sealed epoch: its signed tree root and the tree it commits to
#[derive(Debug, Clone)]
struct Snapshot {
    str: Arc<SignedTreeRoot>,
    tree: MerkleTree,
}

/// A persistent authenticated dictionary over a sparse Merkle prefix tree
#[derive(Debug)]
pub struct Pad<V> {
    vrf: V,
    signer: PrivateKey,
    policies: Policies,
    retention: usize,
    current_epoch: u64,
    /// The head of the signed-root chain, kept outside the bounded
    /// snapshot list so it survives any eviction policy
    latest: Arc<SignedTreeRoot>,
    snapshots: VecDeque<Snapshot>,
    pending: MerkleTree,
}

impl<V: VrfEvaluator> Pad<V> {
    /// Create a directory, sealing epoch 0 over the empty tree immediately
    /// so that clients have a chain anchor before any binding exists.
    ///
    /// `retention` is the number of most recent epochs whose snapshots stay
    /// resident (at least one is always kept).
    pub fn new(vrf: V, signer: PrivateKey, policies: Policies, retention: usize) -> Self {
        let retention = retention.max(1);
        let mut tree = MerkleTree::new(&mut OsRng);
        let tree_hash = tree.recompute_root_hash();
        let str = Arc::new(SignedTreeRoot::sign(
            &signer,
            None,
            0,
            tree_hash,
            policies.serialize(),
        ));
        info!(
            "directory initialized at epoch 0, root {}",
            hex::encode(tree_hash)
        );
        let pending = tree.clone();
        let mut snapshots = VecDeque::with_capacity(retention);
        snapshots.push_back(Snapshot {
            str: Arc::clone(&str),
            tree,
        });
        Self {
            vrf,
            signer,
            policies,
            retention,
            current_epoch: 0,
            latest: str,
            snapshots,
            pending,
        }
    }

    /// The most recently sealed epoch
    pub fn current_epoch(&self) -> u64 {
        self.current_epoch
    }

    /// The policies this directory advertises
    pub fn policies(&self) -> &Policies {
        &self.policies
    }

    /// Register a new binding on the pending tree. Registration is
    /// insert-only: a username whose index is already bound is rejected
    /// with [PadError::NameExisted]; key rotation goes through
    /// [Pad::change_key] instead. The binding becomes visible to lookups
    /// once the next [Pad::update] seals it.
    pub fn insert(&mut self, label: ConiksLabel, value: ConiksValue) -> Result<(), PadError> {
        let index = self.vrf.compute(&label);
        if self.pending.binding_at(&index).is_some() {
            return Err(PadError::NameExisted(
                String::from_utf8_lossy(&label).into_owned(),
            ));
        }
        debug!("registering binding at index {index}");
        self.pending.set(&mut OsRng, index, label, value);
        Ok(())
    }

    /// Replace the key bound to an existing username, re-committing the
    /// binding under a fresh salt. Fails with [PadError::NameNotFound] if
    /// the username is not bound in the pending tree.
    pub fn change_key(&mut self, label: ConiksLabel, value: ConiksValue) -> Result<(), PadError> {
        let index = self.vrf.compute(&label);
        if self.pending.binding_at(&index).is_none() {
            return Err(PadError::NameNotFound(
                String::from_utf8_lossy(&label).into_owned(),
            ));
        }
        debug!("changing key at index {index}");
        self.pending.set(&mut OsRng, index, label, value);
        Ok(())
    }

    /// Seal the pending tree as the next epoch.
    ///
    /// The pending tree's hashes are recomputed, a signed tree root is
    /// chained onto the latest one, the `(root, tree)` snapshot is
    /// retained, snapshots older than the retention window are dropped, and
    /// a fresh copy-on-write pending tree is split off the sealed one.
    pub fn update(&mut self) -> Arc<SignedTreeRoot> {
        let tree_hash = self.pending.recompute_root_hash();
        let next_epoch = self.current_epoch + 1;
        let str = Arc::new(SignedTreeRoot::sign(
            &self.signer,
            Some(self.latest.as_ref()),
            next_epoch,
            tree_hash,
            self.policies.serialize(),
        ));

        let sealed = self.pending.clone();
        self.snapshots.push_back(Snapshot {
            str: Arc::clone(&str),
            tree: sealed,
        });
        while self.snapshots.len() > self.retention {
            self.snapshots.pop_front();
        }
        self.latest = Arc::clone(&str);
        self.current_epoch = next_epoch;
        info!(
            "sealed epoch {}, root {}",
            next_epoch,
            hex::encode(tree_hash)
        );
        str
    }

    /// Look up a username in the latest sealed epoch
    pub fn lookup(&self, label: &ConiksLabel) -> Result<(AuthPath, Arc<SignedTreeRoot>), PadError> {
        self.lookup_at(label, self.current_epoch)
    }

    /// Look up a username in a specific epoch. Fails with
    /// [PadError::EpochNotFound] once the epoch's snapshot has been
    /// evicted. Whether the result proves inclusion or absence is conveyed
    /// by the returned path, not by an error.
    pub fn lookup_at(
        &self,
        label: &ConiksLabel,
        epoch: u64,
    ) -> Result<(AuthPath, Arc<SignedTreeRoot>), PadError> {
        let snapshot = self
            .snapshot_at(epoch)
            .ok_or(PadError::EpochNotFound(epoch))?;
        let index = self.vrf.compute(label);
        let path = snapshot.tree.get(&index)?;
        Ok((path, Arc::clone(&snapshot.str)))
    }

    /// The signed tree root of the latest sealed epoch
    pub fn latest_str(&self) -> Arc<SignedTreeRoot> {
        Arc::clone(&self.latest)
    }

    /// The signed tree root of a specific epoch, if still retained
    pub fn get_str(&self, epoch: u64) -> Option<Arc<SignedTreeRoot>> {
        self.snapshot_at(epoch)
            .map(|snapshot| Arc::clone(&snapshot.str))
    }

    fn snapshot_at(&self, epoch: u64) -> Option<&Snapshot> {
        self.snapshots
            .iter()
            .find(|snapshot| snapshot.str.epoch == epoch)
    }
}
