// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Errors for the directory's data structure operations.

use coniks_core::VerificationError;
use core::fmt;

/// Errors thrown by the Merkle prefix tree
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeError {
    /// An authentication path was requested from a tree whose hashes have
    /// not been recomputed since the last mutation
    StaleRoot,
}

impl fmt::Display for TreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StaleRoot => {
                write!(f, "the tree root must be recomputed before proofs are served")
            }
        }
    }
}

/// The errors thrown by the operations of [crate::pad::Pad]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PadError {
    /// Tried to register a username that is already bound
    NameExisted(String),
    /// Tried to change the key of a username that is not bound
    NameNotFound(String),
    /// Looked up an epoch whose snapshot has been evicted (or never existed)
    EpochNotFound(u64),
    /// Error propagation
    Tree(TreeError),
    /// Error propagation
    Verification(VerificationError),
}

impl From<TreeError> for PadError {
    fn from(error: TreeError) -> Self {
        Self::Tree(error)
    }
}

impl From<VerificationError> for PadError {
    fn from(error: VerificationError) -> Self {
        Self::Verification(error)
    }
}

impl fmt::Display for PadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NameExisted(name) => {
                write!(f, "the name {} is already registered", name)
            }
            Self::NameNotFound(name) => {
                write!(f, "the name {} is not registered", name)
            }
            Self::EpochNotFound(epoch) => {
                write!(f, "no snapshot is retained for epoch {}", epoch)
            }
            Self::Tree(err) => {
                write!(f, "{}", err)
            }
            Self::Verification(err) => {
                write!(f, "{}", err)
            }
        }
    }
}
