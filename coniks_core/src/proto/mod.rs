// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Canonical wire encodings and the stable error codes exchanged between a
//! directory and its clients.
//!
//! The encodings are deterministic concatenations with big-endian length
//! prefixes wherever a field is variable length. They are part of the
//! protocol surface: the hash chain between signed tree roots is computed
//! over exactly these bytes, so the layouts must never change silently.
//!
//! Decoding is the untrusted boundary. Every decoder here consumes its
//! whole input and reports [VerificationError::MalformedDirectoryMessage]
//! for anything it cannot parse, without panicking on hostile input.

use crate::commitment::{Commitment, SALT_BYTES};
use crate::hash::{try_parse_digest, Digest, DIGEST_BYTES, NONCE_BYTES};
use crate::sign::SIGNATURE_BYTES;
use crate::signed_tree_root::SignedTreeRoot;
use crate::types::{AuthPath, ConiksLabel, ConiksValue, Index, ProofNode, INDEX_BYTES};
use crate::verify::VerificationError;


// Leaf-variant tags in serialized authentication paths.
const USER_LEAF_TAG: u8 = b'U';
const EMPTY_LEAF_TAG: u8 = b'E';

// ============================================
// Error codes
// ============================================

/// The stable error codes a directory and its clients exchange. The
/// numeric values are part of the wire protocol.
///
/// [ErrorCode::NameNotFound] doubles as the code for a well-formed proof of
/// absence; it does not indicate a protocol failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum ErrorCode {
    /// The request succeeded
    Success = 0,
    /// Registration failed because the username is already bound
    NameExisted = 1,
    /// The username is not bound (or the queried epoch is gone)
    NameNotFound = 2,
    /// The directory could not decode the client's request
    MalformedClientMessage = 3,
    /// The client could not decode the directory's response
    MalformedDirectoryMessage = 4,
    /// A proof's binding disagrees with the client's
    BindingsDiffer = 5,
    /// A proof's commitment did not re-derive
    UnverifiableCommitment = 6,
    /// An absence proof's indices disagree on the leaf's prefix
    IndicesMismatch = 7,
    /// A proof's reconstructed root disagrees with the signed tree root
    UnequalTreeHashes = 8,
    /// A signed tree root failed signature or chain verification
    BadStr = 9,
}

impl ErrorCode {
    /// Decode a wire error code
    pub fn from_u8(code: u8) -> Option<Self> {
        match code {
            0 => Some(Self::Success),
            1 => Some(Self::NameExisted),
            2 => Some(Self::NameNotFound),
            3 => Some(Self::MalformedClientMessage),
            4 => Some(Self::MalformedDirectoryMessage),
            5 => Some(Self::BindingsDiffer),
            6 => Some(Self::UnverifiableCommitment),
            7 => Some(Self::IndicesMismatch),
            8 => Some(Self::UnequalTreeHashes),
            9 => Some(Self::BadStr),
            _ => None,
        }
    }
}

impl From<&VerificationError> for ErrorCode {
    fn from(error: &VerificationError) -> Self {
        match error {
            VerificationError::BindingsDiffer => Self::BindingsDiffer,
            VerificationError::UnverifiableCommitment => Self::UnverifiableCommitment,
            VerificationError::IndicesMismatch => Self::IndicesMismatch,
            VerificationError::UnequalTreeHashes => Self::UnequalTreeHashes,
            VerificationError::BadStr => Self::BadStr,
            VerificationError::MalformedDirectoryMessage => Self::MalformedDirectoryMessage,
            VerificationError::MalformedClientMessage => Self::MalformedClientMessage,
        }
    }
}

// ============================================
// Reader
// ============================================

/// A bounds-checked cursor over untrusted wire bytes
pub(crate) struct Reader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> Reader<'a> {
    pub(crate) fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8], VerificationError> {
        let end = self
            .pos
            .checked_add(n)
            .ok_or(VerificationError::MalformedDirectoryMessage)?;
        if end > self.buf.len() {
            return Err(VerificationError::MalformedDirectoryMessage);
        }
        let out = &self.buf[self.pos..end];
        self.pos = end;
        Ok(out)
    }

    fn read_u8(&mut self) -> Result<u8, VerificationError> {
        Ok(self.take(1)?[0])
    }

    fn read_u32(&mut self) -> Result<u32, VerificationError> {
        let bytes = self.take(4)?;
        let mut arr = [0u8; 4];
        arr.copy_from_slice(bytes);
        Ok(u32::from_be_bytes(arr))
    }

    pub(crate) fn read_u64(&mut self) -> Result<u64, VerificationError> {
        let bytes = self.take(8)?;
        let mut arr = [0u8; 8];
        arr.copy_from_slice(bytes);
        Ok(u64::from_be_bytes(arr))
    }

    pub(crate) fn read_len_prefixed(&mut self) -> Result<&'a [u8], VerificationError> {
        let len = self.read_u32()? as usize;
        self.take(len)
    }

    fn read_digest(&mut self) -> Result<Digest, VerificationError> {
        let bytes = self.take(DIGEST_BYTES)?;
        try_parse_digest(bytes).map_err(|_| VerificationError::MalformedDirectoryMessage)
    }

    fn read_index(&mut self) -> Result<Index, VerificationError> {
        let bytes = self.take(INDEX_BYTES)?;
        Index::try_from(bytes).map_err(|_| VerificationError::MalformedDirectoryMessage)
    }

    /// Reject trailing garbage
    pub(crate) fn finish(&self) -> Result<(), VerificationError> {
        if self.pos == self.buf.len() {
            Ok(())
        } else {
            Err(VerificationError::MalformedDirectoryMessage)
        }
    }
}

fn write_len_prefixed(out: &mut Vec<u8>, bytes: &[u8]) {
    out.extend_from_slice(&(bytes.len() as u32).to_be_bytes());
    out.extend_from_slice(bytes);
}

// ============================================
// Authentication paths
// ============================================

/// Encode an authentication path:
/// `lookupIndex || nonce || tag || be32(level) || leaf.index ||
/// [salt || commitValue || len-prefixed username || len-prefixed key] ||
/// be32(nSiblings) || siblings...`
///
/// The `'U'` block is present iff the reached leaf was occupied. Masked
/// username/key fields (proofs of absence over a user leaf) encode as zero
/// length.
pub fn encode_auth_path(path: &AuthPath) -> Vec<u8> {
    let mut out = Vec::new();
    out.extend_from_slice(path.lookup_index.as_bytes());
    out.extend_from_slice(&path.tree_nonce);
    match &path.leaf.commitment {
        Some(commitment) => {
            out.push(USER_LEAF_TAG);
            out.extend_from_slice(&path.leaf.level.to_be_bytes());
            out.extend_from_slice(path.leaf.index.as_bytes());
            out.extend_from_slice(&commitment.salt);
            out.extend_from_slice(&commitment.value);
            let label = path.leaf.label.as_ref().map(|l| l.as_slice()).unwrap_or(&[]);
            write_len_prefixed(&mut out, label);
            let value = path.leaf.value.as_ref().map(|v| v.as_slice()).unwrap_or(&[]);
            write_len_prefixed(&mut out, value);
        }
        None => {
            out.push(EMPTY_LEAF_TAG);
            out.extend_from_slice(&path.leaf.level.to_be_bytes());
            out.extend_from_slice(path.leaf.index.as_bytes());
        }
    }
    out.extend_from_slice(&(path.siblings.len() as u32).to_be_bytes());
    for sibling in &path.siblings {
        out.extend_from_slice(sibling);
    }
    out
}

/// Decode an authentication path, the inverse of [encode_auth_path]
pub fn decode_auth_path(bytes: &[u8]) -> Result<AuthPath, VerificationError> {
    let mut reader = Reader::new(bytes);
    let lookup_index = reader.read_index()?;
    let mut tree_nonce = [0u8; NONCE_BYTES];
    tree_nonce.copy_from_slice(reader.take(NONCE_BYTES)?);

    let leaf = match reader.read_u8()? {
        tag if tag == USER_LEAF_TAG => {
            let level = reader.read_u32()?;
            let index = reader.read_index()?;
            let mut salt = [0u8; SALT_BYTES];
            salt.copy_from_slice(reader.take(SALT_BYTES)?);
            let commit_value = reader.read_digest()?;
            let label_bytes = reader.read_len_prefixed()?;
            let value_bytes = reader.read_len_prefixed()?;
            ProofNode {
                index,
                level,
                commitment: Some(Commitment {
                    salt,
                    value: commit_value,
                }),
                label: if label_bytes.is_empty() {
                    None
                } else {
                    Some(ConiksLabel(label_bytes.to_vec()))
                },
                value: if value_bytes.is_empty() {
                    None
                } else {
                    Some(ConiksValue(value_bytes.to_vec()))
                },
            }
        }
        tag if tag == EMPTY_LEAF_TAG => {
            let level = reader.read_u32()?;
            let index = reader.read_index()?;
            ProofNode {
                index,
                level,
                commitment: None,
                label: None,
                value: None,
            }
        }
        _ => return Err(VerificationError::MalformedDirectoryMessage),
    };

    let sibling_count = reader.read_u32()? as usize;
    // A valid path never has more siblings than the tree is deep.
    if sibling_count > 8 * INDEX_BYTES {
        return Err(VerificationError::MalformedDirectoryMessage);
    }
    let mut siblings = Vec::with_capacity(sibling_count);
    for _ in 0..sibling_count {
        siblings.push(reader.read_digest()?);
    }
    reader.finish()?;

    Ok(AuthPath {
        lookup_index,
        tree_nonce,
        leaf,
        siblings,
    })
}

// ============================================
// Signed tree roots
// ============================================

/// Decode a signed tree root, the inverse of [SignedTreeRoot::serialize]
pub fn decode_signed_tree_root(bytes: &[u8]) -> Result<SignedTreeRoot, VerificationError> {
    let mut reader = Reader::new(bytes);
    let epoch = reader.read_u64()?;
    let previous_epoch = reader.read_u64()?;
    let previous_str_hash = reader.read_len_prefixed()?;
    let previous_str_hash = try_parse_digest(previous_str_hash)
        .map_err(|_| VerificationError::MalformedDirectoryMessage)?;
    let tree_hash = reader.read_len_prefixed()?;
    let tree_hash =
        try_parse_digest(tree_hash).map_err(|_| VerificationError::MalformedDirectoryMessage)?;
    let policies = reader.read_len_prefixed()?.to_vec();
    let signature = reader.read_len_prefixed()?.to_vec();
    if signature.len() != SIGNATURE_BYTES {
        return Err(VerificationError::MalformedDirectoryMessage);
    }
    reader.finish()?;

    Ok(SignedTreeRoot {
        epoch,
        previous_epoch,
        tree_hash,
        previous_str_hash,
        policies,
        signature,
    })
}
