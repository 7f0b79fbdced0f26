// Copyright (c) Meta Platforms, Inc. and affiliates.
//
// This source code is licensed under both the MIT license found in the
// LICENSE-MIT file in the root directory of this source tree and the Apache
// License, Version 2.0 found in the LICENSE-APACHE file in the root directory
// of this source tree.

//! Signed tree roots: the directory's per-epoch commitment.
//!
//! Each epoch the directory signs the tree's root hash together with the
//! epoch number and the hash of the previous signed tree root, forming an
//! append-only chain. A client that checks the chain links and the
//! signatures can detect any attempt to rewrite history or to show
//! different views to different clients.

use crate::hash::{self, Digest, EMPTY_DIGEST};
use crate::sign;
#[cfg(feature = "serde_serialization")]
use crate::utils::serde_helpers::{bytes_deserialize_hex, bytes_serialize_hex};
use crate::verify::VerificationError;

use subtle::ConstantTimeEq;

/// A signed snapshot of the directory at one epoch
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(
    feature = "serde_serialization",
    derive(serde::Serialize, serde::Deserialize)
)]
pub struct SignedTreeRoot {
    /// The epoch this root was sealed at; monotonic, starting at 0
    pub epoch: u64,
    /// The epoch of the previous root in the chain (0 for the first root)
    pub previous_epoch: u64,
    /// The tree's root hash after applying the epoch's updates
    #[cfg_attr(
        feature = "serde_serialization",
        serde(serialize_with = "bytes_serialize_hex")
    )]
    #[cfg_attr(
        feature = "serde_serialization",
        serde(deserialize_with = "bytes_deserialize_hex")
    )]
    pub tree_hash: Digest,
    /// The hash of the previous root's serialization; all zero for epoch 0
    #[cfg_attr(
        feature = "serde_serialization",
        serde(serialize_with = "bytes_serialize_hex")
    )]
    #[cfg_attr(
        feature = "serde_serialization",
        serde(deserialize_with = "bytes_deserialize_hex")
    )]
    pub previous_str_hash: Digest,
    /// The serialized directory policies in force at this epoch
    #[cfg_attr(
        feature = "serde_serialization",
        serde(serialize_with = "bytes_serialize_hex")
    )]
    #[cfg_attr(
        feature = "serde_serialization",
        serde(deserialize_with = "bytes_deserialize_hex")
    )]
    pub policies: Vec<u8>,
    /// The directory's signature over the chained fields
    #[cfg_attr(
        feature = "serde_serialization",
        serde(serialize_with = "bytes_serialize_hex")
    )]
    #[cfg_attr(
        feature = "serde_serialization",
        serde(deserialize_with = "bytes_deserialize_hex")
    )]
    pub signature: Vec<u8>,
}

impl SignedTreeRoot {
    /// Build and sign the root for `epoch`, chaining it onto `previous`
    /// (absent only for epoch 0).
    pub fn sign(
        signer: &sign::PrivateKey,
        previous: Option<&SignedTreeRoot>,
        epoch: u64,
        tree_hash: Digest,
        policies: Vec<u8>,
    ) -> Self {
        let previous_epoch = previous.map(|prev| prev.epoch).unwrap_or(0);
        let previous_str_hash = previous
            .map(|prev| hash::hash(&prev.serialize()))
            .unwrap_or(EMPTY_DIGEST);
        let signature = signer.sign(&signing_payload(
            &previous_str_hash,
            &tree_hash,
            epoch,
            previous_epoch,
            &policies,
        ));
        SignedTreeRoot {
            epoch,
            previous_epoch,
            tree_hash,
            previous_str_hash,
            policies,
            signature,
        }
    }

    /// The canonical, deterministic serialization of this root. This is the
    /// byte string whose hash chains epochs together.
    pub fn serialize(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(
            8 + 8 + 4 * 4 + self.previous_str_hash.len()
                + self.tree_hash.len()
                + self.policies.len()
                + self.signature.len(),
        );
        out.extend_from_slice(&self.epoch.to_be_bytes());
        out.extend_from_slice(&self.previous_epoch.to_be_bytes());
        out.extend_from_slice(&(self.previous_str_hash.len() as u32).to_be_bytes());
        out.extend_from_slice(&self.previous_str_hash);
        out.extend_from_slice(&(self.tree_hash.len() as u32).to_be_bytes());
        out.extend_from_slice(&self.tree_hash);
        out.extend_from_slice(&(self.policies.len() as u32).to_be_bytes());
        out.extend_from_slice(&self.policies);
        out.extend_from_slice(&(self.signature.len() as u32).to_be_bytes());
        out.extend_from_slice(&self.signature);
        out
    }

    /// Check the directory's signature over this root
    pub fn verify_signature(&self, key: &sign::PublicKey) -> Result<(), VerificationError> {
        let payload = signing_payload(
            &self.previous_str_hash,
            &self.tree_hash,
            self.epoch,
            self.previous_epoch,
            &self.policies,
        );
        if key.verify(&payload, &self.signature) {
            Ok(())
        } else {
            Err(VerificationError::BadStr)
        }
    }

    /// Check that this root directly extends `previous`: consecutive
    /// epochs and an intact hash link
    pub fn verify_chain(&self, previous: &SignedTreeRoot) -> Result<(), VerificationError> {
        let expected = hash::hash(&previous.serialize());
        let linked: bool = self.previous_str_hash[..].ct_eq(&expected[..]).into();
        if linked && self.previous_epoch == previous.epoch && self.epoch == previous.epoch + 1 {
            Ok(())
        } else {
            Err(VerificationError::BadStr)
        }
    }
}

// The byte string the directory signs:
// prevStrHash || treeHash || be64(epoch) || be64(prevEpoch) || policies
fn signing_payload(
    previous_str_hash: &Digest,
    tree_hash: &Digest,
    epoch: u64,
    previous_epoch: u64,
    policies: &[u8],
) -> Vec<u8> {
    let mut out = Vec::with_capacity(previous_str_hash.len() + tree_hash.len() + 16 + policies.len());
    out.extend_from_slice(previous_str_hash);
    out.extend_from_slice(tree_hash);
    out.extend_from_slice(&epoch.to_be_bytes());
    out.extend_from_slice(&previous_epoch.to_be_bytes());
    out.extend_from_slice(policies);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn signer() -> sign::PrivateKey {
        let mut rng = StdRng::seed_from_u64(99);
        sign::PrivateKey::generate(&mut rng)
    }

    #[test]
    fn test_sign_and_verify_signature() {
        let signer = signer();
        let root = SignedTreeRoot::sign(&signer, None, 0, [1u8; 32], b"policies".to_vec());
        assert_eq!(0, root.epoch);
        assert_eq!(0, root.previous_epoch);
        assert_eq!(EMPTY_DIGEST, root.previous_str_hash);
        assert_eq!(Ok(()), root.verify_signature(&signer.public()));
    }

    #[test]
    fn test_tampered_root_fails_verification() {
        let signer = signer();
        let mut root = SignedTreeRoot::sign(&signer, None, 0, [1u8; 32], b"policies".to_vec());
        root.tree_hash[0] ^= 1;
        assert_eq!(
            Err(VerificationError::BadStr),
            root.verify_signature(&signer.public())
        );
    }

    #[test]
    fn test_chain_links() {
        let signer = signer();
        let genesis = SignedTreeRoot::sign(&signer, None, 0, [1u8; 32], b"p".to_vec());
        let next = SignedTreeRoot::sign(&signer, Some(&genesis), 1, [2u8; 32], b"p".to_vec());
        assert_eq!(
            hash::hash(&genesis.serialize()),
            next.previous_str_hash
        );
        assert_eq!(Ok(()), next.verify_chain(&genesis));
        // a root cannot chain onto itself
        assert_eq!(Err(VerificationError::BadStr), next.verify_chain(&next));
    }

    #[test]
    fn test_chain_detects_rewritten_history() {
        let signer = signer();
        let genesis = SignedTreeRoot::sign(&signer, None, 0, [1u8; 32], b"p".to_vec());
        let next = SignedTreeRoot::sign(&signer, Some(&genesis), 1, [2u8; 32], b"p".to_vec());
        let mut rewritten = genesis.clone();
        rewritten.tree_hash = [9u8; 32];
        assert_eq!(Err(VerificationError::BadStr), next.verify_chain(&rewritten));
    }

    #[test]
    fn test_serialization_is_length_prefixed() {
        let signer = signer();
        let root = SignedTreeRoot::sign(&signer, None, 7, [1u8; 32], b"abc".to_vec());
        let bytes = root.serialize();
        assert_eq!(7u64.to_be_bytes(), bytes[..8]);
        // policies length prefix sits after both digests
        let policies_len_at = 8 + 8 + 4 + 32 + 4 + 32;
        assert_eq!(
            3u32.to_be_bytes(),
            bytes[policies_len_at..policies_len_at + 4]
        );
    }
}
