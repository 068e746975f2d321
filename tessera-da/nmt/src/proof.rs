// std
use std::slice;
// crates
use serde::{Deserialize, Serialize};
use thiserror::Error;
// internal
use crate::hash::{hash_leaf, hash_nodes, NamespacedHash};
use crate::namespace::{Namespace, NS_SIZE};
use crate::tree::split_point;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProofError {
    #[error("recomputed root does not match the committed root")]
    RootMismatch,
    #[error("proof omits part of the namespace range")]
    IncompleteRange,
    #[error("leaf namespace does not match the queried namespace")]
    NamespaceMismatch,
    #[error("proof is missing sibling hashes")]
    MissingSiblings,
    #[error("proof carries more sibling hashes than the tree shape admits")]
    ExtraSiblings,
    #[error("expected {want} leaves in the proven range, got {got}")]
    LeafCountMismatch { got: usize, want: usize },
    #[error("malformed proof: {0}")]
    MalformedProof(&'static str),
}

/// Merkle range proof: the in-range leaves are supplied by the verifier,
/// `siblings` are the roots of the maximal subtrees outside `[start, end)`
/// in left-to-right order.
///
/// Verification replays the same power-of-two split the tree was built with,
/// which requires the leaf count of the committed tree; every verifying
/// context here knows it from the square width in the availability header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Proof {
    pub start: usize,
    pub end: usize,
    pub siblings: Vec<NamespacedHash>,
}

impl Proof {
    pub fn is_empty(&self) -> bool {
        self.start >= self.end && self.siblings.is_empty()
    }

    /// Verify that `leaf_hashes` occupy `[start, end)` of the `tree_size`
    /// leaf tree committed to by `root`.
    pub fn verify_range(
        &self,
        root: &NamespacedHash,
        leaf_hashes: &[NamespacedHash],
        tree_size: usize,
    ) -> Result<(), ProofError> {
        self.verify_leaf_hashes(root, leaf_hashes, None, tree_size)
    }

    /// Single-leaf convenience over the range form. `namespace` is the
    /// namespace the leaf was committed under (the parity sentinel for
    /// parity leaves), `data` the raw leaf bytes.
    pub fn verify_inclusion(
        &self,
        root: &NamespacedHash,
        namespace: Namespace,
        data: &[u8],
        tree_size: usize,
    ) -> Result<(), ProofError> {
        if self.end != self.start + 1 {
            return Err(ProofError::MalformedProof("inclusion proof must cover one leaf"));
        }
        self.verify_leaf_hashes(root, &[hash_leaf(namespace, data)], None, tree_size)
    }

    fn verify_leaf_hashes(
        &self,
        root: &NamespacedHash,
        leaf_hashes: &[NamespacedHash],
        completeness: Option<Namespace>,
        tree_size: usize,
    ) -> Result<(), ProofError> {
        if self.start > self.end || self.end > tree_size {
            return Err(ProofError::MalformedProof("proof range exceeds tree"));
        }
        if leaf_hashes.len() != self.end - self.start {
            return Err(ProofError::LeafCountMismatch {
                got: leaf_hashes.len(),
                want: self.end - self.start,
            });
        }
        if leaf_hashes.is_empty() {
            return Err(ProofError::MalformedProof("empty leaf range"));
        }
        let mut siblings = self.siblings.iter();
        let mut leaves = leaf_hashes.iter();
        let computed =
            self.compute_subtree(0, tree_size, &mut siblings, &mut leaves, completeness)?;
        if siblings.next().is_some() {
            return Err(ProofError::ExtraSiblings);
        }
        if computed != *root {
            return Err(ProofError::RootMismatch);
        }
        Ok(())
    }

    fn compute_subtree(
        &self,
        a: usize,
        b: usize,
        siblings: &mut slice::Iter<'_, NamespacedHash>,
        leaves: &mut slice::Iter<'_, NamespacedHash>,
        completeness: Option<Namespace>,
    ) -> Result<NamespacedHash, ProofError> {
        if b <= self.start || a >= self.end {
            let sibling = siblings.next().ok_or(ProofError::MissingSiblings)?;
            if let Some(namespace) = completeness {
                // everything left of the range must sort below the queried
                // namespace, everything right of it above
                if b <= self.start && sibling.max_namespace() >= namespace {
                    return Err(ProofError::IncompleteRange);
                }
                if a >= self.end && sibling.min_namespace() <= namespace {
                    return Err(ProofError::IncompleteRange);
                }
            }
            return Ok(*sibling);
        }
        if b - a == 1 {
            return leaves
                .next()
                .copied()
                .ok_or(ProofError::MalformedProof("leaf underflow"));
        }
        let mid = a + split_point(b - a);
        let left = self.compute_subtree(a, mid, siblings, leaves, completeness)?;
        let right = self.compute_subtree(mid, b, siblings, leaves, completeness)?;
        Ok(hash_nodes(&left, &right))
    }
}

/// Proof that a set of leaves is everything a tree commits under one
/// namespace. Presence proofs cover the contiguous run of matching leaves;
/// absence proofs pin the leaf that would follow the namespace, showing the
/// gap; an empty presence proof claims the namespace lies outside the root's
/// committed range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NamespaceProof {
    Presence { proof: Proof },
    Absence { proof: Proof, leaf: NamespacedHash },
}

impl NamespaceProof {
    pub fn is_of_absence(&self) -> bool {
        matches!(self, Self::Absence { .. })
    }

    /// Verify that `raw_leaves` are exactly the leaves committed under
    /// `namespace` by the `tree_size` leaf tree behind `root`. Raw leaves
    /// are namespace-prefixed byte strings and every prefix must equal the
    /// queried namespace.
    pub fn verify_complete_namespace<L: AsRef<[u8]>>(
        &self,
        root: &NamespacedHash,
        namespace: Namespace,
        raw_leaves: &[L],
        tree_size: usize,
    ) -> Result<(), ProofError> {
        match self {
            Self::Presence { proof } if proof.is_empty() => {
                if !raw_leaves.is_empty() {
                    return Err(ProofError::MalformedProof("leaves with an empty proof"));
                }
                if root.contains(namespace) {
                    return Err(ProofError::IncompleteRange);
                }
                Ok(())
            }
            Self::Presence { proof } => {
                let mut leaf_hashes = Vec::with_capacity(raw_leaves.len());
                for raw in raw_leaves {
                    let raw = raw.as_ref();
                    if raw.len() < NS_SIZE || namespace.as_ref() != &raw[..NS_SIZE] {
                        return Err(ProofError::NamespaceMismatch);
                    }
                    leaf_hashes.push(hash_leaf(namespace, raw));
                }
                proof.verify_leaf_hashes(root, &leaf_hashes, Some(namespace), tree_size)
            }
            Self::Absence { proof, leaf } => {
                if !raw_leaves.is_empty() {
                    return Err(ProofError::MalformedProof("absence proof carries leaves"));
                }
                if !root.contains(namespace) {
                    return Err(ProofError::MalformedProof(
                        "absence claimed for a namespace outside the root range",
                    ));
                }
                if leaf.min_namespace() <= namespace {
                    return Err(ProofError::NamespaceMismatch);
                }
                if proof.end != proof.start + 1 {
                    return Err(ProofError::MalformedProof("absence proof must cover one leaf"));
                }
                proof.verify_leaf_hashes(root, &[*leaf], Some(namespace), tree_size)
            }
        }
    }
}
