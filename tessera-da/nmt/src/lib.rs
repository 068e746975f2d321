pub mod hash;
pub mod namespace;
pub mod proof;
pub mod tree;
pub mod visitor;

// crates
use thiserror::Error;
// internal
pub use hash::{
    NamespacedHash, DecodedNode, HASH_SIZE, LEAF_PREFIX, NAMESPACED_HASH_SIZE, NODE_PREFIX,
};
pub use namespace::{Namespace, NS_SIZE};
pub use proof::{NamespaceProof, Proof, ProofError};
pub use tree::{split_point, NamespaceMerkleTree};
pub use visitor::{CommitError, NodeVisitor, NoopVisitor};

#[derive(Debug, Error)]
pub enum NmtError {
    #[error("namespace {next} pushed after {prev} at leaf {index}")]
    OrderingViolation {
        index: usize,
        prev: Namespace,
        next: Namespace,
    },
    #[error("leaf {index} out of range for tree of {len} leaves")]
    LeafOutOfRange { index: usize, len: usize },
    #[error("tree is sealed once its root is computed")]
    Sealed,
    #[error(transparent)]
    Commit(#[from] CommitError),
    #[error("namespace must be {NS_SIZE} bytes, got {0}")]
    InvalidNamespaceSize(usize),
    #[error("namespaced hash must be {NAMESPACED_HASH_SIZE} bytes, got {0}")]
    InvalidHashSize(usize),
    #[error("min namespace exceeds max in encoded hash")]
    InvalidHashRange,
    #[error("malformed node bytes")]
    MalformedNode,
}
