// std
use std::fmt;
use std::sync::Arc;
// crates
use thiserror::Error;
// internal
use crate::hash::NamespacedHash;
use crate::namespace::Namespace;

/// Failure raised by a visitor while recording nodes; it aborts the
/// commitment so nothing half-persisted is ever served.
#[derive(Debug, Error)]
#[error("commit failed: {0}")]
pub struct CommitError(String);

impl CommitError {
    pub fn new(err: impl fmt::Display) -> Self {
        Self(err.to_string())
    }
}

/// Observes every node of a tree while its root is being computed, children
/// before parents. A store recording each visited node can later serve any
/// node of the tree by digest.
pub trait NodeVisitor {
    fn visit_leaf(
        &self,
        hash: &NamespacedHash,
        namespace: Namespace,
        data: &[u8],
    ) -> Result<(), CommitError>;

    fn visit_inner(
        &self,
        hash: &NamespacedHash,
        left: &NamespacedHash,
        right: &NamespacedHash,
    ) -> Result<(), CommitError>;
}

/// Visitor that records nothing.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopVisitor;

impl NodeVisitor for NoopVisitor {
    fn visit_leaf(&self, _: &NamespacedHash, _: Namespace, _: &[u8]) -> Result<(), CommitError> {
        Ok(())
    }

    fn visit_inner(
        &self,
        _: &NamespacedHash,
        _: &NamespacedHash,
        _: &NamespacedHash,
    ) -> Result<(), CommitError> {
        Ok(())
    }
}

impl<V: NodeVisitor + ?Sized> NodeVisitor for &V {
    fn visit_leaf(
        &self,
        hash: &NamespacedHash,
        namespace: Namespace,
        data: &[u8],
    ) -> Result<(), CommitError> {
        (**self).visit_leaf(hash, namespace, data)
    }

    fn visit_inner(
        &self,
        hash: &NamespacedHash,
        left: &NamespacedHash,
        right: &NamespacedHash,
    ) -> Result<(), CommitError> {
        (**self).visit_inner(hash, left, right)
    }
}

impl<V: NodeVisitor + ?Sized> NodeVisitor for Arc<V> {
    fn visit_leaf(
        &self,
        hash: &NamespacedHash,
        namespace: Namespace,
        data: &[u8],
    ) -> Result<(), CommitError> {
        (**self).visit_leaf(hash, namespace, data)
    }

    fn visit_inner(
        &self,
        hash: &NamespacedHash,
        left: &NamespacedHash,
        right: &NamespacedHash,
    ) -> Result<(), CommitError> {
        (**self).visit_inner(hash, left, right)
    }
}
