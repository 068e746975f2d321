// std
use std::collections::HashMap;
use std::sync::Mutex;
// crates
use bytes::Bytes;
// internal
use crate::{NodeKey, NodeStore};
use tessera_nmt::{
    hash::{inner_node_bytes, leaf_node_bytes},
    CommitError, Namespace, NamespacedHash, NodeVisitor,
};

/// Visitor that buffers every node it sees as `digest → preimage`, for one
/// async flush after the (possibly rayon-driven) encode completes.
///
/// Buffering keeps tree construction synchronous while the store write
/// stays async; concurrent trees share one batch safely. Until
/// [`NodeBatch::commit`] succeeds nothing counts as persisted.
#[derive(Debug, Default)]
pub struct NodeBatch {
    nodes: Mutex<HashMap<NodeKey, Bytes>>,
}

impl NodeBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.lock().unwrap().is_empty()
    }

    /// Flush every buffered node into `store`. The buffer is cleared only
    /// once every put has succeeded, so a failed commit leaves the batch
    /// intact and calling `commit` again retries the flush (puts being
    /// idempotent, nodes already written are harmless to rewrite).
    pub async fn commit<S: NodeStore>(&self, store: &S) -> Result<(), CommitError> {
        let nodes: Vec<(NodeKey, Bytes)> = self
            .nodes
            .lock()
            .unwrap()
            .iter()
            .map(|(key, value)| (*key, value.clone()))
            .collect();
        for (key, value) in nodes {
            store.put(key, value).await.map_err(CommitError::new)?;
        }
        self.nodes.lock().unwrap().clear();
        Ok(())
    }
}

impl NodeVisitor for NodeBatch {
    fn visit_leaf(
        &self,
        hash: &NamespacedHash,
        namespace: Namespace,
        data: &[u8],
    ) -> Result<(), CommitError> {
        self.nodes
            .lock()
            .unwrap()
            .entry(hash.digest())
            .or_insert_with(|| Bytes::from(leaf_node_bytes(namespace, data)));
        Ok(())
    }

    fn visit_inner(
        &self,
        hash: &NamespacedHash,
        left: &NamespacedHash,
        right: &NamespacedHash,
    ) -> Result<(), CommitError> {
        self.nodes
            .lock()
            .unwrap()
            .entry(hash.digest())
            .or_insert_with(|| Bytes::from(inner_node_bytes(left, right)));
        Ok(())
    }
}
