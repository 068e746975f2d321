// std
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
// crates
use async_trait::async_trait;
use bytes::Bytes;
// internal
use crate::{NodeKey, NodeStore, StoreError};

/// In-memory node store. Cheap to clone; clones share the same map.
#[derive(Debug, Default, Clone)]
pub struct MemStore {
    nodes: Arc<RwLock<HashMap<NodeKey, Bytes>>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.nodes.read().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.read().unwrap().is_empty()
    }
}

#[async_trait]
impl NodeStore for MemStore {
    async fn put(&self, key: NodeKey, value: Bytes) -> Result<(), StoreError> {
        self.nodes.write().unwrap().entry(key).or_insert(value);
        Ok(())
    }

    async fn get(&self, key: &NodeKey) -> Result<Option<Bytes>, StoreError> {
        Ok(self.nodes.read().unwrap().get(key).cloned())
    }

    async fn has(&self, key: &NodeKey) -> Result<bool, StoreError> {
        Ok(self.nodes.read().unwrap().contains_key(key))
    }
}
