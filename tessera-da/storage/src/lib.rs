pub mod batch;
pub mod fs;
pub mod mem;

// crates
use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;
// internal
use tessera_nmt::HASH_SIZE;

pub use batch::NodeBatch;
pub use fs::{FsStore, FsStoreSettings};
pub use mem::MemStore;

pub type NodeKey = [u8; HASH_SIZE];

#[derive(Debug, Error)]
pub enum StoreError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Content-addressed persistence for merkle nodes: values are the exact
/// hash preimages of their keys, so a reader can check every byte it gets
/// back. Puts are idempotent; writing the same key twice is harmless.
#[async_trait]
pub trait NodeStore: Send + Sync {
    async fn put(&self, key: NodeKey, value: Bytes) -> Result<(), StoreError>;
    async fn get(&self, key: &NodeKey) -> Result<Option<Bytes>, StoreError>;
    async fn has(&self, key: &NodeKey) -> Result<bool, StoreError>;
}

#[async_trait]
impl<S: NodeStore + ?Sized> NodeStore for &S {
    async fn put(&self, key: NodeKey, value: Bytes) -> Result<(), StoreError> {
        (**self).put(key, value).await
    }

    async fn get(&self, key: &NodeKey) -> Result<Option<Bytes>, StoreError> {
        (**self).get(key).await
    }

    async fn has(&self, key: &NodeKey) -> Result<bool, StoreError> {
        (**self).has(key).await
    }
}

#[async_trait]
impl<S: NodeStore + ?Sized> NodeStore for std::sync::Arc<S> {
    async fn put(&self, key: NodeKey, value: Bytes) -> Result<(), StoreError> {
        (**self).put(key, value).await
    }

    async fn get(&self, key: &NodeKey) -> Result<Option<Bytes>, StoreError> {
        (**self).get(key).await
    }

    async fn has(&self, key: &NodeKey) -> Result<bool, StoreError> {
        (**self).has(key).await
    }
}
