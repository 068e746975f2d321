// std
use std::path::PathBuf;
// crates
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use tokio::fs::{File, OpenOptions};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
// internal
use crate::{NodeKey, NodeStore, StoreError};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FsStoreSettings {
    pub base_dir: PathBuf,
}

/// One file per node under `base_dir`, named by the hex digest.
#[derive(Debug, Clone)]
pub struct FsStore {
    settings: FsStoreSettings,
}

impl FsStore {
    pub fn new(settings: FsStoreSettings) -> Self {
        Self { settings }
    }

    fn path_for(&self, key: &NodeKey) -> PathBuf {
        let mut path = self.settings.base_dir.clone();
        path.push(hex::encode(key));
        path
    }
}

#[async_trait]
impl NodeStore for FsStore {
    async fn put(&self, key: NodeKey, value: Bytes) -> Result<(), StoreError> {
        let path = self.path_for(&key);
        if tokio::fs::try_exists(&path).await.unwrap_or(false) {
            // same key means same preimage, nothing to rewrite
            return Ok(());
        }
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)
            .await
            .map_err(|e| {
                tracing::error!("failed to open node file: {e}");
                e
            })?;
        file.write_all(&value).await.map_err(|e| {
            tracing::error!("failed to write node file: {e}");
            e.into()
        })
    }

    async fn get(&self, key: &NodeKey) -> Result<Option<Bytes>, StoreError> {
        let mut file = match File::open(self.path_for(key)).await {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                tracing::error!("failed to open node file: {e}");
                return Err(e.into());
            }
        };
        let mut contents = vec![];
        file.read_to_end(&mut contents).await.map_err(|e| {
            tracing::error!("failed to read node file: {e}");
            StoreError::from(e)
        })?;
        Ok(Some(Bytes::from(contents)))
    }

    async fn has(&self, key: &NodeKey) -> Result<bool, StoreError> {
        Ok(tokio::fs::try_exists(self.path_for(key)).await?)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[tokio::test]
    async fn round_trips_through_the_filesystem() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(FsStoreSettings {
            base_dir: dir.path().to_path_buf(),
        });

        let key = [0xabu8; 32];
        assert_eq!(store.get(&key).await.unwrap(), None);
        assert!(!store.has(&key).await.unwrap());

        store.put(key, Bytes::from_static(b"preimage")).await.unwrap();
        store.put(key, Bytes::from_static(b"preimage")).await.unwrap();
        assert!(store.has(&key).await.unwrap());
        assert_eq!(
            store.get(&key).await.unwrap(),
            Some(Bytes::from_static(b"preimage"))
        );
    }

    #[tokio::test]
    async fn creates_the_base_dir_on_first_put() {
        let dir = tempfile::tempdir().unwrap();
        let store = FsStore::new(FsStoreSettings {
            base_dir: dir.path().join("nested").join("nodes"),
        });
        store.put([1u8; 32], Bytes::from_static(b"n")).await.unwrap();
        assert!(store.has(&[1u8; 32]).await.unwrap());
    }
}
