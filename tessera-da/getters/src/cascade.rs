// std
use std::sync::Arc;
// crates
use async_trait::async_trait;
// internal
use tessera_core::{ExtendedHeader, Getter, GetterError, NamespacedShares};
use tessera_nmt::Namespace;
use tessera_square::{ExtendedDataSquare, Share};

/// Ordered fall-through over other getters: the first success wins, a
/// verification failure stops the chain cold, anything else moves on to
/// the next backend. Itself a [`Getter`], so chains nest.
///
/// Backends run strictly in sequence, each to completion, never raced.
pub struct CascadeGetter {
    getters: Vec<Arc<dyn Getter>>,
}

impl CascadeGetter {
    pub fn new(getters: Vec<Arc<dyn Getter>>) -> Self {
        Self { getters }
    }
}

#[async_trait]
impl Getter for CascadeGetter {
    async fn get_share(
        &self,
        header: &ExtendedHeader,
        row: usize,
        col: usize,
    ) -> Result<Share, GetterError> {
        let mut last = GetterError::NotFound;
        for (index, getter) in self.getters.iter().enumerate() {
            match getter.get_share(header, row, col).await {
                Ok(share) => return Ok(share),
                Err(err) if err.is_verification() => return Err(err),
                Err(err) => {
                    tracing::debug!(backend = index, %err, "get_share fell through");
                    last = err;
                }
            }
        }
        Err(last)
    }

    async fn get_eds(&self, header: &ExtendedHeader) -> Result<ExtendedDataSquare, GetterError> {
        let mut last = GetterError::NotFound;
        for (index, getter) in self.getters.iter().enumerate() {
            match getter.get_eds(header).await {
                Ok(square) => return Ok(square),
                Err(err) if err.is_verification() => return Err(err),
                Err(err) => {
                    tracing::debug!(backend = index, %err, "get_eds fell through");
                    last = err;
                }
            }
        }
        Err(last)
    }

    async fn get_shares_by_namespace(
        &self,
        header: &ExtendedHeader,
        namespace: Namespace,
    ) -> Result<NamespacedShares, GetterError> {
        let mut last = GetterError::NotFound;
        for (index, getter) in self.getters.iter().enumerate() {
            match getter.get_shares_by_namespace(header, namespace).await {
                Ok(shares) => return Ok(shares),
                Err(err) if err.is_verification() => return Err(err),
                Err(err) => {
                    tracing::debug!(backend = index, %err, "get_shares_by_namespace fell through");
                    last = err;
                }
            }
        }
        Err(last)
    }
}
