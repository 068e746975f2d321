pub mod namespaced;

// crates
use async_trait::async_trait;
use thiserror::Error;
// internal
use crate::header::ExtendedHeader;
use tessera_nmt::{Namespace, ProofError};
use tessera_square::{ExtendedDataSquare, RepairError, Share};

pub use namespaced::{NamespacedRow, NamespacedShares};

/// How a retrieval backend fails. The cascade treats everything except
/// [`GetterError::Verification`] as grounds to try the next backend; a
/// backend whose data fails verification must fail loudly and terminally.
#[derive(Debug, Error)]
pub enum GetterError {
    #[error("requested data not found")]
    NotFound,
    #[error("not enough shares retrievable to reconstruct the data")]
    Unavailable,
    #[error("backend does not support {0}")]
    UnsupportedOperation(&'static str),
    #[error("verification against the trusted header failed: {0}")]
    Verification(String),
    #[error("transport failure: {0}")]
    Transport(String),
    #[error("malformed payload: {0}")]
    Serialization(String),
}

impl GetterError {
    pub fn verification(err: impl std::fmt::Display) -> Self {
        Self::Verification(err.to_string())
    }

    pub fn transport(err: impl std::fmt::Display) -> Self {
        Self::Transport(err.to_string())
    }

    pub fn serialization(err: impl std::fmt::Display) -> Self {
        Self::Serialization(err.to_string())
    }

    /// Terminal for the cascading chain: later backends must not paper over
    /// a commitment mismatch.
    pub fn is_verification(&self) -> bool {
        matches!(self, Self::Verification(_))
    }
}

impl From<ProofError> for GetterError {
    fn from(err: ProofError) -> Self {
        Self::verification(err)
    }
}

impl From<RepairError> for GetterError {
    fn from(err: RepairError) -> Self {
        match err {
            RepairError::Unavailable => Self::Unavailable,
            RepairError::RootMismatch { .. } => Self::verification(err),
            other => Self::serialization(other),
        }
    }
}

/// Retrieves shares, squares, or whole namespaces for a trusted header.
///
/// Every implementation verifies what it returns against `header.dah()`
/// before handing it to the caller; nothing unverified may escape. Callers
/// own deadlines (`tokio::time::timeout` around any call); implementations
/// keep no partial external state across awaits so dropping a call is safe.
#[async_trait]
pub trait Getter: Send + Sync {
    /// The share at `(row, col)` of the extended square, proven against the
    /// row root committed in the header.
    async fn get_share(
        &self,
        header: &ExtendedHeader,
        row: usize,
        col: usize,
    ) -> Result<Share, GetterError>;

    /// The whole extended square; its recomputed roots must equal every
    /// entry of the header's availability header.
    async fn get_eds(&self, header: &ExtendedHeader) -> Result<ExtendedDataSquare, GetterError>;

    /// All shares committed under `namespace`, with a completeness proof
    /// per row whose committed range contains it.
    async fn get_shares_by_namespace(
        &self,
        header: &ExtendedHeader,
        namespace: Namespace,
    ) -> Result<NamespacedShares, GetterError>;
}

/// Probabilistic data-availability check: sample enough random coordinates
/// and conclude the square is retrievable without downloading it.
#[async_trait]
pub trait Availability: Send + Sync {
    async fn shares_available(&self, header: &ExtendedHeader) -> Result<(), GetterError>;
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn only_verification_is_terminal() {
        assert!(GetterError::verification(ProofError::RootMismatch).is_verification());
        for err in [
            GetterError::NotFound,
            GetterError::Unavailable,
            GetterError::UnsupportedOperation("get_eds"),
            GetterError::transport("connection refused"),
            GetterError::serialization("bad json"),
        ] {
            assert!(!err.is_verification());
        }
    }

    #[test]
    fn repair_failures_map_to_getter_semantics() {
        assert!(matches!(
            GetterError::from(RepairError::Unavailable),
            GetterError::Unavailable
        ));
        let byzantine = RepairError::RootMismatch {
            axis: tessera_square::Axis::Row,
            index: 3,
        };
        assert!(GetterError::from(byzantine).is_verification());
    }
}
