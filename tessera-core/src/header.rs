// crates
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde::{Deserialize, Serialize};
use thiserror::Error;
// internal
use tessera_nmt::NamespacedHash;
use tessera_square::EncodedData;

/// Domain tag separating the availability-header hash from every other
/// Blake2b use in the workspace.
const DAH_HASH_DOMAIN: &[u8] = b"tessera-dah-v1";

#[derive(Debug, Error)]
pub enum HeaderError {
    #[error("header has no roots")]
    Empty,
    #[error("row and column root counts differ: {rows} vs {columns}")]
    RootCountMismatch { rows: usize, columns: usize },
    #[error("root count {0} is not an even power of two")]
    InvalidWidth(usize),
}

/// The commitment clients sample and verify against: the namespaced root of
/// every row and column of one extended data square, in index order.
///
/// Immutable once derived; two headers are equal exactly when both root
/// lists match element-wise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DataAvailabilityHeader {
    row_roots: Vec<NamespacedHash>,
    column_roots: Vec<NamespacedHash>,
}

impl DataAvailabilityHeader {
    pub fn from_encoded(encoded: &EncodedData) -> Self {
        Self {
            row_roots: encoded.row_roots.clone(),
            column_roots: encoded.column_roots.clone(),
        }
    }

    pub fn from_roots(
        row_roots: Vec<NamespacedHash>,
        column_roots: Vec<NamespacedHash>,
    ) -> Result<Self, HeaderError> {
        let header = Self {
            row_roots,
            column_roots,
        };
        header.validate_basic()?;
        Ok(header)
    }

    pub fn validate_basic(&self) -> Result<(), HeaderError> {
        if self.row_roots.is_empty() {
            return Err(HeaderError::Empty);
        }
        if self.row_roots.len() != self.column_roots.len() {
            return Err(HeaderError::RootCountMismatch {
                rows: self.row_roots.len(),
                columns: self.column_roots.len(),
            });
        }
        let width = self.row_roots.len();
        if width < 2 || !width.is_power_of_two() {
            return Err(HeaderError::InvalidWidth(width));
        }
        Ok(())
    }

    /// Extended width `2k` of the committed square.
    pub fn square_width(&self) -> usize {
        self.row_roots.len()
    }

    pub fn row_root(&self, row: usize) -> Option<&NamespacedHash> {
        self.row_roots.get(row)
    }

    pub fn column_root(&self, col: usize) -> Option<&NamespacedHash> {
        self.column_roots.get(col)
    }

    pub fn row_roots(&self) -> &[NamespacedHash] {
        &self.row_roots
    }

    pub fn column_roots(&self) -> &[NamespacedHash] {
        &self.column_roots
    }

    /// Fold both root lists into one 32 byte commitment. Length prefixes
    /// keep the encoding injective, the hash order-preserving.
    pub fn hash(&self) -> [u8; 32] {
        let mut hasher = Blake2b::<U32>::new();
        hasher.update(DAH_HASH_DOMAIN);
        hasher.update((self.row_roots.len() as u32).to_be_bytes());
        for root in &self.row_roots {
            hasher.update(root.to_bytes());
        }
        hasher.update((self.column_roots.len() as u32).to_be_bytes());
        for root in &self.column_roots {
            hasher.update(root.to_bytes());
        }
        hasher.finalize().into()
    }
}

/// Header a client already trusts via the consensus layer, carrying the
/// availability commitment for its height. Getters take it read-only and
/// verify everything they return against its [`DataAvailabilityHeader`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtendedHeader {
    height: u64,
    dah: DataAvailabilityHeader,
}

impl ExtendedHeader {
    pub fn new(height: u64, dah: DataAvailabilityHeader) -> Self {
        Self { height, dah }
    }

    pub fn height(&self) -> u64 {
        self.height
    }

    pub fn dah(&self) -> &DataAvailabilityHeader {
        &self.dah
    }
}
