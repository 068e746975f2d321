// std
use std::fmt;
// crates
use base64::prelude::*;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
// internal
use crate::NmtError;

/// Width in bytes of every namespace identifier.
pub const NS_SIZE: usize = 8;

/// Fixed-width namespace identifier carried as the leading bytes of a share.
///
/// Namespaces order byte-lexicographically. [`Namespace::PARITY`] is the
/// reserved maximum under which erasure parity leaves are committed, so any
/// valid data namespace sorts strictly below every parity leaf.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Namespace([u8; NS_SIZE]);

impl Namespace {
    /// Reserved sentinel for erasure parity leaves.
    pub const PARITY: Namespace = Namespace([u8::MAX; NS_SIZE]);
    pub const MIN: Namespace = Namespace([0; NS_SIZE]);

    pub const fn new(bytes: [u8; NS_SIZE]) -> Self {
        Self(bytes)
    }

    /// Big-endian integer form, convenient for tests and fixtures.
    pub const fn from_be_u64(value: u64) -> Self {
        Self(value.to_be_bytes())
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, NmtError> {
        let bytes: [u8; NS_SIZE] = bytes
            .try_into()
            .map_err(|_| NmtError::InvalidNamespaceSize(bytes.len()))?;
        Ok(Self(bytes))
    }

    pub const fn as_bytes(&self) -> &[u8; NS_SIZE] {
        &self.0
    }

    pub const fn is_parity(&self) -> bool {
        matches!(*self, Self::PARITY)
    }
}

impl AsRef<[u8]> for Namespace {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Namespace({})", hex::encode(self.0))
    }
}

impl Serialize for Namespace {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64_STANDARD.encode(self.0))
    }
}

impl<'de> Deserialize<'de> for Namespace {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        let bytes = BASE64_STANDARD
            .decode(encoded)
            .map_err(D::Error::custom)?;
        Self::from_slice(&bytes).map_err(D::Error::custom)
    }
}
