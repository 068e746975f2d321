// std
use std::fmt;
// crates
use base64::prelude::*;
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
// internal
use crate::EncodingError;
use tessera_nmt::{Namespace, NS_SIZE};

/// Fixed size in bytes of every share, original and parity alike.
pub const SHARE_SIZE: usize = 256;
/// Bytes left for payload after the namespace prefix.
pub const PAYLOAD_SIZE: usize = SHARE_SIZE - NS_SIZE;

/// One cell of a data square: a namespace prefix followed by opaque payload.
///
/// Parity shares produced by the codec reuse the same container; their bytes
/// are codec output and the prefix carries no meaning, which is why trees
/// commit them under the parity sentinel instead.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Share(Vec<u8>);

impl Share {
    pub fn build(namespace: Namespace, payload: &[u8]) -> Result<Self, EncodingError> {
        if payload.len() != PAYLOAD_SIZE {
            return Err(EncodingError::WrongPayloadSize(payload.len()));
        }
        let mut bytes = Vec::with_capacity(SHARE_SIZE);
        bytes.extend_from_slice(namespace.as_bytes());
        bytes.extend_from_slice(payload);
        Ok(Self(bytes))
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, EncodingError> {
        if bytes.len() != SHARE_SIZE {
            return Err(EncodingError::WrongShareSize(bytes.len()));
        }
        Ok(Self(bytes.to_vec()))
    }

    pub fn namespace(&self) -> Namespace {
        let mut ns = [0u8; NS_SIZE];
        ns.copy_from_slice(&self.0[..NS_SIZE]);
        Namespace::new(ns)
    }

    pub fn payload(&self) -> &[u8] {
        &self.0[NS_SIZE..]
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl AsRef<[u8]> for Share {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl fmt::Debug for Share {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Share(ns={}, {} bytes)", self.namespace(), self.0.len())
    }
}

impl Serialize for Share {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64_STANDARD.encode(&self.0))
    }
}

impl<'de> Deserialize<'de> for Share {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        let bytes = BASE64_STANDARD
            .decode(encoded)
            .map_err(D::Error::custom)?;
        Self::from_slice(&bytes).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn build_pads_nothing_and_checks_length() {
        let ns = Namespace::from_be_u64(7);
        let share = Share::build(ns, &[0xab; PAYLOAD_SIZE]).unwrap();
        assert_eq!(share.as_bytes().len(), SHARE_SIZE);
        assert_eq!(share.namespace(), ns);
        assert_eq!(share.payload(), &[0xab; PAYLOAD_SIZE]);

        assert!(matches!(
            Share::build(ns, &[0u8; 3]),
            Err(EncodingError::WrongPayloadSize(3))
        ));
    }

    #[test]
    fn from_slice_requires_exact_share_size() {
        assert!(Share::from_slice(&[0u8; SHARE_SIZE]).is_ok());
        assert!(matches!(
            Share::from_slice(&[0u8; SHARE_SIZE - 1]),
            Err(EncodingError::WrongShareSize(_))
        ));
    }

    #[test]
    fn serde_round_trip() {
        let share = Share::build(Namespace::from_be_u64(3), &[9; PAYLOAD_SIZE]).unwrap();
        let encoded = serde_json::to_string(&share).unwrap();
        let decoded: Share = serde_json::from_str(&encoded).unwrap();
        assert_eq!(share, decoded);
    }
}
