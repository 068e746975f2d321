// crates
use base64::prelude::*;
use blake2::digest::consts::U32;
use blake2::{Blake2b, Digest};
use serde::{de::Error as _, Deserialize, Deserializer, Serialize, Serializer};
// internal
use crate::namespace::{Namespace, NS_SIZE};
use crate::NmtError;

pub const HASH_SIZE: usize = 32;
pub const NAMESPACED_HASH_SIZE: usize = 2 * NS_SIZE + HASH_SIZE;

/// Domain prefix of a leaf hash preimage.
pub const LEAF_PREFIX: u8 = 0x00;
/// Domain prefix of an inner node hash preimage.
pub const NODE_PREFIX: u8 = 0x01;

type Hasher = Blake2b<U32>;

/// A merkle node digest together with the namespace range it commits to.
///
/// Wire form is `min ‖ max ‖ digest` (48 bytes). The range of an inner node
/// ignores children made purely of parity leaves, so a row's committed range
/// ends at its highest data namespace instead of the parity sentinel.
#[derive(Copy, Clone, PartialEq, Eq, Hash)]
pub struct NamespacedHash {
    min_ns: Namespace,
    max_ns: Namespace,
    digest: [u8; HASH_SIZE],
}

impl NamespacedHash {
    pub const fn new(min_ns: Namespace, max_ns: Namespace, digest: [u8; HASH_SIZE]) -> Self {
        Self {
            min_ns,
            max_ns,
            digest,
        }
    }

    pub const fn min_namespace(&self) -> Namespace {
        self.min_ns
    }

    pub const fn max_namespace(&self) -> Namespace {
        self.max_ns
    }

    pub const fn digest(&self) -> [u8; HASH_SIZE] {
        self.digest
    }

    /// Whether `ns` falls inside the committed namespace range.
    pub fn contains(&self, ns: Namespace) -> bool {
        self.min_ns <= ns && ns <= self.max_ns
    }

    /// A node whose whole range is the parity sentinel.
    pub fn is_parity(&self) -> bool {
        self.min_ns.is_parity()
    }

    pub fn to_bytes(&self) -> [u8; NAMESPACED_HASH_SIZE] {
        let mut out = [0u8; NAMESPACED_HASH_SIZE];
        out[..NS_SIZE].copy_from_slice(self.min_ns.as_bytes());
        out[NS_SIZE..2 * NS_SIZE].copy_from_slice(self.max_ns.as_bytes());
        out[2 * NS_SIZE..].copy_from_slice(&self.digest);
        out
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self, NmtError> {
        if bytes.len() != NAMESPACED_HASH_SIZE {
            return Err(NmtError::InvalidHashSize(bytes.len()));
        }
        let min_ns = Namespace::from_slice(&bytes[..NS_SIZE])?;
        let max_ns = Namespace::from_slice(&bytes[NS_SIZE..2 * NS_SIZE])?;
        if min_ns > max_ns {
            return Err(NmtError::InvalidHashRange);
        }
        let mut digest = [0u8; HASH_SIZE];
        digest.copy_from_slice(&bytes[2 * NS_SIZE..]);
        Ok(Self {
            min_ns,
            max_ns,
            digest,
        })
    }
}

impl std::fmt::Debug for NamespacedHash {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "NamespacedHash({}..{}, {})",
            self.min_ns,
            self.max_ns,
            hex::encode(self.digest)
        )
    }
}

impl Serialize for NamespacedHash {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&BASE64_STANDARD.encode(self.to_bytes()))
    }
}

impl<'de> Deserialize<'de> for NamespacedHash {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let encoded = String::deserialize(deserializer)?;
        let bytes = BASE64_STANDARD
            .decode(encoded)
            .map_err(D::Error::custom)?;
        Self::from_bytes(&bytes).map_err(D::Error::custom)
    }
}

/// Hash a leaf: `H(LEAF_PREFIX ‖ ns ‖ data)` ranged to `ns` alone.
pub fn hash_leaf(ns: Namespace, data: &[u8]) -> NamespacedHash {
    let mut hasher = Hasher::new();
    hasher.update([LEAF_PREFIX]);
    hasher.update(ns.as_bytes());
    hasher.update(data);
    NamespacedHash {
        min_ns: ns,
        max_ns: ns,
        digest: hasher.finalize().into(),
    }
}

/// Hash two children: `H(NODE_PREFIX ‖ left ‖ right)` over their wire forms.
pub fn hash_nodes(left: &NamespacedHash, right: &NamespacedHash) -> NamespacedHash {
    let mut hasher = Hasher::new();
    hasher.update([NODE_PREFIX]);
    hasher.update(left.to_bytes());
    hasher.update(right.to_bytes());
    let min_ns = left.min_ns.min(right.min_ns);
    // Parity children do not widen the committed range unless the whole
    // subtree is parity.
    let max_ns = match (left.is_parity(), right.is_parity()) {
        (false, true) => left.max_ns,
        _ => left.max_ns.max(right.max_ns),
    };
    NamespacedHash {
        min_ns,
        max_ns,
        digest: hasher.finalize().into(),
    }
}

/// Root of a tree with no leaves.
pub fn empty_root() -> NamespacedHash {
    NamespacedHash {
        min_ns: Namespace::MIN,
        max_ns: Namespace::MIN,
        digest: Hasher::new().finalize().into(),
    }
}

/// Persisted node value: the exact hash preimage of a leaf.
pub fn leaf_node_bytes(ns: Namespace, data: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + NS_SIZE + data.len());
    out.push(LEAF_PREFIX);
    out.extend_from_slice(ns.as_bytes());
    out.extend_from_slice(data);
    out
}

/// Persisted node value: the exact hash preimage of an inner node.
pub fn inner_node_bytes(left: &NamespacedHash, right: &NamespacedHash) -> Vec<u8> {
    let mut out = Vec::with_capacity(1 + 2 * NAMESPACED_HASH_SIZE);
    out.push(NODE_PREFIX);
    out.extend_from_slice(&left.to_bytes());
    out.extend_from_slice(&right.to_bytes());
    out
}

/// A node value decoded back from its persisted preimage form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DecodedNode {
    Leaf { namespace: Namespace, data: Vec<u8> },
    Inner {
        left: NamespacedHash,
        right: NamespacedHash,
    },
}

impl DecodedNode {
    /// Recompute the namespaced hash this value is the preimage of. A store
    /// read is trusted only once this equals the key it was fetched under.
    pub fn hash(&self) -> NamespacedHash {
        match self {
            Self::Leaf { namespace, data } => hash_leaf(*namespace, data),
            Self::Inner { left, right } => hash_nodes(left, right),
        }
    }
}

pub fn decode_node(bytes: &[u8]) -> Result<DecodedNode, NmtError> {
    match bytes.first() {
        Some(&LEAF_PREFIX) if bytes.len() >= 1 + NS_SIZE => Ok(DecodedNode::Leaf {
            namespace: Namespace::from_slice(&bytes[1..1 + NS_SIZE])?,
            data: bytes[1 + NS_SIZE..].to_vec(),
        }),
        Some(&NODE_PREFIX) if bytes.len() == 1 + 2 * NAMESPACED_HASH_SIZE => {
            Ok(DecodedNode::Inner {
                left: NamespacedHash::from_bytes(&bytes[1..1 + NAMESPACED_HASH_SIZE])?,
                right: NamespacedHash::from_bytes(&bytes[1 + NAMESPACED_HASH_SIZE..])?,
            })
        }
        _ => Err(NmtError::MalformedNode),
    }
}
