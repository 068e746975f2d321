// crates
use async_trait::async_trait;
// internal
use tessera_core::{
    ExtendedHeader, Getter, GetterError, NamespacedRow, NamespacedShares,
};
use tessera_da_storage::NodeStore;
use tessera_nmt::hash::{decode_node, DecodedNode};
use tessera_nmt::{split_point, Namespace, NamespaceProof, NamespacedHash, Proof};
use tessera_square::{repair, ExtendedDataSquare, RsGf8Codec, Share};

/// Getter over a content-addressed node store populated by tree visitors.
///
/// The store is untrusted at read time: every fetched value is re-hashed
/// and compared against the digest it was requested under before any byte
/// of it is believed.
pub struct StoreGetter<S> {
    store: S,
}

impl<S: NodeStore> StoreGetter<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    async fn fetch_node(&self, hash: &NamespacedHash) -> Result<Option<DecodedNode>, GetterError> {
        let Some(bytes) = self
            .store
            .get(&hash.digest())
            .await
            .map_err(GetterError::transport)?
        else {
            return Ok(None);
        };
        let decoded = decode_node(&bytes).map_err(GetterError::serialization)?;
        if decoded.hash() != *hash {
            return Err(GetterError::verification(
                "stored node does not match its content key",
            ));
        }
        Ok(Some(decoded))
    }

    /// Descend from `root` to the leaf at `index` of a `width` leaf tree.
    async fn fetch_leaf(
        &self,
        root: &NamespacedHash,
        index: usize,
        width: usize,
    ) -> Result<Share, GetterError> {
        let mut hash = *root;
        let (mut a, mut b) = (0usize, width);
        while b - a > 1 {
            let node = self.fetch_node(&hash).await?.ok_or(GetterError::NotFound)?;
            let DecodedNode::Inner { left, right } = node else {
                return Err(GetterError::verification(
                    "leaf value found at an inner position",
                ));
            };
            let mid = a + split_point(b - a);
            if index < mid {
                hash = left;
                b = mid;
            } else {
                hash = right;
                a = mid;
            }
        }
        let node = self.fetch_node(&hash).await?.ok_or(GetterError::NotFound)?;
        let DecodedNode::Leaf { data, .. } = node else {
            return Err(GetterError::verification(
                "inner value found at a leaf position",
            ));
        };
        Share::from_slice(&data).map_err(GetterError::serialization)
    }

    /// Collect whatever leaves of one row tree the store still holds.
    /// Missing subtrees leave `None` gaps for the repairer to fill.
    async fn collect_row(
        &self,
        root: &NamespacedHash,
        width: usize,
        out: &mut [Option<Share>],
    ) -> Result<(), GetterError> {
        let mut stack = vec![(*root, 0usize, width)];
        while let Some((hash, a, b)) = stack.pop() {
            let Some(node) = self.fetch_node(&hash).await? else {
                continue;
            };
            match node {
                DecodedNode::Leaf { data, .. } if b - a == 1 => {
                    out[a] = Some(Share::from_slice(&data).map_err(GetterError::serialization)?);
                }
                DecodedNode::Inner { left, right } if b - a > 1 => {
                    let mid = a + split_point(b - a);
                    stack.push((right, mid, b));
                    stack.push((left, a, mid));
                }
                _ => {
                    return Err(GetterError::verification(
                        "node shape does not match its tree position",
                    ))
                }
            }
        }
        Ok(())
    }

    /// Walk only the subtrees of one row whose committed range can hold
    /// `namespace`, collecting the matching leaves and the pruned subtree
    /// roots as range-proof siblings.
    async fn namespace_row(
        &self,
        root: &NamespacedHash,
        width: usize,
        namespace: Namespace,
    ) -> Result<(Vec<Share>, NamespaceProof), GetterError> {
        let mut shares = Vec::new();
        let mut siblings = Vec::new();
        let mut start = 0usize;
        let mut end = 0usize;
        let mut stack = vec![(*root, 0usize, width)];
        while let Some((hash, a, b)) = stack.pop() {
            if hash.max_namespace() < namespace || hash.min_namespace() > namespace {
                siblings.push(hash);
                continue;
            }
            let node = self.fetch_node(&hash).await?.ok_or(GetterError::NotFound)?;
            match node {
                DecodedNode::Leaf { data, .. } if b - a == 1 => {
                    if shares.is_empty() {
                        start = a;
                    }
                    end = a + 1;
                    shares.push(Share::from_slice(&data).map_err(GetterError::serialization)?);
                }
                DecodedNode::Inner { left, right } if b - a > 1 => {
                    let mid = a + split_point(b - a);
                    stack.push((right, mid, b));
                    stack.push((left, a, mid));
                }
                _ => {
                    return Err(GetterError::verification(
                        "node shape does not match its tree position",
                    ))
                }
            }
        }
        if shares.is_empty() {
            // the namespace sits in a gap of the committed range; the walk
            // above descended into it, so redo the descent for the successor
            return Ok((Vec::new(), self.absence_proof(root, width, namespace).await?));
        }
        let proof = NamespaceProof::Presence {
            proof: Proof {
                start,
                end,
                siblings,
            },
        };
        Ok((shares, proof))
    }

    /// Single-leaf proof for the first leaf sorting above `namespace`,
    /// which pins the gap an absent namespace would have occupied.
    async fn absence_proof(
        &self,
        root: &NamespacedHash,
        width: usize,
        namespace: Namespace,
    ) -> Result<NamespaceProof, GetterError> {
        let mut hash = *root;
        let (mut a, mut b) = (0usize, width);
        let mut before = Vec::new();
        let mut after = Vec::new();
        while b - a > 1 {
            let node = self.fetch_node(&hash).await?.ok_or(GetterError::NotFound)?;
            let DecodedNode::Inner { left, right } = node else {
                return Err(GetterError::verification(
                    "leaf value found at an inner position",
                ));
            };
            let mid = a + split_point(b - a);
            if left.max_namespace() > namespace {
                after.push(right);
                hash = left;
                b = mid;
            } else {
                before.push(left);
                hash = right;
                a = mid;
            }
        }
        // siblings run left to right: the skipped left subtrees top-down,
        // then the skipped right subtrees bottom-up
        let mut siblings = before;
        siblings.extend(after.into_iter().rev());
        Ok(NamespaceProof::Absence {
            proof: Proof {
                start: a,
                end: a + 1,
                siblings,
            },
            leaf: hash,
        })
    }
}

#[async_trait]
impl<S: NodeStore> Getter for StoreGetter<S> {
    async fn get_share(
        &self,
        header: &ExtendedHeader,
        row: usize,
        col: usize,
    ) -> Result<Share, GetterError> {
        let dah = header.dah();
        let width = dah.square_width();
        if col >= width {
            return Err(GetterError::NotFound);
        }
        let root = dah.row_root(row).ok_or(GetterError::NotFound)?;
        self.fetch_leaf(root, col, width).await
    }

    async fn get_eds(&self, header: &ExtendedHeader) -> Result<ExtendedDataSquare, GetterError> {
        let dah = header.dah();
        let width = dah.square_width();
        let mut shares: Vec<Option<Share>> = vec![None; width * width];
        for (row, root) in dah.row_roots().iter().enumerate() {
            self.collect_row(root, width, &mut shares[row * width..(row + 1) * width])
                .await?;
        }
        // repair re-verifies every line root, complete inputs included
        let square = repair(dah.row_roots(), dah.column_roots(), &RsGf8Codec::new(), shares)?;
        Ok(square)
    }

    async fn get_shares_by_namespace(
        &self,
        header: &ExtendedHeader,
        namespace: Namespace,
    ) -> Result<NamespacedShares, GetterError> {
        let dah = header.dah();
        let width = dah.square_width();
        let mut rows = Vec::new();
        for (index, root) in dah.row_roots().iter().enumerate() {
            if !root.contains(namespace) {
                continue;
            }
            let (shares, proof) = self.namespace_row(root, width, namespace).await?;
            rows.push(NamespacedRow {
                row: index as u16,
                shares,
                proof,
            });
        }
        let result = NamespacedShares { rows };
        result.verify(dah, namespace)?;
        Ok(result)
    }
}
