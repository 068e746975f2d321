// crates
use serde::{Deserialize, Serialize};
// internal
use crate::da::GetterError;
use crate::header::DataAvailabilityHeader;
use tessera_nmt::{Namespace, NamespaceProof};
use tessera_square::Share;

/// One row's contribution to a namespace query: the matching shares plus
/// the proof that they are complete for that row. Rows whose committed
/// range contains the namespace but hold no matching share appear with an
/// absence proof and an empty share list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespacedRow {
    pub row: u16,
    pub shares: Vec<Share>,
    pub proof: NamespaceProof,
}

/// Every share a square commits under one namespace, in row order, each row
/// carrying its own completeness proof against the availability header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamespacedShares {
    pub rows: Vec<NamespacedRow>,
}

impl NamespacedShares {
    /// Matching shares flattened in row-major order.
    pub fn shares(&self) -> Vec<Share> {
        self.rows.iter().flat_map(|row| row.shares.clone()).collect()
    }

    /// Re-run every row proof against the header. The listed rows must be
    /// exactly the header rows whose committed range contains `namespace`,
    /// ascending; a missing, reordered, or unprovable row fails.
    pub fn verify(
        &self,
        dah: &DataAvailabilityHeader,
        namespace: Namespace,
    ) -> Result<(), GetterError> {
        let width = dah.square_width();
        let mut rows = self.rows.iter();
        for (index, root) in dah.row_roots().iter().enumerate() {
            if !root.contains(namespace) {
                continue;
            }
            let row = rows
                .next()
                .ok_or_else(|| GetterError::verification("row covering the namespace is missing"))?;
            if usize::from(row.row) != index {
                return Err(GetterError::verification(format!(
                    "expected row {index}, got row {}",
                    row.row
                )));
            }
            row.proof
                .verify_complete_namespace(root, namespace, &row.shares, width)?;
        }
        if rows.next().is_some() {
            return Err(GetterError::verification(
                "result carries rows the header does not commit to the namespace",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use tessera_nmt::{NamespaceMerkleTree, NoopVisitor};
    use tessera_square::testutils::rand_shares;
    use tessera_square::{DaEncoder, DaEncoderParams, EncodedData, ExtendedDataSquare};

    fn ns(id: u64) -> Namespace {
        Namespace::from_be_u64(id)
    }

    fn encoded() -> (EncodedData, DataAvailabilityHeader) {
        let shares = rand_shares(&[1, 1, 2, 2]);
        let encoded = DaEncoder::new(DaEncoderParams::new(2))
            .encode(&shares, &NoopVisitor)
            .unwrap();
        let dah = DataAvailabilityHeader::from_encoded(&encoded);
        (encoded, dah)
    }

    /// Rebuild one row tree exactly the way the encoder committed it.
    fn row_tree(square: &ExtendedDataSquare, row: usize) -> NamespaceMerkleTree {
        let k = square.original_width();
        let mut tree = NamespaceMerkleTree::new();
        for (col, share) in square.row(row).unwrap().iter().enumerate() {
            // only cells inside the original quadrant carry their own namespace
            let leaf_ns = if row < k && col < k {
                share.namespace()
            } else {
                Namespace::PARITY
            };
            tree.push(leaf_ns, share.as_bytes()).unwrap();
        }
        tree
    }

    fn query(encoded: &EncodedData, dah: &DataAvailabilityHeader, ns: Namespace) -> NamespacedShares {
        let mut rows = Vec::new();
        for row in 0..dah.square_width() {
            if !dah.row_root(row).unwrap().contains(ns) {
                continue;
            }
            let mut tree = row_tree(&encoded.square, row);
            tree.root().unwrap();
            let shares: Vec<Share> = encoded.square.row(row).unwrap()
                [..encoded.square.original_width()]
                .iter()
                .filter(|share| share.namespace() == ns)
                .cloned()
                .collect();
            rows.push(NamespacedRow {
                row: row as u16,
                shares,
                proof: tree.prove_namespace(ns),
            });
        }
        NamespacedShares { rows }
    }

    #[test]
    fn complete_namespace_result_verifies() {
        let (encoded, dah) = encoded();
        // namespaces [1, 1 | 2, 2] land rows 0 and 1 with one namespace each
        let result = query(&encoded, &dah, ns(2));
        assert_eq!(result.rows.len(), 1);
        assert_eq!(result.rows[0].row, 1);
        assert_eq!(result.shares().len(), 2);
        result.verify(&dah, ns(2)).unwrap();
    }

    #[test]
    fn tampered_share_fails_verification() {
        let (encoded, dah) = encoded();
        let mut result = query(&encoded, &dah, ns(1));
        let tampered = rand_shares(&[1]).remove(0);
        result.rows[0].shares[0] = tampered;
        assert!(result.verify(&dah, ns(1)).unwrap_err().is_verification());
    }

    #[test]
    fn dropping_a_committed_row_fails_verification() {
        let (encoded, dah) = encoded();
        let mut result = query(&encoded, &dah, ns(1));
        result.rows.clear();
        assert!(result.verify(&dah, ns(1)).unwrap_err().is_verification());
    }

    #[test]
    fn extra_rows_fail_verification() {
        let (encoded, dah) = encoded();
        let mut result = query(&encoded, &dah, ns(2));
        let duplicate = result.rows[0].clone();
        result.rows.push(duplicate);
        assert!(result.verify(&dah, ns(2)).unwrap_err().is_verification());
    }

    #[test]
    fn uncommitted_namespace_verifies_empty() {
        let (_, dah) = encoded();
        let empty = NamespacedShares::default();
        empty.verify(&dah, ns(9)).unwrap();
    }

    #[test]
    fn result_round_trips_through_serde() {
        let (encoded, dah) = encoded();
        let result = query(&encoded, &dah, ns(1));
        let json = serde_json::to_string(&result).unwrap();
        let decoded: NamespacedShares = serde_json::from_str(&json).unwrap();
        assert_eq!(decoded, result);
        decoded.verify(&dah, ns(1)).unwrap();
    }
}
