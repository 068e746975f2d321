// crates
#[cfg(feature = "parallel")]
use rayon::iter::{
    IndexedParallelIterator, IntoParallelIterator, IntoParallelRefIterator, ParallelIterator,
};
// internal
use crate::codec::{Codec, CodecError, RsGf8Codec};
use crate::eds::ExtendedDataSquare;
use crate::share::Share;
use crate::EncodingError;
use tessera_nmt::{Namespace, NamespaceMerkleTree, NamespacedHash, NmtError, NodeVisitor};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DaEncoderParams {
    /// Width `k` of the original data square.
    pub square_width: usize,
}

impl DaEncoderParams {
    pub const fn new(square_width: usize) -> Self {
        Self { square_width }
    }
}

/// Everything `encode` produces: the extended square and the namespaced
/// commitment to every one of its rows and columns, in index order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedData {
    pub square: ExtendedDataSquare,
    pub row_roots: Vec<NamespacedHash>,
    pub column_roots: Vec<NamespacedHash>,
}

/// Extends a namespace-ordered `k × k` square to `2k × 2k` and commits to
/// every row and column with a namespaced merkle tree.
///
/// The row pass completes before the column pass starts, so column parity
/// is computed over settled row-extended data; with the `parallel` feature
/// both passes and the commitment pass fan out per line.
pub struct DaEncoder<C = RsGf8Codec> {
    params: DaEncoderParams,
    codec: C,
}

impl DaEncoder<RsGf8Codec> {
    pub fn new(params: DaEncoderParams) -> Self {
        Self::with_codec(params, RsGf8Codec::new())
    }
}

impl<C: Codec> DaEncoder<C> {
    pub fn with_codec(params: DaEncoderParams, codec: C) -> Self {
        Self { params, codec }
    }

    pub const fn params(&self) -> &DaEncoderParams {
        &self.params
    }

    pub fn encode<V>(&self, shares: &[Share], visitor: &V) -> Result<EncodedData, EncodingError>
    where
        V: NodeVisitor + Sync,
    {
        let k = self.params.square_width;
        if !k.is_power_of_two() || !self.codec.supports(k) {
            return Err(EncodingError::UnsupportedWidth(k));
        }
        if shares.len() != k * k {
            return Err(EncodingError::WrongShareCount {
                got: shares.len(),
                want: k * k,
            });
        }
        Self::check_ordering(shares)?;

        let upper = self.extend_rows(shares, k)?;
        let lower = self.extend_columns(&upper, k)?;

        let width = 2 * k;
        let mut flat = Vec::with_capacity(width * width);
        for row in upper.into_iter().chain(lower) {
            flat.extend(row);
        }
        let square = ExtendedDataSquare::from_shares(flat, width)?;
        let (row_roots, column_roots) = self.commit(&square, visitor)?;
        Ok(EncodedData {
            square,
            row_roots,
            column_roots,
        })
    }

    /// Shares must arrive namespace-sorted across the whole square, not just
    /// within rows; row trees alone would miss violations at row boundaries.
    fn check_ordering(shares: &[Share]) -> Result<(), EncodingError> {
        for (i, pair) in shares.windows(2).enumerate() {
            if pair[1].namespace() < pair[0].namespace() {
                return Err(EncodingError::Ordering(NmtError::OrderingViolation {
                    index: i + 1,
                    prev: pair[0].namespace(),
                    next: pair[1].namespace(),
                }));
            }
        }
        Ok(())
    }

    fn extend_rows(&self, shares: &[Share], k: usize) -> Result<Vec<Vec<Share>>, EncodingError> {
        let rows: Vec<&[Share]> = shares.chunks(k).collect();
        let extend = |row: &&[Share]| -> Result<Vec<Share>, CodecError> {
            let parity = self.codec.encode(row)?;
            Ok(row.iter().cloned().chain(parity).collect())
        };
        let extended: Result<Vec<Vec<Share>>, CodecError> = {
            #[cfg(feature = "parallel")]
            {
                rows.par_iter().map(extend).collect()
            }
            #[cfg(not(feature = "parallel"))]
            {
                rows.iter().map(extend).collect()
            }
        };
        Ok(extended?)
    }

    fn extend_columns(
        &self,
        upper: &[Vec<Share>],
        k: usize,
    ) -> Result<Vec<Vec<Share>>, EncodingError> {
        let width = 2 * k;
        let column_parity = |col: usize| -> Result<Vec<Share>, CodecError> {
            let column: Vec<Share> = upper.iter().map(|row| row[col].clone()).collect();
            Ok(self.codec.encode(&column)?)
        };
        let parities: Result<Vec<Vec<Share>>, CodecError> = {
            #[cfg(feature = "parallel")]
            {
                (0..width).into_par_iter().map(column_parity).collect()
            }
            #[cfg(not(feature = "parallel"))]
            {
                (0..width).map(column_parity).collect()
            }
        };
        let parities = parities?;
        // lower rows are the transposed column parity runs
        let mut lower = vec![Vec::with_capacity(width); k];
        for column in &parities {
            for (row, share) in lower.iter_mut().zip(column) {
                row.push(share.clone());
            }
        }
        Ok(lower)
    }

    fn commit<V>(
        &self,
        square: &ExtendedDataSquare,
        visitor: &V,
    ) -> Result<(Vec<NamespacedHash>, Vec<NamespacedHash>), EncodingError>
    where
        V: NodeVisitor + Sync,
    {
        let k = square.original_width();
        let width = square.width();
        let rows: Vec<&[Share]> = square.rows().collect();
        let row_roots: Result<Vec<NamespacedHash>, NmtError> = {
            #[cfg(feature = "parallel")]
            {
                rows.par_iter()
                    .enumerate()
                    .map(|(r, row)| axis_root(row.iter(), data_prefix(r, k), visitor))
                    .collect()
            }
            #[cfg(not(feature = "parallel"))]
            {
                rows.iter()
                    .enumerate()
                    .map(|(r, row)| axis_root(row.iter(), data_prefix(r, k), visitor))
                    .collect()
            }
        };
        let column_roots: Result<Vec<NamespacedHash>, NmtError> = {
            #[cfg(feature = "parallel")]
            {
                (0..width)
                    .into_par_iter()
                    .map(|col| axis_root(square.column(col), data_prefix(col, k), visitor))
                    .collect()
            }
            #[cfg(not(feature = "parallel"))]
            {
                (0..width)
                    .map(|col| axis_root(square.column(col), data_prefix(col, k), visitor))
                    .collect()
            }
        };
        Ok((row_roots?, column_roots?))
    }
}

/// Commit one extended row or column, left-to-right or top-to-bottom. Only
/// the leading `data_prefix` leaves carry their own namespace: `k` for
/// lines crossing the original quadrant, zero for lines that are parity
/// end to end, whose prefixes are codec output and mean nothing.
pub(crate) fn axis_root<'a, V: NodeVisitor>(
    shares: impl IntoIterator<Item = &'a Share>,
    data_prefix: usize,
    visitor: V,
) -> Result<NamespacedHash, NmtError> {
    let mut tree = NamespaceMerkleTree::with_visitor(visitor);
    for (i, share) in shares.into_iter().enumerate() {
        let namespace = if i < data_prefix {
            share.namespace()
        } else {
            Namespace::PARITY
        };
        tree.push(namespace, share.as_bytes())?;
    }
    tree.root()
}

/// Leaves of line `index` that sit inside the original quadrant: `k` for
/// the first `k` lines of either axis, none after that.
pub(crate) fn data_prefix(index: usize, k: usize) -> usize {
    if index < k {
        k
    } else {
        0
    }
}

#[cfg(test)]
pub mod test {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use rand::{thread_rng, RngCore};

    use super::*;
    use crate::share::PAYLOAD_SIZE;
    use tessera_nmt::{CommitError, NoopVisitor};

    pub fn rand_payload() -> Vec<u8> {
        let mut payload = vec![0u8; PAYLOAD_SIZE];
        thread_rng().fill_bytes(&mut payload);
        payload
    }

    /// `k²` shares sorted by namespace, two shares per namespace.
    pub fn sorted_shares(k: usize) -> Vec<Share> {
        (0..k * k)
            .map(|i| {
                Share::build(Namespace::from_be_u64(i as u64 / 2 + 1), &rand_payload()).unwrap()
            })
            .collect()
    }

    #[test]
    fn encode_produces_the_extended_shape() {
        let encoder = DaEncoder::new(DaEncoderParams::new(4));
        let shares = sorted_shares(4);
        let encoded = encoder.encode(&shares, &NoopVisitor).unwrap();

        assert_eq!(encoded.square.width(), 8);
        assert_eq!(encoded.row_roots.len(), 8);
        assert_eq!(encoded.column_roots.len(), 8);
        // original quadrant is untouched
        for row in 0..4 {
            for col in 0..4 {
                assert_eq!(
                    encoded.square.share(row, col),
                    Some(&shares[row * 4 + col])
                );
            }
        }
    }

    #[test]
    fn single_share_squares_encode() {
        let encoder = DaEncoder::new(DaEncoderParams::new(1));
        let shares = vec![Share::build(Namespace::from_be_u64(1), &rand_payload()).unwrap()];
        let encoded = encoder.encode(&shares, &NoopVisitor).unwrap();
        assert_eq!(encoded.square.width(), 2);
    }

    #[test]
    fn encoding_is_deterministic() {
        let encoder = DaEncoder::new(DaEncoderParams::new(2));
        let shares = sorted_shares(2);
        let a = encoder.encode(&shares, &NoopVisitor).unwrap();
        let b = encoder.encode(&shares, &NoopVisitor).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn parity_commits_under_the_sentinel() {
        let encoder = DaEncoder::new(DaEncoderParams::new(2));
        let shares = sorted_shares(2);
        let encoded = encoder.encode(&shares, &NoopVisitor).unwrap();
        // data rows range over their namespaces, parity rows over the sentinel
        assert_eq!(encoded.row_roots[0].min_namespace(), shares[0].namespace());
        assert!(encoded.row_roots[3].is_parity());
        assert!(encoded.column_roots[3].is_parity());
        // data row ranges ignore their parity tail
        assert_eq!(encoded.row_roots[0].max_namespace(), shares[1].namespace());
    }

    #[test]
    fn rejects_the_wrong_share_count() {
        let encoder = DaEncoder::new(DaEncoderParams::new(2));
        let shares = sorted_shares(2);
        assert!(matches!(
            encoder.encode(&shares[..3], &NoopVisitor),
            Err(EncodingError::WrongShareCount { got: 3, want: 4 })
        ));
    }

    #[test]
    fn rejects_widths_the_codec_cannot_extend() {
        let encoder = DaEncoder::new(DaEncoderParams::new(3));
        let shares = sorted_shares(3);
        assert!(matches!(
            encoder.encode(&shares, &NoopVisitor),
            Err(EncodingError::UnsupportedWidth(3))
        ));
    }

    #[test]
    fn unordered_input_fails_before_any_visit() {
        let encoder = DaEncoder::new(DaEncoderParams::new(2));
        let mut shares = sorted_shares(2);
        shares.swap(0, 3);

        let visits = AtomicUsize::new(0);
        struct Counting<'a>(&'a AtomicUsize);
        impl NodeVisitor for Counting<'_> {
            fn visit_leaf(
                &self,
                _: &NamespacedHash,
                _: Namespace,
                _: &[u8],
            ) -> Result<(), CommitError> {
                self.0.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            fn visit_inner(
                &self,
                _: &NamespacedHash,
                _: &NamespacedHash,
                _: &NamespacedHash,
            ) -> Result<(), CommitError> {
                self.0.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
        }

        let err = encoder.encode(&shares, &Counting(&visits)).unwrap_err();
        assert!(matches!(
            err,
            EncodingError::Ordering(NmtError::OrderingViolation { .. })
        ));
        assert_eq!(visits.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn visitor_failure_aborts_the_encode() {
        struct Failing;
        impl NodeVisitor for Failing {
            fn visit_leaf(
                &self,
                _: &NamespacedHash,
                _: Namespace,
                _: &[u8],
            ) -> Result<(), CommitError> {
                Err(CommitError::new("backend gone"))
            }
            fn visit_inner(
                &self,
                _: &NamespacedHash,
                _: &NamespacedHash,
                _: &NamespacedHash,
            ) -> Result<(), CommitError> {
                Ok(())
            }
        }

        let encoder = DaEncoder::new(DaEncoderParams::new(2));
        let shares = sorted_shares(2);
        assert!(matches!(
            encoder.encode(&shares, &Failing),
            Err(EncodingError::Commit(_))
        ));
    }

    #[test]
    fn tampering_one_cell_flips_exactly_one_row_and_column_root() {
        let encoder = DaEncoder::new(DaEncoderParams::new(4));
        let shares = sorted_shares(4);
        let encoded = encoder.encode(&shares, &NoopVisitor).unwrap();

        let mut tampered = encoded.square.shares().to_vec();
        let idx = 8 + 2; // row 1, column 2
        let kept_ns = tampered[idx].namespace();
        tampered[idx] = Share::build(kept_ns, &rand_payload()).unwrap();
        let tampered = ExtendedDataSquare::from_shares(tampered, 8).unwrap();
        let (row_roots, column_roots) = encoder.commit(&tampered, &NoopVisitor).unwrap();

        let changed_rows: Vec<usize> = (0..8)
            .filter(|&r| row_roots[r] != encoded.row_roots[r])
            .collect();
        let changed_cols: Vec<usize> = (0..8)
            .filter(|&c| column_roots[c] != encoded.column_roots[c])
            .collect();
        assert_eq!(changed_rows, vec![1]);
        assert_eq!(changed_cols, vec![2]);
    }

    #[test]
    fn codec_errors_surface_typed() {
        struct Refusing;
        impl Codec for Refusing {
            fn encode(&self, _: &[Share]) -> Result<Vec<Share>, CodecError> {
                Err(CodecError::Codec("refused".into()))
            }
            fn reconstruct(&self, _: &mut [Option<Share>]) -> Result<(), CodecError> {
                Err(CodecError::Codec("refused".into()))
            }
            fn supports(&self, _: usize) -> bool {
                true
            }
        }

        let encoder = DaEncoder::with_codec(DaEncoderParams::new(2), Refusing);
        let shares = sorted_shares(2);
        assert!(matches!(
            encoder.encode(&shares, &NoopVisitor),
            Err(EncodingError::Codec(_))
        ));
    }
}
