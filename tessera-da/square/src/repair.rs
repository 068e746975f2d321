// crates
use thiserror::Error;
// internal
use crate::codec::{Codec, CodecError};
use crate::eds::{Axis, ExtendedDataSquare};
use crate::encoder::{axis_root, data_prefix};
use crate::share::Share;
use crate::EncodingError;
use tessera_nmt::{NamespacedHash, NmtError, NoopVisitor};

#[derive(Debug, Error)]
pub enum RepairError {
    #[error("not enough shares to reconstruct the square")]
    Unavailable,
    #[error("reconstructed {axis} {index} does not match its committed root")]
    RootMismatch { axis: Axis, index: usize },
    #[error("row and column root counts differ: {rows} vs {columns}")]
    RootCountMismatch { rows: usize, columns: usize },
    #[error(transparent)]
    Encoding(#[from] EncodingError),
    #[error(transparent)]
    Codec(#[from] CodecError),
    #[error(transparent)]
    Tree(#[from] NmtError),
}

/// Rebuild a full extended square from whatever shares survived, verifying
/// every line against its committed root.
///
/// Rows and columns are solved crossword-style: any line with at least `k`
/// survivors is reconstructed, which can complete further lines on the other
/// axis; the scan repeats until the square closes or stops progressing. A
/// line whose recomputed root disagrees with the commitment is a sign of a
/// byzantine encoding and aborts immediately, complete inputs included, so
/// every returned square has had all `2·width` roots re-verified.
pub fn repair<C: Codec>(
    row_roots: &[NamespacedHash],
    column_roots: &[NamespacedHash],
    codec: &C,
    mut shares: Vec<Option<Share>>,
) -> Result<ExtendedDataSquare, RepairError> {
    let width = row_roots.len();
    if column_roots.len() != width {
        return Err(RepairError::RootCountMismatch {
            rows: width,
            columns: column_roots.len(),
        });
    }
    if width < 2 || !width.is_power_of_two() || !codec.supports(width / 2) {
        return Err(EncodingError::UnsupportedWidth(width).into());
    }
    if shares.len() != width * width {
        return Err(EncodingError::WrongShareCount {
            got: shares.len(),
            want: width * width,
        }
        .into());
    }
    let k = width / 2;

    let mut row_done = vec![false; width];
    let mut col_done = vec![false; width];

    loop {
        let mut progress = false;

        for row in 0..width {
            if row_done[row] {
                continue;
            }
            let line = &mut shares[row * width..(row + 1) * width];
            if !try_complete_line(codec, line, k)? {
                continue;
            }
            let root = axis_root(line.iter().flatten(), data_prefix(row, k), NoopVisitor)?;
            if root != row_roots[row] {
                return Err(RepairError::RootMismatch {
                    axis: Axis::Row,
                    index: row,
                });
            }
            row_done[row] = true;
            progress = true;
        }

        for col in 0..width {
            if col_done[col] {
                continue;
            }
            let mut line: Vec<Option<Share>> =
                (0..width).map(|row| shares[row * width + col].clone()).collect();
            if !try_complete_line(codec, &mut line, k)? {
                continue;
            }
            let root = axis_root(line.iter().flatten(), data_prefix(col, k), NoopVisitor)?;
            if root != column_roots[col] {
                return Err(RepairError::RootMismatch {
                    axis: Axis::Col,
                    index: col,
                });
            }
            for (row, share) in line.into_iter().enumerate() {
                let slot = &mut shares[row * width + col];
                if slot.is_none() {
                    *slot = share;
                }
            }
            col_done[col] = true;
            progress = true;
        }

        if row_done.iter().all(|&done| done) && col_done.iter().all(|&done| done) {
            break;
        }
        if !progress {
            return Err(RepairError::Unavailable);
        }
    }

    let shares: Vec<Share> = shares.into_iter().flatten().collect();
    Ok(ExtendedDataSquare::from_shares(shares, width)?)
}

/// Reconstruct a line in place when enough survivors exist. `Ok(true)` means
/// the line is now complete, `Ok(false)` that it still lacks shares.
fn try_complete_line<C: Codec>(
    codec: &C,
    line: &mut [Option<Share>],
    k: usize,
) -> Result<bool, RepairError> {
    let present = line.iter().filter(|share| share.is_some()).count();
    if present == line.len() {
        return Ok(true);
    }
    if present < k {
        return Ok(false);
    }
    codec.reconstruct(line)?;
    Ok(true)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::codec::RsGf8Codec;
    use crate::encoder::test::sorted_shares;
    use crate::encoder::{DaEncoder, DaEncoderParams, EncodedData};
    use crate::share::SHARE_SIZE;

    fn encoded(k: usize) -> EncodedData {
        DaEncoder::new(DaEncoderParams::new(k))
            .encode(&sorted_shares(k), &tessera_nmt::NoopVisitor)
            .unwrap()
    }

    fn present(encoded: &EncodedData) -> Vec<Option<Share>> {
        encoded.square.shares().iter().cloned().map(Some).collect()
    }

    #[test]
    fn complete_input_is_verified_and_returned() {
        let data = encoded(2);
        let repaired = repair(
            &data.row_roots,
            &data.column_roots,
            &RsGf8Codec::new(),
            present(&data),
        )
        .unwrap();
        assert_eq!(repaired, data.square);
    }

    #[test]
    fn half_of_every_row_recovers() {
        let data = encoded(2);
        let mut shares = present(&data);
        for row in 0..4 {
            for col in 0..2 {
                shares[row * 4 + col] = None;
            }
        }
        let repaired =
            repair(&data.row_roots, &data.column_roots, &RsGf8Codec::new(), shares).unwrap();
        assert_eq!(repaired, data.square);
    }

    #[test]
    fn missing_rows_are_rebuilt_through_columns() {
        let data = encoded(2);
        let mut shares = present(&data);
        // wipe the top half entirely: rows are unsolvable until the column
        // pass refills them
        for idx in 0..8 {
            shares[idx] = None;
        }
        let repaired =
            repair(&data.row_roots, &data.column_roots, &RsGf8Codec::new(), shares).unwrap();
        assert_eq!(repaired, data.square);
    }

    #[test]
    fn below_threshold_is_unavailable() {
        let data = encoded(2);
        let mut shares = vec![None; 16];
        shares[0] = Some(data.square.share(0, 0).unwrap().clone());
        shares[1] = Some(data.square.share(0, 1).unwrap().clone());
        let err = repair(&data.row_roots, &data.column_roots, &RsGf8Codec::new(), shares)
            .unwrap_err();
        assert!(matches!(err, RepairError::Unavailable));
    }

    #[test]
    fn tampered_share_is_flagged_as_byzantine() {
        let data = encoded(2);
        let mut shares = present(&data);
        shares[4 + 2] = Some(Share::from_slice(&[0xee; SHARE_SIZE]).unwrap());
        let err = repair(&data.row_roots, &data.column_roots, &RsGf8Codec::new(), shares)
            .unwrap_err();
        assert!(matches!(
            err,
            RepairError::RootMismatch {
                axis: Axis::Row,
                index: 1
            }
        ));
    }

    #[test]
    fn mismatched_root_counts_are_rejected() {
        let data = encoded(2);
        let err = repair(
            &data.row_roots,
            &data.column_roots[..3],
            &RsGf8Codec::new(),
            present(&data),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            RepairError::RootCountMismatch {
                rows: 4,
                columns: 3
            }
        ));
    }
}
