// std
use std::fmt;
// internal
use crate::share::Share;
use crate::EncodingError;

/// Row or column orientation inside a square.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Row,
    Col,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Row => write!(f, "row"),
            Axis::Col => write!(f, "column"),
        }
    }
}

/// Erasure-extended `2k × 2k` square in row-major order.
///
/// The upper-left `k × k` quadrant holds the original shares; the other
/// three quadrants are parity: rows extend rightward, columns extend
/// downward, and the lower-right quadrant is parity of parity (identical
/// whichever axis produced it, the code being linear).
#[derive(Clone, PartialEq, Eq)]
pub struct ExtendedDataSquare {
    width: usize,
    shares: Vec<Share>,
}

impl ExtendedDataSquare {
    /// Wrap a flat row-major share vector of extended width `width` (2k).
    pub fn from_shares(shares: Vec<Share>, width: usize) -> Result<Self, EncodingError> {
        if width < 2 || !width.is_power_of_two() {
            return Err(EncodingError::UnsupportedWidth(width));
        }
        if shares.len() != width * width {
            return Err(EncodingError::WrongShareCount {
                got: shares.len(),
                want: width * width,
            });
        }
        Ok(Self { width, shares })
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn original_width(&self) -> usize {
        self.width / 2
    }

    pub fn share(&self, row: usize, col: usize) -> Option<&Share> {
        if row < self.width && col < self.width {
            self.shares.get(row * self.width + col)
        } else {
            None
        }
    }

    pub fn row(&self, row: usize) -> Option<&[Share]> {
        if row < self.width {
            Some(&self.shares[row * self.width..(row + 1) * self.width])
        } else {
            None
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[Share]> {
        self.shares.chunks(self.width)
    }

    /// Top-to-bottom walk of column `col`; `col` must be below the width.
    pub fn column(&self, col: usize) -> impl Iterator<Item = &Share> + '_ {
        debug_assert!(col < self.width);
        self.shares.iter().skip(col).step_by(self.width)
    }

    /// Whether the coordinate lies outside the original data quadrant.
    pub fn is_parity(&self, row: usize, col: usize) -> bool {
        let k = self.original_width();
        row >= k || col >= k
    }

    pub fn shares(&self) -> &[Share] {
        &self.shares
    }
}

impl fmt::Debug for ExtendedDataSquare {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ExtendedDataSquare({0}x{0})", self.width)
    }
}
