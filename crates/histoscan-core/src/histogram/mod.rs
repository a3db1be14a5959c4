//! Histogram results and the top-level histogram call
//!
//! A [`Histogram`] owns a block of `u32` counts laid out as one row of
//! `2^bits` bins per counted component. Its [`HistogramDims`] record
//! whether the result is one-dimensional (a single implicit row) or
//! two-dimensional (explicit rows).

mod compute;

pub use compute::{HistogramRequest, histogram};

use std::ops::Index;

use crate::error::{Error, Result};

/// Shape of a histogram.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HistogramDims {
    /// One implicit row, shape `(bins,)`
    Flat { bins: usize },
    /// Explicit rows, shape `(rows, bins)`
    Rows { rows: usize, bins: usize },
}

impl HistogramDims {
    /// Bins per row.
    pub fn bins(&self) -> usize {
        match *self {
            HistogramDims::Flat { bins } | HistogramDims::Rows { bins, .. } => bins,
        }
    }

    /// Number of rows; 1 for a flat histogram.
    pub fn rows(&self) -> usize {
        match *self {
            HistogramDims::Flat { .. } => 1,
            HistogramDims::Rows { rows, .. } => rows,
        }
    }

    /// Number of axes, 1 or 2.
    pub fn ndim(&self) -> usize {
        match self {
            HistogramDims::Flat { .. } => 1,
            HistogramDims::Rows { .. } => 2,
        }
    }

    /// Total number of counters.
    pub fn len(&self) -> usize {
        self.rows() * self.bins()
    }

    /// Whether there are no counters at all.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The shape as a list of extents.
    pub fn shape(&self) -> Vec<usize> {
        match *self {
            HistogramDims::Flat { bins } => vec![bins],
            HistogramDims::Rows { rows, bins } => vec![rows, bins],
        }
    }
}

/// Owned per-component bin counts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Histogram {
    counts: Vec<u32>,
    dims: HistogramDims,
}

impl Histogram {
    /// A zero-filled histogram of the given shape.
    pub fn zeros(dims: HistogramDims) -> Self {
        Self {
            counts: vec![0; dims.len()],
            dims,
        }
    }

    /// Wrap existing counts.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if `counts.len()` does not equal
    /// the number of counters in `dims`.
    pub fn from_vec(counts: Vec<u32>, dims: HistogramDims) -> Result<Self> {
        if counts.len() != dims.len() {
            return Err(Error::ShapeMismatch {
                what: "histogram counts",
                expected: vec![dims.len()],
                actual: vec![counts.len()],
            });
        }
        Ok(Self { counts, dims })
    }

    /// The shape of this histogram.
    pub fn dims(&self) -> HistogramDims {
        self.dims
    }

    /// Number of axes, 1 or 2.
    pub fn ndim(&self) -> usize {
        self.dims.ndim()
    }

    /// Bins per row.
    pub fn bins(&self) -> usize {
        self.dims.bins()
    }

    /// Number of rows; 1 for a flat histogram.
    pub fn rows(&self) -> usize {
        self.dims.rows()
    }

    /// Counts of one row.
    ///
    /// # Panics
    ///
    /// Panics if `row >= self.rows()`.
    pub fn row(&self, row: usize) -> &[u32] {
        let bins = self.bins();
        &self.counts[row * bins..(row + 1) * bins]
    }

    /// Mutable counts of one row.
    ///
    /// # Panics
    ///
    /// Panics if `row >= self.rows()`.
    pub fn row_mut(&mut self, row: usize) -> &mut [u32] {
        let bins = self.bins();
        &mut self.counts[row * bins..(row + 1) * bins]
    }

    /// All counts, row after row.
    pub fn counts(&self) -> &[u32] {
        &self.counts
    }

    /// All counts, mutable.
    pub fn counts_mut(&mut self) -> &mut [u32] {
        &mut self.counts
    }

    /// Count at `(row, bin)`, or `None` if out of range.
    pub fn get(&self, row: usize, bin: usize) -> Option<u32> {
        if row >= self.rows() || bin >= self.bins() {
            return None;
        }
        Some(self.counts[row * self.bins() + bin])
    }

    /// Sum of one row.
    ///
    /// # Panics
    ///
    /// Panics if `row >= self.rows()`.
    pub fn total(&self, row: usize) -> u64 {
        self.row(row).iter().map(|&c| u64::from(c)).sum()
    }

    /// Reset every count to zero.
    pub fn fill_zero(&mut self) {
        self.counts.fill(0);
    }

    /// Add another histogram of the same shape, bin by bin.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if the shapes differ.
    pub fn add_assign(&mut self, other: &Histogram) -> Result<()> {
        if self.dims != other.dims {
            return Err(Error::ShapeMismatch {
                what: "histogram",
                expected: self.dims.shape(),
                actual: other.dims.shape(),
            });
        }
        for (dst, src) in self.counts.iter_mut().zip(&other.counts) {
            *dst += *src;
        }
        Ok(())
    }

    /// Take the counts out.
    pub fn into_vec(self) -> Vec<u32> {
        self.counts
    }
}

impl Index<usize> for Histogram {
    type Output = u32;

    fn index(&self, index: usize) -> &u32 {
        &self.counts[index]
    }
}
