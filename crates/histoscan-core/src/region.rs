//! Row regions and mask filtering
//!
//! A [`Region`] binds an image view, an optional mask and a contiguous range
//! of rows. It is the unit of work handed to the scan kernel: the dispatcher
//! splits the full image region into grains with [`Region::split_rows`] and
//! every grain is scanned independently.
//!
//! Walking a region honours the view's row and column strides, so strided
//! and column-major sources are read in place.

use std::ops::Range;

use crate::error::{Error, Result};
use crate::image::{BitDepth, ImageView, MaskView, Sample};

/// An image, its optional mask, and a row range `[start, end)`.
#[derive(Debug, Clone)]
pub struct Region<'a, T: Sample> {
    image: ImageView<'a, T>,
    mask: Option<MaskView<'a>>,
    rows: Range<usize>,
}

/// A sample that does not fit the declared bit depth.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutOfRange {
    pub row: usize,
    pub col: usize,
    pub component: usize,
    pub value: u32,
}

impl<'a, T: Sample> Region<'a, T> {
    /// Create a region covering every row of `image`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ShapeMismatch`] if the mask is not exactly
    /// `(height, width)` of the image.
    pub fn new(image: ImageView<'a, T>, mask: Option<MaskView<'a>>) -> Result<Self> {
        if let Some(m) = &mask
            && (m.height() != image.height() || m.width() != image.width())
        {
            return Err(Error::ShapeMismatch {
                what: "mask",
                expected: vec![image.height(), image.width()],
                actual: vec![m.height(), m.width()],
            });
        }
        let rows = 0..image.height();
        Ok(Self { image, mask, rows })
    }

    /// The underlying image view.
    pub fn image(&self) -> &ImageView<'a, T> {
        &self.image
    }

    /// The mask, if any.
    pub fn mask(&self) -> Option<&MaskView<'a>> {
        self.mask.as_ref()
    }

    /// Rows covered by this region.
    pub fn rows(&self) -> Range<usize> {
        self.rows.clone()
    }

    /// Pixels per row.
    pub fn width(&self) -> usize {
        self.image.width()
    }

    /// Pixel positions covered, ignoring the mask.
    pub fn pixel_count(&self) -> usize {
        self.rows.len() * self.image.width()
    }

    /// Whether the region covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty() || self.image.width() == 0
    }

    /// A sub-region over `rows`, which must lie inside this region.
    ///
    /// # Panics
    ///
    /// Panics if `rows` is not contained in [`Region::rows`].
    pub fn with_rows(&self, rows: Range<usize>) -> Self {
        assert!(
            rows.start >= self.rows.start && rows.end <= self.rows.end && rows.start <= rows.end,
            "rows {rows:?} outside region {:?}",
            self.rows
        );
        Self {
            image: self.image,
            mask: self.mask,
            rows,
        }
    }

    /// Split into consecutive sub-regions of `grain_rows` rows each.
    ///
    /// The last grain may be shorter. An empty row range yields nothing.
    ///
    /// # Panics
    ///
    /// Panics if `grain_rows` is zero.
    pub fn split_rows(&self, grain_rows: usize) -> impl Iterator<Item = Region<'a, T>> + '_ {
        assert!(grain_rows > 0, "grain_rows must be >= 1");
        self.rows
            .clone()
            .step_by(grain_rows)
            .map(move |start| self.with_rows(start..(start + grain_rows).min(self.rows.end)))
    }

    /// Whether pixel `(row, col)` passes the mask.
    #[inline(always)]
    pub fn is_included(&self, row: usize, col: usize) -> bool {
        self.mask.as_ref().is_none_or(|m| m.is_included(row, col))
    }

    /// Iterate included `(row, col)` positions in row-major order.
    pub fn positions(&self) -> Positions<'_, 'a, T> {
        Positions {
            region: self,
            row: self.rows.start,
            col: 0,
        }
    }

    /// Iterate included pixels together with their samples.
    pub fn pixels(&self) -> impl Iterator<Item = RegionPixel<'_, 'a, T>> + '_ {
        self.positions().map(move |(row, col)| RegionPixel {
            image: &self.image,
            row,
            col,
        })
    }

    /// Find the first selected sample that is `>= 2^bits`.
    ///
    /// Only included pixels and selected components are examined. This is
    /// a separate pass kept off the counting hot path.
    pub fn find_out_of_range(&self, depth: BitDepth, components: &[usize]) -> Option<OutOfRange> {
        if !depth.narrower_than::<T>() {
            return None;
        }
        let limit = depth.bins();
        self.pixels().find_map(|px| {
            components.iter().find_map(|&component| {
                let value = px.sample(component).to_index();
                (value >= limit).then_some(OutOfRange {
                    row: px.row,
                    col: px.col,
                    component,
                    value: value as u32,
                })
            })
        })
    }
}

/// Iterator over included positions of a [`Region`].
pub struct Positions<'r, 'a, T: Sample> {
    region: &'r Region<'a, T>,
    row: usize,
    col: usize,
}

impl<T: Sample> Iterator for Positions<'_, '_, T> {
    type Item = (usize, usize);

    fn next(&mut self) -> Option<Self::Item> {
        let width = self.region.width();
        while self.row < self.region.rows.end {
            while self.col < width {
                let col = self.col;
                self.col += 1;
                if self.region.is_included(self.row, col) {
                    return Some((self.row, col));
                }
            }
            self.row += 1;
            self.col = 0;
        }
        None
    }
}

/// One included pixel of a region.
#[derive(Debug, Clone, Copy)]
pub struct RegionPixel<'r, 'a, T: Sample> {
    image: &'r ImageView<'a, T>,
    pub row: usize,
    pub col: usize,
}

impl<T: Sample> RegionPixel<'_, '_, T> {
    /// Sample of `component` at this pixel.
    #[inline]
    pub fn sample(&self, component: usize) -> T {
        self.image.sample(self.row, self.col, component)
    }
}
