//! Per-pixel inclusion masks
//!
//! A mask is a borrowed `u8` buffer spatially aligned with the image. A
//! pixel is counted iff its mask value is nonzero; the same decision applies
//! to every component of that pixel.

use super::{canonical_shape, check_rect, required_len};
use crate::error::{Error, Result};

/// A borrowed, possibly strided, view of a `u8` inclusion mask.
#[derive(Debug, Clone, Copy)]
pub struct MaskView<'a> {
    data: &'a [u8],
    height: usize,
    width: usize,
    row_stride: usize,
    col_stride: usize,
}

impl<'a> MaskView<'a> {
    /// Create a mask over a row-major buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::BufferTooSmall`] if `data` holds fewer than
    /// `width * height` values.
    ///
    /// # Example
    ///
    /// ```
    /// use histoscan_core::MaskView;
    ///
    /// let mask = MaskView::new(&[1, 0, 1, 0], 2, 2).unwrap();
    /// assert!(mask.is_included(1, 0));
    /// assert!(!mask.is_included(1, 1));
    /// ```
    pub fn new(data: &'a [u8], width: usize, height: usize) -> Result<Self> {
        Self::from_shape(data, &[height, width])
    }

    /// Create a mask from a C-contiguous buffer and its shape.
    ///
    /// A 1-D shape `(len,)` is read as `(1, len)`, matching the image rule.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidDimension`] for anything but one or two axes
    /// - [`Error::BufferTooSmall`] if the buffer is too short
    pub fn from_shape(data: &'a [u8], shape: &[usize]) -> Result<Self> {
        let (height, width) = mask_shape(shape)?;
        Self::with_strides(data, height, width, width, 1)
    }

    /// Create a mask with arbitrary element strides, one per axis.
    ///
    /// # Errors
    ///
    /// As [`MaskView::from_shape`]; additionally
    /// [`Error::InvalidDimension`] if `strides.len() != shape.len()`.
    pub fn from_shape_strides(data: &'a [u8], shape: &[usize], strides: &[usize]) -> Result<Self> {
        if strides.len() != shape.len() {
            return Err(Error::InvalidDimension(format!(
                "{} mask strides given for {} axes",
                strides.len(),
                shape.len()
            )));
        }
        let (height, width) = mask_shape(shape)?;
        let (row_stride, col_stride) = match *strides {
            [col] => (0, col),
            [row, col] => (row, col),
            _ => unreachable!("mask_shape accepts 1 or 2 axes"),
        };
        Self::with_strides(data, height, width, row_stride, col_stride)
    }

    fn with_strides(
        data: &'a [u8],
        height: usize,
        width: usize,
        row_stride: usize,
        col_stride: usize,
    ) -> Result<Self> {
        let required = required_len(&[(height, row_stride), (width, col_stride)]);
        if required > data.len() {
            return Err(Error::BufferTooSmall {
                required,
                len: data.len(),
            });
        }
        Ok(Self {
            data,
            height,
            width,
            row_stride,
            col_stride,
        })
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of columns.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Element stride between rows.
    pub fn row_stride(&self) -> usize {
        self.row_stride
    }

    /// Element stride between columns.
    pub fn col_stride(&self) -> usize {
        self.col_stride
    }

    /// The borrowed buffer.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Whether pixel `(row, col)` takes part in the histogram.
    #[inline(always)]
    pub fn is_included(&self, row: usize, col: usize) -> bool {
        self.data[row * self.row_stride + col * self.col_stride] != 0
    }

    /// Number of included pixels.
    pub fn count_included(&self) -> usize {
        (0..self.height)
            .map(|row| {
                (0..self.width)
                    .filter(|&col| self.is_included(row, col))
                    .count()
            })
            .sum()
    }

    /// A rectangular sub-mask sharing the same buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if the rectangle does not fit.
    pub fn crop(&self, x: usize, y: usize, width: usize, height: usize) -> Result<Self> {
        check_rect(x, y, width, height, self.width, self.height)?;
        let data = self.data;
        let data = if width == 0 || height == 0 {
            &data[..0]
        } else {
            &data[y * self.row_stride + x * self.col_stride..]
        };
        Ok(Self {
            data,
            height,
            width,
            ..*self
        })
    }
}

fn mask_shape(shape: &[usize]) -> Result<(usize, usize)> {
    if shape.len() > 2 {
        return Err(Error::InvalidDimension(format!(
            "mask must have 1 or 2 axes, got {}",
            shape.len()
        )));
    }
    let (height, width, _) = canonical_shape(shape)?;
    Ok((height, width))
}
