//! Borrowed pixel buffers
//!
//! The engine never owns pixel data. Callers describe their memory with an
//! [`ImageView`] (and optionally a [`MaskView`]): a borrowed slice plus
//! per-axis extents and element strides. Any host array, sliced view or
//! column-major buffer can be expressed this way without copying.
//!
//! # Canonical shape
//!
//! Whatever the source dimensionality, a view is normalized to
//! `(height, width, components)`:
//!
//! - 1-D `(len,)` → `(1, len, 1)`
//! - 2-D `(h, w)` → `(h, w, 1)`
//! - 3-D `(h, w, c)` → `(h, w, c)`; the component axis is always last
//!
//! More than three axes is an [`Error::InvalidDimension`]. The view keeps
//! the number of axes it was built from; a 3-D source always has a
//! component axis, even when that axis has length one.

mod mask;

pub use mask::MaskView;

use crate::error::{Error, Result};

/// An unsigned sample type that can be histogrammed.
///
/// Implemented for `u8` (8-bit data) and `u16` (12- and 16-bit data).
pub trait Sample: Copy + Send + Sync + std::fmt::Debug + 'static {
    /// Width of the storage type in bits.
    const CONTAINER_BITS: u32;

    /// The sample value as a bin index.
    fn to_index(self) -> usize;
}

impl Sample for u8 {
    const CONTAINER_BITS: u32 = 8;

    #[inline(always)]
    fn to_index(self) -> usize {
        self as usize
    }
}

impl Sample for u16 {
    const CONTAINER_BITS: u32 = 16;

    #[inline(always)]
    fn to_index(self) -> usize {
        self as usize
    }
}

/// Number of significant bits per sample.
///
/// Determines the histogram width: `2^bits` bins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u32)]
pub enum BitDepth {
    /// 8-bit samples stored in `u8`
    Bit8 = 8,
    /// 12-bit samples stored in `u16`
    Bit12 = 12,
    /// 16-bit samples stored in `u16`
    Bit16 = 16,
}

impl BitDepth {
    /// Create a `BitDepth` from a raw bit count.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBitDepth`] if `bits` is not 8, 12, or 16.
    pub fn from_bits(bits: u32) -> Result<Self> {
        match bits {
            8 => Ok(BitDepth::Bit8),
            12 => Ok(BitDepth::Bit12),
            16 => Ok(BitDepth::Bit16),
            _ => Err(Error::InvalidBitDepth {
                bits,
                reason: "must be 8, 12 or 16".to_string(),
            }),
        }
    }

    /// Full-range depth for a sample type (8 for `u8`, 16 for `u16`).
    pub fn full_range<T: Sample>() -> Self {
        if T::CONTAINER_BITS == 8 {
            BitDepth::Bit8
        } else {
            BitDepth::Bit16
        }
    }

    /// Get the number of significant bits.
    pub fn bits(self) -> u32 {
        self as u32
    }

    /// Number of histogram bins, `2^bits`.
    pub fn bins(self) -> usize {
        1usize << self.bits()
    }

    /// Largest in-range sample value.
    pub fn max_value(self) -> u32 {
        (1u32 << self.bits()) - 1
    }

    /// Check that samples of type `T` carry this depth.
    ///
    /// 8-bit data must be stored in `u8`; 12- and 16-bit data in `u16`.
    /// No implicit widening or narrowing is performed.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBitDepth`] if the container width is wrong.
    pub fn check_container<T: Sample>(self) -> Result<()> {
        let required = match self {
            BitDepth::Bit8 => 8,
            BitDepth::Bit12 | BitDepth::Bit16 => 16,
        };
        if T::CONTAINER_BITS != required {
            return Err(Error::InvalidBitDepth {
                bits: self.bits(),
                reason: format!(
                    "needs {required}-bit samples, got {}-bit",
                    T::CONTAINER_BITS
                ),
            });
        }
        Ok(())
    }

    /// Whether a `T` can hold values outside this depth's range.
    pub fn narrower_than<T: Sample>(self) -> bool {
        self.bits() < T::CONTAINER_BITS
    }
}

/// A borrowed, possibly strided, view of pixel samples.
///
/// All strides are in elements, not bytes. The view is read-only and valid
/// for the lifetime of the borrowed slice.
#[derive(Debug, Clone, Copy)]
pub struct ImageView<'a, T: Sample> {
    data: &'a [T],
    height: usize,
    width: usize,
    components: usize,
    row_stride: usize,
    col_stride: usize,
    component_stride: usize,
    ndim: usize,
}

impl<'a, T: Sample> ImageView<'a, T> {
    /// Create a view over a C-contiguous buffer of interleaved pixels.
    ///
    /// # Arguments
    ///
    /// * `data` - Sample buffer, row-major, components interleaved
    /// * `width` - Pixels per row
    /// * `height` - Number of rows
    /// * `components` - Samples per pixel
    ///
    /// # Errors
    ///
    /// Returns an error if `components` is zero or the buffer is too short.
    ///
    /// # Example
    ///
    /// ```
    /// use histoscan_core::ImageView;
    ///
    /// let rgb = [0u8, 1, 2, 3, 4, 5];
    /// let view = ImageView::new(&rgb, 2, 1, 3).unwrap();
    /// assert_eq!(view.components(), 3);
    /// assert_eq!(view.sample(0, 1, 2), 5);
    /// ```
    pub fn new(data: &'a [T], width: usize, height: usize, components: usize) -> Result<Self> {
        Self::from_shape(data, &[height, width, components])
    }

    /// Create a view from a C-contiguous buffer and its shape.
    ///
    /// The shape follows the dimension inference rules in the module docs.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidDimension`] for zero or more than three axes, or a
    ///   zero-length component axis
    /// - [`Error::BufferTooSmall`] if the shape needs more elements than
    ///   `data` holds
    pub fn from_shape(data: &'a [T], shape: &[usize]) -> Result<Self> {
        let (height, width, components) = canonical_shape(shape)?;
        Self::with_strides(
            data,
            height,
            width,
            components,
            width * components,
            components,
            1,
            shape.len(),
        )
    }

    /// Create a view from a buffer with arbitrary element strides.
    ///
    /// `strides` has one entry per axis of `shape`. Column-major and
    /// sliced sources are expressed here rather than copied.
    ///
    /// # Errors
    ///
    /// As [`ImageView::from_shape`]; additionally
    /// [`Error::InvalidDimension`] if `strides.len() != shape.len()`.
    pub fn from_shape_strides(data: &'a [T], shape: &[usize], strides: &[usize]) -> Result<Self> {
        if strides.len() != shape.len() {
            return Err(Error::InvalidDimension(format!(
                "{} strides given for {} axes",
                strides.len(),
                shape.len()
            )));
        }
        let (height, width, components) = canonical_shape(shape)?;
        let (row_stride, col_stride, component_stride) = match *strides {
            [col] => (0, col, 0),
            [row, col] => (row, col, 0),
            [row, col, comp] => (row, col, comp),
            _ => unreachable!("canonical_shape accepts 1 to 3 axes"),
        };
        Self::with_strides(
            data,
            height,
            width,
            components,
            row_stride,
            col_stride,
            component_stride,
            shape.len(),
        )
    }

    #[allow(clippy::too_many_arguments)]
    fn with_strides(
        data: &'a [T],
        height: usize,
        width: usize,
        components: usize,
        row_stride: usize,
        col_stride: usize,
        component_stride: usize,
        ndim: usize,
    ) -> Result<Self> {
        if components == 0 {
            return Err(Error::InvalidDimension(
                "image must have at least one component".to_string(),
            ));
        }
        let required = required_len(&[
            (height, row_stride),
            (width, col_stride),
            (components, component_stride),
        ]);
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
            components,
            row_stride,
            col_stride,
            component_stride,
            ndim,
        })
    }

    /// Number of axes of the source shape: 1, 2 or 3.
    ///
    /// [`ImageView::new`] always builds a 3-axis view.
    pub fn ndim(&self) -> usize {
        self.ndim
    }

    /// Number of rows.
    pub fn height(&self) -> usize {
        self.height
    }

    /// Number of pixels per row.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Samples per pixel.
    pub fn components(&self) -> usize {
        self.components
    }

    /// Total pixel count, `height * width`.
    pub fn pixel_count(&self) -> usize {
        self.height * self.width
    }

    /// Whether the view covers no pixels.
    pub fn is_empty(&self) -> bool {
        self.height == 0 || self.width == 0
    }

    /// Element stride between rows.
    pub fn row_stride(&self) -> usize {
        self.row_stride
    }

    /// Element stride between pixels in a row.
    pub fn col_stride(&self) -> usize {
        self.col_stride
    }

    /// Element stride between components of a pixel.
    pub fn component_stride(&self) -> usize {
        self.component_stride
    }

    /// The borrowed buffer.
    pub fn data(&self) -> &'a [T] {
        self.data
    }

    /// Element offset of the first sample of pixel `(row, col)`.
    #[inline(always)]
    pub fn pixel_offset(&self, row: usize, col: usize) -> usize {
        row * self.row_stride + col * self.col_stride
    }

    /// Read one sample.
    ///
    /// # Panics
    ///
    /// Panics if `(row, col, component)` lies outside the view.
    #[inline]
    pub fn sample(&self, row: usize, col: usize, component: usize) -> T {
        assert!(
            row < self.height && col < self.width && component < self.components,
            "sample ({row}, {col}, {component}) outside {}x{}x{} view",
            self.height,
            self.width,
            self.components
        );
        self.data[self.pixel_offset(row, col) + component * self.component_stride]
    }

    /// A rectangular sub-view sharing the same buffer.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if the rectangle does not fit
    /// inside the view.
    pub fn crop(&self, x: usize, y: usize, width: usize, height: usize) -> Result<Self> {
        check_rect(x, y, width, height, self.width, self.height)?;
        let data = self.data;
        let data = if width == 0 || height == 0 {
            &data[..0]
        } else {
            &data[self.pixel_offset(y, x)..]
        };
        Ok(Self {
            data,
            height,
            width,
            ..*self
        })
    }
}

/// Normalize a 1-, 2- or 3-axis shape to `(height, width, components)`.
pub(crate) fn canonical_shape(shape: &[usize]) -> Result<(usize, usize, usize)> {
    match *shape {
        [len] => Ok((1, len, 1)),
        [h, w] => Ok((h, w, 1)),
        [h, w, c] => Ok((h, w, c)),
        _ => Err(Error::InvalidDimension(format!(
            "expected 1 to 3 axes, got {}",
            shape.len()
        ))),
    }
}

/// Elements needed to reach the last addressable sample.
///
/// Returns 0 when any extent is zero and `usize::MAX` on overflow.
pub(crate) fn required_len(axes: &[(usize, usize)]) -> usize {
    if axes.iter().any(|&(extent, _)| extent == 0) {
        return 0;
    }
    axes.iter()
        .try_fold(1usize, |acc, &(extent, stride)| {
            (extent - 1)
                .checked_mul(stride)
                .and_then(|span| acc.checked_add(span))
        })
        .unwrap_or(usize::MAX)
}

pub(crate) fn check_rect(
    x: usize,
    y: usize,
    width: usize,
    height: usize,
    full_width: usize,
    full_height: usize,
) -> Result<()> {
    let fits_x = x.checked_add(width).is_some_and(|end| end <= full_width);
    let fits_y = y.checked_add(height).is_some_and(|end| end <= full_height);
    if !fits_x || !fits_y {
        return Err(Error::InvalidParameter(format!(
            "region {width}x{height} at ({x}, {y}) outside {full_width}x{full_height} image"
        )));
    }
    Ok(())
}
