//! Validated histogram requests
//!
//! [`HistogramRequest`] collects the optional parts of a call (bit depth,
//! mask, component selection, accumulation, scan options) and runs it on a
//! caller-supplied executor. Every check runs before any counter is
//! touched, so a rejected request leaves a caller's output exactly as it
//! was.

use log::debug;

use super::{Histogram, HistogramDims};
use crate::config::ScanOptions;
use crate::dispatch::{GrainExecutor, Sequential, dispatch};
use crate::error::{Error, Result};
use crate::image::{BitDepth, ImageView, MaskView, Sample};
use crate::region::Region;
use crate::tuning::{PixelLayout, TuningTable};

/// A histogram call under construction.
///
/// # Example
///
/// ```
/// use histoscan_core::{HistogramRequest, ImageView, MaskView, Sequential};
///
/// let pixels = [0u8, 1, 2, 3];
/// let keep = [1u8, 0, 1, 0];
/// let image = ImageView::from_shape(&pixels, &[2, 2]).unwrap();
/// let mask = MaskView::new(&keep, 2, 2).unwrap();
///
/// let hist = HistogramRequest::new(image)
///     .mask(mask)
///     .compute(&Sequential)
///     .unwrap();
/// assert_eq!(&hist.counts()[..4], &[1, 0, 1, 0]);
/// ```
#[derive(Debug, Clone)]
pub struct HistogramRequest<'a, T: Sample> {
    image: ImageView<'a, T>,
    bits: Option<u32>,
    mask: Option<MaskView<'a>>,
    components: Option<Vec<usize>>,
    accumulate: bool,
    options: ScanOptions,
    tuning_table: Option<&'a TuningTable>,
}

/// Everything needed to scan, after validation.
struct Plan<'a, T: Sample> {
    region: Region<'a, T>,
    depth: BitDepth,
    components: Vec<usize>,
    dims: HistogramDims,
    options: ScanOptions,
}

impl<'a, T: Sample> HistogramRequest<'a, T> {
    /// Start a request over every pixel and component of `image`.
    ///
    /// Defaults: full-range bits for `T`, no mask, all components in
    /// order, no accumulation, [`ScanOptions::default`].
    pub fn new(image: ImageView<'a, T>) -> Self {
        Self {
            image,
            bits: None,
            mask: None,
            components: None,
            accumulate: false,
            options: ScanOptions::default(),
            tuning_table: None,
        }
    }

    /// Significant bits per sample: 8, 12 or 16.
    pub fn bits(mut self, bits: u32) -> Self {
        self.bits = Some(bits);
        self
    }

    /// Count only pixels where `mask` is nonzero.
    pub fn mask(mut self, mask: MaskView<'a>) -> Self {
        self.mask = Some(mask);
        self
    }

    /// Count these components, in this order, one output row each.
    ///
    /// Duplicates are allowed. An explicit selection always produces a
    /// two-dimensional result, even for a single component. Without a
    /// selection, 1-D and 2-D images give a flat result and 3-D images one
    /// row per component.
    pub fn components(mut self, components: &[usize]) -> Self {
        self.components = Some(components.to_vec());
        self
    }

    /// Add to the output's existing counts instead of replacing them.
    pub fn accumulate(mut self, accumulate: bool) -> Self {
        self.accumulate = accumulate;
        self
    }

    /// Scan options; replaces any earlier options.
    pub fn options(mut self, options: ScanOptions) -> Self {
        self.options = options;
        self
    }

    /// Pick stripes, unroll and grain size from `table` for this request's
    /// layout, depth and masking. Threading and range-check settings from
    /// [`HistogramRequest::options`] are kept.
    pub fn tuning_table(mut self, table: &'a TuningTable) -> Self {
        self.tuning_table = Some(table);
        self
    }

    /// The shape the result will have.
    ///
    /// # Errors
    ///
    /// Fails as [`HistogramRequest::compute`] does for an invalid bit depth
    /// or component selection.
    pub fn output_dims(&self) -> Result<HistogramDims> {
        let depth = self.depth()?;
        let components = self.selected_components()?;
        Ok(self.dims_for(depth, &components))
    }

    /// Compute a fresh histogram.
    ///
    /// # Errors
    ///
    /// - [`Error::InvalidBitDepth`] if the bit depth is not 8, 12 or 16, or
    ///   does not match the sample type
    /// - [`Error::InvalidParameter`] for an explicitly empty component list
    /// - [`Error::InvalidComponentIndex`] for a component index out of range
    /// - [`Error::ShapeMismatch`] if the mask shape differs from the image
    /// - [`Error::SampleOutOfRange`] if range checking is enabled and a
    ///   counted sample does not fit the bit depth
    pub fn compute(&self, executor: &dyn GrainExecutor) -> Result<Histogram> {
        let plan = self.plan()?;
        let mut out = Histogram::zeros(plan.dims);
        run(&plan, executor, out.counts_mut());
        Ok(out)
    }

    /// Compute into a caller-supplied histogram and hand it back.
    ///
    /// `out` is zeroed first unless accumulation was requested. If any
    /// check fails, `out` is left untouched.
    ///
    /// # Errors
    ///
    /// As [`HistogramRequest::compute`]; additionally
    /// [`Error::ShapeMismatch`] if `out` does not have the shape given by
    /// [`HistogramRequest::output_dims`].
    pub fn compute_into<'h>(
        &self,
        executor: &dyn GrainExecutor,
        out: &'h mut Histogram,
    ) -> Result<&'h mut Histogram> {
        let plan = self.plan()?;
        if out.dims() != plan.dims {
            return Err(Error::ShapeMismatch {
                what: "output",
                expected: plan.dims.shape(),
                actual: out.dims().shape(),
            });
        }
        if !self.accumulate {
            out.fill_zero();
        }
        run(&plan, executor, out.counts_mut());
        Ok(out)
    }

    fn depth(&self) -> Result<BitDepth> {
        let depth = match self.bits {
            Some(bits) => BitDepth::from_bits(bits)?,
            None => BitDepth::full_range::<T>(),
        };
        depth.check_container::<T>()?;
        Ok(depth)
    }

    fn selected_components(&self) -> Result<Vec<usize>> {
        let available = self.image.components();
        let Some(selection) = &self.components else {
            return Ok((0..available).collect());
        };
        if selection.is_empty() {
            return Err(Error::InvalidParameter(
                "component selection must not be empty".to_string(),
            ));
        }
        if let Some(&index) = selection.iter().find(|&&c| c >= available) {
            return Err(Error::InvalidComponentIndex {
                index,
                components: available,
            });
        }
        Ok(selection.clone())
    }

    fn dims_for(&self, depth: BitDepth, components: &[usize]) -> HistogramDims {
        let bins = depth.bins();
        // Without a component axis there is exactly one component.
        if self.components.is_none() && self.image.ndim() < 3 {
            HistogramDims::Flat { bins }
        } else {
            HistogramDims::Rows {
                rows: components.len(),
                bins,
            }
        }
    }

    fn plan(&self) -> Result<Plan<'a, T>> {
        let depth = self.depth()?;
        let components = self.selected_components()?;
        let dims = self.dims_for(depth, &components);
        let region = Region::new(self.image, self.mask)?;

        if self.options.check_samples
            && let Some(hit) = region.find_out_of_range(depth, &components)
        {
            return Err(Error::SampleOutOfRange {
                value: hit.value,
                bits: depth.bits(),
                row: hit.row,
                col: hit.col,
                component: hit.component,
            });
        }

        let mut options = self.options;
        if let Some(table) = self.tuning_table {
            let layout = PixelLayout::classify(self.image.components(), &components);
            let tuned = table.scan_options(layout, depth, self.mask.is_some(), self.image.width());
            debug!(
                "tuning for {layout} {}-bit masked={}: {:?}",
                depth.bits(),
                self.mask.is_some(),
                tuned.tuning
            );
            options.tuning = tuned.tuning;
        }

        Ok(Plan {
            region,
            depth,
            components,
            dims,
            options,
        })
    }
}

fn run<T: Sample>(plan: &Plan<'_, T>, executor: &dyn GrainExecutor, out: &mut [u32]) {
    dispatch(
        &plan.region,
        &plan.components,
        plan.depth,
        &plan.options,
        executor,
        out,
    );
}

/// Histogram every component of `image` at `bits` bits, single-threaded.
///
/// Shorthand for `HistogramRequest::new(image).bits(bits).compute(&Sequential)`.
///
/// # Errors
///
/// As [`HistogramRequest::compute`].
///
/// # Example
///
/// ```
/// use histoscan_core::{ImageView, histogram};
///
/// let data = [0u8, 1, 1, 2, 2, 2];
/// let image = ImageView::from_shape(&data, &[6]).unwrap();
/// let hist = histogram(image, 8).unwrap();
/// assert_eq!(hist.ndim(), 1);
/// assert_eq!(&hist.counts()[..3], &[1, 2, 3]);
/// ```
pub fn histogram<T: Sample>(image: ImageView<'_, T>, bits: u32) -> Result<Histogram> {
    HistogramRequest::new(image).bits(bits).compute(&Sequential)
}
