//! Striped, unrolled counting kernel
//!
//! A single counter per bin serializes the scan: consecutive equal samples
//! hit the same memory location and each increment waits for the previous
//! store. The kernel therefore keeps `stripes` independent banks of
//! counters per component, feeds consecutive pixels to different banks, and
//! folds the banks together once its rows are done.
//!
//! Pixels are processed in blocks of `unroll`: the bins of a whole block are
//! computed first, then the increments are issued. Pixels that do not fill a
//! final block go through the plain reference loop.
//!
//! When the bit depth is narrower than the sample type (12-bit data in
//! `u16`), every bank carries one extra overflow bin. Samples `>= 2^bits`
//! land there and are discarded by the fold, so the hot path needs no range
//! branch and can never index outside the arena.
//!
//! Counts are added into the output, never assigned, so scanning on top of
//! existing counts accumulates.

use crate::config::StripeConfig;
use crate::image::{BitDepth, Sample};
use crate::region::Region;

/// Counters indexed by `(stripe, component, bin)`.
///
/// Allocated once per scan or per worker and folded down at the end. Any
/// number of regions can be scanned into one arena before the fold.
#[derive(Debug)]
pub struct StripeArena {
    counts: Vec<u32>,
    stripes: usize,
    components: usize,
    stripe_len: usize,
}

impl StripeArena {
    /// Allocate zeroed banks for `stripes × components × stripe_len` bins.
    pub fn new(stripes: usize, components: usize, stripe_len: usize) -> Self {
        Self {
            counts: vec![0; stripes * components * stripe_len],
            stripes,
            components,
            stripe_len,
        }
    }

    /// An arena sized for `components` counted samples of type `T` at
    /// `depth`, with an overflow bin per bank when `T` is wider than the
    /// depth.
    pub fn for_scan<T: Sample>(config: &StripeConfig, components: usize, depth: BitDepth) -> Self {
        let overflow = depth.narrower_than::<T>();
        Self::new(
            config.stripes(),
            components,
            depth.bins() + usize::from(overflow),
        )
    }

    /// Number of banks.
    pub fn stripes(&self) -> usize {
        self.stripes
    }

    #[inline(always)]
    fn increment(&mut self, stripe: usize, component: usize, bin: usize) {
        self.counts[(stripe * self.components + component) * self.stripe_len + bin] += 1;
    }

    /// Add the first `bins` bins of every bank into `out`.
    ///
    /// `out` is laid out as `components × bins`. Overflow bins beyond
    /// `bins` are dropped.
    pub fn fold_into(&self, out: &mut [u32], bins: usize) {
        let bank = self.components * self.stripe_len;
        for component in 0..self.components {
            let dst = &mut out[component * bins..(component + 1) * bins];
            for stripe in self.counts.chunks_exact(bank) {
                let src = &stripe[component * self.stripe_len..][..bins];
                for (d, s) in dst.iter_mut().zip(src) {
                    *d += *s;
                }
            }
        }
    }
}

/// Count one sample at a time.
///
/// The plain reference scan: every striped or threaded result must equal
/// this. Samples `>= 2^bits` are skipped. `out` is `components.len() × bins`
/// and is added to.
pub fn scan_reference<T: Sample>(
    region: &Region<'_, T>,
    components: &[usize],
    depth: BitDepth,
    out: &mut [u32],
) {
    let bins = depth.bins();
    debug_assert_eq!(out.len(), components.len() * bins);
    for px in region.pixels() {
        for (i, &component) in components.iter().enumerate() {
            let bin = px.sample(component).to_index();
            if bin < bins {
                out[i * bins + bin] += 1;
            }
        }
    }
}

/// A run of pixels at a constant stride in both image and mask.
#[derive(Debug, Clone, Copy)]
struct Span {
    start: usize,
    mask_start: usize,
    len: usize,
}

/// Count the pixels of `region` using striped accumulation.
///
/// Produces exactly the counts of [`scan_reference`] for any valid
/// `config`; only `stripes` and `unroll` are used here.
pub fn scan_striped<T: Sample>(
    region: &Region<'_, T>,
    components: &[usize],
    depth: BitDepth,
    config: &StripeConfig,
    out: &mut [u32],
) {
    if region.is_empty() || components.is_empty() {
        return;
    }
    let mut arena = StripeArena::for_scan::<T>(config, components.len(), depth);
    scan_striped_into(region, components, depth, config, &mut arena, out);
    arena.fold_into(out, depth.bins());
}

/// Scan `region` into `arena` without folding it.
///
/// Block counts go to the arena, tail pixels straight to `out`. The caller
/// folds the arena into `out` once every region has been scanned. `arena`
/// must come from [`StripeArena::for_scan`] with the same `config`,
/// component count and depth.
pub fn scan_striped_into<T: Sample>(
    region: &Region<'_, T>,
    components: &[usize],
    depth: BitDepth,
    config: &StripeConfig,
    arena: &mut StripeArena,
    out: &mut [u32],
) {
    let ncomp = components.len();
    let bins = depth.bins();
    debug_assert_eq!(out.len(), ncomp * bins);
    debug_assert_eq!(arena.stripes(), config.stripes());
    if region.is_empty() || ncomp == 0 {
        return;
    }

    let image = region.image();
    let data = image.data();
    let col_stride = image.col_stride();
    let offsets: Vec<usize> = components
        .iter()
        .map(|&c| c * image.component_stride())
        .collect();

    let mask = region.mask();
    let (mask_data, mask_col_stride) = match mask {
        Some(m) => (m.data(), m.col_stride()),
        None => (&[][..], 0),
    };

    let stripes = config.stripes();
    let unroll = config.unroll();
    let shift = depth.bits();

    // Bank assignment depends only on the position inside a block.
    let lane_stripe: Vec<usize> = (0..unroll).map(|k| k % stripes).collect();
    let mut block_bins = vec![0usize; unroll * ncomp];
    let mut block_keep = vec![true; unroll];

    for span in spans(region) {
        let blocks = span.len / unroll;
        for block in 0..blocks {
            let first = block * unroll;
            for k in 0..unroll {
                let px = span.start + (first + k) * col_stride;
                for (i, &off) in offsets.iter().enumerate() {
                    let value = data[px + off].to_index();
                    block_bins[k * ncomp + i] = if value >> shift != 0 { bins } else { value };
                }
            }
            if mask.is_some() {
                for (k, keep) in block_keep.iter_mut().enumerate() {
                    *keep = mask_data[span.mask_start + (first + k) * mask_col_stride] != 0;
                }
            }
            for i in 0..ncomp {
                for k in 0..unroll {
                    if block_keep[k] {
                        arena.increment(lane_stripe[k], i, block_bins[k * ncomp + i]);
                    }
                }
            }
        }

        let tail = Span {
            start: span.start + blocks * unroll * col_stride,
            mask_start: span.mask_start + blocks * unroll * mask_col_stride,
            len: span.len - blocks * unroll,
        };
        count_span(
            data,
            mask.map(|_| (mask_data, mask_col_stride)),
            tail,
            col_stride,
            &offsets,
            bins,
            out,
        );
    }
}

/// Plain loop over one span, straight into `out`.
fn count_span<T: Sample>(
    data: &[T],
    mask: Option<(&[u8], usize)>,
    span: Span,
    col_stride: usize,
    offsets: &[usize],
    bins: usize,
    out: &mut [u32],
) {
    for j in 0..span.len {
        if let Some((mask_data, mask_col_stride)) = mask
            && mask_data[span.mask_start + j * mask_col_stride] == 0
        {
            continue;
        }
        let px = span.start + j * col_stride;
        for (i, &off) in offsets.iter().enumerate() {
            let bin = data[px + off].to_index();
            if bin < bins {
                out[i * bins + bin] += 1;
            }
        }
    }
}

/// Break a region into constant-stride runs.
///
/// When consecutive rows follow each other at exactly one column stride
/// (in the image and in the mask), the whole row range is one run and
/// blocks may straddle row boundaries. Otherwise there is one run per row.
fn spans<T: Sample>(region: &Region<'_, T>) -> Vec<Span> {
    let image = region.image();
    let width = region.width();
    let rows = region.rows();
    let image_flat = image.row_stride() == width * image.col_stride() || rows.len() == 1;
    let mask_flat = region
        .mask()
        .is_none_or(|m| m.row_stride() == width * m.col_stride() || rows.len() == 1);
    let mask_offset = |row: usize| region.mask().map_or(0, |m| row * m.row_stride());

    if image_flat && mask_flat {
        return vec![Span {
            start: image.pixel_offset(rows.start, 0),
            mask_start: mask_offset(rows.start),
            len: rows.len() * width,
        }];
    }
    rows.map(|row| Span {
        start: image.pixel_offset(row, 0),
        mask_start: mask_offset(row),
        len: width,
    })
    .collect()
}
