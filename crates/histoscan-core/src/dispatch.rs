//! Grain dispatch and reduction
//!
//! The row range of a region is cut into grains of `grain_rows` rows, or of
//! about [`default_grain_pixels`] pixels when no grain size is set. Small
//! inputs are scanned grain by grain on the calling thread into one stripe
//! arena that is folded once at the end. Large inputs hand the grains to a
//! [`GrainExecutor`]; every worker counts into its own partial histogram,
//! and after all grains are done the partials are summed into the output
//! on the calling thread.
//!
//! Addition of counts is commutative and associative, so the result does not
//! depend on grain size, worker count or the order grains are executed in.
//!
//! The worker pool is always supplied by the caller. Tests use
//! [`Sequential`] or their own executor; production code can pass a
//! [`RayonPool`] built for the purpose or explicitly opt into
//! [`GlobalPool`].
//!
//! [`default_grain_pixels`]: crate::config::StripeConfig::default_grain_pixels

use std::ops::Range;

use log::{debug, trace};
use rayon::prelude::*;

use crate::config::ScanOptions;
use crate::image::{BitDepth, Sample};
use crate::kernel::{StripeArena, scan_striped, scan_striped_into};
use crate::region::Region;

/// Work run by an executor for one grain, counting into a partial.
pub type GrainTask<'t> = dyn Fn(Range<usize>, &mut [u32]) + Sync + 't;

/// Runs grain tasks, possibly on several threads.
pub trait GrainExecutor: Sync {
    /// Whether this executor can run grains concurrently.
    fn is_parallel(&self) -> bool;

    /// Run `task` once for every grain and return the partial histograms.
    ///
    /// Each partial has `len` counters, starts zeroed and is owned by one
    /// worker at a time; a worker may reuse its partial for several grains.
    /// The returned partials are summed by the caller in any order.
    fn run(&self, grains: &[Range<usize>], len: usize, task: &GrainTask<'_>) -> Vec<Vec<u32>>;
}

/// Runs every grain in order on the calling thread.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sequential;

impl GrainExecutor for Sequential {
    fn is_parallel(&self) -> bool {
        false
    }

    fn run(&self, grains: &[Range<usize>], len: usize, task: &GrainTask<'_>) -> Vec<Vec<u32>> {
        let mut partial = vec![0u32; len];
        for grain in grains {
            task(grain.clone(), &mut partial);
        }
        vec![partial]
    }
}

/// Runs grains on a caller-owned rayon pool.
///
/// # Example
///
/// ```
/// use histoscan_core::RayonPool;
///
/// let pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();
/// let executor = RayonPool::new(&pool);
/// # let _ = executor;
/// ```
#[derive(Debug, Clone, Copy)]
pub struct RayonPool<'p> {
    pool: &'p rayon::ThreadPool,
}

impl<'p> RayonPool<'p> {
    /// Wrap `pool`; grains run inside [`rayon::ThreadPool::install`].
    pub fn new(pool: &'p rayon::ThreadPool) -> Self {
        Self { pool }
    }
}

impl GrainExecutor for RayonPool<'_> {
    fn is_parallel(&self) -> bool {
        self.pool.current_num_threads() > 1
    }

    fn run(&self, grains: &[Range<usize>], len: usize, task: &GrainTask<'_>) -> Vec<Vec<u32>> {
        self.pool.install(|| run_parallel(grains, len, task))
    }
}

/// Runs grains on rayon's global pool.
#[derive(Debug, Clone, Copy, Default)]
pub struct GlobalPool;

impl GrainExecutor for GlobalPool {
    fn is_parallel(&self) -> bool {
        rayon::current_num_threads() > 1
    }

    fn run(&self, grains: &[Range<usize>], len: usize, task: &GrainTask<'_>) -> Vec<Vec<u32>> {
        run_parallel(grains, len, task)
    }
}

fn run_parallel(grains: &[Range<usize>], len: usize, task: &GrainTask<'_>) -> Vec<Vec<u32>> {
    grains
        .par_iter()
        .fold(
            || vec![0u32; len],
            |mut partial, grain| {
                task(grain.clone(), &mut partial);
                partial
            },
        )
        .collect()
}

/// How a scan is executed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExecutionMode {
    /// Grains run in order on the calling thread
    SingleThreaded,
    /// Grains run on the executor's workers
    MultiThreaded,
}

impl ExecutionMode {
    /// Pick the mode for `pixels` pixels.
    ///
    /// Threaded only when the options allow it, the volume reaches the
    /// threshold, and the executor can actually run grains concurrently.
    pub fn select(options: &ScanOptions, pixels: usize, executor: &dyn GrainExecutor) -> Self {
        if options.parallel && pixels >= options.parallel_threshold && executor.is_parallel() {
            ExecutionMode::MultiThreaded
        } else {
            ExecutionMode::SingleThreaded
        }
    }
}

/// Scan `region` into `out`, splitting it into grains.
///
/// `out` is `components.len() × 2^bits` and is added to, never cleared.
/// Returns the execution mode that was used.
pub fn dispatch<T: Sample>(
    region: &Region<'_, T>,
    components: &[usize],
    depth: BitDepth,
    options: &ScanOptions,
    executor: &dyn GrainExecutor,
    out: &mut [u32],
) -> ExecutionMode {
    let tuning = options.tuning;
    let grain_rows = tuning.resolve_grain_rows(depth, region.width());
    let pixels = region.pixel_count();
    let mode = ExecutionMode::select(options, pixels, executor);
    debug!(
        "histogram scan: {pixels} pixels, {} components, {} bits, {mode:?} (threshold {}, grain {grain_rows} rows)",
        components.len(),
        depth.bits(),
        options.parallel_threshold,
    );

    match mode {
        ExecutionMode::SingleThreaded => {
            if region.is_empty() || components.is_empty() {
                return mode;
            }
            let mut arena = StripeArena::for_scan::<T>(&tuning, components.len(), depth);
            for grain in region.split_rows(grain_rows) {
                scan_striped_into(&grain, components, depth, &tuning, &mut arena, out);
            }
            arena.fold_into(out, depth.bins());
        }
        ExecutionMode::MultiThreaded => {
            let grains: Vec<Range<usize>> =
                region.split_rows(grain_rows).map(|g| g.rows()).collect();
            let task = |rows: Range<usize>, partial: &mut [u32]| {
                trace!("scanning grain rows {rows:?}");
                scan_striped(&region.with_rows(rows), components, depth, &tuning, partial);
            };
            let partials = executor.run(&grains, out.len(), &task);
            debug!(
                "merging {} partial histograms from {} grains",
                partials.len(),
                grains.len()
            );
            for partial in &partials {
                for (dst, src) in out.iter_mut().zip(partial) {
                    *dst += *src;
                }
            }
        }
    }
    mode
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::config::StripeConfig;
    use crate::image::ImageView;
    use crate::kernel::scan_reference;

    /// Runs grains back to front, one fresh partial per grain.
    struct Reversed;

    impl GrainExecutor for Reversed {
        fn is_parallel(&self) -> bool {
            true
        }

        fn run(&self, grains: &[Range<usize>], len: usize, task: &GrainTask<'_>) -> Vec<Vec<u32>> {
            grains
                .iter()
                .rev()
                .map(|grain| {
                    let mut partial = vec![0u32; len];
                    task(grain.clone(), &mut partial);
                    partial
                })
                .collect()
        }
    }

    /// Records how many grains it was handed.
    struct Counting<'c>(&'c AtomicUsize);

    impl GrainExecutor for Counting<'_> {
        fn is_parallel(&self) -> bool {
            true
        }

        fn run(&self, grains: &[Range<usize>], len: usize, task: &GrainTask<'_>) -> Vec<Vec<u32>> {
            self.0.fetch_add(grains.len(), Ordering::Relaxed);
            Sequential.run(grains, len, task)
        }
    }

    fn threaded_options(grain_rows: usize) -> ScanOptions {
        ScanOptions {
            tuning: StripeConfig::new(2, 4, grain_rows).unwrap(),
            parallel: true,
            parallel_threshold: 0,
            check_samples: true,
        }
    }

    fn sample_image() -> Vec<u8> {
        (0..37 * 11).map(|i| (i * 7 % 256) as u8).collect()
    }

    #[test]
    fn test_select_mode() {
        let opts = ScanOptions::default();
        assert_eq!(
            ExecutionMode::select(&opts, 100, &Reversed),
            ExecutionMode::SingleThreaded
        );
        assert_eq!(
            ExecutionMode::select(&opts, 1 << 22, &Reversed),
            ExecutionMode::MultiThreaded
        );
        assert_eq!(
            ExecutionMode::select(&opts, 1 << 22, &Sequential),
            ExecutionMode::SingleThreaded
        );
        let st = ScanOptions::single_threaded();
        assert_eq!(
            ExecutionMode::select(&st, 1 << 30, &Reversed),
            ExecutionMode::SingleThreaded
        );
    }

    #[test]
    fn test_reversed_grains_match_reference() {
        let data = sample_image();
        let image = ImageView::from_shape(&data, &[37, 11]).unwrap();
        let region = Region::new(image, None).unwrap();
        let mut expected = vec![0u32; 256];
        scan_reference(&region, &[0], BitDepth::Bit8, &mut expected);

        for grain_rows in [1, 2, 5, 36, 37, 100] {
            let mut out = vec![0u32; 256];
            let mode = dispatch(
                &region,
                &[0],
                BitDepth::Bit8,
                &threaded_options(grain_rows),
                &Reversed,
                &mut out,
            );
            assert_eq!(mode, ExecutionMode::MultiThreaded);
            assert_eq!(out, expected, "grain_rows={grain_rows}");
        }
    }

    #[test]
    fn test_rayon_pool_matches_sequential() {
        let data = sample_image();
        let image = ImageView::from_shape(&data, &[37, 11]).unwrap();
        let region = Region::new(image, None).unwrap();
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(3)
            .build()
            .unwrap();

        let mut seq = vec![0u32; 256];
        dispatch(
            &region,
            &[0],
            BitDepth::Bit8,
            &threaded_options(3),
            &Sequential,
            &mut seq,
        );
        let mut par = vec![0u32; 256];
        dispatch(
            &region,
            &[0],
            BitDepth::Bit8,
            &threaded_options(3),
            &RayonPool::new(&pool),
            &mut par,
        );
        assert_eq!(seq, par);
        assert_eq!(par.iter().sum::<u32>(), 37 * 11);
    }

    #[test]
    fn test_sequential_executor_single_partial() {
        let grains = [0..2, 2..4];
        let partials = Sequential.run(&grains, 4, &|rows, partial| {
            partial[rows.start] += 1;
        });
        assert_eq!(partials, vec![vec![1, 0, 1, 0]]);
    }

    #[test]
    fn test_default_grain_follows_width() {
        // A tall one-pixel-wide 16-bit column must not be cut into
        // one-row grains.
        let data: Vec<u16> = (0..5000u32).map(|i| (i * 13 % 65536) as u16).collect();
        let image = ImageView::from_shape(&data, &[5000, 1]).unwrap();
        let region = Region::new(image, None).unwrap();
        let mut expected = vec![0u32; 65536];
        scan_reference(&region, &[0], BitDepth::Bit16, &mut expected);

        let options = ScanOptions {
            parallel_threshold: 0,
            ..ScanOptions::default()
        };
        let grains = AtomicUsize::new(0);
        let mut out = vec![0u32; 65536];
        dispatch(
            &region,
            &[0],
            BitDepth::Bit16,
            &options,
            &Counting(&grains),
            &mut out,
        );
        assert_eq!(out, expected);
        assert_eq!(grains.load(Ordering::Relaxed), 1);

        let mut out = vec![0u32; 65536];
        dispatch(
            &region,
            &[0],
            BitDepth::Bit16,
            &ScanOptions::single_threaded(),
            &Sequential,
            &mut out,
        );
        assert_eq!(out, expected);
    }

    #[test]
    fn test_dispatch_adds_to_existing() {
        let data = [1u8; 20];
        let image = ImageView::from_shape(&data, &[4, 5]).unwrap();
        let region = Region::new(image, None).unwrap();
        let mut out = vec![0u32; 256];
        out[1] = 100;
        dispatch(
            &region,
            &[0],
            BitDepth::Bit8,
            &threaded_options(1),
            &Reversed,
            &mut out,
        );
        assert_eq!(out[1], 120);
    }
}
