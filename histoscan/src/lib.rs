//! histoscan - Fast per-component image histograms
//!
//! Counts the pixels of 8-, 12- and 16-bit images per intensity bin,
//! optionally restricted by a mask and to a selection of components.
//!
//! # Overview
//!
//! - Zero-copy input: any row-major, column-major or sliced buffer is
//!   described by an [`ImageView`] with element strides
//! - Striped, unrolled counting with explicit [`StripeConfig`] values
//! - Row-grain multithreading on a caller-supplied [`GrainExecutor`]
//! - Identical counts for every configuration and thread count
//!
//! # Example
//!
//! ```
//! use histoscan::{HistogramRequest, ImageView, RayonPool, ScanOptions};
//!
//! let pixels: Vec<u16> = (0..64 * 64).map(|i| (i % 4096) as u16).collect();
//! let image = ImageView::from_shape(&pixels, &[64, 64]).unwrap();
//!
//! let pool = rayon::ThreadPoolBuilder::new().num_threads(2).build().unwrap();
//! let options = ScanOptions {
//!     parallel_threshold: 0,
//!     ..ScanOptions::default()
//! };
//! let hist = HistogramRequest::new(image)
//!     .bits(12)
//!     .options(options)
//!     .compute(&RayonPool::new(&pool))
//!     .unwrap();
//! assert_eq!(hist.bins(), 4096);
//! assert_eq!(hist.total(0), 64 * 64);
//! ```

// Re-export the engine (all public types live in the core crate)
pub use histoscan_core::*;
