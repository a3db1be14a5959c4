//! histoscan-core - Per-component intensity histograms of raw pixel buffers
//!
//! This crate counts how many pixels of an 8-, 12- or 16-bit image fall
//! into each intensity bin, separately for every selected component.
//!
//! # Core Data Structures
//!
//! - [`ImageView`] - Borrowed, strided view of interleaved samples
//! - [`MaskView`] - Borrowed per-pixel inclusion mask
//! - [`Region`] - An image, its mask and a range of rows
//! - [`Histogram`] - Owned `u32` counts, one row of `2^bits` bins per component
//! - [`StripeConfig`] / [`ScanOptions`] - Explicit performance parameters
//! - [`TuningTable`] - Parsed `TUNE(...)` records
//!
//! # Execution
//!
//! Counting uses several independent accumulator banks per component and
//! processes pixels in unrolled blocks; see [`kernel`]. Large images are
//! split into row grains and scanned on a caller-supplied
//! [`GrainExecutor`]; see [`dispatch`]. The result is identical for every
//! configuration and executor.
//!
//! # Example
//!
//! ```
//! use histoscan_core::{HistogramRequest, ImageView, Sequential};
//!
//! let rgb = [0u8, 1, 2, 3, 4, 5];
//! let image = ImageView::from_shape(&rgb, &[1, 2, 3]).unwrap();
//! let hist = HistogramRequest::new(image).compute(&Sequential).unwrap();
//! assert_eq!(hist.rows(), 3);
//! assert_eq!(hist.get(0, 3), Some(1));
//! ```

pub mod config;
pub mod dispatch;
pub mod error;
pub mod histogram;
pub mod image;
pub mod kernel;
pub mod region;
pub mod tuning;

pub use config::{
    DEFAULT_GRAIN_PIXELS_8BIT, DEFAULT_GRAIN_PIXELS_16BIT, DEFAULT_PARALLEL_THRESHOLD, ScanOptions,
    StripeConfig,
};
pub use dispatch::{
    ExecutionMode, GlobalPool, GrainExecutor, GrainTask, RayonPool, Sequential, dispatch,
};
pub use error::{Error, Result};
pub use histogram::{Histogram, HistogramDims, HistogramRequest, histogram};
pub use image::{BitDepth, ImageView, MaskView, Sample};
pub use region::{OutOfRange, Region, RegionPixel};
pub use tuning::{PixelLayout, TuningRecord, TuningTable};
