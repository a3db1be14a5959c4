//! histoscan-test - Regression test framework for histoscan
//!
//! Provides the [`RegParams`] harness used by the `*_reg.rs` integration
//! tests, and seeded synthetic inputs to feed them.
//!
//! # Usage
//!
//! ```ignore
//! use histoscan_test::{RegParams, random_samples, reference_histogram};
//!
//! let mut rp = RegParams::new("conservation");
//! rp.compare_values(1024.0, hist.total(0) as f64, 0.0);
//! assert!(rp.cleanup());
//! ```
//!
//! # Environment Variables
//!
//! - `REGTEST_MODE`: Set to "compare" (default) or "display". Display mode
//!   also prints a summary of every histogram that is compared.

mod error;
mod images;
mod params;

pub use error::{TestError, TestResult};
pub use images::{
    all_values_u8, all_values_u16, constant_samples, random_mask, random_samples,
    reference_histogram,
};
pub use params::{RegParams, RegTestMode};
