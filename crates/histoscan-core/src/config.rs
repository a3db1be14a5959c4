//! Scan configuration
//!
//! Performance parameters are plain values passed on every call. None of
//! them change the resulting counts; any valid combination produces the
//! same histogram.

use crate::error::{Error, Result};
use crate::image::BitDepth;

/// Default pixel volume at or above which threaded execution is used.
pub const DEFAULT_PARALLEL_THRESHOLD: usize = 1 << 22;

/// Default grain size in pixels for 8-bit data.
pub const DEFAULT_GRAIN_PIXELS_8BIT: usize = 1 << 14;

/// Default grain size in pixels for 12- and 16-bit data.
pub const DEFAULT_GRAIN_PIXELS_16BIT: usize = 1 << 17;

/// Stripe, unroll and grain parameters for one scan.
///
/// - `stripes`: independent accumulator banks per component
/// - `unroll`: pixels processed per loop body
/// - `grain_rows`: rows per unit of work in threaded dispatch
///
/// A configuration without an explicit grain sizes its grains from the
/// image width so each one covers about [`StripeConfig::default_grain_pixels`]
/// pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StripeConfig {
    stripes: usize,
    unroll: usize,
    grain_rows: Option<usize>,
}

impl StripeConfig {
    /// Create a validated configuration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if any value is zero.
    ///
    /// # Example
    ///
    /// ```
    /// use histoscan_core::StripeConfig;
    ///
    /// let config = StripeConfig::new(4, 16, 64).unwrap();
    /// assert_eq!(config.stripes(), 4);
    /// assert!(StripeConfig::new(0, 16, 64).is_err());
    /// ```
    pub fn new(stripes: usize, unroll: usize, grain_rows: usize) -> Result<Self> {
        for (name, value) in [
            ("stripes", stripes),
            ("unroll", unroll),
            ("grain_rows", grain_rows),
        ] {
            if value == 0 {
                return Err(Error::InvalidParameter(format!("{name} must be >= 1")));
            }
        }
        Ok(Self {
            stripes,
            unroll,
            grain_rows: Some(grain_rows),
        })
    }

    /// Create a validated configuration whose grain size follows the width.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if `stripes` or `unroll` is zero.
    pub fn with_auto_grain(stripes: usize, unroll: usize) -> Result<Self> {
        let config = Self::new(stripes, unroll, 1)?;
        Ok(Self {
            grain_rows: None,
            ..config
        })
    }

    /// Number of accumulator banks.
    pub fn stripes(&self) -> usize {
        self.stripes
    }

    /// Pixels per unrolled block.
    pub fn unroll(&self) -> usize {
        self.unroll
    }

    /// Rows per grain, if set explicitly.
    pub fn grain_rows(&self) -> Option<usize> {
        self.grain_rows
    }

    /// Rows per grain for an image `width` pixels wide at `depth`.
    pub fn resolve_grain_rows(&self, depth: BitDepth, width: usize) -> usize {
        self.grain_rows.unwrap_or_else(|| {
            Self::grain_rows_for_width(Self::default_grain_pixels(depth), width)
        })
    }

    /// Same stripes and unroll with a different grain size.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidParameter`] if `grain_rows` is zero.
    pub fn with_grain_rows(self, grain_rows: usize) -> Result<Self> {
        Self::new(self.stripes, self.unroll, grain_rows)
    }

    /// Convert a grain size in pixels to whole rows of `width` pixels.
    ///
    /// Always at least one row.
    pub fn grain_rows_for_width(grain_pixels: usize, width: usize) -> usize {
        (grain_pixels / width.max(1)).max(1)
    }

    /// The default grain size in pixels for a bit depth.
    pub fn default_grain_pixels(depth: BitDepth) -> usize {
        match depth {
            BitDepth::Bit8 => DEFAULT_GRAIN_PIXELS_8BIT,
            BitDepth::Bit12 | BitDepth::Bit16 => DEFAULT_GRAIN_PIXELS_16BIT,
        }
    }
}

impl Default for StripeConfig {
    fn default() -> Self {
        Self {
            stripes: 2,
            unroll: 8,
            grain_rows: None,
        }
    }
}

/// Options controlling one histogram call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanOptions {
    /// Stripe, unroll and grain parameters
    pub tuning: StripeConfig,
    /// Allow threaded execution for large inputs
    pub parallel: bool,
    /// Minimum pixel volume for threaded execution
    pub parallel_threshold: usize,
    /// Reject samples `>= 2^bits` before scanning
    ///
    /// Only has an effect for 12-bit data. When disabled, such samples are
    /// silently left out of the counts.
    pub check_samples: bool,
}

impl Default for ScanOptions {
    fn default() -> Self {
        Self {
            tuning: StripeConfig::default(),
            parallel: true,
            parallel_threshold: DEFAULT_PARALLEL_THRESHOLD,
            check_samples: true,
        }
    }
}

impl ScanOptions {
    /// Options that never use worker threads.
    pub fn single_threaded() -> Self {
        Self {
            parallel: false,
            ..Self::default()
        }
    }

    /// Replace the stripe configuration.
    pub fn with_tuning(mut self, tuning: StripeConfig) -> Self {
        self.tuning = tuning;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stripe_config_rejects_zero() {
        assert!(StripeConfig::new(1, 1, 1).is_ok());
        assert!(StripeConfig::new(1, 0, 1).is_err());
        assert!(StripeConfig::new(1, 1, 0).is_err());
    }

    #[test]
    fn test_resolve_grain_rows() {
        let auto = StripeConfig::default();
        assert_eq!(auto.grain_rows(), None);
        assert_eq!(auto.resolve_grain_rows(BitDepth::Bit8, 1024), 16);
        assert_eq!(auto.resolve_grain_rows(BitDepth::Bit16, 1), 1 << 17);
        assert_eq!(auto.resolve_grain_rows(BitDepth::Bit12, 1 << 20), 1);

        let fixed = StripeConfig::new(2, 8, 5).unwrap();
        assert_eq!(fixed.resolve_grain_rows(BitDepth::Bit16, 1), 5);

        let tuned = StripeConfig::with_auto_grain(4, 16).unwrap();
        assert_eq!((tuned.stripes(), tuned.unroll()), (4, 16));
        assert_eq!(tuned.grain_rows(), None);
        assert!(StripeConfig::with_auto_grain(0, 16).is_err());
    }

    #[test]
    fn test_grain_rows_for_width() {
        assert_eq!(StripeConfig::grain_rows_for_width(1 << 14, 1024), 16);
        assert_eq!(StripeConfig::grain_rows_for_width(1 << 14, 1 << 20), 1);
        assert_eq!(StripeConfig::grain_rows_for_width(100, 0), 100);
    }

    #[test]
    fn test_default_options() {
        let opts = ScanOptions::default();
        assert!(opts.parallel);
        assert!(opts.check_samples);
        assert_eq!(opts.parallel_threshold, 1 << 22);
        assert!(!ScanOptions::single_threaded().parallel);
    }
}
