//! Error types for histoscan-core
//!
//! Provides a unified error type for all operations in the core crate.
//! Each variant captures enough context for diagnostics without exposing
//! internal implementation details.
//!
//! Every error is raised during validation, before any scanning starts,
//! so a failed call never leaves a caller-supplied output half-written.

use thiserror::Error;

/// Histoscan error type
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum Error {
    /// Unsupported number of axes, or an axis that must not be empty
    #[error("invalid dimension: {0}")]
    InvalidDimension(String),

    /// Bit depth not in {8, 12, 16}, or not representable in the sample type
    #[error("invalid bit depth {bits}: {reason}")]
    InvalidBitDepth { bits: u32, reason: String },

    /// Requested component index outside `[0, components)`
    #[error("component index {index} out of range [0, {components})")]
    InvalidComponentIndex { index: usize, components: usize },

    /// Mask or output shape does not match what the image requires
    #[error("shape mismatch for {what}: expected {expected:?}, got {actual:?}")]
    ShapeMismatch {
        what: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    /// A sample value does not fit the declared bit depth
    #[error(
        "sample value {value} at ({row}, {col}) component {component} exceeds {bits}-bit range"
    )]
    SampleOutOfRange {
        value: u32,
        bits: u32,
        row: usize,
        col: usize,
        component: usize,
    },

    /// Declared extents and strides reach past the end of the buffer
    #[error("buffer too small: view needs {required} elements, buffer has {len}")]
    BufferTooSmall { required: usize, len: usize },

    /// Invalid parameter value
    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    /// Malformed tuning record
    #[error("invalid tuning record on line {line}: {message}")]
    InvalidTuning { line: usize, message: String },
}

/// Result type alias for histoscan operations
pub type Result<T> = std::result::Result<T, Error>;
