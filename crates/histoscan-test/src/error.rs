//! Error types for the test framework

use thiserror::Error;

/// Errors that can occur while preparing regression inputs
#[derive(Debug, Error)]
pub enum TestError {
    /// A random distribution could not be built from the given bounds
    #[error("invalid generator parameters: {0}")]
    Generator(String),
}

/// Result type for test operations
pub type TestResult<T> = Result<T, TestError>;
