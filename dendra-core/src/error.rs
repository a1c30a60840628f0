//! Structured error types for the Dendra ecosystem.

use thiserror::Error;

/// Unified error type for all Dendra operations.
#[derive(Debug, Error)]
pub enum DendraError {
    /// Invalid input (bad arguments, out-of-range values, length mismatches)
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Catch-all for other errors
    #[error("{0}")]
    Other(String),
}

/// Convenience alias used throughout the Dendra ecosystem.
pub type Result<T> = std::result::Result<T, DendraError>;
