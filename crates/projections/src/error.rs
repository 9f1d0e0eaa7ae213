//! Projection error types.

use thiserror::Error;

/// Errors that can occur while building statistics.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProjectionError {
    /// The requested reporting period is not recognised.
    #[error("Unknown period: {0}")]
    UnknownPeriod(String),
}

/// Result type for projection operations.
pub type Result<T> = std::result::Result<T, ProjectionError>;
