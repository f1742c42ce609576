//! Error types for the revenue_forecast crate

use thiserror::Error;

/// Custom error types for the revenue_forecast crate
#[derive(Debug, Error)]
pub enum ForecastError {
    /// Engine tunables violate their stated constraints; raised at
    /// construction, fatal to that engine instance
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),

    /// Out-of-order or duplicate periods handed to a window or a fit;
    /// the caller may retry with corrected data
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Fit or evaluate called with fewer observations than required
    #[error("Insufficient data: {0}")]
    InsufficientData(String),

    /// Checkpoint/restore blob is malformed or version-incompatible;
    /// the caller must re-fit from raw data
    #[error("Serialization failure: {0}")]
    SerializationFailure(String),

    /// Error related to data loading at the collaborator boundary
    #[error("Data error: {0}")]
    DataError(String),

    /// Error from IO operations
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

/// Result type with our custom error
pub type Result<T> = std::result::Result<T, ForecastError>;

impl From<csv::Error> for ForecastError {
    fn from(err: csv::Error) -> Self {
        ForecastError::DataError(err.to_string())
    }
}
