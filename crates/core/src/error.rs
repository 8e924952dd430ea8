//! Error types for the fx-bars system.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the fx-bars system.
#[derive(Error, Debug)]
pub enum Error {
    /// Source artifact absent at the expected location.
    #[error("Input file not found: {}", .0.display())]
    MissingInput(PathBuf),

    /// Required columns absent from the input table.
    #[error("Schema error: {0}")]
    Schema(String),

    /// Nothing left to work with after filtering.
    #[error("Data availability error: {0}")]
    DataAvailability(String),

    /// A value that could not be accepted (bad cell, bad instrument code).
    #[error("Validation error: {0}")]
    Validation(String),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV read/write error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    /// Create a missing-input error.
    pub fn missing_input(path: impl Into<PathBuf>) -> Self {
        Error::MissingInput(path.into())
    }

    /// Create a schema error.
    pub fn schema(msg: impl Into<String>) -> Self {
        Error::Schema(msg.into())
    }

    /// Create a data-availability error.
    pub fn data_availability(msg: impl Into<String>) -> Self {
        Error::DataAvailability(msg.into())
    }

    /// Create a validation error.
    pub fn validation(msg: impl Into<String>) -> Self {
        Error::Validation(msg.into())
    }

    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }
}
