//! Error types for the crypto-bot backtester.

use thiserror::Error;

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Main error type for the backtester.
///
/// Order outcomes such as a margin call or an oversell are not errors; they
/// are reported through [`crate::OrderStatus`].
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration error (rejected at setup).
    #[error("Configuration error: {0}")]
    Config(String),

    /// Malformed or out-of-order input bars.
    #[error("Data format error: {0}")]
    DataFormat(String),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV reader error.
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl Error {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Error::Config(msg.into())
    }

    /// Create a data format error.
    pub fn data_format(msg: impl Into<String>) -> Self {
        Error::DataFormat(msg.into())
    }

    /// Create a data format error pointing at a 1-based input line.
    pub fn data_format_at(line: u64, msg: impl std::fmt::Display) -> Self {
        Error::DataFormat(format!("line {line}: {msg}"))
    }
}
