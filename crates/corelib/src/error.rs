//! Error types for the core library.

use thiserror::Error;

/// Result type alias for the core library.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in the core library.
///
/// None of these are raised by the placement path itself; they come from
/// identifier validation and from loading configuration or model files.
#[derive(Debug, Error)]
pub enum Error {
    /// Invalid node identifier
    #[error("Invalid node: {0}")]
    InvalidNode(String),

    /// Invalid table identifier
    #[error("Invalid table: {0}")]
    InvalidTable(String),

    /// Decay parameters that cannot produce a meaningful curve
    #[error("Invalid decay parameters for {table}: {reason}")]
    InvalidDecayParameters { table: String, reason: String },

    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
