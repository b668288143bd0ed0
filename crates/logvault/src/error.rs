//! Error types for the log store.

use chrono::{DateTime, Utc};
use thiserror::Error;

/// Errors that can occur in the log store.
#[derive(Debug, Error)]
pub enum LogError {
    /// The query end precedes its start.
    #[error("invalid range: end {end} precedes start {start}")]
    InvalidRange {
        /// Requested start of the range.
        start: DateTime<Utc>,
        /// Requested end of the range.
        end: DateTime<Utc>,
    },

    /// A service name was empty.
    #[error("service name must not be empty")]
    EmptyServiceName,

    /// The store configuration is invalid.
    #[error("invalid configuration: {0}")]
    Config(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for log store operations.
pub type Result<T> = std::result::Result<T, LogError>;
