//! Traits for log storage backends.
//!
//! [`LogBackend`] is the surface a transport layer (HTTP handlers, RPC
//! services) programs against: ingest a line, query a time window.

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::{LogEntry, ServiceName};

/// Ingest and range-query operations over per-service logs.
pub trait LogBackend: Send + Sync {
    /// Stores a log line for `service`.
    fn add_log(&self, service: &ServiceName, timestamp: DateTime<Utc>, payload: String);

    /// Returns the lines for `service` with `start <= timestamp < end`,
    /// earliest first.
    ///
    /// An unknown service yields an empty result.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::InvalidRange`](crate::LogError::InvalidRange) if
    /// `end` precedes `start`.
    fn query_logs(
        &self,
        service: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<LogEntry>>;
}
