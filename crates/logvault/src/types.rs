//! Core types for the log store.
//!
//! This module provides:
//! - [`ServiceName`] — Validated partition key for log lines
//! - [`LogEntry`] — A single timestamped log line
//! - [`TimeRange`] — End-exclusive time window for queries
//! - [`SweepReport`] — Outcome of one retention pass
//! - [`StoreStats`] — Point-in-time size of the store

use std::borrow::Borrow;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::LogError;

/// Name of the service a log line originates from.
///
/// Case-sensitive and never empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServiceName(String);

impl ServiceName {
    /// Creates a service name, rejecting the empty string.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::EmptyServiceName`] if `name` is empty.
    pub fn new(name: impl Into<String>) -> Result<Self, LogError> {
        let name = name.into();
        if name.is_empty() {
            return Err(LogError::EmptyServiceName);
        }
        Ok(Self(name))
    }

    /// Returns the name as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ServiceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for ServiceName {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

// Lets the store's map be queried with a plain `&str`.
impl Borrow<str> for ServiceName {
    fn borrow(&self) -> &str {
        &self.0
    }
}

impl TryFrom<String> for ServiceName {
    type Error = LogError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl TryFrom<&str> for ServiceName {
    type Error = LogError;

    fn try_from(value: &str) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ServiceName> for String {
    fn from(name: ServiceName) -> Self {
        name.0
    }
}

/// A single stored log line.
///
/// Entries order by timestamp first and payload second, so two lines with
/// the same instant always sort the same way regardless of arrival order.
/// Identical entries are allowed and kept as separate lines.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct LogEntry {
    /// When the line was emitted.
    pub timestamp: DateTime<Utc>,
    /// The raw log line.
    #[serde(rename = "message")]
    pub payload: String,
}

impl LogEntry {
    /// Creates a new entry.
    #[must_use]
    pub fn new(timestamp: DateTime<Utc>, payload: impl Into<String>) -> Self {
        Self {
            timestamp,
            payload: payload.into(),
        }
    }
}

/// Time window for a query: `start` inclusive, `end` exclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeRange {
    /// Start of the range (inclusive).
    pub start: DateTime<Utc>,
    /// End of the range (exclusive).
    pub end: DateTime<Utc>,
}

impl TimeRange {
    /// Creates a range. Bounds are not checked here; the store rejects
    /// ranges whose end precedes their start.
    #[must_use]
    pub const fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Self {
        Self { start, end }
    }

    /// Returns true if `end` is not before `start`.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.end >= self.start
    }

    /// Checks if a timestamp falls within this range.
    #[must_use]
    pub fn contains(&self, timestamp: DateTime<Utc>) -> bool {
        timestamp >= self.start && timestamp < self.end
    }
}

/// Outcome of a single retention sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Number of services examined.
    pub services_scanned: usize,
    /// Number of entries evicted across all services.
    pub entries_evicted: usize,
    /// Number of services removed because their index became empty.
    pub services_dropped: usize,
}

impl SweepReport {
    /// Returns true if the sweep changed nothing.
    #[must_use]
    pub const fn is_noop(&self) -> bool {
        self.entries_evicted == 0 && self.services_dropped == 0
    }
}

/// Point-in-time size of a store.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StoreStats {
    /// Number of services with at least one entry.
    pub services: usize,
    /// Total entries across all services.
    pub entries: usize,
}
