//! Ordered per-service entry index.
//!
//! [`ServiceIndex`] keeps one service's entries sorted by
//! `(timestamp, payload)`. Both range bounds are found by binary search, and
//! because the oldest entries always sit at the front, retention only ever
//! trims a prefix.

use std::collections::VecDeque;
use std::time::Duration;

use chrono::{DateTime, Utc};

use crate::clock::to_time_delta;
use crate::types::LogEntry;

/// Sorted entries for a single service.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServiceIndex {
    entries: VecDeque<LogEntry>,
}

impl ServiceIndex {
    /// Creates a new empty index.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an entry at its sorted position.
    ///
    /// Equal entries land after the ones already present.
    pub fn insert(&mut self, entry: LogEntry) {
        // Fast path: most lines arrive roughly in time order.
        if self.entries.back().is_none_or(|last| *last <= entry) {
            self.entries.push_back(entry);
            return;
        }
        let pos = self.entries.partition_point(|e| *e <= entry);
        self.entries.insert(pos, entry);
    }

    /// Returns the entries with `start <= timestamp < end`, earliest first.
    ///
    /// An inverted range yields nothing.
    pub fn range(
        &self,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> impl Iterator<Item = &LogEntry> + '_ {
        let lo = self.entries.partition_point(|e| e.timestamp < start);
        let hi = self.entries.partition_point(|e| e.timestamp < end).max(lo);
        self.entries.range(lo..hi)
    }

    /// Removes the leading run of entries older than `retention` at `now`.
    ///
    /// An entry is expired when `now - timestamp > retention`. Returns the
    /// number of entries removed.
    pub fn remove_expired(&mut self, now: DateTime<Utc>, retention: Duration) -> usize {
        let Some(cutoff) = now.checked_sub_signed(to_time_delta(retention)) else {
            return 0;
        };
        let mut removed = 0;
        while self.entries.front().is_some_and(|e| e.timestamp < cutoff) {
            self.entries.pop_front();
            removed += 1;
        }
        removed
    }

    /// Returns true if every entry is expired at `now`.
    #[must_use]
    pub fn is_fully_expired(&self, now: DateTime<Utc>, retention: Duration) -> bool {
        match (self.last(), now.checked_sub_signed(to_time_delta(retention))) {
            (Some(newest), Some(cutoff)) => newest.timestamp < cutoff,
            _ => false,
        }
    }

    /// Removes and returns the oldest entry.
    pub fn pop_front(&mut self) -> Option<LogEntry> {
        self.entries.pop_front()
    }

    /// Returns the oldest entry.
    #[must_use]
    pub fn first(&self) -> Option<&LogEntry> {
        self.entries.front()
    }

    /// Returns the newest entry.
    #[must_use]
    pub fn last(&self) -> Option<&LogEntry> {
        self.entries.back()
    }

    /// Iterates all entries in order.
    pub fn iter(&self) -> impl Iterator<Item = &LogEntry> + '_ {
        self.entries.iter()
    }

    /// Returns the number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns true if the index holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
