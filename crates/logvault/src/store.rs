//! Concurrent in-memory log store.
//!
//! This module provides:
//! - [`LogStore`] — Per-service ordered indices behind two-level locking
//! - Implementation of [`LogBackend`] for generic usage
//!
//! Locking: the service map sits behind one `RwLock` and every service index
//! behind its own. Locks are always taken map first, then index. Writers hold
//! the map read lock while they mutate an index, so the sweeper (which drops
//! empty indices under the map write lock) can never orphan an index that an
//! insert is about to write into.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use parking_lot::{RwLock, RwLockUpgradableReadGuard, RwLockWriteGuard};
use tracing::{debug, trace};

use crate::clock::{Clock, SystemClock};
use crate::config::StoreConfig;
use crate::error::{LogError, Result};
use crate::index::ServiceIndex;
use crate::traits::LogBackend;
use crate::types::{LogEntry, ServiceName, StoreStats, SweepReport, TimeRange};

type SharedIndex = Arc<RwLock<ServiceIndex>>;

/// Thread-safe in-memory log store with retention.
pub struct LogStore {
    /// Configuration
    config: StoreConfig,
    /// Time source for age comparisons
    clock: Arc<dyn Clock>,
    /// Service name to its index; never maps to an empty index between calls
    services: RwLock<HashMap<ServiceName, SharedIndex>>,
}

impl std::fmt::Debug for LogStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogStore")
            .field("config", &self.config)
            .field("clock", &self.clock)
            .field("services", &self.services.read().len())
            .finish()
    }
}

impl Default for LogStore {
    fn default() -> Self {
        Self::new(StoreConfig::default())
    }
}

impl LogStore {
    /// Creates a store that reads time from the system clock.
    #[must_use]
    pub fn new(config: StoreConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    /// Creates a store with an explicit time source.
    #[must_use]
    pub fn with_clock(config: StoreConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            services: RwLock::new(HashMap::new()),
        }
    }

    /// Stores a log line for `service`, creating its index on first use.
    pub fn add_log(
        &self,
        service: &ServiceName,
        timestamp: DateTime<Utc>,
        payload: impl Into<String>,
    ) {
        self.add_entry(service, LogEntry::new(timestamp, payload));
    }

    /// Stores a prebuilt entry for `service`.
    pub fn add_entry(&self, service: &ServiceName, entry: LogEntry) {
        {
            let services = self.services.read();
            if let Some(index) = services.get(service) {
                index.write().insert(entry);
                trace!(service = %service, "appended log entry");
                return;
            }
        }

        // Slow path: another writer may have created it since we looked.
        let services = self.services.upgradable_read();
        let services = if services.contains_key(service) {
            RwLockUpgradableReadGuard::downgrade(services)
        } else {
            let mut services = RwLockUpgradableReadGuard::upgrade(services);
            services.insert(service.clone(), SharedIndex::default());
            debug!(service = %service, "created service index");
            RwLockWriteGuard::downgrade(services)
        };
        if let Some(index) = services.get(service) {
            index.write().insert(entry);
        }
        trace!(service = %service, "appended log entry");
    }

    /// Returns the lines for `service` with `start <= timestamp < end`.
    ///
    /// The result is a copy; later writes do not show up in it. An unknown
    /// service yields an empty vector.
    ///
    /// # Errors
    ///
    /// Returns [`LogError::InvalidRange`] if `end` precedes `start`.
    pub fn get_logs(
        &self,
        service: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<LogEntry>> {
        self.query(service, TimeRange::new(start, end))
    }

    /// Same as [`get_logs`](Self::get_logs) with a [`TimeRange`].
    ///
    /// # Errors
    ///
    /// Returns [`LogError::InvalidRange`] if the range is inverted.
    pub fn query(&self, service: &str, range: TimeRange) -> Result<Vec<LogEntry>> {
        if !range.is_valid() {
            return Err(LogError::InvalidRange {
                start: range.start,
                end: range.end,
            });
        }

        let Some(index) = self.index_for(service) else {
            return Ok(Vec::new());
        };
        let entries: Vec<LogEntry> = index.read().range(range.start, range.end).cloned().collect();
        Ok(entries)
    }

    /// Returns the services currently holding entries, sorted by name.
    #[must_use]
    pub fn services(&self) -> Vec<ServiceName> {
        let mut names: Vec<ServiceName> = self.services.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Returns the number of entries stored for `service`.
    #[must_use]
    pub fn service_len(&self, service: &str) -> usize {
        self.index_for(service).map_or(0, |index| index.read().len())
    }

    /// Returns the number of services and entries.
    #[must_use]
    pub fn stats(&self) -> StoreStats {
        let services = self.services.read();
        StoreStats {
            services: services.len(),
            entries: services.values().map(|index| index.read().len()).sum(),
        }
    }

    /// Returns the total number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.stats().entries
    }

    /// Returns true if no service holds any entry.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.services.read().is_empty()
    }

    /// Runs one retention pass using the store's clock.
    pub fn sweep(&self) -> SweepReport {
        self.sweep_at(self.clock.now())
    }

    /// Runs one retention pass as if the current time were `now`.
    ///
    /// Services whose entries all expire are evicted and removed while the
    /// map is held exclusively, so no caller ever sees an empty service.
    pub fn sweep_at(&self, now: DateTime<Utc>) -> SweepReport {
        let retention = self.config.retention;
        let mut report = SweepReport::default();
        let mut draining = Vec::new();

        // Upgradable read: concurrent readers and writers to existing
        // services proceed; only service creation waits.
        let services = self.services.upgradable_read();
        report.services_scanned = services.len();

        for (name, index) in services.iter() {
            let mut index = index.write();
            if index.is_fully_expired(now, retention) {
                draining.push(name.clone());
                continue;
            }
            let evicted = index.remove_expired(now, retention);
            if evicted > 0 {
                trace!(service = %name, evicted, "evicted expired entries");
            }
            report.entries_evicted += evicted;
        }

        if !draining.is_empty() {
            let mut services = RwLockUpgradableReadGuard::upgrade(services);
            for name in draining {
                let Some(index) = services.get(&name).map(Arc::clone) else {
                    continue;
                };
                // Writers may have added fresh entries before the upgrade.
                let mut index = index.write();
                report.entries_evicted += index.remove_expired(now, retention);
                if index.is_empty() {
                    services.remove(&name);
                    report.services_dropped += 1;
                    debug!(service = %name, "dropped empty service index");
                }
            }
        }

        report
    }

    /// Returns the configuration.
    #[must_use]
    pub const fn config(&self) -> &StoreConfig {
        &self.config
    }

    /// Returns the current time according to the store's clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    fn index_for(&self, service: &str) -> Option<SharedIndex> {
        self.services.read().get(service).map(Arc::clone)
    }
}

/// Shared log store handle.
pub type SharedLogStore = Arc<LogStore>;

/// Creates a new shared log store.
#[must_use]
pub fn shared_store(config: StoreConfig) -> SharedLogStore {
    Arc::new(LogStore::new(config))
}

// ============================================================================
// Trait Implementations
// ============================================================================

impl LogBackend for LogStore {
    fn add_log(&self, service: &ServiceName, timestamp: DateTime<Utc>, payload: String) {
        LogStore::add_log(self, service, timestamp, payload);
    }

    fn query_logs(
        &self,
        service: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> Result<Vec<LogEntry>> {
        LogStore::get_logs(self, service, start, end)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use std::time::Duration;
    use test_case::test_case;

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).expect("valid timestamp")
    }

    fn svc(name: &str) -> ServiceName {
        ServiceName::new(name).expect("valid name")
    }

    fn pairs(entries: &[LogEntry]) -> Vec<(i64, &str)> {
        entries
            .iter()
            .map(|e| (e.timestamp.timestamp(), e.payload.as_str()))
            .collect()
    }

    fn scenario_store() -> LogStore {
        let store = LogStore::default();
        store.add_log(&svc("a"), ts(100), "x");
        store.add_log(&svc("a"), ts(105), "y");
        store.add_log(&svc("b"), ts(100), "z");
        store
    }

    #[test_case("a", 100, 105 => vec![(100, "x".to_string())] ; "end instant excluded")]
    #[test_case("a", 100, 106 => vec![(100, "x".to_string()), (105, "y".to_string())] ; "both entries")]
    #[test_case("a", 101, 105 => Vec::<(i64, String)>::new() ; "gap between entries")]
    #[test_case("a", 100, 100 => Vec::<(i64, String)>::new() ; "empty range")]
    #[test_case("b", 0, 1000 => vec![(100, "z".to_string())] ; "other service isolated")]
    #[test_case("c", 0, 1000 => Vec::<(i64, String)>::new() ; "unknown service")]
    fn scenario_queries(service: &str, start: i64, end: i64) -> Vec<(i64, String)> {
        let store = scenario_store();
        store
            .get_logs(service, ts(start), ts(end))
            .expect("valid range")
            .into_iter()
            .map(|e| (e.timestamp.timestamp(), e.payload))
            .collect()
    }

    #[test]
    fn inverted_range_is_rejected() {
        let store = scenario_store();
        let result = store.get_logs("a", ts(105), ts(100));
        assert!(matches!(
            result,
            Err(LogError::InvalidRange { start, end }) if start == ts(105) && end == ts(100)
        ));

        // Checked before lookup: unknown services fail the same way.
        assert!(store.get_logs("nope", ts(1), ts(0)).is_err());
    }

    #[test]
    fn query_with_time_range() {
        let store = scenario_store();
        let logs = store.query("a", TimeRange::new(ts(0), ts(200))).expect("valid range");
        assert_eq!(pairs(&logs), vec![(100, "x"), (105, "y")]);
    }

    #[test]
    fn query_rejects_inverted_time_range() {
        let store = scenario_store();
        let result = store.query("a", TimeRange::new(ts(105), ts(100)));
        assert!(matches!(
            result,
            Err(LogError::InvalidRange { start, end }) if start == ts(105) && end == ts(100)
        ));

        // Equal bounds are a valid, empty window.
        assert!(store.query("a", TimeRange::new(ts(100), ts(100))).expect("valid range").is_empty());
    }

    #[test]
    fn results_are_snapshots() {
        let store = scenario_store();
        let before = store.get_logs("a", ts(0), ts(1000)).expect("valid range");

        store.add_log(&svc("a"), ts(101), "late");

        assert_eq!(before.len(), 2);
        assert_eq!(store.service_len("a"), 3);
    }

    #[test]
    fn ties_break_on_payload_not_arrival() {
        let store = LogStore::default();
        store.add_log(&svc("a"), ts(1), "second");
        store.add_log(&svc("a"), ts(1), "first");

        let logs = store.get_logs("a", ts(0), ts(2)).expect("valid range");
        assert_eq!(pairs(&logs), vec![(1, "first"), (1, "second")]);
    }

    #[test]
    fn service_names_are_case_sensitive() {
        let store = LogStore::default();
        store.add_log(&svc("Api"), ts(1), "upper");

        assert_eq!(store.service_len("Api"), 1);
        assert_eq!(store.service_len("api"), 0);
    }

    #[test]
    fn stats_and_services() {
        let store = scenario_store();
        assert_eq!(
            store.stats(),
            StoreStats {
                services: 2,
                entries: 3
            }
        );
        assert_eq!(store.services(), vec![svc("a"), svc("b")]);
        assert_eq!(store.len(), 3);
        assert!(!store.is_empty());
        assert!(LogStore::default().is_empty());
    }

    #[test]
    fn sweep_evicts_and_drops_empty_services() {
        let store = LogStore::new(StoreConfig::default().with_retention(Duration::from_secs(10)));
        store.add_log(&svc("old"), ts(0), "gone");
        store.add_log(&svc("mixed"), ts(0), "gone");
        store.add_log(&svc("mixed"), ts(50), "kept");

        let report = store.sweep_at(ts(55));

        assert_eq!(
            report,
            SweepReport {
                services_scanned: 2,
                entries_evicted: 2,
                services_dropped: 1,
            }
        );
        assert_eq!(store.services(), vec![svc("mixed")]);
        let logs = store.get_logs("mixed", ts(0), ts(100)).expect("valid range");
        assert_eq!(pairs(&logs), vec![(50, "kept")]);
    }

    #[test]
    fn sweep_with_nothing_expired_is_noop() {
        let store = scenario_store();
        let report = store.sweep_at(ts(106));
        assert!(report.is_noop());
        assert_eq!(report.services_scanned, 2);
        assert_eq!(store.len(), 3);
    }

    #[test]
    fn sweep_uses_store_clock() {
        let clock = Arc::new(ManualClock::new(ts(1_000)));
        let store = LogStore::with_clock(
            StoreConfig::default().with_retention(Duration::from_secs(60)),
            clock.clone(),
        );
        store.add_log(&svc("a"), ts(1_000), "line");
        assert_eq!(store.now(), ts(1_000));

        clock.advance(Duration::from_secs(60));
        assert!(store.sweep().is_noop());

        clock.advance(Duration::from_secs(1));
        let report = store.sweep();
        assert_eq!(report.entries_evicted, 1);
        assert_eq!(report.services_dropped, 1);
        assert!(store.is_empty());
    }

    #[test]
    fn expired_entries_visible_until_swept() {
        let clock = Arc::new(ManualClock::new(ts(0)));
        let store = LogStore::with_clock(
            StoreConfig::default().with_retention(Duration::from_secs(10)),
            clock.clone(),
        );
        store.add_log(&svc("a"), ts(0), "stale");
        clock.advance(Duration::from_secs(3_600));

        assert_eq!(store.get_logs("a", ts(0), ts(1)).expect("valid range").len(), 1);
        store.sweep();
        assert!(store.get_logs("a", ts(0), ts(1)).expect("valid range").is_empty());
    }

    #[test]
    fn service_recreated_after_drop() {
        let store = LogStore::new(StoreConfig::default().with_retention(Duration::from_secs(1)));
        store.add_log(&svc("a"), ts(0), "first life");
        store.sweep_at(ts(100));
        assert!(store.is_empty());

        store.add_log(&svc("a"), ts(100), "second life");
        let logs = store.get_logs("a", ts(0), ts(200)).expect("valid range");
        assert_eq!(pairs(&logs), vec![(100, "second life")]);
    }

    #[test]
    fn backend_trait_delegates() {
        let store = LogStore::default();
        let backend: &dyn LogBackend = &store;
        backend.add_log(&svc("a"), ts(5), "via trait".to_string());

        let logs = backend.query_logs("a", ts(0), ts(10)).expect("valid range");
        assert_eq!(pairs(&logs), vec![(5, "via trait")]);
        assert!(backend.query_logs("a", ts(10), ts(0)).is_err());
    }

    #[test]
    fn shared_store_works() {
        let store = shared_store(StoreConfig::default());
        store.add_log(&svc("a"), ts(1), "one");

        let store2 = Arc::clone(&store);
        store2.add_log(&svc("a"), ts(2), "two");
        assert_eq!(store.len(), 2);
    }
}
