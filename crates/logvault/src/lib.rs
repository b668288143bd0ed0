//! # logvault
//!
//! In-memory log aggregation core: per-service, time-ordered storage with
//! range queries and a background retention sweep.
//!
//! This crate provides:
//!
//! - [`LogEntry`] — A timestamped log line, ordered by `(timestamp, payload)`
//! - [`ServiceName`] — Validated, case-sensitive partition key
//! - [`ServiceIndex`] — Sorted entries for one service
//! - [`LogStore`] — Concurrent store over all service indices
//! - [`RetentionSweeper`] — Tokio task that evicts expired entries
//! - [`LogVault`] — A store and its sweeper started together
//! - [`LogBackend`] — Abstract trait for transport layers
//!
//! Queries are end-exclusive: an entry stamped exactly at `end` is not
//! returned. Eviction is periodic, so an expired entry stays visible until
//! the next sweep.
//!
//! ## Example
//!
//! ```rust
//! use chrono::{TimeDelta, Utc};
//! use logvault::{LogStore, ServiceName, StoreConfig};
//!
//! let store = LogStore::new(StoreConfig::default());
//! let api = ServiceName::new("api")?;
//!
//! let now = Utc::now();
//! store.add_log(&api, now, "request served");
//!
//! let logs = store.get_logs("api", now, now + TimeDelta::seconds(1))?;
//! assert_eq!(logs.len(), 1);
//! assert!(store.get_logs("billing", now, now)?.is_empty());
//! # Ok::<(), logvault::LogError>(())
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod clock;
pub mod config;
pub mod error;
pub mod index;
pub mod store;
pub mod sweeper;
pub mod traits;
pub mod types;
pub mod vault;

// Re-export main types
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{StoreConfig, DEFAULT_RETENTION, DEFAULT_SWEEP_INTERVAL};
pub use error::{LogError, Result};
pub use index::ServiceIndex;
pub use store::{shared_store, LogStore, SharedLogStore};
pub use sweeper::{RetentionSweeper, SweeperHandle, SweeperState};
pub use traits::LogBackend;
pub use types::{LogEntry, ServiceName, StoreStats, SweepReport, TimeRange};
pub use vault::LogVault;
