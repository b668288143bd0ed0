//! A store paired with its retention sweeper.

use std::sync::Arc;

use crate::clock::{Clock, SystemClock};
use crate::config::StoreConfig;
use crate::error::Result;
use crate::store::LogStore;
use crate::sweeper::{RetentionSweeper, SweeperHandle};

/// A running log store: the shared [`LogStore`] plus the task that keeps it
/// within its retention window.
#[derive(Debug)]
pub struct LogVault {
    store: Arc<LogStore>,
    sweeper: SweeperHandle,
}

impl LogVault {
    /// Validates `config`, builds a store, and starts its sweeper.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn start(config: StoreConfig) -> Result<Self> {
        Self::start_with_clock(config, Arc::new(SystemClock))
    }

    /// Like [`start`](Self::start) with an explicit time source.
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn start_with_clock(config: StoreConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        config.validate()?;
        let store = Arc::new(LogStore::with_clock(config, clock));
        let sweeper = RetentionSweeper::new(Arc::clone(&store)).spawn();
        Ok(Self { store, sweeper })
    }

    /// Returns a handle to the store for ingest and queries.
    #[must_use]
    pub fn store(&self) -> Arc<LogStore> {
        Arc::clone(&self.store)
    }

    /// Returns the sweeper handle.
    #[must_use]
    pub const fn sweeper(&self) -> &SweeperHandle {
        &self.sweeper
    }

    /// Stops the sweeper. The store stays usable through any handles
    /// obtained from [`store`](Self::store).
    pub async fn shutdown(self) {
        self.sweeper.shutdown().await;
    }
}
