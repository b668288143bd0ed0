//! Background retention sweeper.
//!
//! A Tokio task that calls [`LogStore::sweep`] on a fixed interval until it
//! is cancelled. Each pass runs on the blocking pool so a large store never
//! stalls an async worker. Sweeps are best-effort: a late or skipped tick
//! simply waits for the next one, and nothing is ever reported back to store
//! callers.

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::store::LogStore;

/// Shortest interval the sweeper will tick at.
const MIN_INTERVAL: Duration = Duration::from_millis(1);

/// Lifecycle state of a sweeper task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SweeperState {
    /// Waiting for the next tick.
    Idle,
    /// Running a sweep pass.
    Sweeping,
    /// The task has exited.
    Stopped,
}

impl SweeperState {
    const fn as_u8(self) -> u8 {
        match self {
            Self::Idle => 0,
            Self::Sweeping => 1,
            Self::Stopped => 2,
        }
    }

    const fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Sweeping,
            _ => Self::Stopped,
        }
    }
}

/// Builder for the periodic retention task.
#[derive(Debug)]
pub struct RetentionSweeper {
    store: Arc<LogStore>,
    interval: Duration,
}

impl RetentionSweeper {
    /// Creates a sweeper using the store's configured interval.
    #[must_use]
    pub fn new(store: Arc<LogStore>) -> Self {
        let interval = store.config().sweep_interval;
        Self { store, interval }
    }

    /// Overrides the sweep interval.
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Starts the sweeper on the current Tokio runtime.
    ///
    /// The first sweep happens one interval after spawning.
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    #[must_use]
    pub fn spawn(self) -> SweeperHandle {
        let cancel = CancellationToken::new();
        let shared = Arc::new(Shared {
            state: AtomicU8::new(SweeperState::Idle.as_u8()),
            cycles: AtomicU64::new(0),
        });

        let interval = self.interval.max(MIN_INTERVAL);
        if interval != self.interval {
            warn!(requested = ?self.interval, "sweep interval too small, clamping");
        }

        let task = tokio::spawn(run(self.store, interval, cancel.clone(), Arc::clone(&shared)));
        debug!(?interval, "retention sweeper started");

        SweeperHandle {
            cancel,
            shared,
            task: Some(task),
        }
    }
}

#[derive(Debug)]
struct Shared {
    state: AtomicU8,
    cycles: AtomicU64,
}

impl Shared {
    fn set_state(&self, state: SweeperState) {
        self.state.store(state.as_u8(), Ordering::SeqCst);
    }
}

async fn run(
    store: Arc<LogStore>,
    interval: Duration,
    cancel: CancellationToken,
    shared: Arc<Shared>,
) {
    let mut ticker = time::interval_at(Instant::now() + interval, interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            biased;
            () = cancel.cancelled() => break,
            _ = ticker.tick() => {}
        }

        shared.set_state(SweeperState::Sweeping);
        // The pass takes every index lock in turn; keep it off the async workers.
        let pass = Arc::clone(&store);
        let report = match tokio::task::spawn_blocking(move || pass.sweep()).await {
            Ok(report) => report,
            Err(e) => {
                shared.set_state(SweeperState::Idle);
                warn!(error = %e, "retention sweep failed, retrying next cycle");
                continue;
            }
        };
        let cycle = shared.cycles.fetch_add(1, Ordering::SeqCst) + 1;
        shared.set_state(SweeperState::Idle);

        if report.is_noop() {
            debug!(cycle, scanned = report.services_scanned, "retention sweep found nothing");
        } else {
            info!(
                cycle,
                scanned = report.services_scanned,
                evicted = report.entries_evicted,
                dropped = report.services_dropped,
                "retention sweep complete"
            );
        }
    }

    shared.set_state(SweeperState::Stopped);
    debug!("retention sweeper stopped");
}

/// Handle for controlling a running sweeper.
///
/// Dropping the handle cancels the task.
#[derive(Debug)]
pub struct SweeperHandle {
    cancel: CancellationToken,
    shared: Arc<Shared>,
    task: Option<JoinHandle<()>>,
}

impl SweeperHandle {
    /// Returns the current state of the task.
    #[must_use]
    pub fn state(&self) -> SweeperState {
        SweeperState::from_u8(self.shared.state.load(Ordering::SeqCst))
    }

    /// Returns how many sweep cycles have completed.
    #[must_use]
    pub fn cycles(&self) -> u64 {
        self.shared.cycles.load(Ordering::SeqCst)
    }

    /// Returns true until the task has been cancelled.
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled()
    }

    /// Returns a token that stops the sweeper when cancelled.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stops the sweeper and waits for the task to exit.
    pub async fn shutdown(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            if let Err(e) = task.await {
                warn!(error = %e, "retention sweeper task ended abnormally");
            }
        }
    }
}

impl Drop for SweeperHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
