//! Shared progress and error aggregation for a download run.
//!
//! Every transfer task reports into one [`RunStatus`]. Updates to the counters
//! and the error list happen under a single lock, so a reader always sees a
//! consistent [`StatusSnapshot`] and every failure is recorded exactly once.

use std::fmt::Display;
use std::sync::{Mutex, MutexGuard};

use tracing::{debug, info, warn};

#[derive(Debug, Default)]
struct StatusInner {
    total: u64,
    completed: u64,
    skipped: u64,
    in_flight: usize,
    peak_in_flight: usize,
    errors: Vec<String>,
}

/// Point-in-time copy of a run's progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StatusSnapshot {
    /// Files in the run.
    pub total: u64,
    /// Files completed, including those already present locally.
    pub completed: u64,
    /// Files found already complete and not transferred.
    pub skipped: u64,
    /// Transfers currently running.
    pub in_flight: usize,
    /// Highest number of simultaneous transfers observed.
    pub peak_in_flight: usize,
    /// One `"<file name> <error>"` line per failed file, in completion order.
    pub errors: Vec<String>,
}

impl StatusSnapshot {
    /// Number of failed files.
    #[must_use]
    pub fn failed(&self) -> u64 {
        self.errors.len() as u64
    }

    /// Files actually transferred during the run.
    #[must_use]
    pub fn downloaded(&self) -> u64 {
        self.completed.saturating_sub(self.skipped)
    }

    /// Files that neither completed nor failed.
    #[must_use]
    pub fn unfinished(&self) -> u64 {
        self.total
            .saturating_sub(self.completed)
            .saturating_sub(self.failed())
    }
}

/// Thread-safe run status shared by all transfer tasks.
#[derive(Debug, Default)]
pub struct RunStatus {
    inner: Mutex<StatusInner>,
}

impl RunStatus {
    /// Creates a status for a run of `total` files.
    #[must_use]
    pub fn new(total: u64) -> Self {
        Self {
            inner: Mutex::new(StatusInner {
                total,
                ..StatusInner::default()
            }),
        }
    }

    fn lock(&self) -> MutexGuard<'_, StatusInner> {
        // A panicking reporter cannot leave the counters half-updated.
        self.inner
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
    }

    /// Marks a transfer as started.
    pub fn record_start(&self, file_name: &str) {
        let in_flight = {
            let mut inner = self.lock();
            inner.in_flight += 1;
            inner.peak_in_flight = inner.peak_in_flight.max(inner.in_flight);
            inner.in_flight
        };
        debug!(file = file_name, in_flight, "transfer started");
    }

    /// Marks a transfer as finished successfully.
    pub fn record_success(&self, file_name: &str) {
        let (completed, total) = {
            let mut inner = self.lock();
            inner.in_flight = inner.in_flight.saturating_sub(1);
            inner.completed += 1;
            (inner.completed, inner.total)
        };
        info!(file = file_name, completed, total, "file complete");
    }

    /// Marks a file as already present locally with the expected size.
    pub fn record_already_complete(&self, file_name: &str) {
        let (completed, total) = {
            let mut inner = self.lock();
            inner.completed += 1;
            inner.skipped += 1;
            (inner.completed, inner.total)
        };
        info!(file = file_name, completed, total, "already complete, skipping");
    }

    /// Records a failed transfer as `"<file name> <error>"`.
    pub fn record_error(&self, file_name: &str, error: impl Display) {
        let message = format!("{file_name} {error}");
        let failed = {
            let mut inner = self.lock();
            inner.in_flight = inner.in_flight.saturating_sub(1);
            inner.errors.push(message.clone());
            inner.errors.len()
        };
        warn!(file = file_name, failed, error = %message, "file failed");
    }

    /// Returns `(completed, failed, total)` without copying the error list.
    #[must_use]
    pub fn counts(&self) -> (u64, u64, u64) {
        let inner = self.lock();
        (inner.completed, inner.errors.len() as u64, inner.total)
    }

    /// Returns a consistent copy of the current status.
    #[must_use]
    pub fn snapshot(&self) -> StatusSnapshot {
        let inner = self.lock();
        StatusSnapshot {
            total: inner.total,
            completed: inner.completed,
            skipped: inner.skipped,
            in_flight: inner.in_flight,
            peak_in_flight: inner.peak_in_flight,
            errors: inner.errors.clone(),
        }
    }
}
