//! Download engine for concurrent file retrieval.
//!
//! This module provides the [`DownloadEngine`] which runs one transfer task per
//! file with at most `concurrency` transfers in flight, using a
//! semaphore-based concurrency control pattern.
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use voltdownload_core::download::{
//!     DownloadEngine, DownloadTask, PrestageHint, RetrieveClient, RunStatus,
//! };
//! use voltdownload_core::http::Credentials;
//! use voltdownload_core::metadata::RemoteFile;
//!
//! # async fn example(files: Vec<RemoteFile>) -> Result<(), Box<dyn std::error::Error>> {
//! let client = RetrieveClient::new("fe4.pawsey.org.au:7790", Credentials::default())?;
//! let hint = PrestageHint::from_names(files.iter().map(|f| f.name.as_str()));
//! let status = Arc::new(RunStatus::new(files.len() as u64));
//! let mut tasks = Vec::new();
//! for file in files {
//!     tasks.push(DownloadTask::new(client.retrieve_url(&file.name)?, file, "."));
//! }
//! let engine = DownloadEngine::new(6)?;
//! engine.process_tasks(tasks, &client, &hint, &status).await?;
//! println!("{:?}", status.snapshot());
//! # Ok(())
//! # }
//! ```

mod task;

use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, info, instrument, warn};

use super::client::{PrestageHint, RetrieveClient};
use super::status::RunStatus;
pub use task::DownloadTask;
use task::process_download_task;

/// Minimum allowed concurrency value.
pub const MIN_CONCURRENCY: usize = 1;

/// Maximum allowed concurrency value.
pub const MAX_CONCURRENCY: usize = 12;

/// Default concurrency if not specified.
pub const DEFAULT_CONCURRENCY: usize = 6;

/// Error type for download engine operations.
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// Invalid concurrency value provided.
    #[error(
        "invalid concurrency value {value}: must be between {MIN_CONCURRENCY} and {MAX_CONCURRENCY}"
    )]
    InvalidConcurrency {
        /// The invalid value that was provided.
        value: usize,
    },

    /// Semaphore was closed unexpectedly.
    #[error("semaphore closed unexpectedly")]
    SemaphoreClosed,
}

/// How a batch of transfers ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EngineOutcome {
    /// Every task ran to completion (successfully or not).
    Completed,
    /// The shutdown signal fired; in-flight transfers were aborted.
    Interrupted,
}

/// Download engine for concurrent file retrieval.
///
/// # Concurrency Model
///
/// - Each transfer runs in its own Tokio task
/// - A semaphore permit is acquired before spawning each task
/// - Permits are released automatically when transfers finish (RAII)
/// - The engine returns only after every spawned task has finished
///
/// Per-file failures are recorded in the shared [`RunStatus`] and never
/// stop the batch.
#[derive(Debug)]
pub struct DownloadEngine {
    /// Semaphore for concurrency control.
    semaphore: Arc<Semaphore>,
    /// Configured concurrency limit.
    concurrency: usize,
}

impl DownloadEngine {
    /// Creates a new engine with the given concurrency limit.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::InvalidConcurrency`] if the value is outside
    /// the valid range (1-12).
    ///
    /// # Example
    ///
    /// ```
    /// use voltdownload_core::download::DownloadEngine;
    ///
    /// let engine = DownloadEngine::new(6).unwrap();
    /// assert_eq!(engine.concurrency(), 6);
    /// assert!(DownloadEngine::new(13).is_err());
    /// ```
    #[instrument(level = "debug")]
    pub fn new(concurrency: usize) -> Result<Self, EngineError> {
        if !(MIN_CONCURRENCY..=MAX_CONCURRENCY).contains(&concurrency) {
            return Err(EngineError::InvalidConcurrency { value: concurrency });
        }

        debug!(concurrency, "creating download engine");

        Ok(Self {
            semaphore: Arc::new(Semaphore::new(concurrency)),
            concurrency,
        })
    }

    /// Returns the configured concurrency limit.
    #[must_use]
    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    /// Runs every task and waits for all of them to finish.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SemaphoreClosed`] if permit acquisition fails.
    /// Individual transfer failures do NOT cause this method to error.
    pub async fn process_tasks(
        &self,
        tasks: Vec<DownloadTask>,
        client: &RetrieveClient,
        prestage: &PrestageHint,
        status: &Arc<RunStatus>,
    ) -> Result<(), EngineError> {
        self.drain(tasks, client, prestage, status).await
    }

    /// Runs every task until all finish or `shutdown` resolves.
    ///
    /// On shutdown no further task is started and in-flight transfers are
    /// aborted; their partial files stay on disk.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::SemaphoreClosed`] if permit acquisition fails.
    #[instrument(skip_all, fields(tasks = tasks.len(), concurrency = self.concurrency))]
    pub async fn process_tasks_until<F>(
        &self,
        tasks: Vec<DownloadTask>,
        client: &RetrieveClient,
        prestage: &PrestageHint,
        status: &Arc<RunStatus>,
        shutdown: F,
    ) -> Result<EngineOutcome, EngineError>
    where
        F: Future<Output = ()>,
    {
        tokio::select! {
            result = self.drain(tasks, client, prestage, status) => {
                result.map(|()| EngineOutcome::Completed)
            }
            () = shutdown => {
                // Dropping the drain future drops its JoinSet, aborting every transfer.
                let snapshot = status.snapshot();
                warn!(
                    completed = snapshot.completed,
                    in_flight = snapshot.in_flight,
                    "shutdown requested, aborting in-flight transfers"
                );
                Ok(EngineOutcome::Interrupted)
            }
        }
    }

    async fn drain(
        &self,
        tasks: Vec<DownloadTask>,
        client: &RetrieveClient,
        prestage: &PrestageHint,
        status: &Arc<RunStatus>,
    ) -> Result<(), EngineError> {
        let mut join_set = JoinSet::new();
        let mut names: HashMap<tokio::task::Id, String> = HashMap::new();

        for task in tasks {
            let permit = Arc::clone(&self.semaphore)
                .acquire_owned()
                .await
                .map_err(|_| EngineError::SemaphoreClosed)?;

            let name = task.file_name().to_string();
            let client = client.clone();
            let prestage = prestage.clone();
            let status_for_task = Arc::clone(status);

            let handle = join_set.spawn(async move {
                let _permit = permit;
                process_download_task(task, client, prestage, &status_for_task).await;
            });
            names.insert(handle.id(), name);

            while let Some(joined) = join_set.try_join_next_with_id() {
                reap(joined, &mut names, status);
            }
        }

        while let Some(joined) = join_set.join_next_with_id().await {
            reap(joined, &mut names, status);
        }

        info!(concurrency = self.concurrency, "all transfers finished");
        Ok(())
    }
}

fn reap(
    joined: Result<(tokio::task::Id, ()), JoinError>,
    names: &mut HashMap<tokio::task::Id, String>,
    status: &RunStatus,
) {
    match joined {
        Ok((id, ())) => {
            names.remove(&id);
        }
        Err(error) => {
            let name = names.remove(&error.id()).unwrap_or_default();
            if error.is_panic() {
                status.record_error(&name, "transfer task panicked");
            }
        }
    }
}
