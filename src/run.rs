//! Run orchestration: one observation, from manifest query to final report.
//!
//! A run is split in two phases so callers can observe progress:
//! [`prepare`] validates the configuration, queries the manifest and creates
//! the output directory; [`PreparedRun::execute`] skips files already on disk
//! and drives the engine. [`run_download`] chains both.

use std::future::Future;
use std::path::PathBuf;
use std::sync::Arc;

use thiserror::Error;
use tracing::{info, instrument};

use crate::download::{
    DEFAULT_CONCURRENCY, DEFAULT_NGAS_HOST, DownloadEngine, DownloadError, DownloadTask,
    EngineError, EngineOutcome, PrestageHint, RetrieveClient, RunStatus, completion,
};
use crate::http::{Credentials, HttpTimeouts};
use crate::metadata::{
    DEFAULT_METADATA_HOST, MetadataClient, MetadataError, ProductSelector, RemoteFile, TimeWindow,
};

/// Default cap on the number of files a single run may retrieve.
pub const DEFAULT_MAX_FILES: usize = 12_000;

/// Everything a run needs to know.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunConfig {
    /// Observation to retrieve.
    pub observation_id: u64,
    /// Product type selection.
    pub selector: ProductSelector,
    /// Optional GPS time window.
    pub window: Option<TimeWindow>,
    /// Archive metadata host.
    pub metadata_host: String,
    /// NGAS retrieval host (`name:port`).
    pub ngas_host: String,
    /// Output directory.
    pub output_dir: PathBuf,
    /// Maximum simultaneous transfers.
    pub concurrency: usize,
    /// Maximum number of files the run may retrieve.
    pub max_files: usize,
    /// Basic-auth credentials for the retrieval host.
    pub credentials: Credentials,
    /// Transport timeouts.
    pub timeouts: HttpTimeouts,
}

impl RunConfig {
    /// Creates a configuration with built-in defaults for `observation_id`.
    #[must_use]
    pub fn new(observation_id: u64) -> Self {
        Self {
            observation_id,
            selector: ProductSelector::default(),
            window: None,
            metadata_host: DEFAULT_METADATA_HOST.to_string(),
            ngas_host: DEFAULT_NGAS_HOST.to_string(),
            output_dir: PathBuf::from("."),
            concurrency: DEFAULT_CONCURRENCY,
            max_files: DEFAULT_MAX_FILES,
            credentials: Credentials::default(),
            timeouts: HttpTimeouts::default(),
        }
    }
}

/// Fatal errors that end a run before or instead of transferring files.
#[derive(Debug, Error)]
pub enum RunError {
    /// Engine construction failed (concurrency out of range).
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// The manifest could not be obtained or decoded.
    #[error(transparent)]
    Metadata(#[from] MetadataError),

    /// Nothing matched the selection.
    #[error("no files found for observation {observation_id} ({selector})")]
    NoFilesFound {
        /// Requested observation.
        observation_id: u64,
        /// Requested product selection.
        selector: ProductSelector,
    },

    /// More files matched than the run may retrieve.
    #[error("{count} files selected, more than the limit of {limit}")]
    TooManyFiles {
        /// Files selected.
        count: usize,
        /// Configured limit.
        limit: usize,
    },

    /// The output directory could not be created.
    #[error("cannot create output directory {path}: {source}")]
    OutputDir {
        /// Requested output directory.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The retrieval client could not be built.
    #[error(transparent)]
    Client(#[from] DownloadError),
}

/// Result of a finished (or interrupted) run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Observation retrieved.
    pub observation_id: u64,
    /// Files selected.
    pub total: u64,
    /// Files complete at the end of the run.
    pub completed: u64,
    /// Files already complete before the run.
    pub skipped: u64,
    /// Files transferred during the run.
    pub downloaded: u64,
    /// One `"<file name> <error>"` line per failed file.
    pub errors: Vec<String>,
    /// Highest number of simultaneous transfers.
    pub peak_in_flight: usize,
    /// Whether the run was cut short by a shutdown signal.
    pub interrupted: bool,
}

impl RunReport {
    /// True when every selected file is complete and nothing failed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        !self.interrupted && self.errors.is_empty() && self.completed == self.total
    }

    /// Number of failed files.
    #[must_use]
    pub fn failed(&self) -> u64 {
        self.errors.len() as u64
    }
}

/// A run whose manifest is known and whose output directory exists.
#[derive(Debug)]
pub struct PreparedRun {
    config: RunConfig,
    engine: DownloadEngine,
    client: RetrieveClient,
    files: Vec<RemoteFile>,
    status: Arc<RunStatus>,
}

impl PreparedRun {
    /// Files selected for the run, in name order.
    #[must_use]
    pub fn files(&self) -> &[RemoteFile] {
        &self.files
    }

    /// Shared status, for progress display while [`execute`](Self::execute) runs.
    #[must_use]
    pub fn status(&self) -> Arc<RunStatus> {
        Arc::clone(&self.status)
    }

    /// Skips complete files, transfers the rest and reports the outcome.
    ///
    /// # Errors
    ///
    /// Returns [`RunError::Client`] if a retrieval URL cannot be built, or
    /// [`RunError::Engine`] if the engine fails. Per-file failures are
    /// reported in [`RunReport::errors`], not as errors.
    #[instrument(skip_all, fields(observation_id = self.config.observation_id))]
    pub async fn execute<F>(self, shutdown: F) -> Result<RunReport, RunError>
    where
        F: Future<Output = ()>,
    {
        let prestage = PrestageHint::from_names(self.files.iter().map(|f| f.name.as_str()));

        let mut tasks = Vec::new();
        for file in &self.files {
            let local_path = self.config.output_dir.join(&file.name);
            if completion::is_complete(&local_path, file.size).await {
                self.status.record_already_complete(&file.name);
                continue;
            }
            let url = self.client.retrieve_url(&file.name)?;
            tasks.push(DownloadTask::new(url, file.clone(), &self.config.output_dir));
        }

        info!(
            total = self.files.len(),
            pending = tasks.len(),
            concurrency = self.engine.concurrency(),
            "starting transfers"
        );

        let outcome = self
            .engine
            .process_tasks_until(tasks, &self.client, &prestage, &self.status, shutdown)
            .await?;

        let snapshot = self.status.snapshot();
        let report = RunReport {
            observation_id: self.config.observation_id,
            total: snapshot.total,
            completed: snapshot.completed,
            skipped: snapshot.skipped,
            downloaded: snapshot.downloaded(),
            peak_in_flight: snapshot.peak_in_flight,
            errors: snapshot.errors,
            interrupted: outcome == EngineOutcome::Interrupted,
        };

        info!(
            completed = report.completed,
            failed = report.failed(),
            interrupted = report.interrupted,
            "run finished"
        );
        Ok(report)
    }
}

/// Validates the configuration, queries the manifest and creates the output
/// directory.
///
/// # Errors
///
/// Returns the fatal [`RunError`] for invalid concurrency, a failed manifest
/// query, an empty selection, a selection over the file cap or an
/// uncreatable output directory.
#[instrument(skip_all, fields(observation_id = config.observation_id, selector = %config.selector))]
pub async fn prepare(config: &RunConfig) -> Result<PreparedRun, RunError> {
    let engine = DownloadEngine::new(config.concurrency)?;

    let metadata = MetadataClient::with_timeouts(config.metadata_host.clone(), config.timeouts)?;
    let files = metadata
        .query_observation(config.observation_id, config.selector, config.window)
        .await?;

    if files.is_empty() {
        return Err(RunError::NoFilesFound {
            observation_id: config.observation_id,
            selector: config.selector,
        });
    }
    if files.len() > config.max_files {
        return Err(RunError::TooManyFiles {
            count: files.len(),
            limit: config.max_files,
        });
    }

    tokio::fs::create_dir_all(&config.output_dir)
        .await
        .map_err(|source| RunError::OutputDir {
            path: config.output_dir.clone(),
            source,
        })?;

    let client = RetrieveClient::with_timeouts(
        config.ngas_host.clone(),
        config.credentials.clone(),
        config.timeouts,
    )?;

    let status = Arc::new(RunStatus::new(files.len() as u64));
    Ok(PreparedRun {
        config: config.clone(),
        engine,
        client,
        files,
        status,
    })
}

/// Runs a whole download for one observation.
///
/// # Errors
///
/// See [`prepare`] and [`PreparedRun::execute`].
pub async fn run_download<F>(config: &RunConfig, shutdown: F) -> Result<RunReport, RunError>
where
    F: Future<Output = ()>,
{
    prepare(config).await?.execute(shutdown).await
}
