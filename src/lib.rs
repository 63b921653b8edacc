//! Voltdownload Core Library
//!
//! Bulk retrieval of observation voltage data from the MWA archive: query an
//! observation's file manifest, select files by product type and GPS time
//! window, and fetch them from the NGAS archive with bounded parallelism.
//! Files already on disk with the declared size are skipped, so runs resume.
//!
//! # Architecture
//!
//! - [`filename`] - Archive file-name grammars and GPS time conversion
//! - [`metadata`] - Manifest query and product/time-window selection
//! - [`download`] - Authenticated streamed retrieval and the transfer engine
//! - [`run`] - One observation, from manifest query to final report
//! - [`pulsar_db`] - Client for the pulsar detection database
//! - [`http`] - Shared HTTP client construction, credentials and timeouts

// Clippy lints - strict for library code
#![deny(clippy::unwrap_used)]
#![deny(clippy::expect_used)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod download;
pub mod filename;
pub mod http;
pub mod metadata;
pub mod pulsar_db;
pub mod run;
#[cfg(test)]
pub mod test_support;
pub(crate) mod user_agent;

// Re-export commonly used types
pub use download::{
    DEFAULT_CONCURRENCY, DownloadEngine, DownloadError, EngineError, EngineOutcome,
    RetrieveClient, RunStatus, StatusSnapshot,
};
pub use filename::{FilenameError, ProductType};
pub use metadata::{MetadataClient, MetadataError, ProductSelector, RemoteFile, TimeWindow};
pub use pulsar_db::{PulsarDbClient, PulsarDbError};
pub use run::{
    DEFAULT_MAX_FILES, PreparedRun, RunConfig, RunError, RunReport, prepare, run_download,
};
