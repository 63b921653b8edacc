//! Concurrent file retrieval from the NGAS archive.
//!
//! - [`RetrieveClient`] performs one authenticated, streamed transfer
//! - [`completion::is_complete`] lets reruns skip files already on disk
//! - [`RunStatus`] aggregates progress and per-file errors
//! - [`DownloadEngine`] runs transfers with bounded concurrency

mod client;
pub mod completion;
mod constants;
mod engine;
mod error;
mod status;

pub use client::{DownloadFileResult, PrestageHint, RetrieveClient};
pub use constants::{BUFFER_SIZE, DEFAULT_NGAS_HOST, PRESTAGE_HEADER};
pub use engine::{
    DEFAULT_CONCURRENCY, DownloadEngine, DownloadTask, EngineError, EngineOutcome,
    MAX_CONCURRENCY, MIN_CONCURRENCY,
};
pub use error::{DownloadError, SizeSource};
pub use status::{RunStatus, StatusSnapshot};
