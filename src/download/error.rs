//! Error types for the download module.
//!
//! Every variant describes the failure of a single file transfer. The engine
//! records them against that file and carries on with the rest of the run.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

/// Which declaration a transferred byte count was checked against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SizeSource {
    /// The response's `Content-Length` header.
    ContentLength,
    /// The size listed in the observation manifest.
    Manifest,
}

impl fmt::Display for SizeSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ContentLength => f.write_str("Content-Length"),
            Self::Manifest => f.write_str("manifest"),
        }
    }
}

/// Errors that can occur while retrieving one file.
#[derive(Debug, Error)]
pub enum DownloadError {
    /// Network-level error (DNS resolution, connection refused, reset mid-body).
    #[error("network error retrieving {url}: {source}")]
    Network {
        /// The retrieval URL.
        url: String,
        /// The underlying network error.
        #[source]
        source: reqwest::Error,
    },

    /// Request timed out before completion.
    #[error("timeout retrieving {url}")]
    Timeout {
        /// The retrieval URL.
        url: String,
    },

    /// The retrieval server answered with a non-success status.
    #[error("HTTP {status} retrieving {url}: {message}")]
    HttpStatus {
        /// The retrieval URL.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// The server's response body (truncated).
        message: String,
    },

    /// File system error (create, write, flush).
    #[error("IO error writing to {path}: {source}")]
    Io {
        /// The file path where the error occurred.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// The retrieval URL could not be built.
    #[error("invalid retrieval URL: {url}")]
    InvalidUrl {
        /// The rejected URL string.
        url: String,
    },

    /// Transferred byte count differs from the declared size.
    #[error(
        "size mismatch for {path}: {declared_by} declares {expected_bytes} bytes, got {actual_bytes}"
    )]
    SizeMismatch {
        /// Destination path of the transfer.
        path: PathBuf,
        /// Which declaration was violated.
        declared_by: SizeSource,
        /// Declared size in bytes.
        expected_bytes: u64,
        /// Bytes actually written.
        actual_bytes: u64,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build retrieval HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl DownloadError {
    /// Creates a network error, promoting timeouts to [`DownloadError::Timeout`].
    pub fn network(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { url: url.into() }
        } else {
            Self::Network {
                url: url.into(),
                source,
            }
        }
    }

    /// Creates an HTTP status error.
    pub fn http_status(url: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::HttpStatus {
            url: url.into(),
            status,
            message: message.into(),
        }
    }

    /// Creates a timeout error.
    pub fn timeout(url: impl Into<String>) -> Self {
        Self::Timeout { url: url.into() }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Creates an invalid URL error.
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    /// Creates a size mismatch error.
    pub fn size_mismatch(
        path: impl Into<PathBuf>,
        declared_by: SizeSource,
        expected_bytes: u64,
        actual_bytes: u64,
    ) -> Self {
        Self::SizeMismatch {
            path: path.into(),
            declared_by,
            expected_bytes,
            actual_bytes,
        }
    }

    /// Returns true for errors raised by the local filesystem.
    #[must_use]
    pub fn is_filesystem(&self) -> bool {
        matches!(self, Self::Io { .. })
    }
}

// No `From<reqwest::Error>` / `From<std::io::Error>`: every variant needs the
// URL or path the source error lacks, so callers use the constructors above.
