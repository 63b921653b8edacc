//! Error types for the pulsar database client.

use std::path::PathBuf;

use thiserror::Error;

/// Errors returned by [`PulsarDbClient`](super::PulsarDbClient).
#[derive(Debug, Error)]
pub enum PulsarDbError {
    /// The base URL or an endpoint URL is not valid.
    #[error("invalid pulsar database URL: {url}")]
    InvalidUrl {
        /// The rejected URL.
        url: String,
    },

    /// The request could not be completed.
    #[error("request to {url} failed: {source}")]
    Transport {
        /// Endpoint URL.
        url: String,
        /// The underlying error.
        #[source]
        source: reqwest::Error,
    },

    /// The server answered with a non-success status.
    #[error("HTTP {status} from {url}: {message}")]
    Status {
        /// Endpoint URL.
        url: String,
        /// The HTTP status code.
        status: u16,
        /// The server's response body.
        message: String,
    },

    /// The response body is not valid JSON.
    #[error("invalid JSON from {url}: {source}")]
    InvalidBody {
        /// Endpoint URL.
        url: String,
        /// The decode error.
        #[source]
        source: reqwest::Error,
    },

    /// A local file could not be read or written.
    #[error("IO error on {path}: {source}")]
    Io {
        /// The file involved.
        path: PathBuf,
        /// The underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// A value cannot be carried in an HTTP header.
    #[error("value for header {name} is not valid: {value}")]
    InvalidHeader {
        /// Header name.
        name: String,
        /// Rejected value.
        value: String,
    },

    /// A file name to download has no usable final component.
    #[error("invalid file name: {name}")]
    InvalidFileName {
        /// The rejected name.
        name: String,
    },

    /// The HTTP client could not be constructed.
    #[error("failed to build pulsar database HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl PulsarDbError {
    /// Creates a transport error.
    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        Self::Transport {
            url: url.into(),
            source,
        }
    }

    /// Creates a status error.
    pub fn status(url: impl Into<String>, status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            url: url.into(),
            status,
            message: message.into(),
        }
    }

    /// Creates an IO error.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_error_display() {
        let error = PulsarDbError::status("http://db/pulsar_get/", 404, "not found");
        assert_eq!(
            error.to_string(),
            "HTTP 404 from http://db/pulsar_get/: not found"
        );
    }

    #[test]
    fn test_invalid_header_display() {
        let error = PulsarDbError::InvalidHeader {
            name: "filepath".to_string(),
            value: "caf\u{e9}".to_string(),
        };
        assert!(error.to_string().contains("filepath"));
    }
}
