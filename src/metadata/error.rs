//! Error types for the metadata query.

use thiserror::Error;

use crate::filename::FilenameError;

/// Errors that can occur while fetching or filtering an observation manifest.
///
/// Every variant except [`MetadataError::MalformedName`] means the manifest is
/// unavailable; all of them abort the run before any download starts.
#[derive(Debug, Error)]
pub enum MetadataError {
    /// Transport-level failure (DNS, connection refused, reset while reading).
    #[error("metadata unavailable from {url}: {source}")]
    Unavailable {
        /// The metadata URL that was requested.
        url: String,
        /// The underlying transport error.
        #[source]
        source: reqwest::Error,
    },

    /// The request did not complete within the configured timeout.
    #[error("timeout querying metadata from {url}")]
    Timeout {
        /// The metadata URL that timed out.
        url: String,
    },

    /// The metadata service answered with a non-success status.
    #[error("HTTP {status} querying metadata from {url}")]
    Status {
        /// The metadata URL that was requested.
        url: String,
        /// The HTTP status code.
        status: u16,
    },

    /// The response body is not a manifest.
    #[error("invalid manifest from {url}: {source}")]
    InvalidBody {
        /// The metadata URL that was requested.
        url: String,
        /// The JSON decoding error.
        #[source]
        source: serde_json::Error,
    },

    /// A manifest entry could not be decoded while filtering by time.
    #[error(transparent)]
    MalformedName(#[from] FilenameError),

    /// The HTTP client could not be constructed.
    #[error("failed to build metadata HTTP client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}

impl MetadataError {
    /// Creates a transport error, promoting timeouts to [`MetadataError::Timeout`].
    pub fn transport(url: impl Into<String>, source: reqwest::Error) -> Self {
        if source.is_timeout() {
            Self::Timeout { url: url.into() }
        } else {
            Self::Unavailable {
                url: url.into(),
                source,
            }
        }
    }

    /// Creates an HTTP status error.
    pub fn status(url: impl Into<String>, status: u16) -> Self {
        Self::Status {
            url: url.into(),
            status,
        }
    }

    /// Creates an invalid-body error.
    pub fn invalid_body(url: impl Into<String>, source: serde_json::Error) -> Self {
        Self::InvalidBody {
            url: url.into(),
            source,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::filename::MalformedReason;

    #[test]
    fn test_metadata_status_display() {
        let error = MetadataError::status("http://meta/metadata/obs/?obs_id=1", 503);
        let msg = error.to_string();
        assert!(msg.contains("503"), "got: {msg}");
        assert!(msg.contains("obs_id=1"), "got: {msg}");
    }

    #[test]
    fn test_metadata_invalid_body_display() {
        let source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let error = MetadataError::invalid_body("http://meta/x", source);
        assert!(error.to_string().starts_with("invalid manifest from http://meta/x"));
    }

    #[test]
    fn test_malformed_name_is_transparent() {
        let error: MetadataError =
            FilenameError::malformed("x.tar", "combined", MalformedReason::MissingToken("combined"))
                .into();
        assert_eq!(
            error.to_string(),
            "invalid combined filename x.tar: combined not found in 3rd part"
        );
    }
}
