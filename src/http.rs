//! Shared HTTP client construction policy.
//!
//! The metadata, retrieval and pulsar database clients all build their
//! `reqwest` clients here so timeouts and the User-Agent stay consistent.

use std::time::Duration;

use reqwest::{Client, ClientBuilder};

use crate::user_agent;

/// Default HTTP connect timeout (30 seconds).
pub const CONNECT_TIMEOUT_SECS: u64 = 30;

/// Default HTTP read timeout (5 minutes without receiving any data).
pub const READ_TIMEOUT_SECS: u64 = 300;

/// Transport timeouts applied to every request of a client.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HttpTimeouts {
    /// Connect timeout in seconds.
    pub connect_secs: u64,
    /// Idle timeout between reads in seconds. There is no whole-request deadline.
    pub read_secs: u64,
}

impl Default for HttpTimeouts {
    fn default() -> Self {
        Self {
            connect_secs: CONNECT_TIMEOUT_SECS,
            read_secs: READ_TIMEOUT_SECS,
        }
    }
}

impl HttpTimeouts {
    /// Creates timeouts from explicit second values.
    #[must_use]
    pub const fn new(connect_secs: u64, read_secs: u64) -> Self {
        Self {
            connect_secs,
            read_secs,
        }
    }
}

/// Default archive username.
pub const DEFAULT_USERNAME: &str = "ngas";

/// Default archive password.
pub const DEFAULT_PASSWORD: &str = "ngas";

/// HTTP Basic credentials sent with archive requests.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Basic-auth username.
    pub username: String,
    /// Basic-auth password.
    pub password: String,
}

impl Credentials {
    /// Creates credentials from a username and password.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }
}

impl Default for Credentials {
    fn default() -> Self {
        Self::new(DEFAULT_USERNAME, DEFAULT_PASSWORD)
    }
}

impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Returns a builder carrying the project's timeout and User-Agent policy.
///
/// The read timeout bounds each wait for data, so a slow but steady body
/// transfer may run for as long as it keeps making progress.
pub(crate) fn base_client_builder(timeouts: HttpTimeouts) -> ClientBuilder {
    Client::builder()
        .connect_timeout(Duration::from_secs(timeouts.connect_secs))
        .read_timeout(Duration::from_secs(timeouts.read_secs))
        .user_agent(user_agent::default_user_agent())
}

/// Builds a client with the project's policy.
pub(crate) fn build_client(timeouts: HttpTimeouts) -> Result<Client, reqwest::Error> {
    base_client_builder(timeouts).build()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_timeouts() {
        let timeouts = HttpTimeouts::default();
        assert_eq!(timeouts.connect_secs, 30);
        assert_eq!(timeouts.read_secs, 300);
    }

    #[test]
    fn test_build_client_with_custom_timeouts() {
        assert!(build_client(HttpTimeouts::new(1, 2)).is_ok());
    }

    #[test]
    fn test_default_credentials() {
        let credentials = Credentials::default();
        assert_eq!(credentials.username, "ngas");
        assert_eq!(credentials.password, "ngas");
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let credentials = Credentials::new("observer", "hunter2");
        let debug = format!("{credentials:?}");
        assert!(debug.contains("observer"));
        assert!(!debug.contains("hunter2"), "got: {debug}");
    }
}
