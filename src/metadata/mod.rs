//! Observation manifest query against the archive metadata service.
//!
//! The metadata service lists every file stored for an observation together
//! with its declared product type and size. [`MetadataClient`] fetches that
//! listing with a single request and narrows it to the requested products
//! (and time window) with [`filter_manifest`].
//!
//! # Example
//!
//! ```no_run
//! use voltdownload_core::metadata::{MetadataClient, ProductSelector, TimeWindow};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let client = MetadataClient::new("mwa-metadata01.pawsey.org.au")?;
//! let files = client
//!     .query_observation(1_096_952_256, ProductSelector::Combined, Some(TimeWindow::new(1_096_952_256, 120)))
//!     .await?;
//! println!("{} files selected", files.len());
//! # Ok(())
//! # }
//! ```

mod error;
mod filter;

use reqwest::Client;
use tracing::{debug, info, instrument};

use crate::http::{HttpTimeouts, build_client};

pub use error::MetadataError;
pub use filter::{
    ManifestEntry, ObservationManifest, ParseSelectorError, ProductSelector, RemoteFile,
    TimeWindow, filter_manifest,
};

/// Default archive metadata host.
pub const DEFAULT_METADATA_HOST: &str = "mwa-metadata01.pawsey.org.au";

/// Client for the observation-listing endpoint.
#[derive(Debug, Clone)]
pub struct MetadataClient {
    client: Client,
    host: String,
}

impl MetadataClient {
    /// Creates a client for `host` (`name` or `name:port`) with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new(host: impl Into<String>) -> Result<Self, MetadataError> {
        Self::with_timeouts(host, HttpTimeouts::default())
    }

    /// Creates a client for `host` with explicit transport timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`MetadataError::ClientBuild`] if the HTTP client cannot be built.
    pub fn with_timeouts(
        host: impl Into<String>,
        timeouts: HttpTimeouts,
    ) -> Result<Self, MetadataError> {
        let client = build_client(timeouts).map_err(MetadataError::ClientBuild)?;
        Ok(Self {
            client,
            host: host.into(),
        })
    }

    /// Returns the listing URL for an observation.
    #[must_use]
    pub fn observation_url(&self, observation_id: u64) -> String {
        format!(
            "http://{}/metadata/obs/?obs_id={observation_id}",
            self.host
        )
    }

    /// Fetches the full, unfiltered manifest of an observation.
    ///
    /// # Errors
    ///
    /// Returns a transport, status or body error; no retry is attempted.
    #[instrument(skip(self), fields(host = %self.host))]
    pub async fn fetch_manifest(
        &self,
        observation_id: u64,
    ) -> Result<ObservationManifest, MetadataError> {
        let url = self.observation_url(observation_id);
        debug!(url = %url, "requesting observation manifest");

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| MetadataError::transport(&url, e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(MetadataError::status(&url, status.as_u16()));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| MetadataError::transport(&url, e))?;
        let manifest: ObservationManifest =
            serde_json::from_slice(&body).map_err(|e| MetadataError::invalid_body(&url, e))?;

        debug!(files = manifest.files.len(), "manifest received");
        Ok(manifest)
    }

    /// Fetches the manifest and selects the files the run should retrieve.
    ///
    /// # Errors
    ///
    /// Returns the errors of [`fetch_manifest`](Self::fetch_manifest), or
    /// [`MetadataError::MalformedName`] when a window is given and a matching
    /// entry's name cannot be decoded.
    #[instrument(skip(self), fields(host = %self.host))]
    pub async fn query_observation(
        &self,
        observation_id: u64,
        selector: ProductSelector,
        window: Option<TimeWindow>,
    ) -> Result<Vec<RemoteFile>, MetadataError> {
        let manifest = self.fetch_manifest(observation_id).await?;
        let selected = filter_manifest(&manifest, selector, window)?;

        info!(
            observation_id,
            listed = manifest.files.len(),
            selected = selected.len(),
            selector = %selector,
            "observation manifest filtered"
        );
        Ok(selected)
    }
}
