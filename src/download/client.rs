//! HTTP client for the NGAS retrieval endpoint.
//!
//! [`RetrieveClient`] issues one authenticated GET per file, streams the body
//! into the output directory through a 64 KiB write buffer and verifies the
//! transferred byte count before reporting success.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use futures_util::StreamExt;
use reqwest::Client;
use reqwest::header::CONTENT_LENGTH;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument, warn};
use url::Url;

use super::constants::{BUFFER_SIZE, MAX_ERROR_BODY_CHARS, PRESTAGE_HEADER, RETRIEVE_PATH};
use super::error::{DownloadError, SizeSource};
use crate::http::{Credentials, HttpTimeouts, build_client};

/// JSON list of every file name of a run, sent with each retrieval request so
/// the archive can stage the whole set from tape ahead of time.
///
/// Cloning is cheap; all clones share one string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrestageHint(Arc<str>);

impl PrestageHint {
    /// Builds the hint from the run's file names, in the given order.
    #[must_use]
    pub fn from_names<'a>(names: impl IntoIterator<Item = &'a str>) -> Self {
        let names: Vec<&str> = names.into_iter().collect();
        // Serializing a list of strings cannot fail.
        let json = serde_json::to_string(&names).unwrap_or_else(|_| String::from("[]"));
        Self(Arc::from(json))
    }

    /// Returns the JSON text of the hint.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Default for PrestageHint {
    fn default() -> Self {
        Self(Arc::from("[]"))
    }
}

/// Outcome of one successful retrieval.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadFileResult {
    /// Final output path.
    pub path: PathBuf,
    /// Bytes written to `path`.
    pub bytes_written: u64,
}

/// Client for `http://{host}/RETRIEVE?file_id={name}`.
///
/// Created once per run and shared by all transfer tasks (connection pooling).
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
/// use voltdownload_core::download::{PrestageHint, RetrieveClient};
/// use voltdownload_core::http::Credentials;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let client = RetrieveClient::new("fe4.pawsey.org.au:7790", Credentials::default())?;
/// let url = client.retrieve_url("1096952256_1096952256_ch01.dat")?;
/// let hint = PrestageHint::from_names(["1096952256_1096952256_ch01.dat"]);
/// let result = client
///     .download_to_file(&url, "1096952256_1096952256_ch01.dat", 327_680_000, Path::new("."), &hint)
///     .await?;
/// println!("wrote {} bytes", result.bytes_written);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct RetrieveClient {
    client: Client,
    host: String,
    credentials: Credentials,
}

impl RetrieveClient {
    /// Creates a client for `host` (`name:port`) with default timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new(host: impl Into<String>, credentials: Credentials) -> Result<Self, DownloadError> {
        Self::with_timeouts(host, credentials, HttpTimeouts::default())
    }

    /// Creates a client for `host` with explicit transport timeouts.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::ClientBuild`] if the HTTP client cannot be built.
    pub fn with_timeouts(
        host: impl Into<String>,
        credentials: Credentials,
        timeouts: HttpTimeouts,
    ) -> Result<Self, DownloadError> {
        let client = build_client(timeouts).map_err(DownloadError::ClientBuild)?;
        Ok(Self {
            client,
            host: host.into(),
            credentials,
        })
    }

    /// Returns the configured retrieval host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Builds the retrieval URL of one file.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError::InvalidUrl`] if the host is not a valid authority.
    pub fn retrieve_url(&self, file_name: &str) -> Result<Url, DownloadError> {
        let base = format!("http://{}/{RETRIEVE_PATH}", self.host);
        Url::parse_with_params(&base, &[("file_id", file_name)])
            .map_err(|_| DownloadError::invalid_url(base))
    }

    /// Retrieves one file into `output_dir`, truncating any existing file of
    /// the same name.
    ///
    /// Success requires the byte count written to equal both the response's
    /// `Content-Length` (when present) and `expected_size`. A partially written
    /// file is left on disk when the transfer fails.
    ///
    /// # Errors
    ///
    /// Returns [`DownloadError`] for transport failures, non-success statuses,
    /// local write failures and size mismatches.
    #[instrument(skip(self, output_dir, prestage), fields(url = %url))]
    pub async fn download_to_file(
        &self,
        url: &Url,
        file_name: &str,
        expected_size: u64,
        output_dir: &Path,
        prestage: &PrestageHint,
    ) -> Result<DownloadFileResult, DownloadError> {
        debug!("starting retrieval");

        let response = self
            .client
            .get(url.clone())
            .basic_auth(&self.credentials.username, Some(&self.credentials.password))
            .header(PRESTAGE_HEADER, prestage.as_str())
            .send()
            .await
            .map_err(|e| DownloadError::network(url.as_str(), e))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(DownloadError::http_status(
                url.as_str(),
                status.as_u16(),
                truncate_message(&body),
            ));
        }

        let content_length = declared_content_length(&response);
        if content_length.is_none() {
            warn!(file = file_name, "response carries no Content-Length");
        } else if content_length != Some(expected_size) {
            warn!(
                file = file_name,
                content_length = content_length.unwrap_or_default(),
                manifest_size = expected_size,
                "Content-Length differs from manifest size"
            );
        }

        let file_path = output_dir.join(file_name);
        let mut file = File::create(&file_path)
            .await
            .map_err(|e| DownloadError::io(file_path.clone(), e))?;

        let bytes_written = stream_to_file(&mut file, response, url.as_str(), &file_path).await?;

        if let Some(declared) = content_length
            && declared != bytes_written
        {
            return Err(DownloadError::size_mismatch(
                file_path,
                SizeSource::ContentLength,
                declared,
                bytes_written,
            ));
        }
        if bytes_written != expected_size {
            return Err(DownloadError::size_mismatch(
                file_path,
                SizeSource::Manifest,
                expected_size,
                bytes_written,
            ));
        }

        info!(path = %file_path.display(), bytes = bytes_written, "retrieval complete");

        Ok(DownloadFileResult {
            path: file_path,
            bytes_written,
        })
    }
}

/// Streams the response body to file, returning bytes written.
async fn stream_to_file(
    file: &mut File,
    response: reqwest::Response,
    url: &str,
    file_path: &Path,
) -> Result<u64, DownloadError> {
    let mut writer = BufWriter::with_capacity(BUFFER_SIZE, file);
    let mut stream = response.bytes_stream();
    let mut bytes_written: u64 = 0;

    while let Some(chunk_result) = stream.next().await {
        let chunk = chunk_result.map_err(|e| DownloadError::network(url, e))?;

        writer
            .write_all(&chunk)
            .await
            .map_err(|e| DownloadError::io(file_path.to_path_buf(), e))?;

        bytes_written += chunk.len() as u64;
    }

    writer
        .flush()
        .await
        .map_err(|e| DownloadError::io(file_path.to_path_buf(), e))?;

    Ok(bytes_written)
}

fn declared_content_length(response: &reqwest::Response) -> Option<u64> {
    response
        .headers()
        .get(CONTENT_LENGTH)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.trim().parse::<u64>().ok())
}

fn truncate_message(body: &str) -> String {
    let trimmed = body.trim();
    if trimmed.chars().count() <= MAX_ERROR_BODY_CHARS {
        return trimmed.to_string();
    }
    let mut message: String = trimmed.chars().take(MAX_ERROR_BODY_CHARS).collect();
    message.push_str("...");
    message
}
