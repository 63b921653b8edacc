//! Client for the pulsar detection database's REST API.
//!
//! Every endpoint lives at `<base>/<endpoint>/`, takes HTTP Basic credentials
//! and answers with JSON, returned here as [`serde_json::Value`].

mod error;
mod records;

use std::path::{Path, PathBuf};

use futures_util::StreamExt;
use reqwest::header::{CONTENT_TYPE, HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder, Response};
use serde_json::Value;
use tokio::io::{AsyncWriteExt, BufWriter};
use tracing::{debug, info, instrument};
use url::Url;

use crate::download::BUFFER_SIZE;
use crate::http::{Credentials, HttpTimeouts, build_client};

pub use error::PulsarDbError;
pub use records::{
    CalibratorFile, Detection, DetectionFile, DetectionFileType, FormFields, NewCalibrator,
    NewPulsar, ObservationType,
};

/// Header carrying the local path of an uploaded file.
const FILEPATH_HEADER: &str = "filepath";

/// Multipart part name of an uploaded file.
const UPLOAD_PART: &str = "path";

/// Authenticated client for the pulsar database.
#[derive(Debug, Clone)]
pub struct PulsarDbClient {
    client: Client,
    base: String,
    credentials: Credentials,
}

impl PulsarDbClient {
    /// Creates a client for `base_url` (scheme and host, e.g. `https://db.example.org`).
    ///
    /// # Errors
    ///
    /// Returns [`PulsarDbError::InvalidUrl`] for an unparseable base URL or
    /// [`PulsarDbError::ClientBuild`] if the HTTP client cannot be built.
    pub fn new(base_url: &str, credentials: Credentials) -> Result<Self, PulsarDbError> {
        Self::with_timeouts(base_url, credentials, HttpTimeouts::default())
    }

    /// Creates a client with explicit transport timeouts.
    ///
    /// # Errors
    ///
    /// See [`new`](Self::new).
    pub fn with_timeouts(
        base_url: &str,
        credentials: Credentials,
        timeouts: HttpTimeouts,
    ) -> Result<Self, PulsarDbError> {
        Url::parse(base_url).map_err(|_| PulsarDbError::InvalidUrl {
            url: base_url.to_string(),
        })?;
        let client = build_client(timeouts).map_err(PulsarDbError::ClientBuild)?;
        Ok(Self {
            client,
            base: base_url.trim_end_matches('/').to_string(),
            credentials,
        })
    }

    /// Builds `<base>/<endpoint>/?<params>`.
    ///
    /// # Errors
    ///
    /// Returns [`PulsarDbError::InvalidUrl`] if the result is not a valid URL.
    pub fn endpoint_url(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Url, PulsarDbError> {
        let raw = format!("{}/{endpoint}/", self.base);
        let mut url = Url::parse(&raw).map_err(|_| PulsarDbError::InvalidUrl { url: raw })?;
        if !params.is_empty() {
            url.query_pairs_mut().extend_pairs(params);
        }
        Ok(url)
    }

    fn authed(&self, request: RequestBuilder) -> RequestBuilder {
        request.basic_auth(&self.credentials.username, Some(&self.credentials.password))
    }

    async fn send(request: RequestBuilder, url: &Url) -> Result<Response, PulsarDbError> {
        let response = request
            .send()
            .await
            .map_err(|e| PulsarDbError::transport(url.as_str(), e))?;
        let status = response.status();
        if status.is_success() {
            Ok(response)
        } else {
            let message = response.text().await.unwrap_or_default();
            Err(PulsarDbError::status(
                url.as_str(),
                status.as_u16(),
                message.trim(),
            ))
        }
    }

    async fn json(response: Response, url: &Url) -> Result<Value, PulsarDbError> {
        response
            .json::<Value>()
            .await
            .map_err(|source| PulsarDbError::InvalidBody {
                url: url.to_string(),
                source,
            })
    }

    /// GETs an endpoint and returns its JSON body.
    ///
    /// # Errors
    ///
    /// Returns [`PulsarDbError`] on transport failure, non-success status or
    /// an invalid JSON body.
    #[instrument(skip(self, params))]
    pub async fn get_json(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<Value, PulsarDbError> {
        let url = self.endpoint_url(endpoint, params)?;
        debug!(url = %url, "pulsar database GET");
        let response = Self::send(self.authed(self.client.get(url.clone())), &url).await?;
        Self::json(response, &url).await
    }

    /// POSTs a form-encoded record and returns the JSON body.
    ///
    /// # Errors
    ///
    /// See [`get_json`](Self::get_json).
    #[instrument(skip(self, record))]
    pub async fn post_form(
        &self,
        endpoint: &str,
        record: &impl FormFields,
    ) -> Result<Value, PulsarDbError> {
        let url = self.endpoint_url(endpoint, &[])?;
        let body = url::form_urlencoded::Serializer::new(String::new())
            .extend_pairs(record.form_fields())
            .finish();
        let request = self
            .authed(self.client.post(url.clone()))
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(body);
        let response = Self::send(request, &url).await?;
        Self::json(response, &url).await
    }

    /// Uploads a file as multipart part `path`; the record's fields and the
    /// local path travel as request headers.
    #[instrument(skip(self, record), fields(file = %file_path.display()))]
    async fn upload(
        &self,
        endpoint: &str,
        record: &impl FormFields,
        file_path: &Path,
    ) -> Result<Value, PulsarDbError> {
        let url = self.endpoint_url(endpoint, &[])?;
        let contents = tokio::fs::read(file_path)
            .await
            .map_err(|e| PulsarDbError::io(file_path, e))?;
        let file_name = file_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();

        let mut request = self.authed(self.client.post(url.clone()));
        let mut fields = record.form_fields();
        fields.push((FILEPATH_HEADER, file_path.display().to_string()));
        for (name, value) in fields {
            let header_value =
                HeaderValue::from_str(&value).map_err(|_| PulsarDbError::InvalidHeader {
                    name: name.to_string(),
                    value: value.clone(),
                })?;
            request = request.header(HeaderName::from_static(name), header_value);
        }

        let form = Form::new().part(UPLOAD_PART, Part::bytes(contents).file_name(file_name));
        let response = Self::send(request.multipart(form), &url).await?;
        info!(endpoint, "file uploaded");
        Self::json(response, &url).await
    }

    /// Streams `<endpoint>/?filename=<name>` into `<output_dir>/<name>`.
    #[instrument(skip(self), fields(output_dir = %output_dir.display()))]
    async fn download(
        &self,
        endpoint: &str,
        filename: &str,
        output_dir: &Path,
    ) -> Result<PathBuf, PulsarDbError> {
        let local_name = Path::new(filename)
            .file_name()
            .ok_or_else(|| PulsarDbError::InvalidFileName {
                name: filename.to_string(),
            })?;
        let url = self.endpoint_url(endpoint, &[("filename", filename)])?;
        let response = Self::send(self.authed(self.client.get(url.clone())), &url).await?;

        tokio::fs::create_dir_all(output_dir)
            .await
            .map_err(|e| PulsarDbError::io(output_dir, e))?;
        let path = output_dir.join(local_name);
        let file = tokio::fs::File::create(&path)
            .await
            .map_err(|e| PulsarDbError::io(&path, e))?;

        let mut writer = BufWriter::with_capacity(BUFFER_SIZE, file);
        let mut stream = response.bytes_stream();
        let mut bytes_written: u64 = 0;
        while let Some(chunk) = stream.next().await {
            let chunk = chunk.map_err(|e| PulsarDbError::transport(url.as_str(), e))?;
            writer
                .write_all(&chunk)
                .await
                .map_err(|e| PulsarDbError::io(&path, e))?;
            bytes_written += chunk.len() as u64;
        }
        writer.flush().await.map_err(|e| PulsarDbError::io(&path, e))?;

        info!(path = %path.display(), bytes = bytes_written, "file downloaded");
        Ok(path)
    }

    // ==================== Lookups ====================

    /// Calibrators used by the detections of an observation.
    ///
    /// # Errors
    ///
    /// See [`get_json`](Self::get_json).
    pub async fn detection_find_calibrator(&self, detection_obsid: u64) -> Result<Value, PulsarDbError> {
        let obsid = detection_obsid.to_string();
        self.get_json("detection_find_calibrator", &[("detection_obsid", &obsid)])
            .await
    }

    /// Calibration and its file for an observation.
    ///
    /// # Errors
    ///
    /// See [`get_json`](Self::get_json).
    pub async fn calibration_file_by_observation_id(&self, obsid: u64) -> Result<Value, PulsarDbError> {
        let obsid = obsid.to_string();
        self.get_json("calibration_file_by_observation_id", &[("obsid", &obsid)])
            .await
    }

    /// All calibrators.
    ///
    /// # Errors
    ///
    /// See [`get_json`](Self::get_json).
    pub async fn calibrator_list(&self) -> Result<Value, PulsarDbError> {
        self.get_json("calibrator_list", &[]).await
    }

    /// One calibrator by observation id and calibrator type.
    ///
    /// # Errors
    ///
    /// See [`get_json`](Self::get_json).
    pub async fn calibrator_get(&self, observation_id: u64, caltype: u32) -> Result<Value, PulsarDbError> {
        let observation_id = observation_id.to_string();
        let caltype = caltype.to_string();
        self.get_json(
            "calibrator_get",
            &[("observationid", &observation_id), ("caltype", &caltype)],
        )
        .await
    }

    /// All pulsars.
    ///
    /// # Errors
    ///
    /// See [`get_json`](Self::get_json).
    pub async fn pulsar_list(&self) -> Result<Value, PulsarDbError> {
        self.get_json("pulsar_list", &[]).await
    }

    /// One pulsar by name.
    ///
    /// # Errors
    ///
    /// See [`get_json`](Self::get_json).
    pub async fn pulsar_get(&self, name: &str) -> Result<Value, PulsarDbError> {
        self.get_json("pulsar_get", &[("name", name)]).await
    }

    /// All detections.
    ///
    /// # Errors
    ///
    /// See [`get_json`](Self::get_json).
    pub async fn detection_list(&self) -> Result<Value, PulsarDbError> {
        self.get_json("detection_list", &[]).await
    }

    /// Detections of one observation.
    ///
    /// # Errors
    ///
    /// See [`get_json`](Self::get_json).
    pub async fn detection_get(&self, observation_id: u64) -> Result<Value, PulsarDbError> {
        let observation_id = observation_id.to_string();
        self.get_json("detection_get", &[("observationid", &observation_id)])
            .await
    }

    /// Catalogue parameters of a pulsar.
    ///
    /// # Errors
    ///
    /// See [`get_json`](Self::get_json).
    pub async fn psrcat(&self, pulsar: &str) -> Result<Value, PulsarDbError> {
        self.get_json("psrcat", &[("name", pulsar), ("format", "json")])
            .await
    }

    // ==================== Mutations ====================

    /// Creates a calibrator.
    ///
    /// # Errors
    ///
    /// See [`post_form`](Self::post_form).
    pub async fn calibrator_create(&self, calibrator: &NewCalibrator) -> Result<Value, PulsarDbError> {
        self.post_form("calibrator_create", calibrator).await
    }

    /// Creates a pulsar; the server rejects existing names.
    ///
    /// # Errors
    ///
    /// See [`post_form`](Self::post_form).
    pub async fn pulsar_create(&self, pulsar: &NewPulsar) -> Result<Value, PulsarDbError> {
        self.post_form("pulsar_create", pulsar).await
    }

    /// Creates a detection.
    ///
    /// # Errors
    ///
    /// See [`post_form`](Self::post_form).
    pub async fn detection_create(&self, detection: &Detection) -> Result<Value, PulsarDbError> {
        self.post_form("detection_create", detection).await
    }

    /// Updates an existing detection.
    ///
    /// # Errors
    ///
    /// See [`post_form`](Self::post_form).
    pub async fn detection_update(&self, detection: &Detection) -> Result<Value, PulsarDbError> {
        self.post_form("detection_update", detection).await
    }

    // ==================== Files ====================

    /// Uploads a file against a detection.
    ///
    /// # Errors
    ///
    /// Returns [`PulsarDbError::Io`] if the file cannot be read,
    /// [`PulsarDbError::InvalidHeader`] if a field is not header-safe, and the
    /// errors of [`get_json`](Self::get_json).
    pub async fn detection_file_upload(
        &self,
        file: &DetectionFile,
        file_path: &Path,
    ) -> Result<Value, PulsarDbError> {
        self.upload("detection_file_upload", file, file_path).await
    }

    /// Uploads a file against a calibrator.
    ///
    /// # Errors
    ///
    /// See [`detection_file_upload`](Self::detection_file_upload).
    pub async fn calibrator_file_upload(
        &self,
        file: &CalibratorFile,
        file_path: &Path,
    ) -> Result<Value, PulsarDbError> {
        self.upload("calibrator_file_upload", file, file_path).await
    }

    /// Downloads a detection file into `output_dir`, returning its path.
    ///
    /// # Errors
    ///
    /// Returns [`PulsarDbError::InvalidFileName`], transport and status
    /// errors, or [`PulsarDbError::Io`] for local write failures.
    pub async fn detection_file_download(
        &self,
        filename: &str,
        output_dir: &Path,
    ) -> Result<PathBuf, PulsarDbError> {
        self.download("detection_file_download", filename, output_dir)
            .await
    }

    /// Downloads a calibration file into `output_dir`, returning its path.
    ///
    /// # Errors
    ///
    /// See [`detection_file_download`](Self::detection_file_download).
    pub async fn calibrator_file_download(
        &self,
        filename: &str,
        output_dir: &Path,
    ) -> Result<PathBuf, PulsarDbError> {
        self.download("calibrator_file_download", filename, output_dir)
            .await
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn client() -> PulsarDbClient {
        PulsarDbClient::new("https://pulsar.example.org/", Credentials::new("u", "p")).unwrap()
    }

    #[test]
    fn test_endpoint_url_adds_trailing_slash() {
        let url = client().endpoint_url("pulsar_list", &[]).unwrap();
        assert_eq!(url.as_str(), "https://pulsar.example.org/pulsar_list/");
    }

    #[test]
    fn test_endpoint_url_encodes_params() {
        let url = client()
            .endpoint_url("psrcat", &[("name", "J0437-4715"), ("format", "json")])
            .unwrap();
        assert_eq!(
            url.as_str(),
            "https://pulsar.example.org/psrcat/?name=J0437-4715&format=json"
        );
    }

    #[test]
    fn test_new_rejects_invalid_base() {
        let result = PulsarDbClient::new("not a url", Credentials::default());
        assert!(matches!(result, Err(PulsarDbError::InvalidUrl { .. })));
    }
}
