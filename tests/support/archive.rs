//! Mock archive endpoints: the observation manifest and NGAS `RETRIEVE`.

use std::path::Path;
use std::time::Duration;

use serde_json::{Value, json};
use voltdownload_core::RunConfig;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Combined archive product code.
pub const COMBINED: u32 = 16;
/// ICS-only product code.
pub const ICS: u32 = 15;
/// Raw voltage product code.
pub const RAW: u32 = 11;

/// `host:port` of the mock server, as the clients expect it.
#[must_use]
pub fn host_of(server: &MockServer) -> String {
    server.address().to_string()
}

/// Manifest body listing `(name, filetype, size)` entries.
#[must_use]
pub fn manifest_json(entries: &[(&str, u32, u64)]) -> Value {
    let files: serde_json::Map<String, Value> = entries
        .iter()
        .map(|(name, filetype, size)| {
            (
                (*name).to_string(),
                json!({ "filetype": filetype, "size": size }),
            )
        })
        .collect();
    json!({ "files": files })
}

/// Serves the manifest of `observation_id`.
pub async fn mount_manifest(server: &MockServer, observation_id: u64, entries: &[(&str, u32, u64)]) {
    Mock::given(method("GET"))
        .and(path("/metadata/obs/"))
        .and(query_param("obs_id", observation_id.to_string()))
        .respond_with(ResponseTemplate::new(200).set_body_json(manifest_json(entries)))
        .mount(server)
        .await;
}

/// Serves `body` for `file_name`, expecting exactly `expected_calls` requests.
pub async fn mount_retrieve(server: &MockServer, file_name: &str, body: Vec<u8>, expected_calls: u64) {
    mount_retrieve_delayed(server, file_name, body, expected_calls, Duration::ZERO).await;
}

/// Like [`mount_retrieve`], answering after `delay`.
pub async fn mount_retrieve_delayed(
    server: &MockServer,
    file_name: &str,
    body: Vec<u8>,
    expected_calls: u64,
    delay: Duration,
) {
    Mock::given(method("GET"))
        .and(path("/RETRIEVE"))
        .and(query_param("file_id", file_name))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_bytes(body)
                .set_delay(delay),
        )
        .expect(expected_calls)
        .mount(server)
        .await;
}

/// Run configuration pointing both hosts at the mock server.
#[must_use]
pub fn run_config(server: &MockServer, observation_id: u64, output_dir: &Path) -> RunConfig {
    let host = host_of(server);
    let mut config = RunConfig::new(observation_id);
    config.metadata_host.clone_from(&host);
    config.ngas_host = host;
    config.output_dir = output_dir.to_path_buf();
    config
}

/// Config file pointing both hosts at the mock server.
#[must_use]
pub fn config_file_contents(server: &MockServer, extra: &str) -> String {
    let host = host_of(server);
    format!("ngas_host = \"{host}\"\nmetadata_host = \"{host}\"\n{extra}")
}
