//! Per-file transfer task.

use std::path::{Path, PathBuf};

use tracing::{Instrument, info_span};
use url::Url;

use super::super::client::{PrestageHint, RetrieveClient};
use super::super::status::RunStatus;
use crate::metadata::RemoteFile;

/// One file transfer: where to fetch it from, what it is and where it goes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadTask {
    retrieve_url: Url,
    remote_file: RemoteFile,
    local_dir: PathBuf,
}

impl DownloadTask {
    /// Creates a task for `remote_file`, written into `local_dir`.
    #[must_use]
    pub fn new(retrieve_url: Url, remote_file: RemoteFile, local_dir: impl Into<PathBuf>) -> Self {
        Self {
            retrieve_url,
            remote_file,
            local_dir: local_dir.into(),
        }
    }

    /// Archive name of the file (also its local file name).
    #[must_use]
    pub fn file_name(&self) -> &str {
        &self.remote_file.name
    }

    /// URL the file is retrieved from.
    #[must_use]
    pub fn retrieve_url(&self) -> &Url {
        &self.retrieve_url
    }

    /// Manifest entry of the file.
    #[must_use]
    pub fn remote_file(&self) -> &RemoteFile {
        &self.remote_file
    }

    /// Output directory.
    #[must_use]
    pub fn local_dir(&self) -> &Path {
        &self.local_dir
    }

    /// Destination path of the file.
    #[must_use]
    pub fn local_path(&self) -> PathBuf {
        self.local_dir.join(&self.remote_file.name)
    }
}

/// Runs one transfer and reports its outcome; never fails the run.
pub(super) async fn process_download_task(
    task: DownloadTask,
    client: RetrieveClient,
    prestage: PrestageHint,
    status: &RunStatus,
) {
    let name = task.file_name().to_string();
    let span = info_span!("transfer", file = %name, size = task.remote_file.size);

    async {
        status.record_start(&name);
        let result = client
            .download_to_file(
                &task.retrieve_url,
                &name,
                task.remote_file.size,
                &task.local_dir,
                &prestage,
            )
            .await;
        match result {
            Ok(_) => status.record_success(&name),
            Err(error) => status.record_error(&name, error),
        }
    }
    .instrument(span)
    .await;
}
