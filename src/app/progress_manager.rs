//! Progress UI (spinner) for transfer runs.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use voltdownload_core::RunStatus;

/// Spawns the progress UI (spinner) when requested.
/// Returns (handle, stop) so the caller can signal stop and await the handle.
/// When `use_spinner` is false, returns (None, stop) with stop already true.
pub(crate) fn spawn_progress_ui(
    use_spinner: bool,
    status: Arc<RunStatus>,
    ngas_host: String,
) -> (Option<tokio::task::JoinHandle<()>>, Arc<AtomicBool>) {
    if !use_spinner {
        return (None, Arc::new(AtomicBool::new(true)));
    }
    let stop = Arc::new(AtomicBool::new(false));
    let handle = spawn_spinner_inner(status, ngas_host, Arc::clone(&stop));
    (Some(handle), stop)
}

fn spawn_spinner_inner(
    status: Arc<RunStatus>,
    ngas_host: String,
    stop: Arc<AtomicBool>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(
            ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner()),
        );
        spinner.enable_steady_tick(Duration::from_millis(100));

        while !stop.load(Ordering::SeqCst) {
            let (completed, failed, total) = status.counts();
            spinner.set_message(progress_message(completed, failed, total, &ngas_host));
            tokio::time::sleep(Duration::from_millis(120)).await;
        }

        spinner.finish_and_clear();
    })
}

fn progress_message(completed: u64, failed: u64, total: u64, ngas_host: &str) -> String {
    let done = completed.saturating_add(failed).min(total);
    if failed == 0 {
        format!("[{done}/{total}] Retrieving from {ngas_host}...")
    } else {
        format!("[{done}/{total}] Retrieving from {ngas_host}... ({failed} failed)")
    }
}
