use std::io::{self, IsTerminal};
use std::sync::atomic::Ordering;

use anyhow::Result;
use tokio::sync::watch;
use tracing::{debug, error, info, warn};
use voltdownload_core::RunError;

use crate::ProcessExit;
use crate::app::{config, config_runtime, exit_handler, progress_manager, summary, terminal};

pub(crate) async fn run_voltdownload() -> Result<ProcessExit> {
    let (args, cli_sources) = match config_runtime::parse_cli_with_sources() {
        Ok(parsed) => parsed,
        Err(err) => {
            let _ = err.print();
            // Usage errors exit with the failure code; 2 is reserved for interruption.
            return Ok(if err.use_stderr() {
                ProcessExit::Failure
            } else {
                ProcessExit::Success
            });
        }
    };

    let loaded = config::load_config(args.config.as_deref())?;
    let file_config = loaded.config.as_ref();

    let (verbose, quiet) = config_runtime::effective_verbosity(&args, &cli_sources, file_config);
    let default_level = config_runtime::resolve_default_log_level(verbose, quiet);
    terminal::init_tracing(default_level, terminal::is_no_color_requested());

    debug!(?args, "CLI arguments parsed");
    if let Some(path) = loaded.path.as_deref() {
        debug!(
            path = %path.display(),
            loaded = loaded.loaded_from_file(),
            "Config file consulted"
        );
    }

    let run_config = config_runtime::build_run_config(&args, &cli_sources, file_config);
    info!(
        observation_id = run_config.observation_id,
        selector = %run_config.selector,
        ngas_host = %run_config.ngas_host,
        output_dir = %run_config.output_dir.display(),
        parallel = run_config.concurrency,
        "voltdownload starting"
    );

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            let _ = shutdown_tx.send(true);
        }
    });

    let prepared = tokio::select! {
        prepared = voltdownload_core::prepare(&run_config) => prepared,
        () = wait_for_shutdown(shutdown_rx.clone()) => {
            warn!("Interrupted before transfers started");
            return Ok(ProcessExit::Interrupted);
        }
    };
    let prepared = match prepared {
        Ok(prepared) => prepared,
        Err(err) => return Ok(report_fatal(err)),
    };

    let use_spinner = terminal::should_use_spinner(
        io::stderr().is_terminal(),
        quiet,
        terminal::is_dumb_terminal(),
    );
    let (progress_handle, progress_stop) = progress_manager::spawn_progress_ui(
        use_spinner,
        prepared.status(),
        run_config.ngas_host.clone(),
    );

    let result = prepared.execute(wait_for_shutdown(shutdown_rx)).await;

    progress_stop.store(true, Ordering::SeqCst);
    if let Some(handle) = progress_handle {
        let _ = handle.await;
    }

    let report = match result {
        Ok(report) => report,
        Err(err) => return Ok(report_fatal(err)),
    };

    summary::print_report(&report);
    if report.interrupted {
        warn!(
            completed = report.completed,
            total = report.total,
            "Interrupted. Run again to resume."
        );
    }

    Ok(exit_handler::determine_exit_outcome(&report))
}

fn report_fatal(err: RunError) -> ProcessExit {
    error!(error = %err, "Run aborted");
    let exit = exit_handler::exit_for_error(&err);
    eprintln!("Error: {:#}", anyhow::Error::new(err));
    exit
}

/// Resolves once shutdown has been requested. Never resolves if the signal
/// listener went away without requesting it.
async fn wait_for_shutdown(mut rx: watch::Receiver<bool>) {
    if rx.wait_for(|requested| *requested).await.is_err() {
        std::future::pending::<()>().await;
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::wait_for_shutdown;
    use std::time::Duration;
    use tokio::sync::watch;

    #[tokio::test]
    async fn test_wait_for_shutdown_resolves_on_request() {
        let (tx, rx) = watch::channel(false);
        let waiter = tokio::spawn(wait_for_shutdown(rx));
        tx.send(true).unwrap();
        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .unwrap()
            .unwrap();
    }

    #[tokio::test]
    async fn test_wait_for_shutdown_pends_when_sender_dropped() {
        let (tx, rx) = watch::channel(false);
        drop(tx);
        let result = tokio::time::timeout(Duration::from_millis(50), wait_for_shutdown(rx)).await;
        assert!(result.is_err(), "should still be pending");
    }
}
