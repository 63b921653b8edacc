//! Exit code logic for the voltdownload process.
//!
//! Single responsibility: map a run report or a fatal run error to the process exit outcome.

use voltdownload_core::{RunError, RunReport};

use crate::ProcessExit;

/// Determines the process exit outcome from a finished run.
pub(crate) fn determine_exit_outcome(report: &RunReport) -> ProcessExit {
    if report.interrupted {
        ProcessExit::Interrupted
    } else if report.is_success() {
        ProcessExit::Success
    } else {
        ProcessExit::Failure
    }
}

/// Determines the process exit outcome for a run that ended before transfers.
pub(crate) fn exit_for_error(error: &RunError) -> ProcessExit {
    match error {
        RunError::NoFilesFound { .. } => ProcessExit::NoFilesFound,
        RunError::TooManyFiles { .. } => ProcessExit::LimitExceeded,
        _ => ProcessExit::Failure,
    }
}
