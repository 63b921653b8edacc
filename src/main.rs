//! CLI entry point for voltdownload.

use std::process::ExitCode;

mod app;
mod cli;

/// Process outcome, mapped to a stable exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ProcessExit {
    /// Every selected file is complete.
    Success,
    /// Nothing matched the selection.
    NoFilesFound,
    /// Ctrl+C cut the run short.
    Interrupted,
    /// A file failed, or the run could not start.
    Failure,
    /// More files matched than the run may retrieve.
    LimitExceeded,
}

impl ProcessExit {
    pub(crate) const fn code(self) -> u8 {
        match self {
            Self::Success => 0,
            Self::NoFilesFound => 1,
            Self::Interrupted => 2,
            Self::Failure => 3,
            Self::LimitExceeded => 4,
        }
    }
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        ExitCode::from(exit.code())
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    match app::runtime::run_voltdownload().await {
        Ok(exit) => exit.into(),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ProcessExit::Failure.into()
        }
    }
}
