//! Binary-side application layer: config merge, terminal setup, progress and exit mapping.

pub(crate) mod config;
pub(crate) mod config_runtime;
pub(crate) mod exit_handler;
pub(crate) mod progress_manager;
pub(crate) mod runtime;
pub(crate) mod summary;
pub(crate) mod terminal;
