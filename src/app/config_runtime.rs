//! Merges CLI arguments, the config file and built-in defaults into a `RunConfig`.

use clap::{ArgMatches, CommandFactory, FromArgMatches, parser::ValueSource};

use voltdownload_core::http::{Credentials, HttpTimeouts};
use voltdownload_core::metadata::TimeWindow;
use voltdownload_core::run::RunConfig;

use crate::app::config::{FileConfig, VerbositySetting};
use crate::cli::Args;

/// Which arguments were given explicitly on the command line.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct CliValueSources {
    pub(crate) ngas_host: bool,
    pub(crate) metadata_host: bool,
    pub(crate) output_dir: bool,
    pub(crate) parallel: bool,
    pub(crate) verbose: bool,
    pub(crate) quiet: bool,
}

/// Parses the process arguments. Help, version and usage errors come back as
/// `Err` so the caller decides the exit code.
pub(crate) fn parse_cli_with_sources() -> Result<(Args, CliValueSources), clap::Error> {
    let matches = Args::command().try_get_matches()?;
    let args = Args::from_arg_matches(&matches)?;
    let sources = sources_from_matches(&matches);
    Ok((args, sources))
}

pub(crate) fn sources_from_matches(matches: &ArgMatches) -> CliValueSources {
    CliValueSources {
        ngas_host: is_commandline_value(matches, "ngas_host"),
        metadata_host: is_commandline_value(matches, "metadata_host"),
        output_dir: is_commandline_value(matches, "output_dir"),
        parallel: is_commandline_value(matches, "parallel"),
        verbose: is_commandline_value(matches, "verbose"),
        quiet: is_commandline_value(matches, "quiet"),
    }
}

fn is_commandline_value(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::CommandLine)
}

/// Builds the run configuration: CLI values win over file values, file
/// values over built-in defaults.
pub(crate) fn build_run_config(
    args: &Args,
    cli_sources: &CliValueSources,
    file_config: Option<&FileConfig>,
) -> RunConfig {
    let mut config = RunConfig::new(args.observation_id);
    config.selector = args.product;
    config.window = match (args.from, args.duration) {
        (Some(from), Some(duration)) => Some(TimeWindow::new(from, duration)),
        _ => None,
    };
    config.ngas_host.clone_from(&args.ngas_host);
    config.metadata_host.clone_from(&args.metadata_host);
    config.output_dir.clone_from(&args.output_dir);
    config.concurrency = usize::from(args.parallel);

    let Some(file_config) = file_config else {
        return config;
    };

    if !cli_sources.ngas_host
        && let Some(host) = &file_config.ngas_host
    {
        config.ngas_host.clone_from(host);
    }
    if !cli_sources.metadata_host
        && let Some(host) = &file_config.metadata_host
    {
        config.metadata_host.clone_from(host);
    }
    if !cli_sources.output_dir
        && let Some(output_dir) = &file_config.output_dir
    {
        config.output_dir.clone_from(output_dir);
    }
    if !cli_sources.parallel
        && let Some(parallel) = file_config.parallel
    {
        config.concurrency = usize::from(parallel);
    }
    if let Some(max_files) = file_config.max_files {
        config.max_files = max_files;
    }

    let defaults = Credentials::default();
    config.credentials = Credentials::new(
        file_config.username.clone().unwrap_or(defaults.username),
        file_config.password.clone().unwrap_or(defaults.password),
    );

    let timeouts = HttpTimeouts::default();
    config.timeouts = HttpTimeouts::new(
        file_config.connect_timeout_secs.unwrap_or(timeouts.connect_secs),
        file_config.read_timeout_secs.unwrap_or(timeouts.read_secs),
    );

    config
}

/// Returns `(verbose, quiet)` after applying the config file's verbosity when
/// neither `-v` nor `-q` was given.
pub(crate) fn effective_verbosity(
    args: &Args,
    cli_sources: &CliValueSources,
    file_config: Option<&FileConfig>,
) -> (u8, bool) {
    if cli_sources.verbose || cli_sources.quiet {
        return (args.verbose, args.quiet);
    }
    match file_config.and_then(|config| config.verbosity) {
        Some(VerbositySetting::Default) | None => (args.verbose, args.quiet),
        Some(VerbositySetting::Verbose) => (1, false),
        Some(VerbositySetting::Debug) => (2, false),
        Some(VerbositySetting::Quiet) => (0, true),
    }
}

pub(crate) fn resolve_default_log_level(verbose: u8, quiet: bool) -> &'static str {
    if quiet {
        "error"
    } else {
        match verbose {
            0 => "info",
            1 => "debug",
            _ => "trace",
        }
    }
}
