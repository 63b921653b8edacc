//! CLI argument definitions using clap derive macros.

use std::path::PathBuf;

use clap::Parser;

use voltdownload_core::DEFAULT_CONCURRENCY;
use voltdownload_core::download::DEFAULT_NGAS_HOST;
use voltdownload_core::metadata::{DEFAULT_METADATA_HOST, ProductSelector};

/// Bulk download of observation voltage data from the NGAS archive.
///
/// Lists the observation's files on the metadata service, keeps those of the
/// requested product type (and time window) and retrieves them in parallel.
/// Files already present with the right size are skipped, so an interrupted
/// run can simply be started again.
#[derive(Parser, Debug, Clone)]
#[command(name = "voltdownload")]
#[command(author, version, about)]
pub struct Args {
    /// Observation id
    #[arg(short = 'o', long = "obs", value_name = "ID")]
    pub observation_id: u64,

    /// Product type: raw, recombined, ics, combined (or 11, 12, 15, 16)
    #[arg(short = 't', long = "type", value_name = "TYPE", default_value = "combined")]
    pub product: ProductSelector,

    /// First GPS second of the time window (requires --duration)
    #[arg(long, value_name = "GPS", requires = "duration", allow_negative_numbers = true)]
    pub from: Option<i64>,

    /// Length of the time window in seconds (requires --from)
    #[arg(long, value_name = "SECONDS", requires = "from")]
    pub duration: Option<u64>,

    /// NGAS retrieval host
    #[arg(long = "ngas", value_name = "HOST:PORT", default_value = DEFAULT_NGAS_HOST)]
    pub ngas_host: String,

    /// Archive metadata host
    #[arg(long, value_name = "HOST", default_value = DEFAULT_METADATA_HOST)]
    pub metadata_host: String,

    /// Output directory (created if missing)
    #[arg(short = 'd', long = "dir", value_name = "PATH", default_value = ".")]
    pub output_dir: PathBuf,

    /// Maximum parallel transfers (1-12)
    #[arg(short = 'p', long, default_value_t = DEFAULT_CONCURRENCY as u8, value_parser = clap::value_parser!(u8).range(1..=12))]
    pub parallel: u8,

    /// Config file (default: $XDG_CONFIG_HOME/voltdownload/config.toml)
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Increase output verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    pub quiet: bool,
}
