//! CLI argument parsing using clap.
//!
//! Defines the command-line interface with all options and subcommands.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// meteo-cooloff: historical weather statistics
///
/// Fetches daily observations from the Open-Meteo archive for a set of
/// cities, retrying failed requests with exponential backoff, and writes
/// per-city monthly statistics as JSON.
#[derive(Debug, Parser)]
#[command(name = "meteo-cooloff")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to run
    #[command(subcommand)]
    pub command: Option<Command>,

    /// First day of the range (YYYY-MM-DD)
    #[arg(long = "start-date", value_name = "DATE")]
    pub start_date: Option<String>,

    /// Last day of the range (YYYY-MM-DD)
    #[arg(long = "end-date", value_name = "DATE")]
    pub end_date: Option<String>,

    /// Daily variable to request (can be specified multiple times)
    #[arg(long = "variable", value_name = "NAME")]
    pub variables: Vec<String>,

    /// Only fetch the named city (can be specified multiple times)
    #[arg(long = "city", value_name = "NAME")]
    pub cities: Vec<String>,

    /// Timezone used to align daily values
    #[arg(long)]
    pub timezone: Option<String>,

    /// Archive API endpoint
    #[arg(long = "api-url", value_name = "URL")]
    pub api_url: Option<String>,

    /// HTTP headers in 'Key=Value' or 'Key: Value' format (can be specified multiple times)
    #[arg(long = "header", value_name = "K=V")]
    pub headers: Vec<String>,

    /// Output path for the statistics JSON file
    #[arg(long, short)]
    pub output: Option<PathBuf>,

    /// Per-request timeout in seconds; a timed-out attempt is retried and counts toward --retry-max
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Maximum number of attempts per request
    #[arg(long = "retry-max")]
    pub retry_max: Option<u32>,

    /// Initial cooloff in seconds (doubles after every failed attempt)
    #[arg(long = "retry-delay")]
    pub retry_delay: Option<u64>,

    /// Path to configuration file
    #[arg(long, short)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(long, short)]
    pub verbose: bool,
}

/// Subcommands for meteo-cooloff
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Generate a default configuration file
    Init {
        /// Output path for the configuration file
        #[arg(long, short, default_value = "meteo-cooloff.toml")]
        output: PathBuf,
    },
}

impl Cli {
    /// Parses CLI arguments from the command line.
    #[must_use]
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Parses CLI arguments from an iterator (useful for testing).
    pub fn parse_from_iter<I, T>(iter: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::parse_from(iter)
    }

    /// Returns true if this is the init command.
    #[must_use]
    pub const fn is_init(&self) -> bool {
        matches!(self.command, Some(Command::Init { .. }))
    }
}
