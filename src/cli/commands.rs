//! CLI commands and argument parsing

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

/// Lane-partitioned pagination client
#[derive(Parser, Debug)]
#[command(name = "lanepager")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (YAML or JSON)
    #[arg(short = 'C', long, global = true)]
    pub config: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, default_value = "json")]
    pub format: OutputFormat,

    /// Verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Fetch every record of an entity
    Fetch(FetchArgs),

    /// Show the pages each lane requests per round
    Plan {
        /// Number of lanes
        #[arg(long, default_value = "5")]
        lanes: usize,

        /// Number of rounds
        #[arg(long, default_value = "4")]
        rounds: usize,
    },

    /// Validate a configuration file
    Validate,
}

/// Arguments of the `fetch` command
#[derive(Args, Debug, Clone, Default)]
pub struct FetchArgs {
    /// Entity name (falls back to the config file)
    pub entity: Option<String>,

    /// Base URL of the API (falls back to the config file)
    #[arg(long)]
    pub base_url: Option<String>,

    /// Number of concurrent lanes
    #[arg(long)]
    pub lanes: Option<usize>,

    /// Query parameter carrying the page cursor
    #[arg(long, conflicts_with = "no_cursor")]
    pub cursor_key: Option<String>,

    /// Send a single unpaginated request
    #[arg(long)]
    pub no_cursor: bool,

    /// Attempts per round
    #[arg(long)]
    pub max_attempts: Option<u32>,

    /// Seconds to wait between attempts
    #[arg(long)]
    pub delay: Option<u64>,

    /// Extra query parameter (key=value), repeatable
    #[arg(short, long = "param", value_parser = parse_key_value)]
    pub params: Vec<(String, String)>,

    /// Stop after this many records
    #[arg(long)]
    pub limit: Option<usize>,
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// JSON output (one record per line)
    Json,
    /// Human-readable output
    Pretty,
}

/// Parse a `key=value` argument
fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected key=value, got '{raw}'"))?;
    if key.is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    Ok((key.to_string(), value.to_string()))
}
