//! CLI argument parsing using clap derive API
//!
//! This module defines the command-line interface structure using clap's
//! derive macros. It is purely declarative with no side effects or I/O.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

/// bucketstat -- turn object-store access logs into aggregated metrics.
///
/// Use `bucketstat <COMMAND> --help` for subcommand details.
#[derive(Parser, Debug)]
#[command(name = "bucketstat", version, about, long_about = None)]
pub struct Cli {
    /// Path to the bucketstat.toml configuration file.
    #[arg(short, long, default_value = "bucketstat.toml")]
    pub config: PathBuf,

    /// Override log level (trace, debug, info, warn, error).
    #[arg(long, global = true)]
    pub log_level: Option<String>,

    /// Output format.
    #[arg(long, global = true, default_value = "text")]
    pub output: OutputFormat,

    #[command(subcommand)]
    pub command: Commands,
}

/// Supported output formats.
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table / text output.
    Text,
    /// Machine-readable JSON (datums as JSON lines).
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the metering pipeline over a local access log file.
    Analyze(AnalyzeArgs),

    /// Manage configuration.
    Config(ConfigArgs),
}

// ---- analyze ----

/// Run the pipeline over one log file and emit datums to stdout.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Path to the access log file.
    pub logfile: PathBuf,

    /// Logical source name stamped on every datum (e.g. the bucket name).
    #[arg(short, long)]
    pub source: String,
}

// ---- config ----

/// Manage bucketstat configuration.
#[derive(Args, Debug)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Validate the configuration file and report errors.
    Validate,
    /// Show the effective configuration (file + env overrides + defaults).
    Show {
        /// Show only a specific section (general, metrics, self_metrics).
        #[arg(long)]
        section: Option<String>,
    },
}
