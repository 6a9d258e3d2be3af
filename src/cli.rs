// src/cli.rs

//! CLI argument parsing using `clap`.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};

use crate::types::{DispatchRule, OutputFormat};

/// Command-line arguments for `shopsched`.
#[derive(Debug, Clone, Parser)]
#[command(
    name = "shopsched",
    version,
    about = "Critical path analysis, single-machine dispatching and shifting bottleneck job-shop scheduling.",
    long_about = None
)]
pub struct CliArgs {
    /// Logging level (error, warn, info, debug, trace).
    ///
    /// If omitted, `SHOPSCHED_LOG` or a default level will be used.
    #[arg(long, value_enum, value_name = "LEVEL", global = true)]
    pub log_level: Option<LogLevel>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Schedule the `[job.*]` routing table with the shifting bottleneck
    /// heuristic.
    Schedule {
        /// Instance file (TOML).
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,

        /// Evaluate unscheduled machines concurrently (overrides
        /// `[config].parallel = false`).
        #[arg(long)]
        parallel: bool,

        /// Parse + validate, print the routing table, but don't schedule.
        #[arg(long)]
        dry_run: bool,
    },

    /// Critical path analysis of the `[activity.*]` network.
    Cpm {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },

    /// Sequence the `[item.*]` pool on a single machine.
    Dispatch {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Priority rule; defaults to `[config].rule`.
        #[arg(long, value_enum)]
        rule: Option<DispatchRule>,

        #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
        format: OutputFormat,
    },
}

/// Log level as exposed on the CLI.
#[derive(Debug, Copy, Clone, ValueEnum)]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

/// Convenience wrapper around `CliArgs::parse()`.
pub fn parse() -> CliArgs {
    CliArgs::parse()
}
