//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand, ValueEnum};

use crate::reading::Unit;

/// Scan command arguments.
#[derive(Debug, Args)]
pub struct ScanCommand {
    /// Cooldown in seconds before an identical code is accepted again
    /// (overrides the configured value)
    #[arg(long)]
    pub cooldown: Option<f64>,
}

/// Upload command arguments.
#[derive(Debug, Args)]
pub struct UploadCommand {
    /// Path to the CSV file to upload
    pub file: PathBuf,

    /// The unit whose table receives the rows
    #[arg(short, long, value_enum)]
    pub unit: UnitArg,

    /// Write the validated rows (without this flag the command only
    /// validates and previews)
    #[arg(short = 'y', long)]
    pub yes: bool,
}

/// Process command arguments.
#[derive(Debug, Args)]
pub struct ProcessCommand {
    /// The unit whose unprocessed rows are computed
    #[arg(short, long, value_enum)]
    pub unit: UnitArg,
}

/// Logs command arguments.
#[derive(Debug, Args)]
pub struct LogsCommand {
    /// Maximum number of events to show
    #[arg(short, long, default_value = "30")]
    pub limit: usize,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,
}

/// Status command arguments.
#[derive(Debug, Args)]
pub struct StatusCommand {
    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

/// Unit argument for selecting a readings table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum UnitArg {
    /// Unit 1
    Unit1,
    /// Unit 2
    Unit2,
}

impl From<UnitArg> for Unit {
    fn from(arg: UnitArg) -> Self {
        match arg {
            UnitArg::Unit1 => Self::Unit1,
            UnitArg::Unit2 => Self::Unit2,
        }
    }
}

/// Output format for list commands.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Plain text output
    #[default]
    Plain,
    /// Formatted table
    Table,
    /// JSON output
    Json,
}
