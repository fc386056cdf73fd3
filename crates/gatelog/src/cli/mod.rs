//! Command-line interface for gatelog.
//!
//! This module provides the CLI structure for the `gatelog` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

pub use commands::{
    ConfigCommand, LogsCommand, OutputFormat, ProcessCommand, ScanCommand, StatusCommand,
    UnitArg, UploadCommand,
};

/// gatelog - Access logging and sensor-data processing
///
/// Records debounced QR detections in an access log, uploads CSV sensor
/// data, and fills in derived energy values for unprocessed readings.
#[derive(Debug, Parser)]
#[command(name = "gatelog")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Operator name for role-gated commands
    #[arg(short, long, global = true, value_name = "NAME")]
    pub operator: Option<String>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Run the QR ingest loop (scanner role)
    Scan(ScanCommand),

    /// Validate and upload a CSV of sensor readings
    Upload(UploadCommand),

    /// Compute derived values for unprocessed readings
    Process(ProcessCommand),

    /// Show recent access events (scanner role)
    Logs(LogsCommand),

    /// Open the analytics dashboard (admin role)
    Dashboard,

    /// Show database status
    Status(StatusCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> crate::logging::Verbosity {
        if self.quiet {
            crate::logging::Verbosity::Quiet
        } else {
            match self.verbose {
                0 => crate::logging::Verbosity::Normal,
                1 => crate::logging::Verbosity::Verbose,
                _ => crate::logging::Verbosity::Trace,
            }
        }
    }
}
