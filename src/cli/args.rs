//! Command-line argument parsing for showview
//!
//! This module defines the CLI structure using clap derive macros: a live
//! watch mode, a one-shot snapshot dump, and configuration management.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Args, Parser, Subcommand};

/// showview - Live monitor for show-grouped download progress
#[derive(Parser, Debug)]
#[command(
    name = "showview",
    version,
    about = "Watch show-grouped download progress from a nab-style backend",
    long_about = "Polls a download backend on a fixed interval and keeps a live terminal view of
every active transfer, grouped by the show it belongs to. Show banners and
titles resolve asynchronously as the backend serves them."
)]
pub struct Cli {
    /// Global options
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Subcommands
    #[command(subcommand)]
    pub command: Commands,
}

/// Global arguments available to all subcommands
#[derive(Args, Debug)]
pub struct GlobalArgs {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Very verbose logging (debug level)
    #[arg(long, global = true)]
    pub very_verbose: bool,

    /// Quiet mode - suppress non-essential output
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Configuration file path
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

/// Available CLI commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Watch downloads live, grouped by show
    Watch(WatchArgs),

    /// Fetch one snapshot and print it as a table
    Snapshot(SnapshotArgs),

    /// Show or initialize the configuration file
    Config(ConfigArgs),
}

/// Arguments for the watch command
#[derive(Args, Debug, Clone)]
pub struct WatchArgs {
    /// Backend base URL (overrides the configuration file)
    #[arg(short, long, value_name = "URL")]
    pub url: Option<String>,

    /// Poll interval, e.g. "5s" or "1500ms" (overrides the configuration file)
    #[arg(short, long, value_parser = humantime::parse_duration)]
    pub interval: Option<Duration>,

    /// Disable progress bars and print log lines instead
    #[arg(long)]
    pub no_progress_bars: bool,
}

/// Arguments for the snapshot command
#[derive(Args, Debug, Clone)]
pub struct SnapshotArgs {
    /// Backend base URL (overrides the configuration file)
    #[arg(short, long, value_name = "URL")]
    pub url: Option<String>,

    /// Emit the reconciled entities as JSON instead of a table
    #[arg(long)]
    pub json: bool,
}

/// Arguments for configuration management
#[derive(Args, Debug, Clone)]
pub struct ConfigArgs {
    /// Write a default configuration file if none exists
    #[arg(long)]
    pub init: bool,
}

impl Cli {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Get the logging level based on global arguments
    pub fn log_level(&self) -> tracing::Level {
        if self.global.quiet {
            tracing::Level::ERROR
        } else if self.global.very_verbose {
            tracing::Level::DEBUG
        } else if self.global.verbose {
            tracing::Level::INFO
        } else {
            tracing::Level::WARN
        }
    }
}
