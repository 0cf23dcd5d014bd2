//! Command-line interface components
//!
//! This module contains CLI-specific code for the showview application,
//! including argument parsing, the terminal view and command handlers.

pub mod args;
pub mod commands;
pub mod display;

pub use args::{Cli, Commands, ConfigArgs, GlobalArgs, SnapshotArgs, WatchArgs};
pub use commands::{handle_config, handle_snapshot, handle_watch};
pub use display::{build_view, LogView, ProgressView};
