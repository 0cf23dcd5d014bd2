//! showview CLI application
//!
//! Command-line interface for watching show-grouped download progress.
//! Features fixed-interval polling, incremental view reconciliation and
//! asynchronous show-metadata enrichment.

use std::process;

use anyhow::Context;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};

use showview::cli::{handle_config, handle_snapshot, handle_watch, Cli, Commands};

#[tokio::main]
async fn main() {
    // Initialize program
    let result = run().await;

    // Handle any errors that occurred
    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Main application logic
async fn run() -> anyhow::Result<()> {
    // Parse command line arguments
    let cli = Cli::parse_args();

    // Initialize logging based on verbosity
    init_logging(&cli);

    info!("showview v{} starting", env!("CARGO_PKG_VERSION"));

    // Execute the appropriate command
    match cli.command {
        Commands::Watch(args) => {
            info!("Executing watch command");
            handle_watch(&cli.global, args)
                .await
                .context("watch command failed")
        }
        Commands::Snapshot(args) => {
            info!("Executing snapshot command");
            handle_snapshot(&cli.global, args)
                .await
                .context("snapshot command failed")
        }
        Commands::Config(args) => {
            info!("Executing config command");
            handle_config(&cli.global, args)
                .await
                .context("config command failed")
        }
    }
}

/// Initialize logging based on CLI verbosity settings
fn init_logging(cli: &Cli) {
    let log_level = cli.log_level();

    // Create environment filter
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("showview={}", log_level).parse().unwrap());

    // Initialize subscriber
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_level(cli.global.very_verbose) // Show levels only in very verbose mode
        .init();

    if cli.global.very_verbose {
        info!("Very verbose logging enabled");
    } else if cli.global.verbose {
        info!("Verbose logging enabled");
    }
}
