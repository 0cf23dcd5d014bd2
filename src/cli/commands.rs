//! Command handlers for the showview CLI
//!
//! This module implements the handlers that coordinate between CLI arguments
//! and the core application functionality: the live watch loop, the one-shot
//! snapshot dump, and configuration management.

use std::collections::BTreeMap;
use std::sync::Arc;

use futures::future::join_all;
use tokio::sync::{broadcast, Mutex};
use tracing::{info, warn};

use crate::app::client::{BackendClient, SnapshotSource};
use crate::app::format::{format_bytes, format_speed};
use crate::app::models::ShowId;
use crate::app::reconcile::ReconcileEngine;
use crate::app::scheduler::{PollScheduler, SharedState, WatchState};
use crate::app::view::{NullSink, ViewSink};
use crate::cli::args::{ConfigArgs, GlobalArgs, SnapshotArgs, WatchArgs};
use crate::cli::display::build_view;
use crate::config::AppConfig;
use crate::errors::{AppError, Result};

/// Merge CLI overrides into the loaded configuration
fn effective_config(
    global: &GlobalArgs,
    url: Option<&str>,
    interval: Option<std::time::Duration>,
) -> Result<AppConfig> {
    let mut config = AppConfig::load_or_default(global.config.as_deref())?;
    if let Some(url) = url {
        config.client.base_url = url.to_string();
    }
    if let Some(interval) = interval {
        config.poll.interval = interval;
    }
    config.validate()?;
    Ok(config)
}

/// Handle the watch command
///
/// Runs the poll scheduler against the backend until interrupted, rendering
/// every reconciliation pass into the terminal view.
pub async fn handle_watch(global: &GlobalArgs, args: WatchArgs) -> Result<()> {
    let config = effective_config(global, args.url.as_deref(), args.interval)?;
    info!(
        "Watching {} every {:?}",
        config.client.base_url, config.poll.interval
    );

    let client = Arc::new(BackendClient::new(config.client_config()?)?);
    let force_plain = args.no_progress_bars || !config.display.progress_bars;
    let view = build_view(&config.display, force_plain);
    let state: SharedState<Box<dyn ViewSink>> = Arc::new(Mutex::new(WatchState::new(view)));
    let scheduler = PollScheduler::new(client, state, config.poll_config());

    let (shutdown_tx, shutdown_rx) = broadcast::channel(1);
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received; shutting down");
            let _ = shutdown_tx.send(());
        }
    });

    scheduler.run(shutdown_rx).await;
    Ok(())
}

/// Handle the snapshot command
///
/// Fetches one snapshot, reconciles it into fresh registries, resolves show
/// metadata for the result and prints it: a per-show table by default, the
/// entities as JSON with `--json`.
pub async fn handle_snapshot(global: &GlobalArgs, args: SnapshotArgs) -> Result<()> {
    let config = effective_config(global, args.url.as_deref(), None)?;
    let client = BackendClient::new(config.client_config()?)?;

    let snapshot = client.fetch_snapshot().await.map_err(AppError::from)?;
    let mut engine = ReconcileEngine::new();
    let mut sink = NullSink;
    let outcome = engine.reconcile(&snapshot, &mut sink);

    if outcome.records_skipped > 0 {
        warn!(
            "{} malformed record(s) skipped in this snapshot",
            outcome.records_skipped
        );
    }

    // One-shot runs still want titles: resolve all show metadata up front
    let results = join_all(
        outcome
            .metadata_requests
            .iter()
            .map(|id| client.fetch_show_metadata(id)),
    )
    .await;
    for (id, result) in outcome.metadata_requests.iter().zip(results) {
        match result {
            Ok(metadata) => {
                engine.apply_show_metadata(id, metadata, &mut sink);
            }
            Err(e) => warn!("Metadata fetch for show '{}' failed: {}", id, e),
        }
    }

    if args.json {
        print_json(&engine)?;
    } else {
        print_table(&engine);
    }
    Ok(())
}

fn print_json(engine: &ReconcileEngine) -> Result<()> {
    // Sorted for stable output
    let shows: BTreeMap<_, _> = engine
        .shows()
        .iter()
        .map(|(id, show)| (id.as_str().to_string(), show))
        .collect();
    let downloads: BTreeMap<_, _> = engine
        .downloads()
        .iter()
        .map(|(url, download)| (url.clone(), download))
        .collect();

    let payload = serde_json::json!({
        "shows": shows,
        "downloads": downloads,
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&payload).map_err(|e| AppError::generic(e.to_string()))?
    );
    Ok(())
}

fn print_table(engine: &ReconcileEngine) {
    if engine.shows().is_empty() {
        println!("No active downloads.");
        return;
    }

    let mut show_ids: Vec<ShowId> = engine.shows().keys().into_iter().collect();
    show_ids.sort();

    for id in show_ids {
        let Some(show) = engine.shows().get(&id) else {
            continue;
        };
        println!(
            "{} ({} download{})",
            show.title.as_deref().unwrap_or_else(|| id.as_str()),
            show.downloads.len(),
            if show.downloads.len() == 1 { "" } else { "s" }
        );
        for url in &show.downloads {
            if let Some(download) = engine.downloads().get(url) {
                println!(
                    "  {:>5.1}%  {:>10}  {:>12}  s:{} p:{}  {}",
                    download.progress * 100.0,
                    format_bytes(download.size as f64),
                    format_speed(download.downspeed as f64),
                    download.num_seeds,
                    download.num_peers,
                    download.filename
                );
            }
        }
    }
}

/// Handle the config command
///
/// Prints the effective configuration; with `--init`, writes the default
/// file to the platform config path first (without overwriting).
pub async fn handle_config(global: &GlobalArgs, args: ConfigArgs) -> Result<()> {
    if args.init {
        let path = AppConfig::default_path()
            .ok_or_else(|| AppError::generic("no configuration directory on this platform"))?;
        if path.exists() {
            println!("Configuration file already exists: {}", path.display());
        } else {
            AppConfig::default().save(&path)?;
            println!("Wrote default configuration to {}", path.display());
        }
    }

    let config = AppConfig::load_or_default(global.config.as_deref())?;
    let rendered = toml::to_string_pretty(&config)
        .map_err(|e| AppError::Config(crate::errors::ConfigError::Serialize(e)))?;
    print!("{}", rendered);
    Ok(())
}
