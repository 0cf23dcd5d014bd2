//! Fixed-interval poll scheduling
//!
//! Triggers a reconciliation cycle immediately on startup and then on a
//! fixed interval, collapsing overlapping triggers: a tick that fires while
//! a previous cycle is still in flight is skipped, so reconciliation for
//! snapshot N always completes before the fetch for snapshot N+1 starts.
//! Show-metadata fetches spawned by a cycle are fire-and-forget and are not
//! ordered relative to later cycles; the engine's presence check handles a
//! show departing before its metadata resolves.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{broadcast, Mutex};
use tracing::{debug, info, warn};

use crate::app::client::SnapshotSource;
use crate::app::models::ShowId;
use crate::app::reconcile::ReconcileEngine;
use crate::app::view::ViewSink;
use crate::constants::poll;
use crate::errors::AppError;

/// Polling configuration
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Interval between snapshot polls
    pub interval: Duration,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: poll::DEFAULT_POLL_INTERVAL,
        }
    }
}

/// The engine and its view, locked together
///
/// The poll cycle and every metadata-resolution task take this lock, which
/// serializes all registry mutation onto one logical thread of control.
#[derive(Debug)]
pub struct WatchState<V> {
    pub engine: ReconcileEngine,
    pub view: V,
}

impl<V: ViewSink> WatchState<V> {
    pub fn new(view: V) -> Self {
        Self {
            engine: ReconcileEngine::new(),
            view,
        }
    }
}

/// Shared handle to the watch state
pub type SharedState<V> = Arc<Mutex<WatchState<V>>>;

/// Fixed-interval poll driver
pub struct PollScheduler<S, V> {
    source: Arc<S>,
    state: SharedState<V>,
    config: PollConfig,
    in_flight: Arc<AtomicBool>,
}

impl<S, V> PollScheduler<S, V>
where
    S: SnapshotSource,
    V: ViewSink + 'static,
{
    pub fn new(source: Arc<S>, state: SharedState<V>, config: PollConfig) -> Self {
        Self {
            source,
            state,
            config,
            in_flight: Arc::new(AtomicBool::new(false)),
        }
    }

    /// Run until the shutdown signal arrives
    ///
    /// The first tick completes immediately, so the view populates on
    /// startup rather than after one full interval.
    pub async fn run(&self, mut shutdown_rx: broadcast::Receiver<()>) {
        info!("Polling for snapshots every {:?}", self.config.interval);
        let mut ticker = tokio::time::interval(self.config.interval);

        loop {
            tokio::select! {
                _ = ticker.tick() => self.tick(),
                _ = shutdown_rx.recv() => {
                    debug!("Poll scheduler received shutdown signal");
                    break;
                }
            }
        }
    }

    /// Start one poll cycle unless one is already in flight
    fn tick(&self) {
        if self.in_flight.swap(true, Ordering::SeqCst) {
            debug!("Previous poll still in flight; skipping tick");
            return;
        }

        let source = Arc::clone(&self.source);
        let state = Arc::clone(&self.state);
        let in_flight = Arc::clone(&self.in_flight);
        tokio::spawn(async move {
            run_cycle(source, state).await;
            // Cleared whether the cycle succeeded or was abandoned
            in_flight.store(false, Ordering::SeqCst);
        });
    }
}

/// One complete poll cycle: fetch, reconcile, spawn metadata fetches
async fn run_cycle<S, V>(source: Arc<S>, state: SharedState<V>)
where
    S: SnapshotSource,
    V: ViewSink + 'static,
{
    let snapshot = match source.fetch_snapshot().await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            let err = AppError::from(e);
            warn!(
                "Snapshot fetch failed ({}); keeping last known good view: {}",
                err.category(),
                err
            );
            return;
        }
    };

    let metadata_requests = {
        let mut guard = state.lock().await;
        let watch = &mut *guard;
        let outcome = watch.engine.reconcile(&snapshot, &mut watch.view);
        if outcome.changed() {
            info!(
                "View updated: {} shows, {} downloads",
                watch.engine.shows().len(),
                watch.engine.downloads().len()
            );
        }
        outcome.metadata_requests
    };

    for id in metadata_requests {
        spawn_metadata_fetch(Arc::clone(&source), Arc::clone(&state), id);
    }
}

/// Fire-and-forget metadata fetch for a newly created show
///
/// Issued once per entity lifetime. On failure the banner simply stays
/// unresolved; on late resolution the engine discards the result.
fn spawn_metadata_fetch<S, V>(source: Arc<S>, state: SharedState<V>, id: ShowId)
where
    S: SnapshotSource,
    V: ViewSink + 'static,
{
    tokio::spawn(async move {
        match source.fetch_show_metadata(&id).await {
            Ok(metadata) => {
                let mut guard = state.lock().await;
                let watch = &mut *guard;
                watch
                    .engine
                    .apply_show_metadata(&id, metadata, &mut watch.view);
            }
            Err(e) => {
                warn!(
                    "Metadata fetch for show '{}' failed; banner stays unresolved: {}",
                    id, e
                );
            }
        }
    });
}
