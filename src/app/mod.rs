//! Core application logic for showview
//!
//! This module contains the main application components: the backend client,
//! the entity model and registries, the reconciliation engine, the poll
//! scheduler and the view contract they drive.

pub mod client;
pub mod format;
pub mod models;
pub mod reconcile;
pub mod registry;
pub mod scheduler;
pub mod view;

// Re-export main public API
pub use client::{BackendClient, ClientConfig, SnapshotSource};
pub use format::{format_bytes, format_speed};
pub use models::{
    BannerState, DownloadEntity, DownloadRecord, ShowEntity, ShowId, ShowMetadata,
};
pub use reconcile::{ReconcileEngine, ReconcileOutcome, Registries};
pub use registry::{EntityRegistry, UpsertOutcome};
pub use scheduler::{PollConfig, PollScheduler, SharedState, WatchState};
pub use view::{CollectingSink, NullSink, ViewEvent, ViewSink};
