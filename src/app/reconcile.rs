//! Incremental snapshot reconciliation
//!
//! The engine consumes one polled snapshot (the complete ordered list of
//! active downloads), maintains the show and download registries, and emits
//! the minimal set of create/update/remove notifications needed to keep a
//! rendered view consistent with the latest snapshot. Show metadata resolves
//! asynchronously and is applied through a presence-checked entry point that
//! tolerates the show having been removed in the meantime.

use std::collections::HashSet;

use serde_json::Value;
use tracing::{debug, warn};

use crate::app::models::{BannerState, DownloadEntity, DownloadRecord, ShowEntity, ShowId, ShowMetadata};
use crate::app::registry::EntityRegistry;
use crate::app::view::ViewSink;

/// The two entity registries, owned together
///
/// Only the engine and the metadata-resolution path mutate these.
#[derive(Debug, Default)]
pub struct Registries {
    pub shows: EntityRegistry<ShowId, ShowEntity>,
    pub downloads: EntityRegistry<String, DownloadEntity>,
}

impl Registries {
    pub fn new() -> Self {
        Self::default()
    }

    /// Cross-check the membership invariant between the two registries
    ///
    /// Every url in a show's membership cache must be a live download keyed
    /// by that url whose `show_id` is that show, and every download's show
    /// must exist and list it. Returns a description per violation; empty
    /// means consistent.
    pub fn membership_violations(&self) -> Vec<String> {
        let mut violations = Vec::new();

        for (id, show) in self.shows.iter() {
            for url in &show.downloads {
                match self.downloads.get(url) {
                    None => violations.push(format!(
                        "show '{}' lists '{}' which is not in the download registry",
                        id, url
                    )),
                    Some(download) if &download.show_id != id => violations.push(format!(
                        "show '{}' lists '{}' which belongs to '{}'",
                        id, url, download.show_id
                    )),
                    Some(_) => {}
                }
            }
        }

        for (url, download) in self.downloads.iter() {
            match self.shows.get(&download.show_id) {
                None => violations.push(format!(
                    "download '{}' references missing show '{}'",
                    url, download.show_id
                )),
                Some(show) if !show.downloads.contains(url) => violations.push(format!(
                    "download '{}' is not listed by its show '{}'",
                    url, download.show_id
                )),
                Some(_) => {}
            }
        }

        violations
    }
}

/// What one reconciliation pass did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileOutcome {
    /// Show ids created this pass, in first-appearance order; each needs a
    /// metadata fetch, issued exactly once per entity lifetime
    pub metadata_requests: Vec<ShowId>,
    pub shows_created: usize,
    pub shows_removed: usize,
    pub downloads_created: usize,
    pub downloads_updated: usize,
    pub downloads_removed: usize,
    /// Malformed records skipped without aborting the pass
    pub records_skipped: usize,
}

impl ReconcileOutcome {
    /// Whether the pass changed registry membership at all
    pub fn changed(&self) -> bool {
        self.shows_created > 0
            || self.shows_removed > 0
            || self.downloads_created > 0
            || self.downloads_removed > 0
    }
}

/// Core reconciliation engine
///
/// Invoked once per completed poll with the full current snapshot. All view
/// notifications for one pass are delivered synchronously within that pass:
/// creations and updates in snapshot order, then removals.
#[derive(Debug, Default)]
pub struct ReconcileEngine {
    registries: Registries,
}

impl ReconcileEngine {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn registries(&self) -> &Registries {
        &self.registries
    }

    pub fn shows(&self) -> &EntityRegistry<ShowId, ShowEntity> {
        &self.registries.shows
    }

    pub fn downloads(&self) -> &EntityRegistry<String, DownloadEntity> {
        &self.registries.downloads
    }

    /// Reconcile the registries and view against one snapshot
    pub fn reconcile(&mut self, snapshot: &[Value], view: &mut dyn ViewSink) -> ReconcileOutcome {
        let mut outcome = ReconcileOutcome::default();
        let mut present_shows: HashSet<ShowId> = HashSet::new();
        let mut present_downloads: HashSet<String> = HashSet::new();

        for value in snapshot {
            let record = match DownloadRecord::from_value(value) {
                Ok(record) => record,
                Err(e) => {
                    warn!("Skipping malformed snapshot record: {}", e);
                    outcome.records_skipped += 1;
                    continue;
                }
            };

            // The show reference is only authoritative at creation: an
            // existing download keeps its original show even if a later
            // record names a different one.
            let owner_id = match self.registries.downloads.get(&record.url) {
                Some(existing) if existing.show_id != record.show_id => {
                    warn!(
                        "Download {} reported under show '{}' but belongs to '{}'; keeping original membership",
                        record.url, record.show_id, existing.show_id
                    );
                    existing.show_id.clone()
                }
                Some(existing) => existing.show_id.clone(),
                None => record.show_id.clone(),
            };

            present_shows.insert(owner_id.clone());
            present_downloads.insert(record.url.clone());

            let show_outcome = self.registries.shows.upsert(
                owner_id.clone(),
                || ShowEntity::new(owner_id.clone()),
                |_| {},
            );
            if show_outcome.is_created() {
                debug!("New show observed: {}", owner_id);
                view.on_show_created(&owner_id);
                outcome.metadata_requests.push(owner_id.clone());
                outcome.shows_created += 1;
            }

            let download_outcome = self.registries.downloads.upsert(
                record.url.clone(),
                || DownloadEntity::from_record(&record),
                |existing| existing.apply_record(&record),
            );

            if let Some(show) = self.registries.shows.get_mut(&owner_id) {
                show.attach(&record.url);
            }

            if let Some(entity) = self.registries.downloads.get(&record.url) {
                if download_outcome.is_created() {
                    view.on_download_created(&record.url, entity);
                    outcome.downloads_created += 1;
                } else {
                    view.on_download_updated(&record.url, entity);
                    outcome.downloads_updated += 1;
                }
            }
        }

        self.remove_stale(&present_shows, &present_downloads, view, &mut outcome);

        debug!(
            "Reconciled snapshot: +{}/-{} shows, +{}/~{}/-{} downloads, {} skipped",
            outcome.shows_created,
            outcome.shows_removed,
            outcome.downloads_created,
            outcome.downloads_updated,
            outcome.downloads_removed,
            outcome.records_skipped
        );
        outcome
    }

    /// Remove everything the snapshot no longer contains
    ///
    /// Downloads go first so shows shed their memberships before the stale
    /// show check; both stale sets iterate sorted so notification order is
    /// deterministic.
    fn remove_stale(
        &mut self,
        present_shows: &HashSet<ShowId>,
        present_downloads: &HashSet<String>,
        view: &mut dyn ViewSink,
        outcome: &mut ReconcileOutcome,
    ) {
        let mut stale_downloads: Vec<String> = self
            .registries
            .downloads
            .keys()
            .into_iter()
            .filter(|url| !present_downloads.contains(url))
            .collect();
        stale_downloads.sort();

        for url in stale_downloads {
            if let Some(entity) = self.registries.downloads.remove(&url) {
                if let Some(show) = self.registries.shows.get_mut(&entity.show_id) {
                    show.detach(&url);
                }
                view.on_download_removed(&url);
                outcome.downloads_removed += 1;
                debug!("Pruned departed download: {}", url);
            }
        }

        let mut stale_shows: Vec<ShowId> = self
            .registries
            .shows
            .keys()
            .into_iter()
            .filter(|id| !present_shows.contains(id))
            .collect();
        stale_shows.sort();

        for id in stale_shows {
            view.on_show_removed(&id);
            self.registries.shows.remove(&id);
            outcome.shows_removed += 1;
            debug!("Removed departed show: {}", id);
        }
    }

    /// Apply asynchronously resolved show metadata
    ///
    /// Metadata fetches are not ordered relative to poll cycles: the show may
    /// have been removed since its fetch was issued. Resolution against a
    /// departed show is discarded — it must not recreate the entity or touch
    /// a stale render handle. Returns whether the metadata was applied.
    pub fn apply_show_metadata(
        &mut self,
        id: &ShowId,
        metadata: ShowMetadata,
        view: &mut dyn ViewSink,
    ) -> bool {
        let Some(show) = self.registries.shows.get_mut(id) else {
            debug!("Discarding metadata for departed show '{}'", id);
            return false;
        };

        show.title = metadata.title;
        show.banner = BannerState::Resolved(metadata.banner);
        let show: &ShowEntity = show;
        view.on_show_updated(id, show);
        true
    }
}
