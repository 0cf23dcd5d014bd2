//! View notification contract
//!
//! The engine drives a [`ViewSink`] with create/update/remove callbacks, all
//! delivered synchronously within one pass: creations and updates in snapshot
//! order, then removals. Implementations hold render handles keyed by the
//! same identities as the registries, never authoritative entity state.

use crate::app::models::{DownloadEntity, ShowEntity, ShowId};

/// Callbacks consumed by the presentation layer
///
/// An implementation distinguishes create from update by whether it already
/// holds a render handle for the key; the engine additionally makes the
/// distinction explicit in the callback it picks.
pub trait ViewSink: Send {
    fn on_show_created(&mut self, id: &ShowId);
    fn on_show_updated(&mut self, id: &ShowId, show: &ShowEntity);
    fn on_show_removed(&mut self, id: &ShowId);
    fn on_download_created(&mut self, url: &str, download: &DownloadEntity);
    fn on_download_updated(&mut self, url: &str, download: &DownloadEntity);
    fn on_download_removed(&mut self, url: &str);
}

impl<T: ViewSink + ?Sized> ViewSink for Box<T> {
    fn on_show_created(&mut self, id: &ShowId) {
        (**self).on_show_created(id)
    }

    fn on_show_updated(&mut self, id: &ShowId, show: &ShowEntity) {
        (**self).on_show_updated(id, show)
    }

    fn on_show_removed(&mut self, id: &ShowId) {
        (**self).on_show_removed(id)
    }

    fn on_download_created(&mut self, url: &str, download: &DownloadEntity) {
        (**self).on_download_created(url, download)
    }

    fn on_download_updated(&mut self, url: &str, download: &DownloadEntity) {
        (**self).on_download_updated(url, download)
    }

    fn on_download_removed(&mut self, url: &str) {
        (**self).on_download_removed(url)
    }
}

/// Sink that discards every notification
#[derive(Debug, Default)]
pub struct NullSink;

impl ViewSink for NullSink {
    fn on_show_created(&mut self, _id: &ShowId) {}
    fn on_show_updated(&mut self, _id: &ShowId, _show: &ShowEntity) {}
    fn on_show_removed(&mut self, _id: &ShowId) {}
    fn on_download_created(&mut self, _url: &str, _download: &DownloadEntity) {}
    fn on_download_updated(&mut self, _url: &str, _download: &DownloadEntity) {}
    fn on_download_removed(&mut self, _url: &str) {}
}

/// One recorded view notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewEvent {
    ShowCreated(ShowId),
    ShowUpdated(ShowId),
    ShowRemoved(ShowId),
    DownloadCreated(String),
    DownloadUpdated(String),
    DownloadRemoved(String),
}

/// Sink that records notifications in memory, in delivery order
///
/// Used by the test suite and by headless one-shot runs to inspect what a
/// pass changed without a terminal renderer.
#[derive(Debug, Default)]
pub struct CollectingSink {
    pub events: Vec<ViewEvent>,
}

impl CollectingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.events.clear();
    }

    /// Count of events matching a predicate
    pub fn count(&self, predicate: impl Fn(&ViewEvent) -> bool) -> usize {
        self.events.iter().filter(|e| predicate(e)).count()
    }
}

impl ViewSink for CollectingSink {
    fn on_show_created(&mut self, id: &ShowId) {
        self.events.push(ViewEvent::ShowCreated(id.clone()));
    }

    fn on_show_updated(&mut self, id: &ShowId, _show: &ShowEntity) {
        self.events.push(ViewEvent::ShowUpdated(id.clone()));
    }

    fn on_show_removed(&mut self, id: &ShowId) {
        self.events.push(ViewEvent::ShowRemoved(id.clone()));
    }

    fn on_download_created(&mut self, url: &str, _download: &DownloadEntity) {
        self.events.push(ViewEvent::DownloadCreated(url.to_string()));
    }

    fn on_download_updated(&mut self, url: &str, _download: &DownloadEntity) {
        self.events.push(ViewEvent::DownloadUpdated(url.to_string()));
    }

    fn on_download_removed(&mut self, url: &str) {
        self.events.push(ViewEvent::DownloadRemoved(url.to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::ShowId;

    #[test]
    fn test_collecting_sink_records_in_order() {
        let mut sink = CollectingSink::new();
        let id = ShowId::from("Example Show");
        sink.on_show_created(&id);
        sink.on_show_removed(&id);

        assert_eq!(
            sink.events,
            vec![
                ViewEvent::ShowCreated(id.clone()),
                ViewEvent::ShowRemoved(id),
            ]
        );
        assert_eq!(
            sink.count(|e| matches!(e, ViewEvent::ShowCreated(_))),
            1
        );
    }
}
