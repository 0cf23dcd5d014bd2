//! Live terminal rendering of the download view
//!
//! Implements the view contract with indicatif: one header line per show and
//! one progress bar per download, inserted under its show header and removed
//! when the entity departs. The bars are render handles keyed by the same
//! identities as the registries; the registries stay authoritative.

use std::collections::HashMap;

use crossterm::terminal;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::info;

use crate::app::format::{format_bytes, format_speed};
use crate::app::models::{DownloadEntity, ShowEntity, ShowId};
use crate::app::view::ViewSink;
use crate::config::DisplaySettings;
use crate::constants::display;

/// Scale for bar positions; progress in [0, 1] maps onto [0, PROGRESS_SCALE]
const PROGRESS_SCALE: u64 = display::PROGRESS_SCALE;

/// Progress-bar view backed by an indicatif MultiProgress
pub struct ProgressView {
    multi: MultiProgress,
    show_bars: HashMap<ShowId, ProgressBar>,
    download_bars: HashMap<String, ProgressBar>,
    /// Owning show per download url, for regrouping on removal
    download_shows: HashMap<String, ShowId>,
    /// Insertion anchor per show: the header or the latest bar under it
    anchors: HashMap<ShowId, ProgressBar>,
    max_filename_width: usize,
}

impl ProgressView {
    pub fn new(settings: &DisplaySettings) -> Self {
        Self::with_draw_target(settings, ProgressDrawTarget::stderr())
    }

    /// Construct against an explicit draw target (hidden in tests)
    pub fn with_draw_target(settings: &DisplaySettings, target: ProgressDrawTarget) -> Self {
        let width = terminal::size()
            .map(|(cols, _)| cols)
            .unwrap_or(display::FALLBACK_TERMINAL_WIDTH) as usize;
        // Leave room for the bar, percentage and rate columns
        let max_filename_width = settings
            .max_filename_width
            .min(width.saturating_sub(50))
            .max(8);

        Self {
            multi: MultiProgress::with_draw_target(target),
            show_bars: HashMap::new(),
            download_bars: HashMap::new(),
            download_shows: HashMap::new(),
            anchors: HashMap::new(),
            max_filename_width,
        }
    }

    fn header_style() -> ProgressStyle {
        ProgressStyle::with_template("{msg}").unwrap_or_else(|_| ProgressStyle::default_bar())
    }

    fn bar_style() -> ProgressStyle {
        ProgressStyle::with_template("  {bar:30.cyan/blue} {percent:>3}% {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
    }

    fn header_text(show: &ShowEntity) -> String {
        let name = show.title.as_deref().unwrap_or_else(|| show.id.as_str());
        if show.banner.banner().is_some() {
            format!("▣ {}", name)
        } else {
            format!("▢ {}", name)
        }
    }

    fn download_text(&self, download: &DownloadEntity) -> String {
        let mut name = download.filename.clone();
        if name.is_empty() {
            name = download.url.clone();
        }
        if name.chars().count() > self.max_filename_width {
            name = name
                .chars()
                .take(self.max_filename_width.saturating_sub(1))
                .collect::<String>()
                + "…";
        }

        if download.completed {
            format!("{} done ({})", name, format_bytes(download.size as f64))
        } else {
            format!(
                "{} {} of {} s:{} p:{}",
                name,
                format_speed(download.downspeed as f64),
                format_bytes(download.size as f64),
                download.num_seeds,
                download.num_peers
            )
        }
    }
}

impl ViewSink for ProgressView {
    fn on_show_created(&mut self, id: &ShowId) {
        let bar = ProgressBar::no_length().with_style(Self::header_style());
        let bar = self.multi.add(bar);
        bar.set_message(format!("▢ {}", id));
        self.anchors.insert(id.clone(), bar.clone());
        self.show_bars.insert(id.clone(), bar);
    }

    fn on_show_updated(&mut self, id: &ShowId, show: &ShowEntity) {
        if let Some(bar) = self.show_bars.get(id) {
            bar.set_message(Self::header_text(show));
        }
    }

    fn on_show_removed(&mut self, id: &ShowId) {
        if let Some(bar) = self.show_bars.remove(id) {
            self.multi.remove(&bar);
            bar.finish_and_clear();
        }
        self.anchors.remove(id);
    }

    fn on_download_created(&mut self, url: &str, download: &DownloadEntity) {
        let bar = ProgressBar::new(PROGRESS_SCALE).with_style(Self::bar_style());
        let bar = match self.anchors.get(&download.show_id) {
            Some(anchor) => self.multi.insert_after(anchor, bar),
            None => self.multi.add(bar),
        };
        bar.set_position((download.progress * PROGRESS_SCALE as f64) as u64);
        bar.set_message(self.download_text(download));

        self.anchors.insert(download.show_id.clone(), bar.clone());
        self.download_shows
            .insert(url.to_string(), download.show_id.clone());
        self.download_bars.insert(url.to_string(), bar);
    }

    fn on_download_updated(&mut self, url: &str, download: &DownloadEntity) {
        let text = self.download_text(download);
        if let Some(bar) = self.download_bars.get(url) {
            bar.set_position((download.progress * PROGRESS_SCALE as f64) as u64);
            bar.set_message(text);
        }
    }

    fn on_download_removed(&mut self, url: &str) {
        if let Some(bar) = self.download_bars.remove(url) {
            self.multi.remove(&bar);
            bar.finish_and_clear();
        }
        // New bars for this show regroup under its header
        if let Some(show_id) = self.download_shows.remove(url) {
            if let Some(header) = self.show_bars.get(&show_id) {
                self.anchors.insert(show_id, header.clone());
            }
        }
    }
}

/// Plain view for non-terminal output: one log line per notification
#[derive(Debug, Default)]
pub struct LogView;

impl ViewSink for LogView {
    fn on_show_created(&mut self, id: &ShowId) {
        info!("show added: {}", id);
    }

    fn on_show_updated(&mut self, id: &ShowId, show: &ShowEntity) {
        match show.banner.banner() {
            Some(banner) => info!("show resolved: {} (banner {})", id, banner),
            None => info!("show resolved: {}", id),
        }
    }

    fn on_show_removed(&mut self, id: &ShowId) {
        info!("show removed: {}", id);
    }

    fn on_download_created(&mut self, _url: &str, download: &DownloadEntity) {
        info!(
            "download added: {} [{}] {:.1}% of {}",
            download.filename,
            download.show_id,
            download.progress * 100.0,
            format_bytes(download.size as f64)
        );
    }

    fn on_download_updated(&mut self, _url: &str, download: &DownloadEntity) {
        info!(
            "download progress: {} {:.1}% at {}",
            download.filename,
            download.progress * 100.0,
            format_speed(download.downspeed as f64)
        );
    }

    fn on_download_removed(&mut self, url: &str) {
        info!("download removed: {}", url);
    }
}

/// Pick the terminal or plain view for the current environment
pub fn build_view(settings: &DisplaySettings, force_plain: bool) -> Box<dyn ViewSink> {
    if force_plain || !atty::is(atty::Stream::Stderr) {
        Box::new(LogView)
    } else {
        Box::new(ProgressView::new(settings))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::{DownloadRecord, ShowMetadata};
    use crate::app::reconcile::ReconcileEngine;
    use serde_json::json;

    fn hidden_view() -> ProgressView {
        ProgressView::with_draw_target(&DisplaySettings::default(), ProgressDrawTarget::hidden())
    }

    fn download(show: &str, url: &str, progress: f64) -> DownloadEntity {
        let record = DownloadRecord::from_value(&json!({
            "url": url,
            "entry": [show],
            "filename": "Episode.S01E01.mkv",
            "size": 734003200u64,
            "downspeed": 524288,
            "progress": progress,
            "num_seeds": 4,
            "num_peers": 2
        }))
        .unwrap();
        DownloadEntity::from_record(&record)
    }

    #[test]
    fn test_render_handles_follow_entity_lifecycle() {
        let mut view = hidden_view();
        let id = ShowId::from("Alpha");

        view.on_show_created(&id);
        let entity = download("Alpha", "http://t/a1", 0.25);
        view.on_download_created("http://t/a1", &entity);
        assert_eq!(view.show_bars.len(), 1);
        assert_eq!(view.download_bars.len(), 1);

        view.on_download_updated("http://t/a1", &download("Alpha", "http://t/a1", 0.75));
        view.on_download_removed("http://t/a1");
        view.on_show_removed(&id);
        assert!(view.show_bars.is_empty());
        assert!(view.download_bars.is_empty());
        assert!(view.anchors.is_empty());
        assert!(view.download_shows.is_empty());
    }

    #[test]
    fn test_update_for_unknown_handle_is_a_noop() {
        let mut view = hidden_view();
        // The engine never sends these, but a handle miss must not panic
        view.on_download_updated("http://t/ghost", &download("Alpha", "http://t/ghost", 0.5));
        view.on_download_removed("http://t/ghost");
        view.on_show_removed(&ShowId::from("Ghost"));
    }

    #[test]
    fn test_header_text_reflects_banner_state() {
        let mut engine = ReconcileEngine::new();
        let mut view = hidden_view();
        engine.reconcile(
            &[json!({"url": "http://t/a1", "entry": ["Alpha"], "filename": "e.mkv"})],
            &mut view,
        );
        engine.apply_show_metadata(
            &ShowId::from("Alpha"),
            ShowMetadata {
                title: Some("Alpha: Season One".to_string()),
                banner: Some("static/banners/alpha.jpg".to_string()),
            },
            &mut view,
        );

        let show = engine.shows().get(&ShowId::from("Alpha")).unwrap();
        let text = ProgressView::header_text(show);
        assert!(text.contains("Alpha: Season One"));
        assert!(text.starts_with('▣'));
    }

    #[test]
    fn test_long_filenames_are_truncated() {
        let view = hidden_view();
        let mut entity = download("Alpha", "http://t/a1", 0.5);
        entity.filename = "x".repeat(200);
        let text = view.download_text(&entity);
        assert!(text.chars().count() < 200);
        assert!(text.contains('…'));
    }
}
