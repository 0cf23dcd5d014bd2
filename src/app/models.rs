//! Data models for showview
//!
//! This module defines the core data structures: the raw download record as
//! reported by the backend, the durable show and download entities held in
//! the registries, and the asynchronously resolved show metadata.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::errors::{RecordError, RecordResult};

/// Identity of a show, derived from the show reference on each record
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ShowId(String);

impl ShowId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for ShowId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// One validated download record from a snapshot
///
/// The backend reports each active transfer as a JSON object. Only the
/// transfer url and the show reference are required; the numeric fields
/// default to zero because torrent backends omit them until metadata for the
/// transfer arrives.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadRecord {
    pub url: String,
    pub show_id: ShowId,
    pub filename: String,
    pub size: u64,
    pub downspeed: u64,
    pub upspeed: u64,
    pub progress: f64,
    pub num_seeds: u32,
    pub num_peers: u32,
    pub completed: bool,
}

impl DownloadRecord {
    /// Validate one raw snapshot element
    ///
    /// The show reference is the first element of the `entry` tuple, falling
    /// back to the flat `show` field the backend also sends. A record missing
    /// its url or its show reference is malformed.
    pub fn from_value(value: &Value) -> RecordResult<Self> {
        let obj = value
            .as_object()
            .ok_or(RecordError::InvalidField {
                field: "record",
                reason: "not a JSON object".to_string(),
            })?;

        let url = obj
            .get("url")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .ok_or(RecordError::MissingField { field: "url" })?
            .to_string();

        let show_id = Self::show_reference(obj)?;

        let progress = obj
            .get("progress")
            .and_then(Value::as_f64)
            .unwrap_or(0.0)
            .clamp(0.0, 1.0);

        Ok(Self {
            url,
            show_id,
            filename: obj
                .get("filename")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            size: u64_field(obj, "size"),
            downspeed: u64_field(obj, "downspeed"),
            upspeed: u64_field(obj, "upspeed"),
            progress,
            num_seeds: u32_field(obj, "num_seeds"),
            num_peers: u32_field(obj, "num_peers"),
            completed: obj
                .get("completed")
                .and_then(Value::as_bool)
                .unwrap_or(false),
        })
    }

    fn show_reference(obj: &serde_json::Map<String, Value>) -> RecordResult<ShowId> {
        if let Some(entry) = obj.get("entry") {
            let first = entry
                .as_array()
                .and_then(|e| e.first())
                .and_then(Value::as_str)
                .filter(|s| !s.is_empty());
            if let Some(id) = first {
                return Ok(ShowId::new(id));
            }
            // entry present but unusable: fall through to the flat field
        }

        obj.get("show")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(ShowId::new)
            .ok_or(RecordError::MissingField { field: "entry" })
    }
}

fn u64_field(obj: &serde_json::Map<String, Value>, field: &str) -> u64 {
    obj.get(field)
        .and_then(|v| v.as_u64().or_else(|| v.as_f64().map(|f| f.max(0.0) as u64)))
        .unwrap_or(0)
}

fn u32_field(obj: &serde_json::Map<String, Value>, field: &str) -> u32 {
    obj.get(field)
        .and_then(Value::as_i64)
        .map(|v| v.max(0) as u32)
        .unwrap_or(0)
}

/// Durable record of one transfer's current attributes
///
/// Created on first appearance in a snapshot, overwritten wholesale on every
/// later snapshot containing the same url. The show reference is fixed at
/// creation: a download never changes show.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DownloadEntity {
    pub url: String,
    pub show_id: ShowId,
    pub filename: String,
    pub size: u64,
    pub downspeed: u64,
    pub upspeed: u64,
    pub progress: f64,
    pub num_seeds: u32,
    pub num_peers: u32,
    pub completed: bool,
    pub first_seen: DateTime<Utc>,
    pub last_updated: DateTime<Utc>,
}

impl DownloadEntity {
    pub fn from_record(record: &DownloadRecord) -> Self {
        let now = Utc::now();
        Self {
            url: record.url.clone(),
            show_id: record.show_id.clone(),
            filename: record.filename.clone(),
            size: record.size,
            downspeed: record.downspeed,
            upspeed: record.upspeed,
            progress: record.progress,
            num_seeds: record.num_seeds,
            num_peers: record.num_peers,
            completed: record.completed,
            first_seen: now,
            last_updated: now,
        }
    }

    /// Overwrite the mutable fields from a newer record
    ///
    /// `url`, `show_id` and `first_seen` are identity and never change here.
    pub fn apply_record(&mut self, record: &DownloadRecord) {
        self.filename = record.filename.clone();
        self.size = record.size;
        self.downspeed = record.downspeed;
        self.upspeed = record.upspeed;
        self.progress = record.progress;
        self.num_seeds = record.num_seeds;
        self.num_peers = record.num_peers;
        self.completed = record.completed;
        self.last_updated = Utc::now();
    }
}

/// Banner resolution state for a show
///
/// Metadata arrives from a separate fetch that may land any number of poll
/// cycles after the show was created, or never. A resolved show may still
/// have no banner (the backend serves null for shows without one).
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum BannerState {
    /// Metadata fetch issued, not yet resolved (or failed; never retried)
    Pending,
    /// Metadata resolved, with the banner reference if the show has one
    Resolved(Option<String>),
}

impl BannerState {
    pub fn is_resolved(&self) -> bool {
        matches!(self, BannerState::Resolved(_))
    }

    pub fn banner(&self) -> Option<&str> {
        match self {
            BannerState::Resolved(Some(banner)) => Some(banner),
            _ => None,
        }
    }
}

/// Identity-keyed record grouping downloads under one series
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ShowEntity {
    pub id: ShowId,
    pub title: Option<String>,
    pub banner: BannerState,
    /// Denormalized membership cache of download urls; shrinks only when a
    /// download is pruned from the registry
    pub downloads: BTreeSet<String>,
    pub first_seen: DateTime<Utc>,
}

impl ShowEntity {
    pub fn new(id: ShowId) -> Self {
        Self {
            id,
            title: None,
            banner: BannerState::Pending,
            downloads: BTreeSet::new(),
            first_seen: Utc::now(),
        }
    }

    /// Attach a download url to this show's membership cache
    ///
    /// Idempotent: attaching an already-attached url is a no-op.
    pub fn attach(&mut self, url: &str) -> bool {
        self.downloads.insert(url.to_string())
    }

    /// Detach a download url; no-op if absent
    pub fn detach(&mut self, url: &str) -> bool {
        self.downloads.remove(url)
    }
}

/// Show metadata resolved from the per-show endpoint
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
pub struct ShowMetadata {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub banner: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_record() -> Value {
        json!({
            "url": "http://example.com/a.torrent",
            "magnet": null,
            "id": "abc123",
            "filename": "Show.S01E01.mkv",
            "entry": ["Example Show", 1, 1],
            "show": "Example Show",
            "size": 734003200u64,
            "downspeed": 524288,
            "upspeed": 65536,
            "progress": 0.42,
            "num_seeds": 12,
            "num_peers": 3,
            "completed": false
        })
    }

    #[test]
    fn test_parse_full_record() {
        let record = DownloadRecord::from_value(&sample_record()).unwrap();
        assert_eq!(record.url, "http://example.com/a.torrent");
        assert_eq!(record.show_id, ShowId::from("Example Show"));
        assert_eq!(record.filename, "Show.S01E01.mkv");
        assert_eq!(record.size, 734003200);
        assert_eq!(record.downspeed, 524288);
        assert_eq!(record.upspeed, 65536);
        assert!((record.progress - 0.42).abs() < f64::EPSILON);
        assert_eq!(record.num_seeds, 12);
        assert_eq!(record.num_peers, 3);
        assert!(!record.completed);
    }

    #[test]
    fn test_missing_url_is_malformed() {
        let mut value = sample_record();
        value.as_object_mut().unwrap().remove("url");
        let err = DownloadRecord::from_value(&value).unwrap_err();
        assert!(matches!(err, RecordError::MissingField { field: "url" }));
    }

    #[test]
    fn test_missing_show_reference_is_malformed() {
        let mut value = sample_record();
        let obj = value.as_object_mut().unwrap();
        obj.remove("entry");
        obj.remove("show");
        let err = DownloadRecord::from_value(&value).unwrap_err();
        assert!(matches!(err, RecordError::MissingField { field: "entry" }));
    }

    #[test]
    fn test_show_reference_falls_back_to_flat_field() {
        let mut value = sample_record();
        value.as_object_mut().unwrap().remove("entry");
        let record = DownloadRecord::from_value(&value).unwrap();
        assert_eq!(record.show_id, ShowId::from("Example Show"));
    }

    #[test]
    fn test_empty_entry_falls_back_to_flat_field() {
        let mut value = sample_record();
        value["entry"] = json!([]);
        let record = DownloadRecord::from_value(&value).unwrap();
        assert_eq!(record.show_id, ShowId::from("Example Show"));
    }

    #[test]
    fn test_numeric_fields_default_to_zero() {
        // Torrent backends omit size until transfer metadata arrives
        let value = json!({
            "url": "http://example.com/b.torrent",
            "entry": ["Example Show"],
        });
        let record = DownloadRecord::from_value(&value).unwrap();
        assert_eq!(record.size, 0);
        assert_eq!(record.downspeed, 0);
        assert_eq!(record.num_seeds, 0);
        assert!((record.progress - 0.0).abs() < f64::EPSILON);
        assert!(!record.completed);
    }

    #[test]
    fn test_progress_is_clamped() {
        let mut value = sample_record();
        value["progress"] = json!(1.004);
        let record = DownloadRecord::from_value(&value).unwrap();
        assert!((record.progress - 1.0).abs() < f64::EPSILON);

        value["progress"] = json!(-0.2);
        let record = DownloadRecord::from_value(&value).unwrap();
        assert!((record.progress - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_non_object_record_is_malformed() {
        let err = DownloadRecord::from_value(&json!("not a record")).unwrap_err();
        assert!(matches!(err, RecordError::InvalidField { field: "record", .. }));
    }

    #[test]
    fn test_entity_update_preserves_identity() {
        let record = DownloadRecord::from_value(&sample_record()).unwrap();
        let mut entity = DownloadEntity::from_record(&record);
        let first_seen = entity.first_seen;

        let mut newer = record.clone();
        newer.progress = 0.9;
        newer.downspeed = 1_048_576;
        entity.apply_record(&newer);

        assert!((entity.progress - 0.9).abs() < f64::EPSILON);
        assert_eq!(entity.downspeed, 1_048_576);
        assert_eq!(entity.url, record.url);
        assert_eq!(entity.show_id, record.show_id);
        assert_eq!(entity.first_seen, first_seen);
    }

    #[test]
    fn test_show_attach_is_idempotent() {
        let mut show = ShowEntity::new(ShowId::from("Example Show"));
        assert!(show.attach("http://example.com/a.torrent"));
        assert!(!show.attach("http://example.com/a.torrent"));
        assert_eq!(show.downloads.len(), 1);
        assert!(show.detach("http://example.com/a.torrent"));
        assert!(!show.detach("http://example.com/a.torrent"));
    }

    #[test]
    fn test_banner_state_accessors() {
        assert!(!BannerState::Pending.is_resolved());
        assert_eq!(BannerState::Pending.banner(), None);

        let resolved = BannerState::Resolved(Some("static/banners/x.jpg".to_string()));
        assert!(resolved.is_resolved());
        assert_eq!(resolved.banner(), Some("static/banners/x.jpg"));

        let bare = BannerState::Resolved(None);
        assert!(bare.is_resolved());
        assert_eq!(bare.banner(), None);
    }

    #[test]
    fn test_show_metadata_tolerates_partial_payload() {
        let meta: ShowMetadata = serde_json::from_value(json!({
            "title": "Example Show",
            "ids": {"tvdb": 12345},
            "absolute": false
        }))
        .unwrap();
        assert_eq!(meta.title.as_deref(), Some("Example Show"));
        assert_eq!(meta.banner, None);
    }
}
