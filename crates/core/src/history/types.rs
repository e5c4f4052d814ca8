use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::{MediaRecord, MediaType, RecognizedMeta};

/// One processed feed entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryRecord {
    /// Display title: media title plus season label.
    pub title: String,
    /// Raw feed entry title; the dedup key.
    pub key: String,
    pub media_type: MediaType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
    pub tmdb_id: u32,
    pub processed_at: DateTime<Utc>,
}

impl HistoryRecord {
    /// Record for a dispatched entry whose raw title is `key`.
    pub fn new(key: impl Into<String>, meta: &RecognizedMeta, media: &MediaRecord) -> Self {
        Self {
            title: format!("{} {}", media.title, meta.season_label())
                .trim()
                .to_string(),
            key: key.into(),
            media_type: media.media_type,
            year: media.year,
            poster: media.poster_url.clone(),
            overview: media.overview.clone(),
            tmdb_id: media.tmdb_id,
            processed_at: Utc::now(),
        }
    }
}
