//! Media library existence checks.
//!
//! Before dispatching, the poller asks the library whether the media is
//! already present and, for series, which seasons/episodes are missing.

use std::collections::HashMap;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::classify::{MediaRecord, MediaType, RecognizedMeta};

/// Errors reported by a library backend.
#[derive(Debug, Error)]
pub enum LibraryError {
    #[error("Library unavailable: {0}")]
    Unavailable(String),

    #[error("Library query failed: {0}")]
    Query(String),
}

/// Missing episodes of one season.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeasonGap {
    /// Missing episode numbers. Empty means the whole season is missing.
    #[serde(default)]
    pub episodes: Vec<u32>,
    /// Episode count of the season, when known.
    #[serde(default)]
    pub total_episodes: u32,
}

impl SeasonGap {
    pub fn whole_season(total_episodes: u32) -> Self {
        Self {
            episodes: Vec::new(),
            total_episodes,
        }
    }

    pub fn episodes(episodes: Vec<u32>, total_episodes: u32) -> Self {
        Self {
            episodes,
            total_episodes,
        }
    }

    /// Whether every episode in `wanted` is among the missing ones.
    ///
    /// A whole-season gap covers anything.
    pub fn covers(&self, wanted: &[u32]) -> bool {
        self.episodes.is_empty() || wanted.iter().all(|e| self.episodes.contains(e))
    }
}

/// Catalog id -> season number -> missing episodes.
pub type MissingMap = HashMap<u32, HashMap<u32, SeasonGap>>;

/// Outcome of an existence check.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Existence {
    /// The media is fully present; nothing to fetch.
    pub exists: bool,
    /// Gaps for series; empty for movies.
    pub missing: MissingMap,
}

impl Existence {
    pub fn present() -> Self {
        Self {
            exists: true,
            missing: MissingMap::new(),
        }
    }

    pub fn absent() -> Self {
        Self::default()
    }

    /// Gaps for a series, keyed by season.
    pub fn series_gaps(tmdb_id: u32, seasons: impl IntoIterator<Item = (u32, SeasonGap)>) -> Self {
        let mut missing = MissingMap::new();
        missing.insert(tmdb_id, seasons.into_iter().collect());
        Self {
            exists: false,
            missing,
        }
    }

    /// Gap for one season of one catalog entry.
    pub fn season_gap(&self, tmdb_id: u32, season: u32) -> Option<&SeasonGap> {
        self.missing.get(&tmdb_id).and_then(|seasons| seasons.get(&season))
    }
}

/// Library backend.
#[async_trait]
pub trait ExistenceChecker: Send + Sync {
    /// Report whether `media` exists and what is missing.
    async fn missing(
        &self,
        meta: &RecognizedMeta,
        media: &MediaRecord,
    ) -> Result<Existence, LibraryError>;
}

/// A library that holds nothing.
///
/// Movies are always absent. For series, every season named by the release
/// (season 1 when none is named) is reported wholly missing.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyLibrary;

#[async_trait]
impl ExistenceChecker for EmptyLibrary {
    async fn missing(
        &self,
        meta: &RecognizedMeta,
        media: &MediaRecord,
    ) -> Result<Existence, LibraryError> {
        if media.media_type == MediaType::Movie {
            return Ok(Existence::absent());
        }

        let begin = meta.begin_season.unwrap_or(1);
        let end = meta.end_season.unwrap_or(begin).max(begin);

        Ok(Existence::series_gaps(
            media.tmdb_id,
            (begin..=end).map(|season| (season, SeasonGap::whole_season(0))),
        ))
    }
}
