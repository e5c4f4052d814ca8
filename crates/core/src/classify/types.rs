//! Types produced by classification.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Kind of catalog entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaType {
    Movie,
    Tv,
}

impl MediaType {
    pub fn as_str(&self) -> &'static str {
        match self {
            MediaType::Movie => "movie",
            MediaType::Tv => "tv",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "movie" => Some(MediaType::Movie),
            "tv" | "series" => Some(MediaType::Tv),
            _ => None,
        }
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MediaType::Movie => write!(f, "Movie"),
            MediaType::Tv => write!(f, "TV"),
        }
    }
}

/// Metadata recognized from a release title.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RecognizedMeta {
    /// Canonical name; empty when nothing usable was found.
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub begin_season: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_season: Option<u32>,
    /// Every episode number covered by the release, ascending.
    #[serde(default)]
    pub episodes: Vec<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub media_type_hint: Option<MediaType>,
}

impl RecognizedMeta {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_season(mut self, season: u32) -> Self {
        self.begin_season = Some(season);
        self.media_type_hint = Some(MediaType::Tv);
        self
    }

    pub fn with_episodes(mut self, episodes: Vec<u32>) -> Self {
        self.episodes = episodes;
        self.media_type_hint = Some(MediaType::Tv);
        self
    }

    pub fn with_year(mut self, year: u32) -> Self {
        self.year = Some(year);
        self
    }

    pub fn has_name(&self) -> bool {
        !self.name.trim().is_empty()
    }

    /// `S01`, `S01-S03`, or empty.
    pub fn season_label(&self) -> String {
        match (self.begin_season, self.end_season) {
            (Some(begin), Some(end)) if end != begin => format!("S{:02}-S{:02}", begin, end),
            (Some(begin), _) => format!("S{:02}", begin),
            _ => String::new(),
        }
    }

    /// `E05`, `E01-E03`, or empty.
    pub fn episode_label(&self) -> String {
        match (self.episodes.first(), self.episodes.last()) {
            (Some(first), Some(last)) if first != last => format!("E{:02}-E{:02}", first, last),
            (Some(first), _) => format!("E{:02}", first),
            _ => String::new(),
        }
    }

    /// Season/episode descriptor the per-feed episode filters run against,
    /// e.g. `S01E01`, `S02`, `E12`.
    pub fn season_episode(&self) -> String {
        format!("{}{}", self.season_label(), self.episode_label())
    }
}

/// A resolved catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MediaRecord {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    pub media_type: MediaType,
    pub tmdb_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub poster_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub overview: Option<String>,
}

impl MediaRecord {
    /// `Title (Year)`, or just the title when the year is unknown.
    pub fn title_year(&self) -> String {
        match self.year {
            Some(year) => format!("{} ({})", self.title, year),
            None => self.title.clone(),
        }
    }
}
