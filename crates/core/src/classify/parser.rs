//! Release-name parsing.
//!
//! Handles the common scene and fansub conventions:
//! - `Show.Name.S01E02`, `S01E01-E03`, `S01E01E02`
//! - season packs `S01`, `S01-S03`, `Season 2`
//! - `1x02`
//! - bare episodes `EP05`, `E05`, and absolute numbering `Show - 05`
//! - a release year anywhere after the name
//!
//! Leading group tags (`[Group]`, `【Group】`) are dropped, dots and
//! underscores are treated as spaces, and the name is whatever precedes the
//! first season/episode, year or quality token.

use once_cell::sync::Lazy;
use regex_lite::{Captures, Regex};

use super::{MediaType, RecognizedMeta};

static SEASON_EPISODE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)\bS(\d{1,3})\s*E(\d{1,4})(?:(?:\s*-\s*E?|E)(\d{1,4}))?\b").unwrap()
});

static CROSS_EPISODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(\d{1,2})x(\d{1,3})\b").unwrap());

static SEASON_RANGE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bS(\d{1,3})(?:\s*-\s*S?(\d{1,3}))?\b").unwrap());

static SEASON_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\bSeason\s*(\d{1,2})\b").unwrap());

static EPISODE_WORD: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\b(?:Episode\s*|EP?)(\d{1,4})(?:\s*-\s*(?:EP?)?(\d{1,4}))?\b").unwrap());

static ABSOLUTE_EPISODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\s-\s(\d{1,4})(?:v\d)?\b").unwrap());

static YEAR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b((?:19|20)\d{2})\b").unwrap());

static QUALITY: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?i)\b(?:2160p|1080[pi]|720p|576p|480p|4k|uhd|web-?dl|web-?rip|blu-?ray|bdrip|brrip|hdtv|dvdrip|remux|x26[45]|h 26[45]|hevc|avc|10bit|hdr)\b",
    )
    .unwrap()
});

/// Upper bound on how many episodes a single range may expand to.
const MAX_EPISODE_SPAN: u32 = 2000;

/// Regex-based release-name parser.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReleaseNameParser;

impl ReleaseNameParser {
    pub fn new() -> Self {
        Self
    }

    /// Parse a release title, falling back to `subtitle` for the name when
    /// the title has none.
    pub fn parse(&self, title: &str, subtitle: Option<&str>) -> RecognizedMeta {
        let mut meta = parse_one(title);

        if !meta.has_name() {
            if let Some(sub) = subtitle.filter(|s| !s.trim().is_empty()) {
                let fallback = parse_one(sub);
                meta.name = fallback.name;
                if meta.year.is_none() {
                    meta.year = fallback.year;
                }
                if meta.begin_season.is_none() {
                    meta.begin_season = fallback.begin_season;
                    meta.end_season = fallback.end_season;
                }
                if meta.episodes.is_empty() {
                    meta.episodes = fallback.episodes;
                }
            }
        }

        meta.media_type_hint = if meta.begin_season.is_some() || !meta.episodes.is_empty() {
            Some(MediaType::Tv)
        } else if meta.year.is_some() {
            Some(MediaType::Movie)
        } else {
            None
        };

        meta
    }
}

fn parse_one(raw: &str) -> RecognizedMeta {
    let text = normalize(raw);
    let mut meta = RecognizedMeta::default();
    let mut cut = text.len();

    if let Some(caps) = SEASON_EPISODE.captures(&text) {
        meta.begin_season = number(&caps, 1);
        meta.episodes = episode_range(number(&caps, 2), number(&caps, 3));
        cut = cut.min(start(&caps));
    } else if let Some(caps) = CROSS_EPISODE.captures(&text) {
        meta.begin_season = number(&caps, 1);
        meta.episodes = episode_range(number(&caps, 2), None);
        cut = cut.min(start(&caps));
    } else {
        if let Some(caps) = SEASON_RANGE.captures(&text) {
            meta.begin_season = number(&caps, 1);
            meta.end_season = number(&caps, 2).filter(|end| Some(*end) > meta.begin_season);
            cut = cut.min(start(&caps));
        } else if let Some(caps) = SEASON_WORD.captures(&text) {
            meta.begin_season = number(&caps, 1);
            cut = cut.min(start(&caps));
        }

        if let Some(caps) = EPISODE_WORD.captures(&text) {
            meta.episodes = episode_range(number(&caps, 1), number(&caps, 2));
            cut = cut.min(start(&caps));
        } else if meta.begin_season.is_none() {
            if let Some(caps) = ABSOLUTE_EPISODE.captures(&text) {
                meta.episodes = episode_range(number(&caps, 1), None);
                cut = cut.min(start(&caps));
            }
        }
    }

    // A year at the very start is part of the name ("2012", "1917").
    if let Some(m) = YEAR.find_iter(&text).find(|m| m.start() > 0) {
        meta.year = m.as_str().parse().ok();
        cut = cut.min(m.start());
    }

    if let Some(m) = QUALITY.find(&text) {
        cut = cut.min(m.start());
    }

    meta.name = clean_name(&text[..cut]);
    meta
}

/// Drop leading group tags and turn separators into spaces.
fn normalize(raw: &str) -> String {
    let mut s = raw.trim();
    loop {
        let stripped = s
            .strip_prefix('[')
            .and_then(|rest| rest.find(']').map(|end| &rest[end + 1..]))
            .or_else(|| {
                s.strip_prefix('【')
                    .and_then(|rest| rest.find('】').map(|end| &rest[end + '】'.len_utf8()..]))
            });
        match stripped {
            Some(rest) if !rest.trim().is_empty() => s = rest.trim_start(),
            _ => break,
        }
    }
    s.replace(|c: char| c == '.' || c == '_', " ")
}

fn clean_name(raw: &str) -> String {
    let trimmed = raw.trim_end_matches(|c: char| c.is_whitespace() || matches!(c, '-' | '(' | '[' | '+'));
    trimmed.split_whitespace().collect::<Vec<_>>().join(" ")
}

fn number(caps: &Captures<'_>, group: usize) -> Option<u32> {
    caps.get(group).and_then(|m| m.as_str().parse().ok())
}

fn start(caps: &Captures<'_>) -> usize {
    caps.get(0).map(|m| m.start()).unwrap_or(0)
}

fn episode_range(first: Option<u32>, last: Option<u32>) -> Vec<u32> {
    match (first, last) {
        (Some(first), Some(last)) if last > first && last - first <= MAX_EPISODE_SPAN => {
            (first..=last).collect()
        }
        (Some(first), _) => vec![first],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(title: &str) -> RecognizedMeta {
        ReleaseNameParser::new().parse(title, None)
    }

    #[test]
    fn test_scene_episode() {
        let meta = parse("Show.Name.S01E01.1080p");
        assert_eq!(meta.name, "Show Name");
        assert_eq!(meta.begin_season, Some(1));
        assert_eq!(meta.episodes, vec![1]);
        assert_eq!(meta.season_episode(), "S01E01");
        assert_eq!(meta.media_type_hint, Some(MediaType::Tv));
    }

    #[test]
    fn test_episode_range() {
        let meta = parse("Show Name S02E01-E03 720p WEB-DL");
        assert_eq!(meta.name, "Show Name");
        assert_eq!(meta.begin_season, Some(2));
        assert_eq!(meta.episodes, vec![1, 2, 3]);
        assert_eq!(meta.season_episode(), "S02E01-E03");
    }

    #[test]
    fn test_season_pack_range() {
        let meta = parse("Show.Name.S01-S03.1080p.BluRay");
        assert_eq!(meta.name, "Show Name");
        assert_eq!(meta.begin_season, Some(1));
        assert_eq!(meta.end_season, Some(3));
        assert!(meta.episodes.is_empty());
        assert_eq!(meta.season_episode(), "S01-S03");
    }

    #[test]
    fn test_season_word() {
        let meta = parse("Show Name Season 2 Complete");
        assert_eq!(meta.name, "Show Name");
        assert_eq!(meta.begin_season, Some(2));
        assert_eq!(meta.season_episode(), "S02");
    }

    #[test]
    fn test_cross_notation() {
        let meta = parse("Show Name 2x05 HDTV");
        assert_eq!(meta.name, "Show Name");
        assert_eq!(meta.begin_season, Some(2));
        assert_eq!(meta.episodes, vec![5]);
    }

    #[test]
    fn test_fansub_absolute_episode() {
        let meta = parse("[SubsPlease] Frieren - 05 (1080p) [ABCD1234].mkv");
        assert_eq!(meta.name, "Frieren");
        assert_eq!(meta.begin_season, None);
        assert_eq!(meta.episodes, vec![5]);
        assert_eq!(meta.season_episode(), "E05");
    }

    #[test]
    fn test_bare_episode_marker() {
        let meta = parse("Show Name EP12 1080p");
        assert_eq!(meta.name, "Show Name");
        assert_eq!(meta.episodes, vec![12]);
    }

    #[test]
    fn test_movie_with_year() {
        let meta = parse("Movie.Title.2023.2160p.WEB-DL.x265");
        assert_eq!(meta.name, "Movie Title");
        assert_eq!(meta.year, Some(2023));
        assert_eq!(meta.media_type_hint, Some(MediaType::Movie));
        assert_eq!(meta.season_episode(), "");
    }

    #[test]
    fn test_year_in_parentheses() {
        let meta = parse("Show Name (2019) S01E04");
        assert_eq!(meta.name, "Show Name");
        assert_eq!(meta.year, Some(2019));
        assert_eq!(meta.episodes, vec![4]);
    }

    #[test]
    fn test_leading_year_is_name() {
        let meta = parse("1917 2019 1080p");
        assert_eq!(meta.name, "1917");
        assert_eq!(meta.year, Some(2019));
    }

    #[test]
    fn test_subtitle_fallback() {
        let meta = ReleaseNameParser::new().parse("1080p WEB-DL", Some("Great Show S03E02"));
        assert_eq!(meta.name, "Great Show");
        assert_eq!(meta.begin_season, Some(3));
        assert_eq!(meta.episodes, vec![2]);
    }

    #[test]
    fn test_unparseable_title() {
        let meta = parse("1080p");
        assert!(!meta.has_name());
        assert_eq!(meta.media_type_hint, None);
    }
}
