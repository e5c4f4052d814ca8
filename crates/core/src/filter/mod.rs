//! Include/exclude pattern filtering.
//!
//! Two layers of filters apply to every feed entry:
//! - text filters, configured globally, matched against `"{title} {description}"`
//! - episode filters, taken from a feed URL's `include`/`exclude` query
//!   parameters, matched against the recognized season/episode descriptor
//!
//! All patterns are case-insensitive regular expressions searched anywhere in
//! the text. An empty pattern is inactive: it neither requires nor rejects.

mod rules;

pub use rules::{RuleSetFilter, TorrentRuleFilter, TorrentRulesConfig};

use regex_lite::{Regex, RegexBuilder};
use reqwest::Url;
use thiserror::Error;
use tracing::warn;

/// Errors building filters.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("invalid pattern '{pattern}': {message}")]
    InvalidPattern { pattern: String, message: String },
}

/// A compiled, case-insensitive pattern. Inactive when built from an empty string.
#[derive(Debug, Clone, Default)]
pub struct Pattern {
    regex: Option<Regex>,
}

impl Pattern {
    pub fn new(pattern: &str) -> Result<Self, FilterError> {
        if pattern.is_empty() {
            return Ok(Self::none());
        }

        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| FilterError::InvalidPattern {
                pattern: pattern.to_string(),
                message: e.to_string(),
            })?;

        Ok(Self { regex: Some(regex) })
    }

    /// The inactive pattern.
    pub fn none() -> Self {
        Self { regex: None }
    }

    pub fn is_active(&self) -> bool {
        self.regex.is_some()
    }

    pub fn as_str(&self) -> &str {
        self.regex.as_ref().map(|r| r.as_str()).unwrap_or("")
    }

    /// True when the pattern is inactive or found in `text`.
    pub fn includes(&self, text: &str) -> bool {
        self.regex.as_ref().map_or(true, |r| r.is_match(text))
    }

    /// True when the pattern is active and found in `text`.
    pub fn excludes(&self, text: &str) -> bool {
        self.regex.as_ref().is_some_and(|r| r.is_match(text))
    }
}

/// Result of checking text against an include/exclude pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilterVerdict {
    Pass,
    IncludeMismatch,
    ExcludeMatch,
}

fn verdict(include: &Pattern, exclude: &Pattern, text: &str) -> FilterVerdict {
    if !include.includes(text) {
        FilterVerdict::IncludeMismatch
    } else if exclude.excludes(text) {
        FilterVerdict::ExcludeMatch
    } else {
        FilterVerdict::Pass
    }
}

/// Effective filters for one feed URL.
#[derive(Debug, Clone, Default)]
pub struct FeedFilters {
    pub text_include: Pattern,
    pub text_exclude: Pattern,
    pub episode_include: Pattern,
    pub episode_exclude: Pattern,
}

impl FeedFilters {
    /// Combine the global text filters with the URL's own episode filters.
    ///
    /// A per-URL pattern that fails to compile is logged and left inactive.
    pub fn for_url(url: &str, text_include: &Pattern, text_exclude: &Pattern) -> Self {
        let (episode_include, episode_exclude) = match Self::parse_overrides(url) {
            Ok(overrides) => overrides,
            Err(e) => {
                warn!("Ignoring episode filter on {}: {}", url, e);
                let (include, exclude) = query_overrides(url);
                (
                    Pattern::new(&include).unwrap_or_default(),
                    Pattern::new(&exclude).unwrap_or_default(),
                )
            }
        };

        Self {
            text_include: text_include.clone(),
            text_exclude: text_exclude.clone(),
            episode_include,
            episode_exclude,
        }
    }

    /// Compile the `include`/`exclude` query parameters of a feed URL.
    pub fn parse_overrides(url: &str) -> Result<(Pattern, Pattern), FilterError> {
        let (include, exclude) = query_overrides(url);
        Ok((Pattern::new(&include)?, Pattern::new(&exclude)?))
    }

    /// Check `"{title} {description}"` against the global filters.
    pub fn check_text(&self, text: &str) -> FilterVerdict {
        verdict(&self.text_include, &self.text_exclude, text)
    }

    /// Check a season/episode descriptor against the URL's filters.
    pub fn check_episode(&self, season_episode: &str) -> FilterVerdict {
        verdict(&self.episode_include, &self.episode_exclude, season_episode)
    }
}

/// First values of the `include` and `exclude` query parameters.
fn query_overrides(url: &str) -> (String, String) {
    let Ok(parsed) = Url::parse(url) else {
        return (String::new(), String::new());
    };

    let first = |key: &str| {
        parsed
            .query_pairs()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.into_owned())
            .unwrap_or_default()
    };

    (first("include"), first("exclude"))
}
