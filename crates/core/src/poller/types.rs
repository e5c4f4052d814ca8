use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::dispatch::Action;
use crate::history::{HistoryError, HistoryRecord};

/// Errors that abort a whole poll cycle.
#[derive(Debug, Error)]
pub enum PollerError {
    #[error("History error: {0}")]
    History(#[from] HistoryError),
}

/// Why an entry was not dispatched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    EmptyTitle,
    AlreadyProcessed,
    IncludeMismatch,
    ExcludeMatch,
    Unrecognized,
    EpisodeRangeMismatch,
    NoMediaMatch,
    RuleFilterRejected,
    AlreadyInLibrary,
    AlreadySubscribed,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::EmptyTitle => "empty_title",
            SkipReason::AlreadyProcessed => "already_processed",
            SkipReason::IncludeMismatch => "include_mismatch",
            SkipReason::ExcludeMatch => "exclude_match",
            SkipReason::Unrecognized => "unrecognized",
            SkipReason::EpisodeRangeMismatch => "episode_range_mismatch",
            SkipReason::NoMediaMatch => "no_media_match",
            SkipReason::RuleFilterRejected => "rule_filter_rejected",
            SkipReason::AlreadyInLibrary => "already_in_library",
            SkipReason::AlreadySubscribed => "already_subscribed",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of running one entry through the pipeline.
#[derive(Debug, Clone, PartialEq)]
pub enum EntryOutcome {
    Dispatched { action: Action, record: HistoryRecord },
    Skipped(SkipReason),
    Failed(String),
}

impl EntryOutcome {
    /// Metrics label.
    pub fn label(&self) -> &'static str {
        match self {
            EntryOutcome::Dispatched { .. } => "dispatched",
            EntryOutcome::Skipped(_) => "skipped",
            EntryOutcome::Failed(_) => "failed",
        }
    }
}

/// Per-URL counters of one cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct FeedReport {
    pub url: String,
    pub fetched: usize,
    pub dispatched: usize,
    pub skipped: usize,
    pub failed: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fetch_error: Option<String>,
}

impl FeedReport {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    pub fn record(&mut self, outcome: &EntryOutcome) {
        match outcome {
            EntryOutcome::Dispatched { .. } => self.dispatched += 1,
            EntryOutcome::Skipped(_) => self.skipped += 1,
            EntryOutcome::Failed(_) => self.failed += 1,
        }
    }
}

/// Summary of one poll cycle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleReport {
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
    pub feeds: Vec<FeedReport>,
    /// Records persisted at the end of the cycle.
    pub history_size: usize,
    /// Whether the history was wiped before this cycle's records were added.
    #[serde(default)]
    pub history_cleared: bool,
}

impl Default for CycleReport {
    fn default() -> Self {
        let now = Utc::now();
        Self {
            started_at: now,
            finished_at: now,
            feeds: Vec::new(),
            history_size: 0,
            history_cleared: false,
        }
    }
}

impl CycleReport {
    pub fn total_fetched(&self) -> usize {
        self.feeds.iter().map(|f| f.fetched).sum()
    }

    pub fn total_dispatched(&self) -> usize {
        self.feeds.iter().map(|f| f.dispatched).sum()
    }

    pub fn total_skipped(&self) -> usize {
        self.feeds.iter().map(|f| f.skipped).sum()
    }

    pub fn total_failed(&self) -> usize {
        self.feeds.iter().map(|f| f.failed).sum()
    }

    pub fn duration_secs(&self) -> f64 {
        (self.finished_at - self.started_at)
            .to_std()
            .map(|d| d.as_secs_f64())
            .unwrap_or(0.0)
    }
}
