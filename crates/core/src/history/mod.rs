//! Processed-entry history.
//!
//! The history is the dedup memory of the poller: a feed entry whose raw
//! title is already a key in the history is never processed again.

mod sqlite;
mod types;

pub use sqlite::SqliteHistoryStore;
pub use types::HistoryRecord;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur in history operations.
#[derive(Debug, Error)]
pub enum HistoryError {
    #[error("Database error: {0}")]
    Database(String),

    #[error("Corrupt history record {key}: {message}")]
    Corrupt { key: String, message: String },
}

impl From<rusqlite::Error> for HistoryError {
    fn from(e: rusqlite::Error) -> Self {
        HistoryError::Database(e.to_string())
    }
}

/// Persistent history storage.
#[async_trait]
pub trait HistoryStore: Send + Sync {
    /// Load every stored record, oldest first.
    async fn load(&self) -> Result<Vec<HistoryRecord>, HistoryError>;

    /// Replace the stored collection with `records`.
    async fn save(&self, records: &[HistoryRecord]) -> Result<(), HistoryError>;

    /// Remove every record whose display title equals `key`.
    ///
    /// Returns `Ok(false)` without writing anything when no record matched.
    async fn delete_by_key(&self, key: &str) -> Result<bool, HistoryError>;

    /// Records for display.
    async fn list(&self) -> Result<Vec<HistoryRecord>, HistoryError> {
        self.load().await
    }

    /// Whether the one-shot switch `name` was already consumed, possibly by
    /// an earlier process.
    async fn one_shot_consumed(&self, name: &str) -> Result<bool, HistoryError>;

    /// Mark the one-shot switch `name` consumed, or re-arm it with
    /// `consumed = false`.
    async fn set_one_shot_consumed(&self, name: &str, consumed: bool)
        -> Result<(), HistoryError>;
}
