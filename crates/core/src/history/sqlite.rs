//! SQLite-backed history store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};
use tracing::debug;

use super::{HistoryError, HistoryRecord, HistoryStore};
use crate::classify::MediaType;

/// History kept in a single SQLite table keyed by the dedup key.
pub struct SqliteHistoryStore {
    conn: Mutex<Connection>,
}

impl SqliteHistoryStore {
    /// Open (or create) the database at `path`.
    pub fn new(path: &Path) -> Result<Self, HistoryError> {
        let conn = Connection::open(path)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, HistoryError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), HistoryError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS history (
                key TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                media_type TEXT NOT NULL,
                year INTEGER,
                poster TEXT,
                overview TEXT,
                tmdb_id INTEGER NOT NULL,
                processed_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_history_title ON history(title);

            CREATE TABLE IF NOT EXISTS one_shots (
                name TEXT PRIMARY KEY,
                consumed_at TEXT NOT NULL
            );
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, HistoryError> {
        self.conn
            .lock()
            .map_err(|_| HistoryError::Database("connection lock poisoned".to_string()))
    }
}

fn row_to_record(row: &Row<'_>) -> rusqlite::Result<(HistoryRecord, String, String)> {
    let media_type: String = row.get(2)?;
    let processed_at: String = row.get(7)?;

    let record = HistoryRecord {
        key: row.get(0)?,
        title: row.get(1)?,
        media_type: MediaType::Movie,
        year: row.get(3)?,
        poster: row.get(4)?,
        overview: row.get(5)?,
        tmdb_id: row.get(6)?,
        processed_at: Utc::now(),
    };
    Ok((record, media_type, processed_at))
}

#[async_trait]
impl HistoryStore for SqliteHistoryStore {
    async fn load(&self) -> Result<Vec<HistoryRecord>, HistoryError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT key, title, media_type, year, poster, overview, tmdb_id, processed_at
             FROM history ORDER BY processed_at ASC, rowid ASC",
        )?;

        let rows = stmt.query_map([], row_to_record)?;

        let mut records = Vec::new();
        for row in rows {
            let (mut record, media_type, processed_at) = row?;
            record.media_type =
                MediaType::parse(&media_type).ok_or_else(|| HistoryError::Corrupt {
                    key: record.key.clone(),
                    message: format!("unknown media type '{}'", media_type),
                })?;
            record.processed_at = DateTime::parse_from_rfc3339(&processed_at)
                .map(|dt| dt.with_timezone(&Utc))
                .map_err(|e| HistoryError::Corrupt {
                    key: record.key.clone(),
                    message: e.to_string(),
                })?;
            records.push(record);
        }

        Ok(records)
    }

    async fn save(&self, records: &[HistoryRecord]) -> Result<(), HistoryError> {
        let mut conn = self.conn()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM history", [])?;
        {
            let mut stmt = tx.prepare(
                "INSERT OR REPLACE INTO history
                 (key, title, media_type, year, poster, overview, tmdb_id, processed_at)
                 VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            )?;
            for record in records {
                stmt.execute(params![
                    record.key,
                    record.title,
                    record.media_type.as_str(),
                    record.year,
                    record.poster,
                    record.overview,
                    record.tmdb_id,
                    record.processed_at.to_rfc3339(),
                ])?;
            }
        }
        tx.commit()?;

        debug!("Saved {} history records", records.len());
        Ok(())
    }

    async fn delete_by_key(&self, key: &str) -> Result<bool, HistoryError> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM history WHERE title = ?", params![key])?;
        debug!("Deleted {} history records titled '{}'", removed, key);
        Ok(removed > 0)
    }

    async fn one_shot_consumed(&self, name: &str) -> Result<bool, HistoryError> {
        let conn = self.conn()?;
        let consumed = conn
            .query_row(
                "SELECT 1 FROM one_shots WHERE name = ?",
                params![name],
                |_| Ok(()),
            )
            .optional()?
            .is_some();
        Ok(consumed)
    }

    async fn set_one_shot_consumed(&self, name: &str, consumed: bool) -> Result<(), HistoryError> {
        let conn = self.conn()?;
        if consumed {
            conn.execute(
                "INSERT OR REPLACE INTO one_shots (name, consumed_at) VALUES (?, ?)",
                params![name, Utc::now().to_rfc3339()],
            )?;
        } else {
            conn.execute("DELETE FROM one_shots WHERE name = ?", params![name])?;
        }
        debug!("One-shot '{}' consumed: {}", name, consumed);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use tempfile::TempDir;

    fn record(key: &str, title: &str, minutes_ago: i64) -> HistoryRecord {
        HistoryRecord {
            title: title.to_string(),
            key: key.to_string(),
            media_type: MediaType::Tv,
            year: Some(2020),
            poster: Some("https://image.example/p.jpg".to_string()),
            overview: None,
            tmdb_id: 42,
            processed_at: Utc::now() - Duration::minutes(minutes_ago),
        }
    }

    #[tokio::test]
    async fn test_empty_store_loads_nothing() {
        let store = SqliteHistoryStore::in_memory().unwrap();
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_save_replaces_collection() {
        let store = SqliteHistoryStore::in_memory().unwrap();

        store
            .save(&[record("a", "Show S01", 2), record("b", "Show S02", 1)])
            .await
            .unwrap();
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].key, "a");
        assert_eq!(loaded[1].key, "b");
        assert_eq!(loaded[0].media_type, MediaType::Tv);
        assert_eq!(loaded[0].year, Some(2020));

        store.save(&[record("c", "Other", 0)]).await.unwrap();
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].key, "c");
    }

    #[tokio::test]
    async fn test_save_empty_clears() {
        let store = SqliteHistoryStore::in_memory().unwrap();
        store.save(&[record("a", "Show S01", 0)]).await.unwrap();
        store.save(&[]).await.unwrap();
        assert!(store.load().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_by_display_title() {
        let store = SqliteHistoryStore::in_memory().unwrap();
        store
            .save(&[
                record("Show.S01E01", "Show S01", 3),
                record("Show.S01E02", "Show S01", 2),
                record("Show.S02E01", "Show S02", 1),
            ])
            .await
            .unwrap();

        assert!(store.delete_by_key("Show S01").await.unwrap());

        let remaining = store.load().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].title, "Show S02");
    }

    #[tokio::test]
    async fn test_delete_unknown_key() {
        let store = SqliteHistoryStore::in_memory().unwrap();
        store.save(&[record("a", "Show S01", 0)]).await.unwrap();

        assert!(!store.delete_by_key("Nope").await.unwrap());
        assert_eq!(store.load().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_list_matches_load() {
        let store = SqliteHistoryStore::in_memory().unwrap();
        store.save(&[record("a", "Show S01", 0)]).await.unwrap();
        assert_eq!(store.list().await.unwrap(), store.load().await.unwrap());
    }

    #[tokio::test]
    async fn test_one_shot_marker_survives_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.db");

        {
            let store = SqliteHistoryStore::new(&path).unwrap();
            assert!(!store.one_shot_consumed("clear_history").await.unwrap());
            store.set_one_shot_consumed("clear_history", true).await.unwrap();
        }

        let store = SqliteHistoryStore::new(&path).unwrap();
        assert!(store.one_shot_consumed("clear_history").await.unwrap());
        assert!(!store.one_shot_consumed("run_once").await.unwrap());

        store.set_one_shot_consumed("clear_history", false).await.unwrap();
        assert!(!store.one_shot_consumed("clear_history").await.unwrap());
    }

    #[tokio::test]
    async fn test_save_keeps_one_shot_markers() {
        let store = SqliteHistoryStore::in_memory().unwrap();
        store.set_one_shot_consumed("clear_history", true).await.unwrap();
        store.save(&[]).await.unwrap();
        assert!(store.one_shot_consumed("clear_history").await.unwrap());
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("history.db");

        {
            let store = SqliteHistoryStore::new(&path).unwrap();
            store.save(&[record("a", "Show S01", 0)]).await.unwrap();
        }

        let store = SqliteHistoryStore::new(&path).unwrap();
        let loaded = store.load().await.unwrap();
        assert_eq!(loaded.len(), 1);
        assert_eq!(loaded[0].poster.as_deref(), Some("https://image.example/p.jpg"));
    }
}
