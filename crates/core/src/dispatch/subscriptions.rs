//! SQLite-backed subscription list.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension, Row};

use super::{DispatchError, NewSubscription, Subscription, SubscriptionService};
use crate::classify::{MediaRecord, MediaType};

/// Subscriptions stored in SQLite.
///
/// A subscription is identified by `(tmdb_id, season)`; a `NULL` season
/// means the whole entity (movies, or a series without a season).
pub struct SqliteSubscriptions {
    conn: Mutex<Connection>,
}

impl SqliteSubscriptions {
    /// Open (or create) the database at `path`.
    pub fn new(path: &Path) -> Result<Self, DispatchError> {
        let conn = Connection::open(path)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, DispatchError> {
        let conn = Connection::open_in_memory()?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), DispatchError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS subscriptions (
                id TEXT PRIMARY KEY,
                title TEXT NOT NULL,
                year INTEGER,
                media_type TEXT NOT NULL,
                tmdb_id INTEGER NOT NULL,
                season INTEGER,
                actor TEXT NOT NULL,
                created_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_subscriptions_tmdb ON subscriptions(tmdb_id, season);
            "#,
        )?;
        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, DispatchError> {
        self.conn
            .lock()
            .map_err(|_| DispatchError::Storage("connection lock poisoned".to_string()))
    }

    /// All subscriptions, newest first.
    pub fn list(&self) -> Result<Vec<Subscription>, DispatchError> {
        let conn = self.conn()?;
        let mut stmt = conn.prepare(
            "SELECT id, title, year, media_type, tmdb_id, season, actor, created_at
             FROM subscriptions ORDER BY created_at DESC",
        )?;

        let rows = stmt.query_map([], StoredSubscription::from_row)?;
        let mut subscriptions = Vec::new();
        for row in rows {
            subscriptions.push(row?.parse()?);
        }
        Ok(subscriptions)
    }

    /// Remove a subscription by id. Returns whether one was removed.
    pub fn remove(&self, id: &str) -> Result<bool, DispatchError> {
        let conn = self.conn()?;
        let removed = conn.execute("DELETE FROM subscriptions WHERE id = ?", params![id])?;
        Ok(removed > 0)
    }

    fn find(
        conn: &Connection,
        tmdb_id: u32,
        season: Option<u32>,
    ) -> Result<Option<String>, DispatchError> {
        let id = conn
            .query_row(
                "SELECT id FROM subscriptions WHERE tmdb_id = ? AND season IS ?",
                params![tmdb_id, season],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }
}

/// A subscription row with its text columns not yet parsed.
struct StoredSubscription {
    id: String,
    title: String,
    year: Option<u32>,
    media_type: String,
    tmdb_id: u32,
    season: Option<u32>,
    actor: String,
    created_at: String,
}

impl StoredSubscription {
    fn from_row(row: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            year: row.get(2)?,
            media_type: row.get(3)?,
            tmdb_id: row.get(4)?,
            season: row.get(5)?,
            actor: row.get(6)?,
            created_at: row.get(7)?,
        })
    }

    fn parse(self) -> Result<Subscription, DispatchError> {
        let media_type = MediaType::parse(&self.media_type).ok_or_else(|| DispatchError::Corrupt {
            id: self.id.clone(),
            message: format!("unknown media type '{}'", self.media_type),
        })?;
        let created_at = DateTime::parse_from_rfc3339(&self.created_at)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| DispatchError::Corrupt {
                id: self.id.clone(),
                message: format!("bad created_at '{}': {}", self.created_at, e),
            })?;

        Ok(Subscription {
            id: self.id,
            title: self.title,
            year: self.year,
            media_type,
            tmdb_id: self.tmdb_id,
            season: self.season,
            actor: self.actor,
            created_at,
        })
    }
}

#[async_trait]
impl SubscriptionService for SqliteSubscriptions {
    async fn exists(&self, media: &MediaRecord, season: Option<u32>) -> Result<bool, DispatchError> {
        let conn = self.conn()?;
        Ok(Self::find(&conn, media.tmdb_id, season)?.is_some())
    }

    async fn add(&self, subscription: NewSubscription) -> Result<(), DispatchError> {
        let conn = self.conn()?;

        if Self::find(&conn, subscription.tmdb_id, subscription.season)?.is_some() {
            return if subscription.exist_ok {
                Ok(())
            } else {
                Err(DispatchError::Storage(format!(
                    "subscription for {} already exists",
                    subscription.title
                )))
            };
        }

        conn.execute(
            "INSERT INTO subscriptions (id, title, year, media_type, tmdb_id, season, actor, created_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                uuid::Uuid::new_v4().to_string(),
                subscription.title,
                subscription.year,
                subscription.media_type.as_str(),
                subscription.tmdb_id,
                subscription.season,
                subscription.actor,
                Utc::now().to_rfc3339(),
            ],
        )?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;
    use tempfile::TempDir;

    fn new_sub(media: &MediaRecord, season: Option<u32>, exist_ok: bool) -> NewSubscription {
        NewSubscription {
            title: media.title.clone(),
            year: media.year,
            media_type: media.media_type,
            tmdb_id: media.tmdb_id,
            season,
            exist_ok,
            actor: "feedrelay".to_string(),
        }
    }

    #[tokio::test]
    async fn test_add_and_exists() {
        let store = SqliteSubscriptions::in_memory().unwrap();
        let media = fixtures::series_record();

        assert!(!store.exists(&media, Some(1)).await.unwrap());
        store.add(new_sub(&media, Some(1), true)).await.unwrap();

        assert!(store.exists(&media, Some(1)).await.unwrap());
        assert!(!store.exists(&media, Some(2)).await.unwrap());
        assert!(!store.exists(&media, None).await.unwrap());
    }

    #[tokio::test]
    async fn test_null_season_matches_null() {
        let store = SqliteSubscriptions::in_memory().unwrap();
        let media = fixtures::movie_record();

        store.add(new_sub(&media, None, true)).await.unwrap();
        assert!(store.exists(&media, None).await.unwrap());
    }

    #[tokio::test]
    async fn test_add_existing() {
        let store = SqliteSubscriptions::in_memory().unwrap();
        let media = fixtures::series_record();

        store.add(new_sub(&media, Some(1), true)).await.unwrap();
        store.add(new_sub(&media, Some(1), true)).await.unwrap();
        assert_eq!(store.list().unwrap().len(), 1);

        let result = store.add(new_sub(&media, Some(1), false)).await;
        assert!(matches!(result, Err(DispatchError::Storage(_))));
    }

    #[tokio::test]
    async fn test_list_and_remove() {
        let store = SqliteSubscriptions::in_memory().unwrap();
        let media = fixtures::series_record();
        store.add(new_sub(&media, Some(3), true)).await.unwrap();

        let list = store.list().unwrap();
        assert_eq!(list.len(), 1);
        assert_eq!(list[0].season, Some(3));
        assert_eq!(list[0].media_type, MediaType::Tv);
        assert_eq!(list[0].actor, "feedrelay");

        assert!(store.remove(&list[0].id).unwrap());
        assert!(!store.remove(&list[0].id).unwrap());
        assert!(store.list().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_persists_across_reopen() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("subs.db");
        let media = fixtures::movie_record();

        {
            let store = SqliteSubscriptions::new(&path).unwrap();
            store.add(new_sub(&media, None, true)).await.unwrap();
        }

        let store = SqliteSubscriptions::new(&path).unwrap();
        assert!(store.exists(&media, None).await.unwrap());
    }

    #[tokio::test]
    async fn test_corrupt_rows_are_reported() {
        let store = SqliteSubscriptions::in_memory().unwrap();
        store
            .add(new_sub(&fixtures::series_record(), Some(1), true))
            .await
            .unwrap();

        store
            .conn()
            .unwrap()
            .execute("UPDATE subscriptions SET media_type = 'podcast'", [])
            .unwrap();
        let result = store.list();
        assert!(
            matches!(&result, Err(DispatchError::Corrupt { message, .. }) if message.contains("podcast"))
        );

        store
            .conn()
            .unwrap()
            .execute(
                "UPDATE subscriptions SET media_type = 'tv', created_at = 'yesterday'",
                [],
            )
            .unwrap();
        let result = store.list();
        assert!(
            matches!(&result, Err(DispatchError::Corrupt { message, .. }) if message.contains("created_at"))
        );
    }
}
