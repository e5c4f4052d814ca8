//! Mock library for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::classify::{MediaRecord, RecognizedMeta};
use crate::library::{Existence, ExistenceChecker, LibraryError};

/// Mock implementation of the ExistenceChecker trait.
///
/// Media without a configured answer is reported absent with no gaps.
#[derive(Debug, Default)]
pub struct MockLibrary {
    existence: Arc<RwLock<HashMap<u32, Existence>>>,
    unavailable: Arc<RwLock<bool>>,
    checks: Arc<RwLock<Vec<u32>>>,
}

impl MockLibrary {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer checks for `tmdb_id` with `existence`.
    pub async fn set_existence(&self, tmdb_id: u32, existence: Existence) {
        self.existence.write().await.insert(tmdb_id, existence);
    }

    /// Mark `tmdb_id` as fully present.
    pub async fn set_present(&self, tmdb_id: u32) {
        self.set_existence(tmdb_id, Existence::present()).await;
    }

    /// Make every check fail.
    pub async fn set_unavailable(&self, unavailable: bool) {
        *self.unavailable.write().await = unavailable;
    }

    /// Catalog ids checked so far.
    pub async fn recorded_checks(&self) -> Vec<u32> {
        self.checks.read().await.clone()
    }
}

#[async_trait]
impl ExistenceChecker for MockLibrary {
    async fn missing(
        &self,
        _meta: &RecognizedMeta,
        media: &MediaRecord,
    ) -> Result<Existence, LibraryError> {
        self.checks.write().await.push(media.tmdb_id);

        if *self.unavailable.read().await {
            return Err(LibraryError::Unavailable("mock library offline".to_string()));
        }

        Ok(self
            .existence
            .read()
            .await
            .get(&media.tmdb_id)
            .cloned()
            .unwrap_or_default())
    }
}
