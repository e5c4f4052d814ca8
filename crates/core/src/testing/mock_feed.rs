//! Mock feed source for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::feed::{FeedEntry, FeedError, FeedSource};

/// A recorded fetch for test assertions.
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedFetch {
    pub url: String,
    pub use_proxy: bool,
}

/// Mock implementation of the FeedSource trait.
///
/// URLs without configured entries return an empty list.
#[derive(Debug, Default)]
pub struct MockFeedSource {
    entries: Arc<RwLock<HashMap<String, Vec<FeedEntry>>>>,
    errors: Arc<RwLock<HashMap<String, String>>>,
    fetches: Arc<RwLock<Vec<RecordedFetch>>>,
}

impl MockFeedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the entries returned for `url`.
    pub async fn set_entries(&self, url: &str, entries: Vec<FeedEntry>) {
        self.entries.write().await.insert(url.to_string(), entries);
    }

    /// Make every fetch of `url` fail with a parse error carrying `message`.
    pub async fn set_error(&self, url: &str, message: &str) {
        self.errors
            .write()
            .await
            .insert(url.to_string(), message.to_string());
    }

    pub async fn clear_error(&self, url: &str) {
        self.errors.write().await.remove(url);
    }

    pub async fn recorded_fetches(&self) -> Vec<RecordedFetch> {
        self.fetches.read().await.clone()
    }
}

#[async_trait]
impl FeedSource for MockFeedSource {
    async fn fetch(&self, url: &str, use_proxy: bool) -> Result<Vec<FeedEntry>, FeedError> {
        self.fetches.write().await.push(RecordedFetch {
            url: url.to_string(),
            use_proxy,
        });

        if let Some(message) = self.errors.read().await.get(url) {
            return Err(FeedError::Parse(message.clone()));
        }

        Ok(self
            .entries
            .read()
            .await
            .get(url)
            .cloned()
            .unwrap_or_default())
    }
}
