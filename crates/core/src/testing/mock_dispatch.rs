//! Mock download client and subscription list for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::classify::MediaRecord;
use crate::dispatch::{DispatchError, DownloadRequest, Downloader, NewSubscription, SubscriptionService};

/// Mock implementation of the Downloader trait.
///
/// Accepts every request until told otherwise.
#[derive(Debug)]
pub struct MockDownloader {
    accept: Arc<RwLock<bool>>,
    next_error: Arc<RwLock<Option<DispatchError>>>,
    downloads: Arc<RwLock<Vec<DownloadRequest>>>,
}

impl Default for MockDownloader {
    fn default() -> Self {
        Self {
            accept: Arc::new(RwLock::new(true)),
            next_error: Arc::new(RwLock::new(None)),
            downloads: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl MockDownloader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the client accepts subsequent requests.
    pub async fn set_accept(&self, accept: bool) {
        *self.accept.write().await = accept;
    }

    /// Make the next request fail.
    pub async fn set_next_error(&self, error: DispatchError) {
        *self.next_error.write().await = Some(error);
    }

    /// Requests that were accepted.
    pub async fn recorded_downloads(&self) -> Vec<DownloadRequest> {
        self.downloads.read().await.clone()
    }
}

#[async_trait]
impl Downloader for MockDownloader {
    async fn download(&self, request: DownloadRequest) -> Result<bool, DispatchError> {
        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }
        if !*self.accept.read().await {
            return Ok(false);
        }
        self.downloads.write().await.push(request);
        Ok(true)
    }
}

/// Mock implementation of the SubscriptionService trait.
///
/// `exists` only answers from [`MockSubscriptions::set_existing`]; recorded
/// adds do not count as existing subscriptions.
#[derive(Debug, Default)]
pub struct MockSubscriptions {
    existing: Arc<RwLock<HashSet<(u32, Option<u32>)>>>,
    add_error: Arc<RwLock<Option<DispatchError>>>,
    adds: Arc<RwLock<Vec<NewSubscription>>>,
}

impl MockSubscriptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Report a subscription for `tmdb_id` and `season` as existing.
    pub async fn set_existing(&self, tmdb_id: u32, season: Option<u32>) {
        self.existing.write().await.insert((tmdb_id, season));
    }

    /// Make the next `add` fail.
    pub async fn set_add_error(&self, error: DispatchError) {
        *self.add_error.write().await = Some(error);
    }

    /// Subscriptions that were added.
    pub async fn recorded_adds(&self) -> Vec<NewSubscription> {
        self.adds.read().await.clone()
    }
}

#[async_trait]
impl SubscriptionService for MockSubscriptions {
    async fn exists(&self, media: &MediaRecord, season: Option<u32>) -> Result<bool, DispatchError> {
        Ok(self
            .existing
            .read()
            .await
            .contains(&(media.tmdb_id, season)))
    }

    async fn add(&self, subscription: NewSubscription) -> Result<(), DispatchError> {
        if let Some(error) = self.add_error.write().await.take() {
            return Err(error);
        }
        self.adds.write().await.push(subscription);
        Ok(())
    }
}
