//! Dispatching recognized releases to a download client or a subscription list.

mod dispatcher;
mod qbittorrent;
mod subscriptions;
mod types;

pub use dispatcher::ActionDispatcher;
pub use qbittorrent::QBittorrentDownloader;
pub use subscriptions::SqliteSubscriptions;
pub use types::{
    Action, Candidate, DispatchOutcome, DownloadRequest, NewSubscription, Subscription,
    TorrentDescriptor,
};

use async_trait::async_trait;
use thiserror::Error;

use crate::classify::MediaRecord;

/// Tag attached to every download and subscription this service creates.
pub const ACTOR: &str = "feedrelay";

/// Errors raised while dispatching.
#[derive(Debug, Error)]
pub enum DispatchError {
    #[error("No download client configured")]
    NotConfigured,

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Operation timed out")]
    Timeout,

    #[error("API error: {0}")]
    Api(String),

    #[error("Subscription storage error: {0}")]
    Storage(String),

    #[error("Corrupt subscription {id}: {message}")]
    Corrupt { id: String, message: String },
}

impl From<rusqlite::Error> for DispatchError {
    fn from(e: rusqlite::Error) -> Self {
        DispatchError::Storage(e.to_string())
    }
}

/// Download client.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Start downloading the torrent. `Ok(false)` means the client refused it.
    async fn download(&self, request: DownloadRequest) -> Result<bool, DispatchError>;
}

/// Subscription list.
#[async_trait]
pub trait SubscriptionService: Send + Sync {
    /// Whether a subscription for `media` (and `season`, for series) exists.
    async fn exists(&self, media: &MediaRecord, season: Option<u32>) -> Result<bool, DispatchError>;

    /// Add a subscription.
    async fn add(&self, subscription: NewSubscription) -> Result<(), DispatchError>;
}
