//! Feed fetching.
//!
//! A `FeedSource` turns a feed URL into the raw entries of one fetch. The
//! poller treats an error and an empty result the same way: the rest of that
//! URL is abandoned and the cycle moves on to the next one.

mod http;
mod types;

pub use http::HttpFeedSource;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while fetching or parsing a feed.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Feed server returned HTTP {0}")]
    Status(u16),

    #[error("Feed body exceeds {0} bytes")]
    TooLarge(usize),

    #[error("Failed to parse feed: {0}")]
    Parse(String),

    #[error("Invalid proxy configuration: {0}")]
    Proxy(String),
}

/// Source of feed entries.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Fetch and parse `url`, optionally through the configured proxy.
    async fn fetch(&self, url: &str, use_proxy: bool) -> Result<Vec<FeedEntry>, FeedError>;
}
