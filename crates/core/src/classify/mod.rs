//! Release classification.
//!
//! A [`Classifier`] turns a raw release title into [`RecognizedMeta`]
//! (name, year, season/episode numbers) and resolves that metadata against
//! a media catalog to a [`MediaRecord`].

mod parser;
mod tmdb;
mod types;

pub use parser::ReleaseNameParser;
pub use tmdb::{TmdbClassifier, TmdbConfig};
pub use types::{MediaRecord, MediaType, RecognizedMeta};

use async_trait::async_trait;
use thiserror::Error;

/// Errors that can occur while resolving media against a catalog.
#[derive(Debug, Error)]
pub enum ClassifyError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Rate limit exceeded, please wait before retrying")]
    RateLimited,

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    Parse(String),

    #[error("Classifier not configured: {0}")]
    NotConfigured(String),
}

/// Title parsing and catalog lookup.
#[async_trait]
pub trait Classifier: Send + Sync {
    /// Extract metadata from a release title. `subtitle` (the entry
    /// description) is consulted when the title alone yields no name.
    fn parse(&self, title: &str, subtitle: Option<&str>) -> RecognizedMeta;

    /// Resolve parsed metadata to a catalog entry.
    ///
    /// `Ok(None)` means the catalog has no match.
    async fn recognize(&self, meta: &RecognizedMeta) -> Result<Option<MediaRecord>, ClassifyError>;
}
