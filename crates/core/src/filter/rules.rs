//! Torrent rule sets applied after recognition.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::{FilterError, Pattern};
use crate::classify::{MediaRecord, MediaType};
use crate::dispatch::TorrentDescriptor;

const BYTES_PER_MB: u64 = 1024 * 1024;

/// Secondary filter consulted when `torrent_filter` is enabled.
#[async_trait]
pub trait TorrentRuleFilter: Send + Sync {
    /// Whether the torrent survives the configured rules.
    async fn accepts(&self, torrent: &TorrentDescriptor, media: &MediaRecord) -> bool;
}

/// Configuration for [`RuleSetFilter`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TorrentRulesConfig {
    /// Pattern the torrent title/description must contain.
    #[serde(default)]
    pub include: String,
    /// Pattern the torrent title/description must not contain.
    #[serde(default)]
    pub exclude: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_size_mb: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_size_mb: Option<u64>,
    /// Media types allowed through; empty allows all.
    #[serde(default)]
    pub media_types: Vec<MediaType>,
}

/// Rule filter built from [`TorrentRulesConfig`].
///
/// Size limits only apply to torrents whose size is known.
#[derive(Debug, Clone)]
pub struct RuleSetFilter {
    include: Pattern,
    exclude: Pattern,
    min_bytes: Option<u64>,
    max_bytes: Option<u64>,
    media_types: Vec<MediaType>,
}

impl RuleSetFilter {
    pub fn new(config: &TorrentRulesConfig) -> Result<Self, FilterError> {
        Ok(Self {
            include: Pattern::new(&config.include)?,
            exclude: Pattern::new(&config.exclude)?,
            min_bytes: config.min_size_mb.map(|mb| mb.saturating_mul(BYTES_PER_MB)),
            max_bytes: config.max_size_mb.map(|mb| mb.saturating_mul(BYTES_PER_MB)),
            media_types: config.media_types.clone(),
        })
    }
}

#[async_trait]
impl TorrentRuleFilter for RuleSetFilter {
    async fn accepts(&self, torrent: &TorrentDescriptor, media: &MediaRecord) -> bool {
        if !self.media_types.is_empty() && !self.media_types.contains(&media.media_type) {
            debug!("Rule filter: {} is not an allowed media type", torrent.title);
            return false;
        }

        let text = torrent.text();
        if !self.include.includes(&text) || self.exclude.excludes(&text) {
            debug!("Rule filter: {} rejected by pattern", torrent.title);
            return false;
        }

        if let Some(size) = torrent.size {
            if self.min_bytes.is_some_and(|min| size < min)
                || self.max_bytes.is_some_and(|max| size > max)
            {
                debug!("Rule filter: {} rejected by size ({} bytes)", torrent.title, size);
                return false;
            }
        }

        true
    }
}
