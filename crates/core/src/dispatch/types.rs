//! Dispatch types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::classify::{MediaRecord, MediaType, RecognizedMeta};
use crate::feed::FeedEntry;

/// What to do with a recognized release.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Add a subscription for the media (and season).
    #[default]
    Subscribe,
    /// Hand the torrent to the download client right away.
    Download,
}

impl Action {
    pub fn as_str(&self) -> &'static str {
        match self {
            Action::Subscribe => "subscribe",
            Action::Download => "download",
        }
    }
}

/// The downloadable side of a feed entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TorrentDescriptor {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Torrent file URL or magnet link.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enclosure: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,
    /// Whether fetching the enclosure should go through the proxy.
    #[serde(default)]
    pub use_proxy: bool,
}

impl TorrentDescriptor {
    pub fn from_entry(entry: &FeedEntry, use_proxy: bool) -> Self {
        Self {
            title: entry.title.clone(),
            description: entry.description.clone(),
            enclosure: entry.enclosure.clone(),
            page_url: entry.link.clone(),
            size: entry.size,
            published: entry.published,
            use_proxy,
        }
    }

    /// Title and description joined by a space.
    pub fn text(&self) -> String {
        format!("{} {}", self.title, self.description.as_deref().unwrap_or(""))
    }
}

/// An entry that survived parsing, filtering and recognition.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub entry: FeedEntry,
    pub meta: RecognizedMeta,
    pub media: MediaRecord,
    pub torrent: TorrentDescriptor,
}

/// Request handed to a [`Downloader`](super::Downloader).
#[derive(Debug, Clone)]
pub struct DownloadRequest {
    pub meta: RecognizedMeta,
    pub media: MediaRecord,
    pub torrent: TorrentDescriptor,
    pub save_path: Option<String>,
    /// Tag identifying who requested the download.
    pub actor: String,
}

/// Request handed to a [`SubscriptionService`](super::SubscriptionService).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSubscription {
    pub title: String,
    pub year: Option<u32>,
    pub media_type: MediaType,
    pub tmdb_id: u32,
    pub season: Option<u32>,
    /// Succeed silently when the subscription already exists.
    pub exist_ok: bool,
    pub actor: String,
}

/// A stored subscription.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Subscription {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    pub media_type: MediaType,
    pub tmdb_id: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    pub actor: String,
    pub created_at: DateTime<Utc>,
}

/// How a dispatch attempt ended, short of an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DispatchOutcome {
    /// The action was carried out.
    Dispatched,
    /// The library already holds what the release offers.
    AlreadyInLibrary,
    /// A matching subscription already exists.
    AlreadySubscribed,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_action_serde() {
        assert_eq!(serde_json::to_string(&Action::Download).unwrap(), "\"download\"");
        let action: Action = serde_json::from_str("\"subscribe\"").unwrap();
        assert_eq!(action, Action::Subscribe);
        assert_eq!(Action::default(), Action::Subscribe);
    }

    #[test]
    fn test_descriptor_from_entry() {
        let entry = FeedEntry::new("Show.S01E01")
            .with_description("subs")
            .with_enclosure("magnet:?xt=urn:btih:abc")
            .with_size(42);

        let torrent = TorrentDescriptor::from_entry(&entry, true);
        assert_eq!(torrent.title, "Show.S01E01");
        assert_eq!(torrent.enclosure.as_deref(), Some("magnet:?xt=urn:btih:abc"));
        assert_eq!(torrent.size, Some(42));
        assert!(torrent.use_proxy);
        assert_eq!(torrent.text(), "Show.S01E01 subs");
    }
}
