//! Testing utilities and mock implementations of the collaborator traits.
//!
//! The mocks let the whole poll pipeline run without network access, a
//! metadata service or a download client.
//!
//! # Example
//!
//! ```rust,ignore
//! use feedrelay_core::testing::{fixtures, MockClassifier, MockFeedSource};
//! use feedrelay_core::FeedEntry;
//!
//! let feeds = MockFeedSource::new();
//! feeds.set_entries("https://feed.example/rss", vec![FeedEntry::new("Show.S01E01")]).await;
//!
//! let classifier = MockClassifier::new();
//! classifier.set_media("Show", fixtures::series_record()).await;
//! ```

mod mock_classifier;
mod mock_dispatch;
mod mock_feed;
mod mock_library;
mod mock_plugins;

pub use mock_classifier::MockClassifier;
pub use mock_dispatch::{MockDownloader, MockSubscriptions};
pub use mock_feed::MockFeedSource;
pub use mock_library::MockLibrary;
pub use mock_plugins::{MockNotifier, MockRuleFilter};

/// Test fixtures and helper functions.
pub mod fixtures {
    use crate::classify::{MediaRecord, MediaType, RecognizedMeta};
    use crate::dispatch::{Candidate, TorrentDescriptor};
    use crate::feed::FeedEntry;

    /// A recognized movie.
    pub fn movie_record() -> MediaRecord {
        MediaRecord {
            title: "Heat".to_string(),
            year: Some(1995),
            media_type: MediaType::Movie,
            tmdb_id: 949,
            poster_url: Some("https://image.tmdb.org/t/p/w500/heat.jpg".to_string()),
            overview: Some("A group of professional bank robbers.".to_string()),
        }
    }

    /// A recognized series.
    pub fn series_record() -> MediaRecord {
        MediaRecord {
            title: "Show Name".to_string(),
            year: Some(2020),
            media_type: MediaType::Tv,
            tmdb_id: 1399,
            poster_url: Some("https://image.tmdb.org/t/p/w500/show.jpg".to_string()),
            overview: None,
        }
    }

    /// A feed entry with a magnet enclosure and a 2 GB size.
    pub fn feed_entry(title: &str) -> FeedEntry {
        FeedEntry::new(title)
            .with_enclosure(format!(
                "magnet:?xt=urn:btih:{:040x}",
                title.len() as u128 * 7919
            ))
            .with_size(2 * 1024 * 1024 * 1024)
    }

    /// A movie that made it through recognition.
    pub fn movie_candidate() -> Candidate {
        let entry = feed_entry("Heat.1995.1080p.BluRay.x264");
        Candidate {
            torrent: TorrentDescriptor::from_entry(&entry, false),
            entry,
            meta: RecognizedMeta::new("Heat").with_year(1995),
            media: movie_record(),
        }
    }

    /// A series episode range in one season that made it through recognition.
    pub fn series_candidate(season: u32, episodes: Vec<u32>) -> Candidate {
        let meta = RecognizedMeta::new("Show Name")
            .with_season(season)
            .with_episodes(episodes);
        let entry = feed_entry(&format!(
            "Show.Name.{}{}.1080p.WEB-DL",
            meta.season_label(),
            meta.episode_label()
        ));
        Candidate {
            torrent: TorrentDescriptor::from_entry(&entry, false),
            entry,
            meta,
            media: series_record(),
        }
    }
}
