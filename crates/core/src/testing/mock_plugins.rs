//! Mock rule filter and notifier for testing.

use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::classify::MediaRecord;
use crate::dispatch::TorrentDescriptor;
use crate::filter::TorrentRuleFilter;
use crate::notifier::Notifier;

/// Mock implementation of the TorrentRuleFilter trait. Accepts by default.
#[derive(Debug)]
pub struct MockRuleFilter {
    accept: Arc<RwLock<bool>>,
    checked: Arc<RwLock<Vec<String>>>,
}

impl Default for MockRuleFilter {
    fn default() -> Self {
        Self {
            accept: Arc::new(RwLock::new(true)),
            checked: Arc::new(RwLock::new(Vec::new())),
        }
    }
}

impl MockRuleFilter {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn set_accept(&self, accept: bool) {
        *self.accept.write().await = accept;
    }

    /// Titles of the torrents checked so far.
    pub async fn checked_titles(&self) -> Vec<String> {
        self.checked.read().await.clone()
    }
}

#[async_trait]
impl TorrentRuleFilter for MockRuleFilter {
    async fn accepts(&self, torrent: &TorrentDescriptor, _media: &MediaRecord) -> bool {
        self.checked.write().await.push(torrent.title.clone());
        *self.accept.read().await
    }
}

/// Mock implementation of the Notifier trait; records `(title, text)` pairs.
#[derive(Debug, Default)]
pub struct MockNotifier {
    sent: Arc<RwLock<Vec<(String, String)>>>,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn recorded(&self) -> Vec<(String, String)> {
        self.sent.read().await.clone()
    }
}

#[async_trait]
impl Notifier for MockNotifier {
    async fn notify(&self, title: &str, text: &str) {
        self.sent
            .write()
            .await
            .push((title.to_string(), text.to_string()));
    }
}
