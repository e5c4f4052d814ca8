//! Mock classifier for testing.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock as StdRwLock};
use tokio::sync::RwLock;

use crate::classify::{
    ClassifyError, Classifier, MediaRecord, RecognizedMeta, ReleaseNameParser,
};

/// Mock implementation of the Classifier trait.
///
/// Parsing goes through the real [`ReleaseNameParser`] unless a title has a
/// configured result. Recognition looks the parsed name up in a map of
/// known media and returns `None` for anything else.
#[derive(Debug, Default)]
pub struct MockClassifier {
    parser: ReleaseNameParser,
    /// Parse results by exact title. `parse` is synchronous, hence the std lock.
    metas: StdRwLock<HashMap<String, RecognizedMeta>>,
    media: Arc<RwLock<HashMap<String, MediaRecord>>>,
    next_error: Arc<RwLock<Option<ClassifyError>>>,
    recognize_calls: Arc<RwLock<Vec<RecognizedMeta>>>,
}

impl MockClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Override the parse result for `title`.
    pub async fn set_meta(&self, title: &str, meta: RecognizedMeta) {
        if let Ok(mut metas) = self.metas.write() {
            metas.insert(title.to_string(), meta);
        }
    }

    /// Recognize entries whose parsed name is `name` as `media`.
    pub async fn set_media(&self, name: &str, media: MediaRecord) {
        self.media.write().await.insert(name.to_string(), media);
    }

    /// Make the next recognition fail.
    pub async fn set_next_error(&self, error: ClassifyError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn recognize_calls(&self) -> Vec<RecognizedMeta> {
        self.recognize_calls.read().await.clone()
    }
}

#[async_trait]
impl Classifier for MockClassifier {
    fn parse(&self, title: &str, subtitle: Option<&str>) -> RecognizedMeta {
        let configured = self
            .metas
            .read()
            .ok()
            .and_then(|metas| metas.get(title).cloned());
        configured.unwrap_or_else(|| self.parser.parse(title, subtitle))
    }

    async fn recognize(&self, meta: &RecognizedMeta) -> Result<Option<MediaRecord>, ClassifyError> {
        self.recognize_calls.write().await.push(meta.clone());

        if let Some(error) = self.next_error.write().await.take() {
            return Err(error);
        }

        Ok(self.media.read().await.get(&meta.name).cloned())
    }
}
