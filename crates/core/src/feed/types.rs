use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One raw item of a syndication feed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FeedEntry {
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Download link (torrent file or magnet).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub enclosure: Option<String>,
    /// Details page.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub size: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub published: Option<DateTime<Utc>>,
}

impl FeedEntry {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: None,
            enclosure: None,
            link: None,
            size: None,
            published: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn with_enclosure(mut self, enclosure: impl Into<String>) -> Self {
        self.enclosure = Some(enclosure.into());
        self
    }

    pub fn with_size(mut self, size: u64) -> Self {
        self.size = Some(size);
        self
    }

    /// Title and description joined by a single space, the text the
    /// include/exclude patterns run against.
    pub fn text(&self) -> String {
        format!("{} {}", self.title, self.description.as_deref().unwrap_or(""))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_text_joins_title_and_description() {
        let entry = FeedEntry::new("Show.S01E01").with_description("WEB-DL");
        assert_eq!(entry.text(), "Show.S01E01 WEB-DL");
    }

    #[test]
    fn test_text_without_description_keeps_separator() {
        let entry = FeedEntry::new("Show.S01E01");
        assert_eq!(entry.text(), "Show.S01E01 ");
    }
}
