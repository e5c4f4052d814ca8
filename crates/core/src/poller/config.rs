use serde::{Deserialize, Deserializer, Serialize};

use crate::dispatch::Action;

/// `[poller]` section: what to poll, when, and what to do with matches.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollerConfig {
    #[serde(default)]
    pub enabled: bool,
    /// Cron expression (5 or 6 fields). Takes precedence over `interval_minutes`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cron: Option<String>,
    #[serde(default = "default_interval_minutes")]
    pub interval_minutes: u32,
    /// Send a notification for every dispatched entry.
    #[serde(default)]
    pub notify: bool,
    /// Run one cycle shortly after startup, even with `enabled` off. Fires
    /// once per arming: the database remembers it ran until the switch is
    /// turned off again.
    #[serde(default)]
    pub run_once: bool,
    /// Feed URLs, as an array or a newline-separated string.
    #[serde(default, deserialize_with = "deserialize_feeds")]
    pub feeds: Vec<String>,
    /// Pattern every entry's title and description must contain.
    #[serde(default)]
    pub include: String,
    /// Pattern no entry's title and description may contain.
    #[serde(default)]
    pub exclude: String,
    /// Fetch feeds through the proxy.
    #[serde(default)]
    pub proxy: bool,
    /// Proxy to use; the system proxy environment when unset.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub proxy_url: Option<String>,
    /// Run recognized torrents through `[torrent_rules]`.
    #[serde(default)]
    pub torrent_filter: bool,
    /// Start the next cycle from an empty history, whose records then replace
    /// the stored ones. Applied once, remembered in the database like `run_once`.
    #[serde(default)]
    pub clear_history: bool,
    #[serde(default)]
    pub action: Action,
    /// Download directory handed to the download client.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub save_path: Option<String>,
}

impl Default for PollerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            cron: None,
            interval_minutes: default_interval_minutes(),
            notify: false,
            run_once: false,
            feeds: Vec::new(),
            include: String::new(),
            exclude: String::new(),
            proxy: false,
            proxy_url: None,
            torrent_filter: false,
            clear_history: false,
            action: Action::default(),
            save_path: None,
        }
    }
}

fn default_interval_minutes() -> u32 {
    30
}

impl PollerConfig {
    /// The configured cron expression, if any non-blank one is set.
    pub fn cron_expression(&self) -> Option<&str> {
        self.cron.as_deref().map(str::trim).filter(|c| !c.is_empty())
    }

    /// Human-readable schedule.
    pub fn schedule_description(&self) -> String {
        match self.cron_expression() {
            Some(cron) => format!("cron: {}", cron),
            None => format!("every {} minutes", self.interval_minutes),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FeedList {
    Text(String),
    List(Vec<String>),
}

fn deserialize_feeds<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let lines: Vec<String> = match FeedList::deserialize(deserializer)? {
        FeedList::Text(text) => text.lines().map(str::to_string).collect(),
        FeedList::List(list) => list,
    };

    Ok(lines
        .into_iter()
        .map(|l| l.trim().to_string())
        .filter(|l| !l.is_empty())
        .collect())
}
