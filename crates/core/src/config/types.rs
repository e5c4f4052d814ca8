use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;

use crate::classify::TmdbConfig;
use crate::dispatch::Action;
use crate::filter::TorrentRulesConfig;
use crate::poller::PollerConfig;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub poller: PollerConfig,
    /// TMDB lookups for the built-in classifier.
    #[serde(default)]
    pub tmdb: Option<TmdbConfig>,
    /// Download client, required when `poller.action = "download"`.
    #[serde(default)]
    pub downloader: Option<QBittorrentConfig>,
    /// Rules applied when `poller.torrent_filter` is on.
    #[serde(default)]
    pub torrent_rules: Option<TorrentRulesConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(std::net::Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8080
}

/// Authentication configuration for the administration API
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    /// API key (required when method = "api_key")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("feedrelay.db")
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    None,
    ApiKey,
}

/// qBittorrent Web API configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct QBittorrentConfig {
    /// Web UI URL (e.g., "http://localhost:8080")
    pub url: String,
    pub username: String,
    pub password: String,
    /// Category assigned to added torrents
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Request timeout in seconds (default: 30)
    #[serde(default = "default_timeout")]
    pub timeout_secs: u32,
}

fn default_timeout() -> u32 {
    30
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub poller: SanitizedPollerConfig,
    pub tmdb_configured: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub downloader: Option<SanitizedDownloaderConfig>,
    pub torrent_rules_configured: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: String,
}

/// Poller settings without feed URLs (they often embed passkeys)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedPollerConfig {
    pub enabled: bool,
    pub schedule: String,
    pub notify: bool,
    pub run_once: bool,
    pub feed_count: usize,
    pub include: String,
    pub exclude: String,
    pub proxy: bool,
    pub torrent_filter: bool,
    pub action: Action,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub save_path: Option<String>,
}

/// Sanitized downloader config (credentials hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedDownloaderConfig {
    pub url: String,
    pub credentials_configured: bool,
    pub timeout_secs: u32,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        let poller = &config.poller;
        Self {
            auth: SanitizedAuthConfig {
                method: match config.auth.method {
                    AuthMethod::None => "none".to_string(),
                    AuthMethod::ApiKey => "api_key".to_string(),
                },
            },
            server: config.server.clone(),
            database: config.database.clone(),
            poller: SanitizedPollerConfig {
                enabled: poller.enabled,
                schedule: poller.schedule_description(),
                notify: poller.notify,
                run_once: poller.run_once,
                feed_count: poller.feeds.len(),
                include: poller.include.clone(),
                exclude: poller.exclude.clone(),
                proxy: poller.proxy,
                torrent_filter: poller.torrent_filter,
                action: poller.action,
                save_path: poller.save_path.clone(),
            },
            tmdb_configured: config
                .tmdb
                .as_ref()
                .is_some_and(|t| !t.api_key.is_empty()),
            downloader: config
                .downloader
                .as_ref()
                .map(|d| SanitizedDownloaderConfig {
                    url: d.url.clone(),
                    credentials_configured: !d.username.is_empty() && !d.password.is_empty(),
                    timeout_secs: d.timeout_secs,
                }),
            torrent_rules_configured: config.torrent_rules.is_some(),
        }
    }
}
