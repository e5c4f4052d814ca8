//! qBittorrent download client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tokio::sync::RwLock;
use tracing::{debug, warn};

use super::{DispatchError, DownloadRequest, Downloader};
use crate::config::QBittorrentConfig;

/// Downloader talking to the qBittorrent Web API (v2).
pub struct QBittorrentDownloader {
    client: Client,
    config: QBittorrentConfig,
    /// Set once logged in; the session cookie itself lives in the cookie jar.
    session: Arc<RwLock<bool>>,
}

impl QBittorrentDownloader {
    pub fn new(config: QBittorrentConfig) -> Result<Self, DispatchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs as u64))
            .cookie_store(true)
            .build()
            .map_err(|e| DispatchError::ConnectionFailed(e.to_string()))?;

        Ok(Self {
            client,
            config,
            session: Arc::new(RwLock::new(false)),
        })
    }

    /// Get the base URL without trailing slash.
    fn base_url(&self) -> &str {
        self.config.url.trim_end_matches('/')
    }

    /// Login and store session cookie.
    async fn login(&self) -> Result<(), DispatchError> {
        let url = format!("{}/api/v2/auth/login", self.base_url());

        let params = [
            ("username", self.config.username.as_str()),
            ("password", self.config.password.as_str()),
        ];

        let response = self
            .client
            .post(&url)
            .form(&params)
            .send()
            .await
            .map_err(request_error)?;

        let status = response.status();
        let body = response.text().await.unwrap_or_default();

        if body.contains("Ok.") {
            debug!("qBittorrent login successful");
            *self.session.write().await = true;
            Ok(())
        } else if body.contains("Fails.") || status.as_u16() == 403 {
            Err(DispatchError::AuthenticationFailed(
                "Invalid credentials".to_string(),
            ))
        } else {
            Err(DispatchError::AuthenticationFailed(format!(
                "Unexpected response: {}",
                body.chars().take(100).collect::<String>()
            )))
        }
    }

    /// Ensure we have a valid session, logging in if needed.
    async fn ensure_authenticated(&self) -> Result<(), DispatchError> {
        if *self.session.read().await {
            return Ok(());
        }
        self.login().await
    }

    /// Make an authenticated POST request with form data, re-authenticating once on 403.
    async fn post_form(&self, endpoint: &str, params: &[(&str, &str)]) -> Result<String, DispatchError> {
        self.ensure_authenticated().await?;

        let url = format!("{}{}", self.base_url(), endpoint);
        let mut response = self
            .client
            .post(&url)
            .form(params)
            .send()
            .await
            .map_err(request_error)?;

        if response.status().as_u16() == 403 {
            warn!("qBittorrent session expired, re-authenticating");
            *self.session.write().await = false;
            self.login().await?;

            response = self
                .client
                .post(&url)
                .form(params)
                .send()
                .await
                .map_err(request_error)?;
        }

        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::Api(format!("HTTP {}", status)));
        }

        response
            .text()
            .await
            .map_err(|e| DispatchError::Api(e.to_string()))
    }
}

fn request_error(e: reqwest::Error) -> DispatchError {
    if e.is_timeout() {
        DispatchError::Timeout
    } else if e.is_connect() {
        DispatchError::ConnectionFailed(e.to_string())
    } else {
        DispatchError::Api(e.to_string())
    }
}

/// Form fields for `POST /api/v2/torrents/add`.
fn add_params<'a>(
    urls: &'a str,
    request: &'a DownloadRequest,
    category: Option<&'a str>,
) -> Vec<(&'static str, &'a str)> {
    let mut params = vec![("urls", urls), ("tags", request.actor.as_str())];
    if let Some(path) = request.save_path.as_deref() {
        params.push(("savepath", path));
    }
    if let Some(category) = category {
        params.push(("category", category));
    }
    params
}

#[async_trait]
impl Downloader for QBittorrentDownloader {
    async fn download(&self, request: DownloadRequest) -> Result<bool, DispatchError> {
        let Some(urls) = request.torrent.enclosure.as_deref() else {
            warn!("{} has no download link", request.torrent.title);
            return Ok(false);
        };

        let params = add_params(urls, &request, self.config.category.as_deref());
        let body = self.post_form("/api/v2/torrents/add", &params).await?;

        if body.contains("Fails.") {
            warn!("qBittorrent refused {}", request.torrent.title);
            return Ok(false);
        }

        debug!("qBittorrent accepted {}", request.torrent.title);
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::fixtures;

    fn config() -> QBittorrentConfig {
        QBittorrentConfig {
            url: "http://localhost:8080/".to_string(),
            username: "admin".to_string(),
            password: "secret".to_string(),
            category: Some("tv".to_string()),
            timeout_secs: 5,
        }
    }

    fn request(save_path: Option<&str>) -> DownloadRequest {
        let candidate = fixtures::movie_candidate();
        DownloadRequest {
            meta: candidate.meta,
            media: candidate.media,
            torrent: candidate.torrent,
            save_path: save_path.map(str::to_string),
            actor: "feedrelay".to_string(),
        }
    }

    #[test]
    fn test_base_url_trims_slash() {
        let downloader = QBittorrentDownloader::new(config()).unwrap();
        assert_eq!(downloader.base_url(), "http://localhost:8080");
    }

    #[test]
    fn test_add_params() {
        let request = request(Some("/data/tv"));
        let params = add_params("magnet:?xt=urn:btih:abc", &request, Some("tv"));

        assert!(params.contains(&("urls", "magnet:?xt=urn:btih:abc")));
        assert!(params.contains(&("tags", "feedrelay")));
        assert!(params.contains(&("savepath", "/data/tv")));
        assert!(params.contains(&("category", "tv")));
    }

    #[test]
    fn test_add_params_without_optional_fields() {
        let request = request(None);
        let params = add_params("https://x/1.torrent", &request, None);
        assert_eq!(params.len(), 2);
    }

    #[tokio::test]
    async fn test_download_without_enclosure() {
        let downloader = QBittorrentDownloader::new(config()).unwrap();
        let mut request = request(None);
        request.torrent.enclosure = None;

        assert!(!downloader.download(request).await.unwrap());
    }
}
