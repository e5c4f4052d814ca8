//! HTTP feed source backed by reqwest and feed-rs.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Proxy, Response};
use tracing::debug;

use super::{FeedEntry, FeedError, FeedSource};

/// Largest feed body accepted.
const MAX_FEED_BYTES: usize = 10 * 1024 * 1024;

const FETCH_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetches RSS/Atom feeds over HTTP.
///
/// Holds two clients: a direct one and one routed through a proxy. The
/// proxied client uses `proxy_url` when given, otherwise the standard
/// `HTTP(S)_PROXY` environment variables.
pub struct HttpFeedSource {
    direct: Client,
    proxied: Client,
}

impl HttpFeedSource {
    pub fn new(proxy_url: Option<&str>) -> Result<Self, FeedError> {
        let user_agent = concat!("feedrelay/", env!("CARGO_PKG_VERSION"));

        let direct = Client::builder()
            .timeout(FETCH_TIMEOUT)
            .user_agent(user_agent)
            .no_proxy()
            .build()?;

        let mut proxied = Client::builder().timeout(FETCH_TIMEOUT).user_agent(user_agent);
        if let Some(url) = proxy_url.filter(|u| !u.is_empty()) {
            proxied = proxied.proxy(Proxy::all(url).map_err(|e| FeedError::Proxy(e.to_string()))?);
        }

        Ok(Self {
            direct,
            proxied: proxied.build()?,
        })
    }
}

#[async_trait]
impl FeedSource for HttpFeedSource {
    async fn fetch(&self, url: &str, use_proxy: bool) -> Result<Vec<FeedEntry>, FeedError> {
        let client = if use_proxy { &self.proxied } else { &self.direct };

        debug!("Fetching feed {} (proxy: {})", url, use_proxy);
        let response = client.get(url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Status(status.as_u16()));
        }
        if response
            .content_length()
            .is_some_and(|len| len as usize > MAX_FEED_BYTES)
        {
            return Err(FeedError::TooLarge(MAX_FEED_BYTES));
        }

        let body = read_capped(response, MAX_FEED_BYTES).await?;
        parse_feed(&body)
    }
}

/// Read a response body chunk by chunk, giving up as soon as it grows past
/// `limit` bytes.
async fn read_capped(mut response: Response, limit: usize) -> Result<Vec<u8>, FeedError> {
    let mut body = Vec::new();
    while let Some(chunk) = response.chunk().await? {
        if body.len() + chunk.len() > limit {
            return Err(FeedError::TooLarge(limit));
        }
        body.extend_from_slice(&chunk);
    }
    Ok(body)
}

/// Parse an RSS or Atom document into feed entries.
///
/// Entries without a title are kept with an empty title; the poller skips them.
pub fn parse_feed(bytes: &[u8]) -> Result<Vec<FeedEntry>, FeedError> {
    let feed = feed_rs::parser::parse(bytes).map_err(|e| FeedError::Parse(e.to_string()))?;

    let entries = feed
        .entries
        .into_iter()
        .map(|entry| {
            let title = entry
                .title
                .map(|t| t.content.trim().to_string())
                .unwrap_or_default();
            let description = entry
                .summary
                .map(|s| s.content)
                .or_else(|| entry.content.and_then(|c| c.body))
                .filter(|d| !d.trim().is_empty());

            let media = entry
                .media
                .iter()
                .flat_map(|m| m.content.iter())
                .find_map(|c| c.url.as_ref().map(|u| (u.to_string(), c.size)));

            let enclosure_link = entry
                .links
                .iter()
                .find(|l| l.rel.as_deref() == Some("enclosure"));

            let page = entry
                .links
                .iter()
                .find(|l| l.rel.as_deref() != Some("enclosure"))
                .map(|l| l.href.clone());

            let (enclosure, size) = match (media, enclosure_link) {
                (Some((url, size)), _) => (Some(url), size),
                (None, Some(link)) => (Some(link.href.clone()), link.length),
                // Some trackers put the torrent itself in <link>.
                (None, None) => (page.clone().filter(|p| is_torrent_link(p)), None),
            };

            FeedEntry {
                title,
                description,
                enclosure,
                link: page,
                size,
                published: entry.published.or(entry.updated),
            }
        })
        .collect();

    Ok(entries)
}

fn is_torrent_link(url: &str) -> bool {
    url.starts_with("magnet:") || url.to_lowercase().ends_with(".torrent")
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Serve `body` once, without a Content-Length, closing the connection
    /// to end it.
    async fn serve_unsized(body: Vec<u8>) -> String {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request = Vec::new();
            let mut buf = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                let n = socket.read(&mut buf).await.unwrap();
                if n == 0 {
                    return;
                }
                request.extend_from_slice(&buf[..n]);
            }
            let head = "HTTP/1.1 200 OK\r\nContent-Type: application/rss+xml\r\nConnection: close\r\n\r\n";
            socket.write_all(head.as_bytes()).await.unwrap();
            // The client may hang up early once it has seen enough.
            let _ = socket.write_all(&body).await;
            let _ = socket.shutdown().await;
        });
        format!("http://{}/rss", addr)
    }

    fn local_client() -> Client {
        Client::builder().no_proxy().build().unwrap()
    }

    #[tokio::test]
    async fn test_unsized_body_within_limit() {
        let url = serve_unsized(RSS.as_bytes().to_vec()).await;
        let response = local_client().get(&url).send().await.unwrap();
        assert!(response.content_length().is_none());

        let body = read_capped(response, 64 * 1024).await.unwrap();
        assert_eq!(body, RSS.as_bytes());
    }

    #[tokio::test]
    async fn test_unsized_body_over_limit_stops_early() {
        let url = serve_unsized(vec![b'x'; 256 * 1024]).await;
        let response = local_client().get(&url).send().await.unwrap();

        let result = read_capped(response, 4096).await;
        assert!(matches!(result, Err(FeedError::TooLarge(4096))));
    }

    const RSS: &str = r#"<?xml version="1.0" encoding="UTF-8"?>
<rss version="2.0">
  <channel>
    <title>Tracker</title>
    <link>https://tracker.example</link>
    <description>Latest</description>
    <item>
      <title>Show.Name.S01E01.1080p.WEB-DL</title>
      <description>English subs</description>
      <link>https://tracker.example/details/1</link>
      <enclosure url="https://tracker.example/dl/1.torrent" length="1073741824" type="application/x-bittorrent"/>
      <pubDate>Mon, 05 Feb 2024 10:00:00 +0000</pubDate>
    </item>
    <item>
      <title>Movie.Title.2023.2160p</title>
      <link>https://tracker.example/dl/2.torrent</link>
    </item>
  </channel>
</rss>"#;

    #[test]
    fn test_parse_rss_with_enclosure() {
        let entries = parse_feed(RSS.as_bytes()).unwrap();
        assert_eq!(entries.len(), 2);

        let first = &entries[0];
        assert_eq!(first.title, "Show.Name.S01E01.1080p.WEB-DL");
        assert_eq!(first.description.as_deref(), Some("English subs"));
        assert_eq!(
            first.enclosure.as_deref(),
            Some("https://tracker.example/dl/1.torrent")
        );
        assert_eq!(first.link.as_deref(), Some("https://tracker.example/details/1"));
        assert_eq!(first.size, Some(1073741824));
        assert!(first.published.is_some());
    }

    #[test]
    fn test_parse_torrent_link_without_enclosure() {
        let entries = parse_feed(RSS.as_bytes()).unwrap();
        let second = &entries[1];
        assert_eq!(second.title, "Movie.Title.2023.2160p");
        assert!(second.description.is_none());
        assert_eq!(
            second.enclosure.as_deref(),
            Some("https://tracker.example/dl/2.torrent")
        );
    }

    #[test]
    fn test_parse_invalid_document() {
        let result = parse_feed(b"definitely not xml");
        assert!(matches!(result, Err(FeedError::Parse(_))));
    }

    #[test]
    fn test_is_torrent_link() {
        assert!(is_torrent_link("magnet:?xt=urn:btih:abc"));
        assert!(is_torrent_link("https://x.example/a.TORRENT"));
        assert!(!is_torrent_link("https://x.example/details/1"));
    }
}
