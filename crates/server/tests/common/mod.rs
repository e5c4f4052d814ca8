//! Common test utilities for API testing with mocks.
//!
//! The fixture builds an in-process router whose poller talks to mock feed,
//! classifier and library collaborators, with real SQLite history and
//! subscription stores in a temporary directory.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

use feedrelay_core::{
    create_authenticator, load_config_from_str,
    testing::{MockClassifier, MockFeedSource, MockLibrary},
    FeedPoller, FeedScheduler, HistoryStore, PollerDeps, SqliteHistoryStore, SqliteSubscriptions,
};
use feedrelay_server::state::AppState;

/// Re-export fixtures for test convenience
pub use feedrelay_core::testing::fixtures;

/// Feed URL the fixture's poller polls.
pub const FEED_URL: &str = "https://feed.example/rss";

/// API key used when the fixture runs with `api_key` auth.
pub const API_KEY: &str = "test-api-key";

pub struct TestFixture {
    pub router: Router,
    /// Mock feed - configure entries per URL
    pub feeds: Arc<MockFeedSource>,
    /// Mock classifier - configure recognized media
    pub classifier: Arc<MockClassifier>,
    /// Mock library - configure existing media
    pub library: Arc<MockLibrary>,
    pub history: Arc<SqliteHistoryStore>,
    pub subscriptions: Arc<SqliteSubscriptions>,
    /// Temporary directory holding the test database
    pub temp_dir: TempDir,
}

/// Response from a test request
#[derive(Debug)]
pub struct TestResponse {
    pub status: StatusCode,
    pub body: Value,
}

impl TestFixture {
    /// Fixture with a poller and no authentication.
    pub async fn new() -> Self {
        Self::with_config(TestConfig::default()).await
    }

    pub async fn with_config(test_config: TestConfig) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let db_path = temp_dir.path().join("test.db");

        let auth = if test_config.api_key {
            format!("[auth]\nmethod = \"api_key\"\napi_key = \"{}\"\n", API_KEY)
        } else {
            "[auth]\nmethod = \"none\"\n".to_string()
        };
        let toml = format!(
            "{auth}\n[database]\npath = {db:?}\n\n[poller]\nfeeds = [\"{feed}\"]\n",
            auth = auth,
            db = db_path.to_string_lossy(),
            feed = FEED_URL,
        );
        let config = load_config_from_str(&toml).expect("Failed to parse test config");

        let history = Arc::new(
            SqliteHistoryStore::new(&db_path).expect("Failed to create history store"),
        );
        let subscriptions = Arc::new(
            SqliteSubscriptions::new(&db_path).expect("Failed to create subscription store"),
        );

        let feeds = Arc::new(MockFeedSource::new());
        let classifier = Arc::new(MockClassifier::new());
        classifier.set_media("Heat", fixtures::movie_record()).await;
        classifier
            .set_media("Show Name", fixtures::series_record())
            .await;
        let library = Arc::new(MockLibrary::new());

        let scheduler = if test_config.enable_poller {
            let poller = FeedPoller::new(
                config.poller.clone(),
                PollerDeps {
                    feeds: feeds.clone(),
                    classifier: classifier.clone(),
                    library: library.clone(),
                    history: history.clone(),
                    subscriptions: subscriptions.clone(),
                    downloader: None,
                    rule_filter: None,
                    notifier: None,
                },
            )
            .expect("Failed to create poller");
            Some(Arc::new(FeedScheduler::new(Arc::new(poller))))
        } else {
            None
        };

        let authenticator = Arc::from(
            create_authenticator(&config.auth).expect("Failed to create authenticator"),
        );

        let state = Arc::new(AppState::new(
            config,
            authenticator,
            history.clone() as Arc<dyn HistoryStore>,
            subscriptions.clone(),
            scheduler,
        ));

        let router = feedrelay_server::api::create_router(state);

        Self {
            router,
            feeds,
            classifier,
            library,
            history,
            subscriptions,
            temp_dir,
        }
    }

    /// Serve `titles` as the feed's entries.
    pub async fn serve(&self, titles: &[&str]) {
        let entries = titles.iter().map(|t| fixtures::feed_entry(t)).collect();
        self.feeds.set_entries(FEED_URL, entries).await;
    }

    pub async fn get(&self, path: &str) -> TestResponse {
        self.request("GET", path, &[]).await
    }

    pub async fn post(&self, path: &str) -> TestResponse {
        self.request("POST", path, &[]).await
    }

    pub async fn delete(&self, path: &str) -> TestResponse {
        self.request("DELETE", path, &[]).await
    }

    /// Send a request with extra headers.
    pub async fn request(
        &self,
        method: &str,
        path: &str,
        headers: &[(&str, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(path);
        for (name, value) in headers {
            builder = builder.header(*name, *value);
        }
        let request = builder.body(Body::empty()).unwrap();

        let response = self
            .router
            .clone()
            .oneshot(request)
            .await
            .expect("Failed to send request");

        let status = response.status();
        let body_bytes = response
            .into_body()
            .collect()
            .await
            .expect("Failed to collect body")
            .to_bytes();

        let body: Value = if body_bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&body_bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&body_bytes).into()))
        };

        TestResponse { status, body }
    }
}

/// Configuration for test fixture.
#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Wire a poller into the state
    pub enable_poller: bool,
    /// Require the API key on protected routes
    pub api_key: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            enable_poller: true,
            api_key: false,
        }
    }
}

impl TestConfig {
    /// State without a poller, as when no classifier is configured.
    pub fn without_poller() -> Self {
        Self {
            enable_poller: false,
            ..Default::default()
        }
    }

    pub fn with_api_key() -> Self {
        Self {
            api_key: true,
            ..Default::default()
        }
    }
}

/// Helper to assert a response has expected status.
#[macro_export]
macro_rules! assert_status {
    ($response:expr, $status:expr) => {
        assert_eq!(
            $response.status, $status,
            "Expected status {:?}, got {:?}. Body: {}",
            $status,
            $response.status,
            serde_json::to_string_pretty(&$response.body).unwrap_or_default()
        );
    };
}
