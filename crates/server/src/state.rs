use std::sync::Arc;

use feedrelay_core::{
    Authenticator, Config, FeedScheduler, HistoryStore, SanitizedConfig, SqliteSubscriptions,
};

/// Shared application state
pub struct AppState {
    config: Config,
    authenticator: Arc<dyn Authenticator>,
    history: Arc<dyn HistoryStore>,
    subscriptions: Arc<SqliteSubscriptions>,
    /// Absent when the poller could not be wired (no classifier configured).
    scheduler: Option<Arc<FeedScheduler>>,
}

impl AppState {
    pub fn new(
        config: Config,
        authenticator: Arc<dyn Authenticator>,
        history: Arc<dyn HistoryStore>,
        subscriptions: Arc<SqliteSubscriptions>,
        scheduler: Option<Arc<FeedScheduler>>,
    ) -> Self {
        Self {
            config,
            authenticator,
            history,
            subscriptions,
            scheduler,
        }
    }

    pub fn sanitized_config(&self) -> SanitizedConfig {
        SanitizedConfig::from(&self.config)
    }

    pub fn authenticator(&self) -> &dyn Authenticator {
        self.authenticator.as_ref()
    }

    pub fn history(&self) -> &Arc<dyn HistoryStore> {
        &self.history
    }

    pub fn subscriptions(&self) -> &Arc<SqliteSubscriptions> {
        &self.subscriptions
    }

    pub fn scheduler(&self) -> Option<&Arc<FeedScheduler>> {
        self.scheduler.as_ref()
    }
}
