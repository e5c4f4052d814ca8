//! Dispatch notifications.

use async_trait::async_trait;
use tracing::info;

/// Receives a message for every dispatched entry when `poller.notify` is on.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, title: &str, text: &str);
}

/// Notifier that writes to the log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, title: &str, text: &str) {
        info!(target: "feedrelay::notify", "{}: {}", title, text);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_log_notifier_does_not_fail() {
        LogNotifier.notify("Feed subscription", "Show S01 added").await;
    }
}
