use super::{types::Config, AuthMethod, ConfigError};
use crate::dispatch::Action;
use crate::filter::{FeedFilters, Pattern};
use crate::poller::normalize_cron;

/// Validate configuration
/// Currently validates:
/// - Auth section exists (enforced by serde) and api_key is set for api_key auth
/// - Server port is not 0
/// - Global and per-feed include/exclude patterns compile
/// - Schedule is a usable cron expression or a positive interval
/// - Download action has a download client to talk to
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.auth.method == AuthMethod::ApiKey
        && config.auth.api_key.as_deref().unwrap_or("").is_empty()
    {
        return Err(ConfigError::ValidationError(
            "auth.api_key must be set when auth.method = \"api_key\"".to_string(),
        ));
    }

    let poller = &config.poller;

    for (field, pattern) in [("include", &poller.include), ("exclude", &poller.exclude)] {
        Pattern::new(pattern).map_err(|e| {
            ConfigError::ValidationError(format!("poller.{}: {}", field, e))
        })?;
    }

    for url in &poller.feeds {
        FeedFilters::parse_overrides(url).map_err(|e| {
            ConfigError::ValidationError(format!("feed {}: {}", url, e))
        })?;
    }

    if let Some(cron) = poller.cron.as_deref().filter(|c| !c.trim().is_empty()) {
        normalize_cron(cron)
            .map_err(|e| ConfigError::ValidationError(format!("poller.cron: {}", e)))?;
    } else if poller.interval_minutes == 0 {
        return Err(ConfigError::ValidationError(
            "poller.interval_minutes cannot be 0".to_string(),
        ));
    }

    if poller.action == Action::Download && config.downloader.is_none() {
        return Err(ConfigError::ValidationError(
            "poller.action = \"download\" requires a [downloader] section".to_string(),
        ));
    }

    Ok(())
}
