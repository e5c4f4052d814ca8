use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use sha2::{Digest, Sha256};
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use feedrelay_core::{
    create_authenticator, load_config, validate_config, Action, Authenticator, Classifier,
    Downloader, EmptyLibrary, FeedPoller, FeedScheduler, HistoryStore, HttpFeedSource,
    LogNotifier, Notifier, PollerDeps, QBittorrentDownloader, RuleSetFilter, SqliteHistoryStore,
    SqliteSubscriptions, TmdbClassifier, TorrentRuleFilter,
};
use feedrelay_server::api::create_router;
use feedrelay_server::state::AppState;

/// Application version
const VERSION: &str = env!("CARGO_PKG_VERSION");

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        error!("Fatal error: {:#}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config_path = std::env::var("FEEDRELAY_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(|_| PathBuf::from("config.toml"));

    info!("feedrelay {} loading configuration from {:?}", VERSION, config_path);
    let config = load_config(&config_path)
        .with_context(|| format!("Failed to load config from {:?}", config_path))?;

    validate_config(&config).context("Configuration validation failed")?;

    let config_json = serde_json::to_string(&config).unwrap_or_default();
    let config_hash = format!("{:x}", Sha256::digest(config_json.as_bytes()));
    info!(
        auth = ?config.auth.method,
        database = ?config.database.path,
        hash = &config_hash[..16],
        "Configuration loaded"
    );

    let authenticator: Arc<dyn Authenticator> = Arc::from(
        create_authenticator(&config.auth).context("Failed to create authenticator")?,
    );
    info!("Using authenticator: {}", authenticator.method_name());

    let history: Arc<dyn HistoryStore> = Arc::new(
        SqliteHistoryStore::new(&config.database.path)
            .context("Failed to open history store")?,
    );
    let subscriptions = Arc::new(
        SqliteSubscriptions::new(&config.database.path)
            .context("Failed to open subscription store")?,
    );
    info!("History and subscription stores initialized");

    let classifier: Option<Arc<dyn Classifier>> = match &config.tmdb {
        Some(tmdb) => match TmdbClassifier::new(tmdb.clone()) {
            Ok(classifier) => {
                info!("Initializing TMDB classifier");
                Some(Arc::new(classifier))
            }
            Err(e) => {
                error!("Failed to create TMDB classifier: {}", e);
                None
            }
        },
        None => {
            info!("No [tmdb] section configured");
            None
        }
    };

    let downloader: Option<Arc<dyn Downloader>> = match &config.downloader {
        Some(qbit) => match QBittorrentDownloader::new(qbit.clone()) {
            Ok(client) => {
                info!("Initializing qBittorrent downloader at {}", qbit.url);
                Some(Arc::new(client))
            }
            Err(e) => {
                error!("Failed to create qBittorrent downloader: {}", e);
                None
            }
        },
        None => None,
    };
    if config.poller.action == Action::Download && downloader.is_none() {
        warn!("Poller action is download but no downloader is available");
    }

    let rule_filter: Option<Arc<dyn TorrentRuleFilter>> = if config.poller.torrent_filter {
        let rules = config.torrent_rules.clone().unwrap_or_default();
        Some(Arc::new(
            RuleSetFilter::new(&rules).context("Invalid [torrent_rules] pattern")?,
        ))
    } else {
        None
    };

    let notifier: Option<Arc<dyn Notifier>> = config
        .poller
        .notify
        .then(|| Arc::new(LogNotifier) as Arc<dyn Notifier>);

    let scheduler = match classifier {
        Some(classifier) => {
            let feeds = HttpFeedSource::new(config.poller.proxy_url.as_deref())
                .context("Failed to create feed client")?;
            let deps = PollerDeps {
                feeds: Arc::new(feeds),
                classifier,
                library: Arc::new(EmptyLibrary),
                history: Arc::clone(&history),
                subscriptions: subscriptions.clone(),
                downloader,
                rule_filter,
                notifier,
            };
            let poller = FeedPoller::new(config.poller.clone(), deps)
                .context("Invalid poller include/exclude pattern")?;
            let scheduler = Arc::new(FeedScheduler::new(Arc::new(poller)));
            scheduler
                .start()
                .await
                .context("Failed to start feed scheduler")?;
            Some(scheduler)
        }
        None => {
            if config.poller.enabled || config.poller.run_once {
                error!("Poller enabled but no classifier is available (configure [tmdb])");
            }
            None
        }
    };

    let state = Arc::new(AppState::new(
        config.clone(),
        authenticator,
        history,
        subscriptions,
        scheduler.clone(),
    ));

    let app = create_router(state);

    let addr = SocketAddr::new(config.server.host, config.server.port);
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .context("Server error")?;

    info!("Server shutting down...");
    if let Some(scheduler) = scheduler {
        if let Err(e) = scheduler.stop().await {
            warn!("Failed to stop feed scheduler cleanly: {}", e);
        }
        info!("Feed scheduler stopped");
    }

    Ok(())
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
