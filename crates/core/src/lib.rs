pub mod auth;
pub mod classify;
pub mod config;
pub mod dispatch;
pub mod feed;
pub mod filter;
pub mod history;
pub mod library;
pub mod metrics;
pub mod notifier;
pub mod poller;
pub mod testing;

pub use auth::{
    create_authenticator, ApiKeyAuthenticator, AuthError, AuthRequest, Authenticator, Identity,
    NoneAuthenticator,
};
pub use classify::{
    Classifier, ClassifyError, MediaRecord, MediaType, RecognizedMeta, ReleaseNameParser,
    TmdbClassifier, TmdbConfig,
};
pub use config::{
    load_config, load_config_from_str, validate_config, AuthMethod, Config, ConfigError,
    SanitizedConfig,
};
pub use dispatch::{
    Action, ActionDispatcher, Candidate, DispatchError, DispatchOutcome, DownloadRequest,
    Downloader, NewSubscription, QBittorrentDownloader, SqliteSubscriptions, Subscription,
    SubscriptionService, TorrentDescriptor, ACTOR,
};
pub use feed::{FeedEntry, FeedError, FeedSource, HttpFeedSource};
pub use filter::{
    FeedFilters, FilterError, FilterVerdict, Pattern, RuleSetFilter, TorrentRuleFilter,
    TorrentRulesConfig,
};
pub use history::{HistoryError, HistoryRecord, HistoryStore, SqliteHistoryStore};
pub use library::{EmptyLibrary, Existence, ExistenceChecker, LibraryError, SeasonGap};
pub use notifier::{LogNotifier, Notifier};
pub use poller::{
    normalize_cron, CycleReport, EntryOutcome, FeedPoller, FeedReport, FeedScheduler,
    PollerConfig, PollerDeps, PollerError, PollerStatus, SchedulerError, SkipReason,
};
