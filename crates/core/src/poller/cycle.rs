//! One poll cycle: fetch every feed, run each entry through the pipeline,
//! persist the history once at the end.

use std::collections::HashSet;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use chrono::Utc;
use tokio::sync::{Mutex, RwLock};
use tracing::{debug, error, info, warn};

use super::{CycleReport, EntryOutcome, FeedReport, PollerConfig, PollerError, SkipReason};
use crate::classify::Classifier;
use crate::dispatch::{
    Action, ActionDispatcher, Candidate, DispatchOutcome, Downloader, SubscriptionService,
    TorrentDescriptor,
};
use crate::feed::{FeedEntry, FeedSource};
use crate::filter::{FeedFilters, FilterError, FilterVerdict, Pattern, TorrentRuleFilter};
use crate::history::{HistoryRecord, HistoryStore};
use crate::library::ExistenceChecker;
use crate::metrics;
use crate::notifier::Notifier;

/// Persisted marker of the `clear_history` config switch.
const CLEAR_HISTORY_SWITCH: &str = "clear_history";
/// Persisted marker of the `run_once` config switch.
const RUN_ONCE_SWITCH: &str = "run_once";

/// Collaborators of a [`FeedPoller`].
pub struct PollerDeps {
    pub feeds: Arc<dyn FeedSource>,
    pub classifier: Arc<dyn Classifier>,
    pub library: Arc<dyn ExistenceChecker>,
    pub history: Arc<dyn HistoryStore>,
    pub subscriptions: Arc<dyn SubscriptionService>,
    /// Required for `action = "download"`.
    pub downloader: Option<Arc<dyn Downloader>>,
    /// Consulted only when `torrent_filter` is on.
    pub rule_filter: Option<Arc<dyn TorrentRuleFilter>>,
    /// Consulted only when `notify` is on.
    pub notifier: Option<Arc<dyn Notifier>>,
}

/// Marks a cycle as running for as long as it is alive, unwinding included.
struct InProgress<'a>(&'a AtomicBool);

impl<'a> InProgress<'a> {
    fn enter(flag: &'a AtomicBool) -> Self {
        flag.store(true, Ordering::SeqCst);
        Self(flag)
    }
}

impl Drop for InProgress<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

/// Runs poll cycles. Cycles never overlap: each one holds the run lock
/// from history load to history save.
pub struct FeedPoller {
    config: PollerConfig,
    text_include: Pattern,
    text_exclude: Pattern,
    feeds: Arc<dyn FeedSource>,
    classifier: Arc<dyn Classifier>,
    library: Arc<dyn ExistenceChecker>,
    history: Arc<dyn HistoryStore>,
    rule_filter: Option<Arc<dyn TorrentRuleFilter>>,
    notifier: Option<Arc<dyn Notifier>>,
    dispatcher: ActionDispatcher,

    run_lock: Mutex<()>,
    in_progress: AtomicBool,
    clear_requested: AtomicBool,
    last_report: RwLock<Option<CycleReport>>,
}

impl FeedPoller {
    /// Build a poller. Fails when a global include/exclude pattern is invalid.
    pub fn new(config: PollerConfig, deps: PollerDeps) -> Result<Self, FilterError> {
        let text_include = Pattern::new(&config.include)?;
        let text_exclude = Pattern::new(&config.exclude)?;

        let dispatcher = ActionDispatcher::new(
            config.action,
            config.save_path.clone(),
            deps.downloader,
            deps.subscriptions,
        );

        if config.torrent_filter && deps.rule_filter.is_none() {
            warn!("torrent_filter is enabled but no rule filter is configured; all torrents pass");
        }

        Ok(Self {
            clear_requested: AtomicBool::new(false),
            config,
            text_include,
            text_exclude,
            feeds: deps.feeds,
            classifier: deps.classifier,
            library: deps.library,
            history: deps.history,
            rule_filter: deps.rule_filter,
            notifier: deps.notifier,
            dispatcher,
            run_lock: Mutex::new(()),
            in_progress: AtomicBool::new(false),
            last_report: RwLock::new(None),
        })
    }

    pub fn config(&self) -> &PollerConfig {
        &self.config
    }

    pub fn history(&self) -> &Arc<dyn HistoryStore> {
        &self.history
    }

    /// Treat the history as empty on the next cycle and overwrite it with
    /// that cycle's records.
    pub fn request_clear(&self) {
        info!("History clear requested for the next cycle");
        self.clear_requested.store(true, Ordering::SeqCst);
    }

    /// Whether a clear was requested through [`FeedPoller::request_clear`]
    /// and not yet taken by a cycle.
    pub fn clear_requested(&self) -> bool {
        self.clear_requested.load(Ordering::SeqCst)
    }

    /// Whether a cycle is running right now.
    pub fn cycle_in_progress(&self) -> bool {
        self.in_progress.load(Ordering::SeqCst)
    }

    pub async fn last_report(&self) -> Option<CycleReport> {
        self.last_report.read().await.clone()
    }

    /// Whether the startup cycle of `run_once` still has to run. It runs once
    /// per arming of the switch, across restarts.
    pub async fn run_once_pending(&self) -> Result<bool, PollerError> {
        self.pending_switch(RUN_ONCE_SWITCH, self.config.run_once)
            .await
    }

    /// Record that the `run_once` cycle ran.
    pub async fn complete_run_once(&self) -> Result<(), PollerError> {
        self.history
            .set_one_shot_consumed(RUN_ONCE_SWITCH, true)
            .await?;
        Ok(())
    }

    /// Resolve a one-shot config switch against its persisted marker.
    ///
    /// A switch turned off re-arms its marker, so switching it back on fires
    /// it once more.
    async fn pending_switch(&self, name: &str, configured: bool) -> Result<bool, PollerError> {
        let consumed = self.history.one_shot_consumed(name).await?;
        if configured {
            return Ok(!consumed);
        }
        if consumed {
            self.history.set_one_shot_consumed(name, false).await?;
            debug!("One-shot switch '{}' re-armed", name);
        }
        Ok(false)
    }

    /// Delete history records by display title.
    ///
    /// Takes the run lock, so a running cycle cannot save over the deletion.
    pub async fn delete_history(&self, key: &str) -> Result<bool, PollerError> {
        let _guard = self.run_lock.lock().await;
        let deleted = self.history.delete_by_key(key).await?;
        if deleted {
            info!("Deleted history records titled '{}'", key);
        }
        Ok(deleted)
    }

    /// Run one full cycle over every configured feed.
    ///
    /// Waits for any running cycle to finish first. Only history load/save
    /// failures are returned as errors; everything else is counted in the
    /// report.
    pub async fn run_cycle(&self) -> Result<CycleReport, PollerError> {
        let _guard = self.run_lock.lock().await;

        if self.config.feeds.is_empty() {
            debug!("No feeds configured, nothing to poll");
            return Ok(CycleReport::default());
        }

        let result = {
            let _in_progress = InProgress::enter(&self.in_progress);
            self.run_locked().await
        };

        if let Ok(report) = &result {
            *self.last_report.write().await = Some(report.clone());
        }
        result
    }

    async fn run_locked(&self) -> Result<CycleReport, PollerError> {
        let started = Instant::now();
        let started_at = Utc::now();
        metrics::CYCLES_TOTAL.inc();

        // Taken now so a request arriving mid-cycle applies to the next one.
        let requested = self.clear_requested.swap(false, Ordering::SeqCst);
        let configured = match self
            .pending_switch(CLEAR_HISTORY_SWITCH, self.config.clear_history)
            .await
        {
            Ok(pending) => pending,
            Err(e) => {
                self.clear_requested.fetch_or(requested, Ordering::SeqCst);
                return Err(e);
            }
        };
        let clearing = requested || configured;
        let mut history = if clearing {
            info!("Clearing history for this cycle");
            Vec::new()
        } else {
            self.history.load().await.map_err(|e| {
                error!("Failed to load history, aborting cycle: {}", e);
                e
            })?
        };
        let mut seen: HashSet<String> = history.iter().map(|r| r.key.clone()).collect();

        info!(
            "Starting poll cycle over {} feeds ({} known entries)",
            self.config.feeds.len(),
            seen.len()
        );

        let mut feeds = Vec::with_capacity(self.config.feeds.len());
        for url in &self.config.feeds {
            let report = self.poll_feed(url, &mut history, &mut seen).await;
            feeds.push(report);
        }

        if let Err(e) = self.history.save(&history).await {
            error!("Failed to save history: {}", e);
            self.clear_requested.fetch_or(requested, Ordering::SeqCst);
            return Err(e.into());
        }
        if configured {
            if let Err(e) = self
                .history
                .set_one_shot_consumed(CLEAR_HISTORY_SWITCH, true)
                .await
            {
                error!("Failed to record the consumed clear_history switch: {}", e);
                return Err(e.into());
            }
            info!("clear_history switch consumed; later cycles keep their history");
        }

        let report = CycleReport {
            started_at,
            finished_at: Utc::now(),
            feeds,
            history_size: history.len(),
            history_cleared: clearing,
        };
        metrics::CYCLE_DURATION.observe(started.elapsed().as_secs_f64());

        info!(
            "Poll cycle finished: {} fetched, {} dispatched, {} skipped, {} failed",
            report.total_fetched(),
            report.total_dispatched(),
            report.total_skipped(),
            report.total_failed()
        );
        Ok(report)
    }

    async fn poll_feed(
        &self,
        url: &str,
        history: &mut Vec<HistoryRecord>,
        seen: &mut HashSet<String>,
    ) -> FeedReport {
        let mut report = FeedReport::new(url);
        info!("Polling feed {}", url);

        let entries = match self.feeds.fetch(url, self.config.proxy).await {
            Ok(entries) if !entries.is_empty() => entries,
            Ok(_) => {
                warn!("Feed {} returned no entries", url);
                metrics::FETCH_FAILURES.inc();
                report.fetch_error = Some("no entries".to_string());
                return report;
            }
            Err(e) => {
                error!("Failed to fetch feed {}: {}", url, e);
                metrics::FETCH_FAILURES.inc();
                report.fetch_error = Some(e.to_string());
                return report;
            }
        };
        report.fetched = entries.len();

        let filters = FeedFilters::for_url(url, &self.text_include, &self.text_exclude);

        for entry in &entries {
            let outcome = self.process_entry(entry, &filters, seen).await;
            metrics::ENTRIES_TOTAL
                .with_label_values(&[outcome.label()])
                .inc();
            report.record(&outcome);

            if let EntryOutcome::Dispatched { record, .. } = outcome {
                seen.insert(record.key.clone());
                history.push(record);
            }
        }

        info!(
            "Feed {} done: {} entries, {} dispatched, {} skipped, {} failed",
            url, report.fetched, report.dispatched, report.skipped, report.failed
        );
        report
    }

    /// Run a single entry through filtering, recognition and dispatch.
    pub async fn process_entry(
        &self,
        entry: &FeedEntry,
        filters: &FeedFilters,
        seen: &HashSet<String>,
    ) -> EntryOutcome {
        let title = entry.title.as_str();

        if title.trim().is_empty() {
            debug!("Skipping entry without title");
            return EntryOutcome::Skipped(SkipReason::EmptyTitle);
        }
        if seen.contains(title) {
            debug!("{} already processed", title);
            return EntryOutcome::Skipped(SkipReason::AlreadyProcessed);
        }

        match filters.check_text(&entry.text()) {
            FilterVerdict::Pass => {}
            FilterVerdict::IncludeMismatch => {
                info!("{} does not match include pattern", title);
                return EntryOutcome::Skipped(SkipReason::IncludeMismatch);
            }
            FilterVerdict::ExcludeMatch => {
                info!("{} matches exclude pattern", title);
                return EntryOutcome::Skipped(SkipReason::ExcludeMatch);
            }
        }

        let meta = self.classifier.parse(title, entry.description.as_deref());
        if !meta.has_name() {
            warn!("{} could not be parsed into a name", title);
            return EntryOutcome::Skipped(SkipReason::Unrecognized);
        }

        let season_episode = meta.season_episode();
        if filters.check_episode(&season_episode) != FilterVerdict::Pass {
            info!("{} ({}) is outside the feed's episode range", title, season_episode);
            return EntryOutcome::Skipped(SkipReason::EpisodeRangeMismatch);
        }

        let media = match self.classifier.recognize(&meta).await {
            Ok(Some(media)) => media,
            Ok(None) => {
                warn!("No media found for {} (parsed as '{}')", title, meta.name);
                return EntryOutcome::Skipped(SkipReason::NoMediaMatch);
            }
            Err(e) => {
                error!("Recognition of {} failed: {}", title, e);
                return EntryOutcome::Failed(format!("recognition failed: {}", e));
            }
        };

        let torrent = TorrentDescriptor::from_entry(entry, self.config.proxy);

        if self.config.torrent_filter {
            if let Some(rule_filter) = &self.rule_filter {
                if !rule_filter.accepts(&torrent, &media).await {
                    info!("{} rejected by torrent rules", title);
                    return EntryOutcome::Skipped(SkipReason::RuleFilterRejected);
                }
            }
        }

        let existence = match self.library.missing(&meta, &media).await {
            Ok(existence) => existence,
            Err(e) => {
                error!("Library check for {} failed: {}", media.title_year(), e);
                return EntryOutcome::Failed(format!("library check failed: {}", e));
            }
        };
        if existence.exists {
            info!("{} already exists in the library", media.title_year());
            return EntryOutcome::Skipped(SkipReason::AlreadyInLibrary);
        }

        let candidate = Candidate {
            entry: entry.clone(),
            meta,
            media,
            torrent,
        };

        let action = self.dispatcher.action();
        match self.dispatcher.dispatch(&candidate, &existence).await {
            Ok(DispatchOutcome::Dispatched) => {
                metrics::DISPATCHES_TOTAL
                    .with_label_values(&[action.as_str()])
                    .inc();
                let record = HistoryRecord::new(title, &candidate.meta, &candidate.media);
                self.send_notification(action, &record).await;
                EntryOutcome::Dispatched { action, record }
            }
            Ok(DispatchOutcome::AlreadyInLibrary) => {
                EntryOutcome::Skipped(SkipReason::AlreadyInLibrary)
            }
            Ok(DispatchOutcome::AlreadySubscribed) => {
                EntryOutcome::Skipped(SkipReason::AlreadySubscribed)
            }
            Err(e) => {
                error!("Failed to dispatch {}: {}", title, e);
                EntryOutcome::Failed(e.to_string())
            }
        }
    }

    async fn send_notification(&self, action: Action, record: &HistoryRecord) {
        if !self.config.notify {
            return;
        }
        let Some(notifier) = &self.notifier else {
            return;
        };

        let title = match action {
            Action::Subscribe => "Feed subscription added",
            Action::Download => "Feed download started",
        };
        notifier
            .notify(title, &format!("{} ({})", record.title, record.key))
            .await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classify::RecognizedMeta;
    use crate::testing::{
        fixtures, MockClassifier, MockFeedSource, MockLibrary, MockNotifier, MockRuleFilter,
        MockSubscriptions,
    };
    use crate::feed::FeedError;
    use crate::history::SqliteHistoryStore;
    use async_trait::async_trait;

    struct PanickingFeed;

    #[async_trait]
    impl FeedSource for PanickingFeed {
        async fn fetch(&self, _url: &str, _use_proxy: bool) -> Result<Vec<FeedEntry>, FeedError> {
            panic!("feed source blew up");
        }
    }

    struct Harness {
        feeds: Arc<MockFeedSource>,
        classifier: Arc<MockClassifier>,
        rule_filter: Arc<MockRuleFilter>,
        notifier: Arc<MockNotifier>,
        subscriptions: Arc<MockSubscriptions>,
        history: Arc<SqliteHistoryStore>,
    }

    impl Harness {
        fn new() -> Self {
            Self {
                feeds: Arc::new(MockFeedSource::new()),
                classifier: Arc::new(MockClassifier::new()),
                rule_filter: Arc::new(MockRuleFilter::new()),
                notifier: Arc::new(MockNotifier::new()),
                subscriptions: Arc::new(MockSubscriptions::new()),
                history: Arc::new(SqliteHistoryStore::in_memory().unwrap()),
            }
        }

        fn poller(&self, config: PollerConfig) -> FeedPoller {
            FeedPoller::new(
                config,
                PollerDeps {
                    feeds: self.feeds.clone(),
                    classifier: self.classifier.clone(),
                    library: Arc::new(MockLibrary::new()),
                    history: self.history.clone(),
                    subscriptions: self.subscriptions.clone(),
                    downloader: None,
                    rule_filter: Some(self.rule_filter.clone()),
                    notifier: Some(self.notifier.clone()),
                },
            )
            .unwrap()
        }
    }

    fn config(feeds: &[&str]) -> PollerConfig {
        PollerConfig {
            enabled: true,
            feeds: feeds.iter().map(|f| f.to_string()).collect(),
            ..Default::default()
        }
    }

    const FEED: &str = "https://feed.example/rss";

    #[tokio::test]
    async fn test_invalid_global_pattern_rejected() {
        let h = Harness::new();
        let result = FeedPoller::new(
            PollerConfig {
                include: "(".to_string(),
                ..config(&[FEED])
            },
            PollerDeps {
                feeds: h.feeds.clone(),
                classifier: h.classifier.clone(),
                library: Arc::new(MockLibrary::new()),
                history: h.history.clone(),
                subscriptions: h.subscriptions.clone(),
                downloader: None,
                rule_filter: None,
                notifier: None,
            },
        );
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_no_feeds_is_a_no_op() {
        let h = Harness::new();
        let poller = h.poller(PollerConfig {
            clear_history: true,
            ..config(&[])
        });

        let report = poller.run_cycle().await.unwrap();

        assert!(report.feeds.is_empty());
        assert!(poller.last_report().await.is_none());
        // The switch waits for a cycle that actually polls.
        assert!(!h.history.one_shot_consumed(CLEAR_HISTORY_SWITCH).await.unwrap());
    }

    #[tokio::test]
    async fn test_empty_title_and_seen_keys() {
        let h = Harness::new();
        let poller = h.poller(config(&[FEED]));
        let filters = FeedFilters::default();
        let seen: HashSet<String> = ["Known.Title".to_string()].into_iter().collect();

        assert_eq!(
            poller.process_entry(&FeedEntry::new("  "), &filters, &seen).await,
            EntryOutcome::Skipped(SkipReason::EmptyTitle)
        );
        assert_eq!(
            poller
                .process_entry(&FeedEntry::new("Known.Title"), &filters, &seen)
                .await,
            EntryOutcome::Skipped(SkipReason::AlreadyProcessed)
        );
    }

    #[tokio::test]
    async fn test_unparsed_title_is_unrecognized() {
        let h = Harness::new();
        h.classifier
            .set_meta("1080p.WEB-DL", RecognizedMeta::default())
            .await;
        let poller = h.poller(config(&[FEED]));

        let outcome = poller
            .process_entry(
                &FeedEntry::new("1080p.WEB-DL"),
                &FeedFilters::default(),
                &HashSet::new(),
            )
            .await;
        assert_eq!(outcome, EntryOutcome::Skipped(SkipReason::Unrecognized));
        assert!(h.classifier.recognize_calls().await.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_media_is_skipped() {
        let h = Harness::new();
        h.classifier
            .set_meta("Obscure.S01E01", RecognizedMeta::new("Obscure").with_season(1))
            .await;
        let poller = h.poller(config(&[FEED]));

        let outcome = poller
            .process_entry(
                &FeedEntry::new("Obscure.S01E01"),
                &FeedFilters::default(),
                &HashSet::new(),
            )
            .await;
        assert_eq!(outcome, EntryOutcome::Skipped(SkipReason::NoMediaMatch));
    }

    #[tokio::test]
    async fn test_recognition_error_is_failure() {
        let h = Harness::new();
        h.classifier
            .set_next_error(crate::classify::ClassifyError::RateLimited)
            .await;
        let poller = h.poller(config(&[FEED]));

        let outcome = poller
            .process_entry(
                &FeedEntry::new("Show.Name.S01E01"),
                &FeedFilters::default(),
                &HashSet::new(),
            )
            .await;
        assert!(matches!(outcome, EntryOutcome::Failed(_)));
    }

    #[tokio::test]
    async fn test_rule_filter_only_when_enabled() {
        let h = Harness::new();
        h.classifier
            .set_media("Show Name", fixtures::series_record())
            .await;
        h.rule_filter.set_accept(false).await;
        let entry = FeedEntry::new("Show.Name.S01E01");

        let poller = h.poller(PollerConfig {
            torrent_filter: true,
            ..config(&[FEED])
        });
        let outcome = poller
            .process_entry(&entry, &FeedFilters::default(), &HashSet::new())
            .await;
        assert_eq!(outcome, EntryOutcome::Skipped(SkipReason::RuleFilterRejected));

        let poller = h.poller(config(&[FEED]));
        let outcome = poller
            .process_entry(&entry, &FeedFilters::default(), &HashSet::new())
            .await;
        assert!(matches!(outcome, EntryOutcome::Dispatched { .. }));
    }

    #[tokio::test]
    async fn test_fetch_failure_moves_to_next_feed() {
        let h = Harness::new();
        h.feeds
            .set_error("https://down.example/rss", "connection refused")
            .await;
        h.feeds
            .set_entries(FEED, vec![FeedEntry::new("Show.Name.S01E01")])
            .await;
        h.classifier
            .set_media("Show Name", fixtures::series_record())
            .await;
        let poller = h.poller(config(&["https://down.example/rss", FEED]));

        let report = poller.run_cycle().await.unwrap();

        assert_eq!(report.feeds.len(), 2);
        assert!(report.feeds[0].fetch_error.is_some());
        assert_eq!(report.feeds[1].dispatched, 1);
        assert_eq!(report.history_size, 1);
        assert_eq!(poller.last_report().await, Some(report));
    }

    #[tokio::test]
    async fn test_empty_feed_counts_as_fetch_failure() {
        let h = Harness::new();
        let poller = h.poller(config(&[FEED]));

        let report = poller.run_cycle().await.unwrap();
        assert_eq!(report.feeds[0].fetch_error.as_deref(), Some("no entries"));
        assert_eq!(report.feeds[0].fetched, 0);
    }

    #[tokio::test]
    async fn test_notifications_follow_config() {
        let h = Harness::new();
        h.feeds
            .set_entries(FEED, vec![FeedEntry::new("Show.Name.S01E01")])
            .await;
        h.classifier
            .set_media("Show Name", fixtures::series_record())
            .await;

        let poller = h.poller(PollerConfig {
            notify: true,
            ..config(&[FEED])
        });
        poller.run_cycle().await.unwrap();

        let sent = h.notifier.recorded().await;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].0, "Feed subscription added");
        assert!(sent[0].1.contains("Show.Name.S01E01"));
    }

    #[tokio::test]
    async fn test_clear_request_consumed_after_save() {
        let h = Harness::new();
        h.feeds
            .set_entries(FEED, vec![FeedEntry::new("Show.Name.S01E01")])
            .await;
        h.classifier
            .set_media("Show Name", fixtures::series_record())
            .await;
        let poller = h.poller(config(&[FEED]));

        poller.run_cycle().await.unwrap();
        assert_eq!(h.history.load().await.unwrap().len(), 1);

        poller.request_clear();
        let report = poller.run_cycle().await.unwrap();

        assert!(report.history_cleared);
        assert!(!poller.clear_requested());
        // The cleared history no longer dedups the same entry.
        assert_eq!(report.total_dispatched(), 1);
        assert_eq!(h.history.load().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_panicking_cycle_clears_in_progress() {
        let h = Harness::new();
        let poller = Arc::new(
            FeedPoller::new(
                config(&[FEED]),
                PollerDeps {
                    feeds: Arc::new(PanickingFeed),
                    classifier: h.classifier.clone(),
                    library: Arc::new(MockLibrary::new()),
                    history: h.history.clone(),
                    subscriptions: h.subscriptions.clone(),
                    downloader: None,
                    rule_filter: None,
                    notifier: None,
                },
            )
            .unwrap(),
        );

        let task = tokio::spawn({
            let poller = poller.clone();
            async move { poller.run_cycle().await }
        });
        let joined = task.await;

        assert!(joined.unwrap_err().is_panic());
        assert!(!poller.cycle_in_progress());
        assert!(poller.last_report().await.is_none());

        assert!(poller.run_lock.try_lock().is_ok());
    }

    #[tokio::test]
    async fn test_run_once_pending_until_completed() {
        let h = Harness::new();
        let poller = h.poller(PollerConfig {
            run_once: true,
            ..config(&[FEED])
        });

        assert!(poller.run_once_pending().await.unwrap());
        poller.complete_run_once().await.unwrap();
        assert!(!poller.run_once_pending().await.unwrap());

        // Turning the switch off re-arms it for the next time it is on.
        let off = h.poller(config(&[FEED]));
        assert!(!off.run_once_pending().await.unwrap());
        let on_again = h.poller(PollerConfig {
            run_once: true,
            ..config(&[FEED])
        });
        assert!(on_again.run_once_pending().await.unwrap());
    }
}
