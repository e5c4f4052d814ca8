//! Scheduled execution of poll cycles.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Mutex;
use tokio_cron_scheduler::{Job, JobScheduler, JobSchedulerError};
use tracing::{debug, error, info, warn};

use super::{CycleReport, FeedPoller, PollerError};

const JOB_NAME: &str = "feed-poll";
const RUN_ONCE_DELAY: Duration = Duration::from_secs(3);

/// Errors raised while setting up the schedule.
#[derive(Debug, Error)]
pub enum SchedulerError {
    #[error("Invalid cron expression '{expression}': {reason}")]
    InvalidCron { expression: String, reason: String },

    #[error("Interval must be at least one minute")]
    InvalidInterval,

    #[error("Job scheduler error: {0}")]
    Job(#[from] JobSchedulerError),

    #[error("Failed to read startup state: {0}")]
    Poller(#[from] PollerError),
}

/// Snapshot returned by [`FeedScheduler::status`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PollerStatus {
    /// Whether scheduled jobs are registered and running.
    pub running: bool,
    pub schedule: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_report: Option<CycleReport>,
    pub cycle_in_progress: bool,
}

/// Turn a 5-field cron expression into the 6-field form the job scheduler
/// expects by prepending a `0` seconds field. 6- and 7-field expressions
/// pass through unchanged.
pub fn normalize_cron(expression: &str) -> Result<String, SchedulerError> {
    let invalid = |reason: &str| SchedulerError::InvalidCron {
        expression: expression.to_string(),
        reason: reason.to_string(),
    };

    let fields: Vec<&str> = expression.split_whitespace().collect();
    if let Some(field) = fields.iter().find(|f| !f.chars().all(is_cron_char)) {
        return Err(invalid(&format!("unexpected characters in field '{}'", field)));
    }

    match fields.len() {
        5 => Ok(format!("0 {}", fields.join(" "))),
        6 | 7 => Ok(fields.join(" ")),
        n => Err(invalid(&format!("expected 5 or 6 fields, got {}", n))),
    }
}

fn is_cron_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '*' | ',' | '-' | '/' | '?' | '#')
}

/// Drives a [`FeedPoller`] on its configured schedule.
pub struct FeedScheduler {
    poller: Arc<FeedPoller>,
    scheduler: Mutex<Option<JobScheduler>>,
    running: AtomicBool,
}

impl FeedScheduler {
    pub fn new(poller: Arc<FeedPoller>) -> Self {
        Self {
            poller,
            scheduler: Mutex::new(None),
            running: AtomicBool::new(false),
        }
    }

    pub fn poller(&self) -> &Arc<FeedPoller> {
        &self.poller
    }

    /// Register the poll jobs and start the job scheduler.
    ///
    /// The recurring job needs `enabled`; the `run_once` startup cycle is
    /// registered on its own whenever it has not run yet. Does nothing when
    /// neither applies or when already started.
    pub async fn start(&self) -> Result<(), SchedulerError> {
        let config = self.poller.config();
        if self.running.load(Ordering::SeqCst) {
            warn!("Feed scheduler already running");
            return Ok(());
        }

        let run_once = self.poller.run_once_pending().await?;
        if config.run_once && !run_once {
            info!("Startup poll cycle already ran, not repeating it");
        }
        if !config.enabled && !run_once {
            info!("Feed poller disabled, not scheduling");
            return Ok(());
        }

        let scheduler = JobScheduler::new().await?;

        if config.enabled {
            let job = match config.cron_expression() {
                Some(cron) => {
                    let expression = normalize_cron(cron)?;
                    let poller = self.poller.clone();
                    Job::new_async(expression.as_str(), move |_uuid, _l| {
                        let poller = poller.clone();
                        Box::pin(async move { run_scheduled(&poller).await })
                    })?
                }
                None => {
                    if config.interval_minutes == 0 {
                        return Err(SchedulerError::InvalidInterval);
                    }
                    let every = Duration::from_secs(u64::from(config.interval_minutes) * 60);
                    let poller = self.poller.clone();
                    Job::new_repeated_async(every, move |_uuid, _l| {
                        let poller = poller.clone();
                        Box::pin(async move { run_scheduled(&poller).await })
                    })?
                }
            };
            let id = scheduler.add(job).await?;
            debug!("Registered {} job {}", JOB_NAME, id);
        } else {
            info!("Feed poller disabled, scheduling the startup cycle only");
        }

        if run_once {
            let poller = self.poller.clone();
            let once = Job::new_one_shot_async(RUN_ONCE_DELAY, move |_uuid, _l| {
                let poller = poller.clone();
                Box::pin(async move { run_startup(&poller).await })
            })?;
            scheduler.add(once).await?;
        }

        scheduler.start().await?;
        *self.scheduler.lock().await = Some(scheduler);
        self.running.store(true, Ordering::SeqCst);

        if config.enabled {
            info!(
                "Feed poller scheduled ({}), {} feeds",
                config.schedule_description(),
                config.feeds.len()
            );
        }
        Ok(())
    }

    /// Shut the job scheduler down. A cycle already running finishes.
    pub async fn stop(&self) -> Result<(), SchedulerError> {
        let Some(mut scheduler) = self.scheduler.lock().await.take() else {
            return Ok(());
        };
        self.running.store(false, Ordering::SeqCst);
        scheduler.shutdown().await?;
        info!("Feed scheduler stopped");
        Ok(())
    }

    /// Run a cycle now, waiting for any running one to finish first.
    pub async fn run_now(&self) -> Result<CycleReport, PollerError> {
        info!("Running poll cycle on demand");
        self.poller.run_cycle().await
    }

    pub async fn status(&self) -> PollerStatus {
        PollerStatus {
            running: self.running.load(Ordering::SeqCst),
            schedule: self.poller.config().schedule_description(),
            last_report: self.poller.last_report().await,
            cycle_in_progress: self.poller.cycle_in_progress(),
        }
    }
}

async fn run_scheduled(poller: &FeedPoller) {
    if let Err(e) = poller.run_cycle().await {
        error!("Scheduled poll cycle failed: {}", e);
    }
}

/// The `run_once` cycle. Only a cycle that saved its history counts as run.
async fn run_startup(poller: &FeedPoller) {
    info!("Running startup poll cycle");
    if let Err(e) = poller.run_cycle().await {
        error!("Startup poll cycle failed: {}", e);
        return;
    }
    if let Err(e) = poller.complete_run_once().await {
        error!("Failed to record the startup poll cycle: {}", e);
    }
}
