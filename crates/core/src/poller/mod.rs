//! Feed polling.
//!
//! [`FeedPoller`] runs one cycle over every configured feed: fetch, filter,
//! classify, check the library, dispatch, and persist the history of what
//! was dispatched. [`FeedScheduler`] runs cycles on the configured cron
//! expression or interval.

mod config;
mod cycle;
mod scheduler;
mod types;

pub use config::PollerConfig;
pub use cycle::{FeedPoller, PollerDeps};
pub use scheduler::{normalize_cron, FeedScheduler, PollerStatus, SchedulerError};
pub use types::*;
