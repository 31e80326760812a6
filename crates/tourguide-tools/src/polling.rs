//! Bounded polling of asynchronous search jobs
//!
//! Waiting happens inside a single tool call so the model spends one
//! iteration on a search instead of calling the status tool in a loop.

use crate::backend::SearchStatus;
use crate::error::Result;
use std::future::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, info};

/// Configuration for search polling
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Delay between status checks
    pub interval: Duration,
    /// Total budget before giving up
    pub max_wait: Duration,
    /// Hotels needed to return before completion
    pub min_hotels: i64,
    /// Progress (percent) needed to return before completion
    pub min_progress: i64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(3),
            max_wait: Duration::from_secs(60),
            min_hotels: 5,
            min_progress: 40,
        }
    }
}

impl PollConfig {
    /// Create a new polling configuration
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the delay between checks
    #[must_use]
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Set the total budget
    #[must_use]
    pub fn with_max_wait(mut self, max_wait: Duration) -> Self {
        self.max_wait = max_wait;
        self
    }

    /// Set the early-return thresholds
    #[must_use]
    pub fn with_partial_threshold(mut self, min_hotels: i64, min_progress: i64) -> Self {
        self.min_hotels = min_hotels;
        self.min_progress = min_progress;
        self
    }
}

/// How a poll ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// The job completed
    Finished(SearchStatus),
    /// The request id is unknown
    NotFound(SearchStatus),
    /// Enough results are in to show before completion
    Partial(SearchStatus),
    /// Budget exhausted; last status observed
    TimedOut(SearchStatus),
}

/// Poll until the job finishes, disappears, has enough partial results, or the budget runs out.
///
/// Errors from `poll` propagate immediately.
pub async fn poll_until_ready<F, Fut>(config: &PollConfig, mut poll: F) -> Result<PollOutcome>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<SearchStatus>>,
{
    let mut elapsed = Duration::ZERO;
    let mut last = SearchStatus::default();

    while elapsed < config.max_wait {
        let status = poll().await?;

        if status.is_finished() {
            return Ok(PollOutcome::Finished(status));
        }
        if status.is_not_found() {
            return Ok(PollOutcome::NotFound(status));
        }
        if status.hotels_found >= config.min_hotels && status.progress >= config.min_progress {
            info!(
                progress = status.progress,
                hotels = status.hotels_found,
                "Search ready with partial results"
            );
            return Ok(PollOutcome::Partial(status));
        }

        debug!(
            progress = status.progress,
            hotels = status.hotels_found,
            elapsed_secs = elapsed.as_secs(),
            "Search still running"
        );
        last = status;
        sleep(config.interval).await;
        elapsed += config.interval;
    }

    Ok(PollOutcome::TimedOut(last))
}
