//! Orchestrator limits and model settings

use serde::Deserialize;
use std::time::Duration;

/// Per-turn limits and request settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Model calls allowed in one turn
    pub max_iterations: u32,
    /// Empty responses tolerated; the turn gives up on reaching this count
    pub max_empty_retries: u32,
    /// Self-censored responses tolerated; the turn gives up on reaching this count
    pub max_censorship_retries: u32,
    /// On reaching this many promised-action responses the text is returned as is
    pub max_promise_retries: u32,
    /// Replay retries after an access/moderation denial
    pub max_forbidden_retries: u32,
    /// Replay log bound
    pub history_limit: usize,
    /// Wait before retrying when the previous response is still generating
    pub in_progress_wait_ms: u64,
    /// Wait after a web-search-only response
    pub web_search_wait_ms: u64,
    /// Sampling temperature
    pub temperature: f32,
    /// Output token cap
    pub max_output_tokens: u32,
    /// Web search context size (`low`, `medium`, `high`); `None` disables web search
    pub web_search: Option<String>,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            max_iterations: 15,
            max_empty_retries: 3,
            max_censorship_retries: 3,
            max_promise_retries: 2,
            max_forbidden_retries: 2,
            history_limit: 40,
            in_progress_wait_ms: 2000,
            web_search_wait_ms: 1000,
            temperature: 0.3,
            max_output_tokens: 4000,
            web_search: Some("medium".to_string()),
        }
    }
}

impl OrchestratorConfig {
    /// Create a configuration with default limits
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the iteration cap
    #[must_use]
    pub fn with_max_iterations(mut self, max_iterations: u32) -> Self {
        self.max_iterations = max_iterations;
        self
    }

    /// Set the replay log bound
    #[must_use]
    pub fn with_history_limit(mut self, history_limit: usize) -> Self {
        self.history_limit = history_limit;
        self
    }

    /// Set both provider waits
    #[must_use]
    pub fn with_waits(mut self, in_progress: Duration, web_search: Duration) -> Self {
        self.in_progress_wait_ms = in_progress.as_millis() as u64;
        self.web_search_wait_ms = web_search.as_millis() as u64;
        self
    }

    /// Enable web search with the given context size, or disable it
    #[must_use]
    pub fn with_web_search(mut self, context_size: Option<String>) -> Self {
        self.web_search = context_size;
        self
    }

    /// Set sampling parameters
    #[must_use]
    pub fn with_sampling(mut self, temperature: f32, max_output_tokens: u32) -> Self {
        self.temperature = temperature;
        self.max_output_tokens = max_output_tokens;
        self
    }

    /// Wait used when the previous response is still generating
    #[must_use]
    pub fn in_progress_wait(&self) -> Duration {
        Duration::from_millis(self.in_progress_wait_ms)
    }

    /// Wait used after a response carrying only a web search
    #[must_use]
    pub fn web_search_wait(&self) -> Duration {
        Duration::from_millis(self.web_search_wait_ms)
    }
}
