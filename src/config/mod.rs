//! Application configuration
//!
//! TOML sections map onto the library configs of the three crates.

mod loader;

pub use loader::{load_config, load_config_from_str, DEFAULT_CONFIG};

use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use tourguide_core::OrchestratorConfig;
use tourguide_llm::util::mask_api_key;
use tourguide_llm::ResponsesConfig;
use tourguide_tools::{PollConfig, TourVisorConfig};

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub llm: LlmSettings,
    pub tourvisor: TourVisorSettings,
    #[serde(default)]
    pub orchestrator: OrchestratorConfig,
    #[serde(default)]
    pub polling: PollingSettings,
}

/// `[llm]` section
#[derive(Clone, Deserialize)]
pub struct LlmSettings {
    pub base_url: String,
    #[serde(default)]
    pub folder_id: String,
    #[serde(default)]
    pub api_key: String,
    pub model: String,
    #[serde(default = "default_temperature")]
    pub temperature: f32,
    #[serde(default = "default_max_output_tokens")]
    pub max_output_tokens: u32,
    #[serde(default = "default_llm_timeout")]
    pub timeout_secs: u64,
    #[serde(default)]
    pub instructions_path: String,
    #[serde(default = "default_true")]
    pub web_search: bool,
    #[serde(default = "default_context_size")]
    pub web_search_context_size: String,
}

fn default_temperature() -> f32 {
    0.3
}

fn default_max_output_tokens() -> u32 {
    4000
}

fn default_llm_timeout() -> u64 {
    120
}

fn default_true() -> bool {
    true
}

fn default_context_size() -> String {
    "medium".to_string()
}

// SECURITY: Custom Debug implementation to mask API key
impl fmt::Debug for LlmSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LlmSettings")
            .field("base_url", &self.base_url)
            .field("folder_id", &self.folder_id)
            .field("api_key", &mask_api_key(&self.api_key))
            .field("model", &self.model)
            .field("temperature", &self.temperature)
            .field("max_output_tokens", &self.max_output_tokens)
            .field("web_search", &self.web_search)
            .finish()
    }
}

/// `[tourvisor]` section
#[derive(Clone, Deserialize)]
pub struct TourVisorSettings {
    pub base_url: String,
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub password: String,
    #[serde(default = "default_tourvisor_timeout")]
    pub timeout_secs: u64,
}

fn default_tourvisor_timeout() -> u64 {
    30
}

impl fmt::Debug for TourVisorSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TourVisorSettings")
            .field("base_url", &self.base_url)
            .field("login", &self.login)
            .field("password", &"****")
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

/// `[polling]` section
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PollingSettings {
    pub interval_secs: u64,
    pub max_wait_secs: u64,
    pub min_hotels: i64,
    pub min_progress: i64,
}

impl Default for PollingSettings {
    fn default() -> Self {
        let poll = PollConfig::default();
        Self {
            interval_secs: poll.interval.as_secs(),
            max_wait_secs: poll.max_wait.as_secs(),
            min_hotels: poll.min_hotels,
            min_progress: poll.min_progress,
        }
    }
}

impl AppConfig {
    /// Model provider settings; fails when credentials are missing
    pub fn responses_config(&self) -> Result<ResponsesConfig> {
        if self.llm.api_key.is_empty() || self.llm.folder_id.is_empty() {
            bail!("llm.api_key and llm.folder_id must be set (TOURGUIDE_LLM__API_KEY, TOURGUIDE_LLM__FOLDER_ID)");
        }
        Ok(
            ResponsesConfig::new(self.llm.api_key.clone(), self.llm.folder_id.clone())
                .with_base_url(self.llm.base_url.clone())
                .with_model(self.llm.model.clone())
                .with_timeout(Duration::from_secs(self.llm.timeout_secs)),
        )
    }

    /// Search backend settings; fails when credentials are missing
    pub fn tourvisor_config(&self) -> Result<TourVisorConfig> {
        if self.tourvisor.login.is_empty() || self.tourvisor.password.is_empty() {
            bail!("tourvisor.login and tourvisor.password must be set (TOURGUIDE_TOURVISOR__LOGIN, TOURGUIDE_TOURVISOR__PASSWORD)");
        }
        Ok(
            TourVisorConfig::new(self.tourvisor.login.clone(), self.tourvisor.password.clone())
                .with_base_url(self.tourvisor.base_url.clone())
                .with_timeout(Duration::from_secs(self.tourvisor.timeout_secs)),
        )
    }

    /// Orchestrator limits with the model sampling settings folded in
    #[must_use]
    pub fn orchestrator_config(&self) -> OrchestratorConfig {
        let web_search = self
            .llm
            .web_search
            .then(|| self.llm.web_search_context_size.clone());
        self.orchestrator
            .clone()
            .with_sampling(self.llm.temperature, self.llm.max_output_tokens)
            .with_web_search(web_search)
    }

    #[must_use]
    pub fn poll_config(&self) -> PollConfig {
        PollConfig::new()
            .with_interval(Duration::from_secs(self.polling.interval_secs))
            .with_max_wait(Duration::from_secs(self.polling.max_wait_secs))
            .with_partial_threshold(self.polling.min_hotels, self.polling.min_progress)
    }

    /// System instructions read from `llm.instructions_path`, if set
    pub fn instructions(&self) -> Result<Option<String>> {
        if self.llm.instructions_path.is_empty() {
            return Ok(None);
        }
        let text = std::fs::read_to_string(&self.llm.instructions_path).with_context(|| {
            format!("Failed to read instructions from {}", self.llm.instructions_path)
        })?;
        Ok(Some(text))
    }
}
