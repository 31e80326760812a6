//! Orchestrator core structure
//!
//! Contains the `Orchestrator` struct, its builder methods and per-turn setup.

use crate::classifiers::TextClassifier;
use crate::config::OrchestratorConfig;
use crate::dispatcher::ToolDispatcher;
use crate::gate::SlotGate;
use crate::history::HistoryManager;
use crate::metrics::{MetricsSnapshot, OrchestratorMetrics};
use chrono::NaiveDate;
use std::sync::Arc;
use tourguide_llm::{ResponseRequest, ResponsesProvider, ToolSpec};
use tourguide_tools::{tool_specs, PollConfig, TourCard, TourSearchBackend};
use tracing::info;

/// One conversation: history, tool dispatcher and the per-turn state machine.
///
/// Turns take `&mut self`, so a second turn cannot start while one is running.
pub struct Orchestrator {
    pub(crate) provider: Arc<dyn ResponsesProvider>,
    pub(crate) dispatcher: ToolDispatcher,
    pub(crate) history: HistoryManager,
    pub(crate) classifier: TextClassifier,
    pub(crate) metrics: OrchestratorMetrics,
    pub(crate) config: OrchestratorConfig,
    pub(crate) instructions: Option<String>,
    pub(crate) tools: Vec<ToolSpec>,
    pub(crate) model: Option<String>,
}

impl Orchestrator {
    /// Create an orchestrator with the full tool catalog
    #[must_use]
    pub fn new(
        provider: Arc<dyn ResponsesProvider>,
        backend: Arc<dyn TourSearchBackend>,
        config: OrchestratorConfig,
    ) -> Self {
        let metrics = OrchestratorMetrics::new();
        info!(
            provider = provider.name(),
            max_iterations = config.max_iterations,
            web_search = ?config.web_search,
            "Orchestrator created"
        );
        Self {
            dispatcher: ToolDispatcher::new(backend, metrics.clone()),
            history: HistoryManager::new(config.history_limit),
            classifier: TextClassifier::default(),
            tools: tool_specs(config.web_search.as_deref()),
            provider,
            metrics,
            config,
            instructions: None,
            model: None,
        }
    }

    /// Set the system instructions
    #[must_use]
    pub fn with_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.instructions = Some(instructions.into());
        self
    }

    /// Replace the tool list offered to the model
    #[must_use]
    pub fn with_tools(mut self, tools: Vec<ToolSpec>) -> Self {
        self.tools = tools;
        self
    }

    /// Override the provider's default model
    #[must_use]
    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = Some(model.into());
        self
    }

    /// Replace the text classifier
    #[must_use]
    pub fn with_classifier(mut self, classifier: TextClassifier) -> Self {
        self.classifier = classifier;
        self
    }

    /// Replace the slot gate
    #[must_use]
    pub fn with_gate(mut self, gate: SlotGate) -> Self {
        self.dispatcher = self.dispatcher.with_gate(gate);
        self
    }

    /// Set the search polling budget
    #[must_use]
    pub fn with_poll_config(mut self, poll: PollConfig) -> Self {
        self.dispatcher = self.dispatcher.with_poll_config(poll);
        self
    }

    /// Pin the current date used by the tools
    #[must_use]
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.dispatcher = self.dispatcher.with_today(today);
        self
    }

    /// Counter values
    #[must_use]
    pub fn metrics(&self) -> MetricsSnapshot {
        self.metrics.snapshot()
    }

    /// Live counters, shared with the dispatcher
    #[must_use]
    pub fn metrics_handle(&self) -> &OrchestratorMetrics {
        &self.metrics
    }

    /// Conversation history
    #[must_use]
    pub fn history(&self) -> &HistoryManager {
        &self.history
    }

    /// Cards produced by the last turn; each card is handed out once
    pub fn take_pending_cards(&mut self) -> Vec<TourCard> {
        self.dispatcher.take_pending_cards()
    }

    /// Start the conversation over. Counters are kept.
    pub fn reset(&mut self) {
        self.history.reset();
        self.dispatcher.reset();
        info!("Conversation reset");
    }

    pub(crate) fn begin_turn(&mut self, text: &str) {
        self.dispatcher.clear_pending_cards();
        self.metrics.total_messages.inc();
        self.history.begin_turn(text);
    }

    pub(crate) fn build_request(&self) -> ResponseRequest {
        let context = self.history.active_context();
        let mut request = ResponseRequest::new(context.input)
            .with_tools(self.tools.clone())
            .with_temperature(self.config.temperature)
            .with_max_output_tokens(self.config.max_output_tokens)
            .with_previous_response_id(context.previous_response_id);
        if let Some(instructions) = &self.instructions {
            request = request.with_instructions(instructions.clone());
        }
        if let Some(model) = &self.model {
            request = request.with_model(model.clone());
        }
        request
    }
}

impl std::fmt::Debug for Orchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Orchestrator")
            .field("provider", &self.provider.name())
            .field("dispatcher", &self.dispatcher)
            .field("history_len", &self.history.log().len())
            .field("tools", &self.tools.len())
            .finish()
    }
}
