//! Tourguide Core - Dialogue Orchestration
//!
//! This crate provides the conversation engine of the travel assistant,
//! including:
//! - Orchestrator: per-turn loop over model calls and tool execution
//! - History: bounded log with compact (pointer) and replay context modes
//! - Gate: booking-slot and resort checks in front of the tour search
//! - Dispatcher: tool-call routing, argument repair and result rendering
//! - Classifiers: self-censorship, promised-action and duplicated-output detection
//! - Metrics: per-conversation anomaly counters

#![forbid(unsafe_code)]

pub mod classifiers;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod gate;
pub mod history;
pub mod matcher;
pub mod metrics;
pub mod orchestrator;

pub use classifiers::{dedup_response, TextClassifier};
pub use config::OrchestratorConfig;
pub use dispatcher::{ToolDispatcher, ToolOutput};
pub use error::{Error, Result, UserFriendlyError};
pub use gate::{MissingSlot, ResortMention, ResortTable, SlotGate, SlotStatus};
pub use history::{ActiveContext, ContextMode, HistoryManager};
pub use matcher::{PatternMatcher, PhraseMatcher, TextMatcher};
pub use metrics::{MetricsSnapshot, OrchestratorMetrics};
pub use orchestrator::{GiveUpReason, Orchestrator, TurnEvent, TurnReply, TurnStatus};
