//! Turn results and streaming events

use serde::{Deserialize, Serialize};

/// Why a turn ended without a usable model answer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GiveUpReason {
    /// Empty responses exhausted their retries
    EmptyOutput,
    /// Self-censored responses exhausted their retries
    SelfCensorship,
    /// Model-call cap reached
    IterationLimit,
    /// Provider rate-limited the turn
    RateLimited,
    /// Access still denied after replay retries
    Forbidden,
    /// Any other provider failure
    ProviderError,
}

/// How a turn ended
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "reason")]
pub enum TurnStatus {
    /// The text is the model's answer
    Completed,
    /// The text is a fixed apology
    GaveUp(GiveUpReason),
}

/// Result of one user turn
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnReply {
    /// Text to show the customer
    pub text: String,
    /// Outcome
    pub status: TurnStatus,
    /// Model calls made
    pub iterations: u32,
}

impl TurnReply {
    /// Whether the text is a model answer
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.status == TurnStatus::Completed
    }
}

/// Incremental output of a streamed turn
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TurnEvent {
    /// Text fragment to append
    Delta(String),
    /// Everything streamed since the last discard must be cleared
    Discard,
    /// The turn is over
    Finished(TurnReply),
}
