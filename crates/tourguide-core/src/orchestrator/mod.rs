//! Orchestrator - per-turn state machine
//!
//! Alternates between model calls and tool execution, applies the text
//! classifiers to free text, and decides when to retry, fall back to a full
//! replay, or give up.
//!
//! # Module Structure
//!
//! - `types`: Turn results and streaming events
//! - `core`: Orchestrator struct and builder methods
//! - `turn`: Retry budget and the branch logic shared by both loops
//! - `tool_execution`: Tool phase and replay summaries
//! - `process`: Blocking loop
//! - `stream`: Streaming loop

mod core;
mod process;
mod stream;
mod tool_execution;
mod turn;
mod types;

#[cfg(test)]
mod tests;

pub use core::Orchestrator;
pub use turn::{
    CENSORSHIP_GIVE_UP_MESSAGE, CENSORSHIP_NUDGE, CONTINUE_NUDGE, EMPTY_GIVE_UP_MESSAGE,
    FORBIDDEN_NUDGE, ITERATION_LIMIT_MESSAGE, PROMISE_NUDGE_CALL_ID, PROMISE_NUDGE_OUTPUT,
};
pub use types::{GiveUpReason, TurnEvent, TurnReply, TurnStatus};
