//! Pre-search validation against what the customer actually said
//!
//! Both checks read the replay log rather than the model's arguments: the
//! model is prone to filling slots with defaults the customer never gave.

pub mod resorts;
pub mod slots;

pub use resorts::{ResortMention, ResortTable};
pub use slots::{MissingSlot, Slot, SlotGate, SlotStatus};

use crate::history::is_tool_summary;
use serde_json::{Map, Value};
use tourguide_llm::Message;

/// User entries are read from this many most recent log entries
pub const USER_WINDOW: usize = 20;

/// Assistant entries are read from this many most recent log entries
pub const ASSISTANT_WINDOW: usize = 10;

/// Lowercased user text of the recent log and, separately, of the last user entry
pub(crate) fn recent_user_text(history: &[Message]) -> (String, String) {
    let start = history.len().saturating_sub(USER_WINDOW);
    let messages: Vec<&str> = history[start..]
        .iter()
        .filter(|m| m.is_user() && !m.content.is_empty())
        .map(|m| m.content.as_str())
        .collect();
    let last = messages.last().map(|m| m.to_lowercase()).unwrap_or_default();
    (messages.join(" ").to_lowercase(), last)
}

/// Lowercased assistant text of the recent log; tool summaries are not speech
pub(crate) fn recent_assistant_text(history: &[Message]) -> String {
    let start = history.len().saturating_sub(ASSISTANT_WINDOW);
    history[start..]
        .iter()
        .filter(|m| m.is_assistant() && !m.content.is_empty() && !is_tool_summary(m))
        .map(|m| m.content.as_str())
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// An argument counts as given when it is not null, empty, zero or false
pub(crate) fn has_arg(args: &Map<String, Value>, key: &str) -> bool {
    match args.get(key) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.trim().is_empty(),
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::Bool(b)) => *b,
        Some(Value::Array(items)) => !items.is_empty(),
        Some(Value::Object(map)) => !map.is_empty(),
    }
}
