//! Conversation history
//!
//! Two representations of the context coexist and exactly one is active:
//! the compact one (continuation pointer plus the items produced since) and
//! the replay one (the full bounded log, optionally followed by a nudge).

use tourguide_llm::{InputItem, Message};
use tracing::{debug, warn};

/// Leading line of a condensed tool summary in the replay log
pub const TOOL_SUMMARY_PREFIX: &str = "Результаты запросов:\n";

/// Whether a log entry is a tool summary rather than something said to the customer
#[must_use]
pub fn is_tool_summary(message: &Message) -> bool {
    message.is_assistant() && message.content.starts_with(TOOL_SUMMARY_PREFIX)
}

/// Which context the next model call receives
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContextMode {
    /// Continue from the previous response
    Compact {
        /// Continuation pointer; `None` before the first persisted response
        previous_response_id: Option<String>,
        /// Items produced since the pointer
        pending: Vec<InputItem>,
    },
    /// Resend the whole log
    Replay {
        /// Extra user message appended after the log, never stored in it
        nudge: Option<String>,
    },
}

impl Default for ContextMode {
    fn default() -> Self {
        Self::Compact {
            previous_response_id: None,
            pending: Vec::new(),
        }
    }
}

/// Input of one model call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveContext {
    /// Pointer to continue from
    pub previous_response_id: Option<String>,
    /// Input items
    pub input: Vec<InputItem>,
}

/// Replay log plus the active context mode
#[derive(Debug, Clone)]
pub struct HistoryManager {
    log: Vec<Message>,
    mode: ContextMode,
    limit: usize,
}

impl HistoryManager {
    /// Create an empty history bounded to `limit` log entries
    #[must_use]
    pub fn new(limit: usize) -> Self {
        Self {
            log: Vec::new(),
            mode: ContextMode::default(),
            limit,
        }
    }

    /// Start a user turn.
    ///
    /// With a continuation pointer the turn continues compactly from it. Without
    /// one, a conversation that already has earlier entries is replayed in full.
    pub fn begin_turn(&mut self, text: &str) {
        self.append(Message::user(text));
        let pointer = self.previous_response_id().map(str::to_string);
        self.mode = match pointer {
            Some(id) => ContextMode::Compact {
                previous_response_id: Some(id),
                pending: vec![InputItem::user(text)],
            },
            None if self.log.len() > 1 => ContextMode::Replay { nudge: None },
            None => ContextMode::Compact {
                previous_response_id: None,
                pending: vec![InputItem::user(text)],
            },
        };
    }

    /// Append to the replay log, trimming when over the bound
    pub fn append(&mut self, message: Message) {
        self.log.push(message);
        self.trim_if_needed();
    }

    /// Keep the first 2 entries and the most recent `limit - 2`.
    ///
    /// Returns the number of removed entries. The compact context is untouched.
    pub fn trim_if_needed(&mut self) -> usize {
        if self.log.len() <= self.limit {
            return 0;
        }
        let before = self.log.len();
        if self.limit <= 2 {
            self.log.drain(..before - self.limit);
        } else {
            let tail_start = before - (self.limit - 2);
            self.log.drain(2..tail_start);
        }
        let removed = before - self.log.len();
        debug!(removed, kept = self.log.len(), "Trimmed replay log");
        removed
    }

    /// Input for the next model call
    #[must_use]
    pub fn active_context(&self) -> ActiveContext {
        match &self.mode {
            ContextMode::Compact {
                previous_response_id,
                pending,
            } => ActiveContext {
                previous_response_id: previous_response_id.clone(),
                input: pending.clone(),
            },
            ContextMode::Replay { nudge } => {
                let mut input: Vec<InputItem> =
                    self.log.iter().cloned().map(InputItem::from).collect();
                if let Some(nudge) = nudge {
                    input.push(InputItem::user(nudge.as_str()));
                }
                ActiveContext {
                    previous_response_id: None,
                    input,
                }
            }
        }
    }

    /// Drop the continuation pointer and resend the full log next time
    pub fn switch_to_replay(&mut self, nudge: Option<String>) {
        if matches!(
            self.mode,
            ContextMode::Compact {
                previous_response_id: Some(_),
                ..
            }
        ) {
            debug!("Dropping continuation pointer for replay");
        }
        self.mode = ContextMode::Replay { nudge };
    }

    /// Persist a response id as the new pointer, only when the response had output.
    ///
    /// Returns whether the pointer was persisted.
    pub fn record_response(&mut self, response_id: &str, has_output: bool) -> bool {
        if !has_output || response_id.is_empty() {
            warn!(
                response_id,
                "Response without output items, continuation pointer not persisted"
            );
            return false;
        }
        self.mode = ContextMode::Compact {
            previous_response_id: Some(response_id.to_string()),
            pending: Vec::new(),
        };
        true
    }

    /// Items to send with the next compact call.
    ///
    /// In replay mode this starts a pointerless compact context.
    pub fn continue_with(&mut self, items: Vec<InputItem>) {
        match &mut self.mode {
            ContextMode::Compact { pending, .. } => *pending = items,
            ContextMode::Replay { .. } => {
                self.mode = ContextMode::Compact {
                    previous_response_id: None,
                    pending: items,
                }
            }
        }
    }

    /// Commit the final assistant text of a turn and clear pending items
    pub fn commit_assistant(&mut self, text: &str) {
        self.append(Message::assistant(text));
        if let ContextMode::Compact { pending, .. } = &mut self.mode {
            pending.clear();
        }
    }

    /// Record a condensed tool summary so replay keeps tool-derived context
    pub fn record_tool_summary(&mut self, summary: String) {
        self.append(Message::assistant(summary));
    }

    /// Current continuation pointer
    #[must_use]
    pub fn previous_response_id(&self) -> Option<&str> {
        match &self.mode {
            ContextMode::Compact {
                previous_response_id,
                ..
            } => previous_response_id.as_deref(),
            ContextMode::Replay { .. } => None,
        }
    }

    /// Active mode
    #[must_use]
    pub fn mode(&self) -> &ContextMode {
        &self.mode
    }

    /// Replay log
    #[must_use]
    pub fn log(&self) -> &[Message] {
        &self.log
    }

    /// Clear everything
    pub fn reset(&mut self) {
        self.log.clear();
        self.mode = ContextMode::default();
    }
}
