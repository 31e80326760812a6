//! Classifiers for anomalous assistant text
//!
//! - self-censorship: the model refuses an ordinary travel request
//! - promised action: the model narrates a search instead of calling a tool
//! - duplicated output: generation restarted from the top after a broken character

use crate::matcher::{PhraseMatcher, TextMatcher};
use std::sync::Arc;
use tracing::debug;

/// Refusals produced by upstream moderation on a confused context
pub const SELF_CENSORSHIP_PHRASES: &[&str] = &[
    "не могу обсуждать эту тему",
    "я не могу обсуждать",
    "не могу помочь с этим",
    "давайте поговорим о чём-нибудь",
    "поговорим о чём-нибудь ещё",
    "я не могу отвечать на этот вопрос",
];

/// Announcements of an action that must be a tool call instead
pub const PROMISED_ACTION_PHRASES: &[&str] = &[
    "начну поиск",
    "начинаю поиск",
    "запускаю поиск",
    "приступаю к поиску",
    "сейчас поищу",
    "сейчас найду",
    "сейчас подберу",
    "сейчас подбираю",
    "начну подбор",
    "начинаю подбор",
    "подберу для вас",
    "поищу для вас",
    "найду для вас",
    "ищу подходящие",
    "ищу для вас",
    "ищу варианты",
    "давайте поищу",
    "давайте найду",
    "давайте подберу",
    "сейчас посмотрю",
    "сейчас проверю",
    "сейчас узнаю",
    "сейчас уточню",
    "сейчас загружу",
    "момент, ищу",
    "секунду, подбираю",
    "минуту, проверяю",
    "одну секунду",
    "один момент",
];

/// Shorter texts are never deduplicated
const DEDUP_MIN_CHARS: usize = 100;

/// A first line shorter than this is too generic to search for
const DEDUP_MIN_FIRST_LINE_CHARS: usize = 10;

/// Characters stripped before a detected restart
const RESTART_ARTIFACTS: &[char] = &['\u{fffd}', '\n', ' ', '\t'];

/// Stateless classifier over assistant text with swappable phrase sets
#[derive(Debug, Clone)]
pub struct TextClassifier {
    censorship: Arc<dyn TextMatcher>,
    promise: Arc<dyn TextMatcher>,
}

impl Default for TextClassifier {
    fn default() -> Self {
        Self {
            censorship: Arc::new(PhraseMatcher::new(SELF_CENSORSHIP_PHRASES)),
            promise: Arc::new(PhraseMatcher::new(PROMISED_ACTION_PHRASES)),
        }
    }
}

impl TextClassifier {
    /// Classifier with the built-in phrase sets
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the self-censorship matcher
    #[must_use]
    pub fn with_censorship_matcher(mut self, matcher: Arc<dyn TextMatcher>) -> Self {
        self.censorship = matcher;
        self
    }

    /// Replace the promised-action matcher
    #[must_use]
    pub fn with_promise_matcher(mut self, matcher: Arc<dyn TextMatcher>) -> Self {
        self.promise = matcher;
        self
    }

    /// Text is a moderation refusal. Leading markdown heading marks are ignored.
    #[must_use]
    pub fn is_self_censorship(&self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        let normalized = text.to_lowercase();
        let normalized = normalized.trim().trim_start_matches('#').trim();
        self.censorship.matches(normalized)
    }

    /// Text announces an action without performing it
    #[must_use]
    pub fn is_promised_action(&self, text: &str) -> bool {
        if text.is_empty() {
            return false;
        }
        self.promise.matches(text.to_lowercase().trim())
    }
}

/// Cut a response at the point where generation restarted from its first line.
///
/// No-op for texts under 100 characters, texts without a line break in the
/// first 5 characters onwards, and first lines under 10 characters.
#[must_use]
pub fn dedup_response(text: &str) -> String {
    if text.chars().count() < DEDUP_MIN_CHARS {
        return text.to_string();
    }
    let Some(newline) = text.find('\n') else {
        return text.to_string();
    };
    if text[..newline].chars().count() < 5 {
        return text.to_string();
    }
    let first_line = text[..newline].trim();
    if first_line.chars().count() < DEDUP_MIN_FIRST_LINE_CHARS {
        return text.to_string();
    }

    match text[newline + 1..].find(first_line) {
        Some(offset) => {
            let restart = newline + 1 + offset;
            let clean = text[..restart].trim_end_matches(RESTART_ARTIFACTS);
            debug!(
                restart,
                before = text.len(),
                after = clean.len(),
                "Removed duplicated response tail"
            );
            clean.to_string()
        }
        None => text.to_string(),
    }
}
