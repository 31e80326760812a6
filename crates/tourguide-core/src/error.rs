//! Error types for tourguide-core
//!
//! Nothing in a turn surfaces these to the customer directly: the orchestrator
//! renders them through [`UserFriendlyError`] into short Russian messages.

use thiserror::Error;

/// Core error type
#[derive(Debug, Error)]
pub enum Error {
    /// Model provider error
    #[error("llm error: {0}")]
    Llm(#[from] tourguide_llm::Error),

    /// Tool backend error
    #[error("tool error: {0}")]
    Tool(#[from] tourguide_tools::Error),

    /// Invalid settings
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Internal error (serialization, broken invariants)
    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;

/// Customer-facing rendering of an error
pub trait UserFriendlyError {
    /// Short, non-technical message
    fn user_message(&self) -> String;
}

/// Shown when the provider rate-limits the turn
pub const RATE_LIMITED_MESSAGE: &str =
    "Сервис временно перегружен. Подождите несколько секунд и повторите.";

/// Shown when access is still denied after replay retries
pub const FORBIDDEN_MESSAGE: &str =
    "Извините, произошла техническая ошибка. Попробуйте переформулировать запрос или начните новый чат.";

/// Shown for any other failure
pub const GENERIC_FAILURE_MESSAGE: &str =
    "Произошла временная ошибка. Попробуйте ещё раз или начните новый чат.";

impl UserFriendlyError for Error {
    fn user_message(&self) -> String {
        match self {
            Error::Llm(tourguide_llm::Error::RateLimit) => RATE_LIMITED_MESSAGE.to_string(),
            Error::Llm(tourguide_llm::Error::Forbidden(_)) => FORBIDDEN_MESSAGE.to_string(),
            _ => GENERIC_FAILURE_MESSAGE.to_string(),
        }
    }
}
