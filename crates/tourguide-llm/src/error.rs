//! Error types for tourguide-llm

use crate::util::sanitize_error_for_user;
use thiserror::Error;

/// Model provider error type
#[derive(Debug, Error)]
pub enum Error {
    /// Provider not configured
    #[error("provider not configured: {0}")]
    NotConfigured(String),

    /// Rate limit exceeded (HTTP 429)
    #[error("rate limit exceeded")]
    RateLimit,

    /// Access denied or content moderation (HTTP 403)
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The continuation pointer refers to a response that failed upstream
    #[error("previous response status failed: {0}")]
    PreviousResponseFailed(String),

    /// The continuation pointer refers to a response that is still being generated
    #[error("previous response is in_progress: {0}")]
    InProgress(String),

    /// Any other API error
    #[error("api error ({status}): {message}")]
    Api {
        /// HTTP status code
        status: u16,
        /// Sanitized error body
        message: String,
    },

    /// Network error
    #[error("network error: {0}")]
    Network(String),

    /// Timeout
    #[error("timeout after {0}ms")]
    Timeout(u64),

    /// Invalid response
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Request or response (de)serialization failed
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    /// Classify a non-success HTTP response.
    ///
    /// Body markers win over the bare status code, since the upstream reports a
    /// failed or unfinished continuation pointer as a generic 400.
    #[must_use]
    pub fn from_status(status: u16, body: &str) -> Self {
        let lower = body.to_lowercase();
        if status == 429 || lower.contains("too many requests") {
            return Self::RateLimit;
        }
        if status == 403 || lower.contains("forbidden") {
            return Self::Forbidden(sanitize_error_for_user(body));
        }
        Self::classify_message(body).unwrap_or_else(|| Self::Api {
            status,
            message: sanitize_error_for_user(body),
        })
    }

    /// Classify an error reported inside an event stream (`response.failed` / `error`).
    #[must_use]
    pub fn from_stream_failure(message: &str) -> Self {
        let lower = message.to_lowercase();
        if lower.contains("429") || lower.contains("too many requests") {
            return Self::RateLimit;
        }
        if lower.contains("403") || lower.contains("forbidden") {
            return Self::Forbidden(sanitize_error_for_user(message));
        }
        Self::classify_message(message)
            .unwrap_or_else(|| Self::InvalidResponse(sanitize_error_for_user(message)))
    }

    fn classify_message(message: &str) -> Option<Self> {
        if message.contains("status failed") {
            Some(Self::PreviousResponseFailed(sanitize_error_for_user(message)))
        } else if message.contains("in_progress") {
            Some(Self::InProgress(sanitize_error_for_user(message)))
        } else {
            None
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(0)
        } else {
            Self::Network(sanitize_error_for_user(&e.to_string()))
        }
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
