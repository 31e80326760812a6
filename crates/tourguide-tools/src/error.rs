//! Error types for tourguide-tools
//!
//! Business variants carry Russian text because their `Display` output is
//! forwarded to the model verbatim.

use thiserror::Error;

/// Tool error type
#[derive(Debug, Error)]
pub enum Error {
    /// The search finished without usable results
    #[error("{message}. {hint}")]
    NoResults {
        /// What was found
        message: String,
        /// How to widen the search
        hint: String,
    },

    /// The tour id is no longer valid upstream
    #[error("тур {0} устарел или больше не доступен, выполните новый поиск")]
    TourIdExpired(String),

    /// The search job id is unknown or expired upstream
    #[error("поиск {0} не найден или истёк, запустите новый поиск")]
    SearchNotFound(String),

    /// Invalid tool arguments
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Backend reported an error
    #[error("api error: {0}")]
    Api(String),

    /// Network error
    #[error("network error: {0}")]
    Network(String),

    /// Timeout
    #[error("timeout after {0}ms")]
    Timeout(u64),

    /// Backend payload could not be interpreted
    #[error("parse error: {0}")]
    Parse(String),
}

impl Error {
    /// Expected outcomes the model should react to in-band (not-found, expired, empty)
    #[must_use]
    pub fn is_business(&self) -> bool {
        matches!(
            self,
            Self::NoResults { .. } | Self::TourIdExpired(_) | Self::SearchNotFound(_)
        )
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            Self::Timeout(0)
        } else if e.is_decode() {
            Self::Parse(e.to_string())
        } else {
            Self::Network(e.to_string())
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Self::Parse(e.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
