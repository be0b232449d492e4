//! The LLM judgment as an opaque capability.
//!
//! The rest of the application only sees the [`Oracle`] trait: send article
//! text, get back `{call, confidence, explanation}`. The concrete
//! implementations are:
//!
//! - [`groq::GroqOracle`]: calls an OpenAI-compatible chat-completions API
//!   (Groq by default)
//! - [`retry::RetryOracle`]: decorator adding exponential backoff to any
//!   oracle, for transient failures only
//! - `StubOracle` (tests only): canned answers, no network

pub mod groq;
pub mod retry;

use crate::models::OracleResult;
use std::time::Duration;
use thiserror::Error;

/// What the oracle is asked to judge.
#[derive(Debug, Clone, PartialEq)]
pub struct OracleRequest {
    pub text: String,
    /// Terms the bias rules already flagged, passed along as context.
    pub flagged_terms: Vec<String>,
}

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("no API key configured for the analysis service")]
    MissingApiKey,

    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("rate limit exceeded; wait a moment and try again")]
    RateLimited,

    #[error("authentication failed; check the API key")]
    Unauthorized,

    #[error("API error (status {status}): {message}")]
    Api { status: u16, message: String },

    #[error("malformed response: {0}")]
    Malformed(String),
}

impl OracleError {
    /// Worth another attempt after a pause?
    pub fn is_transient(&self) -> bool {
        match self {
            OracleError::Timeout(_) | OracleError::Network(_) | OracleError::RateLimited => true,
            OracleError::Api { status, .. } => *status >= 500,
            OracleError::MissingApiKey | OracleError::Unauthorized | OracleError::Malformed(_) => {
                false
            }
        }
    }
}

/// Async judgment of article text.
pub trait Oracle {
    /// Judge the article in `request`.
    ///
    /// Implementations return a validated [`OracleResult`] or an error; they
    /// never invent a verdict when the service misbehaves.
    async fn analyze(&self, request: &OracleRequest) -> Result<OracleResult, OracleError>;
}


#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transient_classification() {
        assert!(OracleError::RateLimited.is_transient());
        assert!(OracleError::Timeout(Duration::from_secs(1)).is_transient());
        assert!(
            OracleError::Api {
                status: 503,
                message: String::new()
            }
            .is_transient()
        );
        assert!(
            !OracleError::Api {
                status: 400,
                message: String::new()
            }
            .is_transient()
        );
        assert!(!OracleError::Unauthorized.is_transient());
        assert!(!OracleError::Malformed("x".into()).is_transient());
        assert!(!OracleError::MissingApiKey.is_transient());
    }
}
