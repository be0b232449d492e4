//! Terminal error taxonomy for a single analysis.
//!
//! Every analysis ends in either a [`crate::models::Verdict`] or exactly one
//! [`AnalysisError`]. None of these are retried by the pipeline and no
//! partial verdict is ever produced alongside them.

use crate::models::ExtractionMethod;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum AnalysisError {
    /// Malformed URL or empty pasted text.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Every extraction strategy was tried (or the budget ran out) without
    /// producing enough text.
    #[error("extraction failed for {url} (attempted: {})", format_methods(.attempted_methods))]
    ExtractionFailed {
        url: String,
        attempted_methods: Vec<ExtractionMethod>,
    },

    /// The oracle call failed, timed out, or answered with something unusable.
    #[error("oracle unavailable: {reason}")]
    OracleUnavailable { reason: String },
}

impl AnalysisError {
    /// Message shown to the person who asked for the analysis. Each kind
    /// maps to its own wording.
    pub fn user_message(&self) -> &'static str {
        match self {
            AnalysisError::InvalidInput(_) => {
                "Invalid input: provide a valid http(s) URL or non-empty article text."
            }
            AnalysisError::ExtractionFailed { .. } => {
                "Could not read the article. The site may use a paywall or heavy JavaScript."
            }
            AnalysisError::OracleUnavailable { .. } => {
                "The analysis service is unavailable right now. Please try again later."
            }
        }
    }
}

fn format_methods(methods: &[ExtractionMethod]) -> String {
    if methods.is_empty() {
        return "none".to_string();
    }
    methods
        .iter()
        .map(|m| m.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_are_distinct() {
        let invalid = AnalysisError::InvalidInput("empty".into());
        let extraction = AnalysisError::ExtractionFailed {
            url: "https://example.com".into(),
            attempted_methods: vec![],
        };
        let oracle = AnalysisError::OracleUnavailable {
            reason: "timeout".into(),
        };

        assert_ne!(invalid.user_message(), extraction.user_message());
        assert_ne!(extraction.user_message(), oracle.user_message());
        assert_ne!(invalid.user_message(), oracle.user_message());
    }

    #[test]
    fn test_extraction_failed_display_lists_methods() {
        let err = AnalysisError::ExtractionFailed {
            url: "https://example.com/a".into(),
            attempted_methods: vec![
                ExtractionMethod::StructuredData,
                ExtractionMethod::HtmlParagraphs,
            ],
        };
        let shown = err.to_string();
        assert!(shown.contains("https://example.com/a"));
        assert!(shown.contains("structured_data, html_paragraphs"));
    }

    #[test]
    fn test_extraction_failed_display_without_methods() {
        let err = AnalysisError::ExtractionFailed {
            url: "https://example.com".into(),
            attempted_methods: vec![],
        };
        assert!(err.to_string().contains("attempted: none"));
    }
}
