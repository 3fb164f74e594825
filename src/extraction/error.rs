//! Error types for the extraction module

use rig::completion::CompletionError;
use thiserror::Error;

use crate::error::Error as CrateError;

/// Error type for extraction operations
#[derive(Debug, Error)]
pub enum ExtractionError {
    /// The LLM request failed after every attempt
    #[error("LLM error: {0}")]
    Llm(String),

    /// The LLM asked us to slow down
    #[error("LLM rate limit: {0}")]
    RateLimited(String),

    /// Markup could not be reduced
    #[error("Markup reduction error: {0}")]
    Reduce(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl ExtractionError {
    pub fn is_rate_limit(&self) -> bool {
        matches!(self, ExtractionError::RateLimited(_))
    }
}

impl From<CompletionError> for ExtractionError {
    fn from(err: CompletionError) -> Self {
        let message = err.to_string();
        let lower = message.to_lowercase();
        if message.contains("429") || lower.contains("rate_limit") || lower.contains("rate limit") {
            Self::RateLimited(message)
        } else {
            Self::Llm(message)
        }
    }
}

impl From<ExtractionError> for CrateError {
    fn from(err: ExtractionError) -> Self {
        CrateError::Extraction(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_limit_detection() {
        let err: ExtractionError = CompletionError::ProviderError(
            "Rate limit reached for gpt-4o-mini. Please try again in 20ms".to_string(),
        )
        .into();
        assert!(err.is_rate_limit());

        let err: ExtractionError = CompletionError::ProviderError("bad gateway".to_string()).into();
        assert!(!err.is_rate_limit());
    }
}
