//! Error types for the crawler module

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for crawler operations
#[derive(Debug, Error)]
pub enum CrawlError {
    /// The homepage could not be turned into an absolute http(s) URL
    #[error("Invalid homepage URL '{url}': {reason}")]
    InvalidHomepage { url: String, reason: String },

    /// HTML parsing error
    #[error("HTML parsing error: {0}")]
    HtmlParse(String),

    /// URL parsing error
    #[error("URL parsing error: {0}")]
    UrlParse(#[from] url::ParseError),

    /// Other errors
    #[error("{0}")]
    Other(String),
}

impl From<CrawlError> for CrateError {
    fn from(err: CrawlError) -> Self {
        CrateError::Crawl(err.to_string())
    }
}
