//! Error types for the schoolscout crate

use thiserror::Error;

/// Result type for schoolscout operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error type for schoolscout operations
#[derive(Debug, Error)]
pub enum Error {
    /// HTTP client error
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// API returned an error response
    #[error("API error: {status_code} - {message}")]
    Api {
        /// HTTP status code
        status_code: u16,
        /// Error message
        message: String,
    },

    /// Missing or invalid credentials
    #[error("Authentication error: {0}")]
    Auth(String),

    /// Invalid configuration or input
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Discovery error
    #[error("Discovery error: {0}")]
    Discovery(String),

    /// Web crawling error
    #[error("Crawl error: {0}")]
    Crawl(String),

    /// Scripted browser error
    #[error("Browser error: {0}")]
    Browser(String),

    /// Contact extraction error
    #[error("Extraction error: {0}")]
    Extraction(String),

    /// Compilation or output error
    #[error("Compile error: {0}")]
    Compile(String),

    /// Other errors
    #[error("{0}")]
    Other(String),
}
