//! Error types for the discovery module

use std::path::PathBuf;

use crate::error::Error as CrateError;
use thiserror::Error;

/// Error type for discovery operations
#[derive(Debug, Error)]
pub enum DiscoveryError {
    /// Neither places API key variable is set
    #[error("Missing places API key: set GOOGLE_PLACES_API_KEY or GOOGLE_API_KEY")]
    MissingApiKey,

    /// The state is not one of the 50 US states
    #[error("Unknown state '{0}'")]
    UnknownState(String),

    /// The geographic unit list could not be loaded
    #[error("Could not load units from {}: {reason}", path.display())]
    Units { path: PathBuf, reason: String },

    /// HTTP error talking to the places API
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The places API answered with an error status
    #[error("Places API error {status}: {message}")]
    Api { status: String, message: String },

    /// Error writing the organizations artifact
    #[error("Output error: {0}")]
    Output(String),
}

impl From<DiscoveryError> for CrateError {
    fn from(err: DiscoveryError) -> Self {
        match err {
            DiscoveryError::MissingApiKey => CrateError::Auth(err.to_string()),
            DiscoveryError::Http(e) => CrateError::Http(e),
            other => CrateError::Discovery(other.to_string()),
        }
    }
}

impl From<csv::Error> for DiscoveryError {
    fn from(err: csv::Error) -> Self {
        DiscoveryError::Output(err.to_string())
    }
}

impl From<std::io::Error> for DiscoveryError {
    fn from(err: std::io::Error) -> Self {
        DiscoveryError::Output(err.to_string())
    }
}
