//! Error types for the compiler module

use thiserror::Error;

use crate::error::Error as CrateError;

/// Error type for compilation and artifact output
#[derive(Debug, Error)]
pub enum CompileError {
    /// Filesystem error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// CSV writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Raw contacts could not be read or written
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl From<CompileError> for CrateError {
    fn from(err: CompileError) -> Self {
        match err {
            CompileError::Io(e) => CrateError::Io(e),
            CompileError::Csv(e) => CrateError::Csv(e),
            CompileError::Json(e) => CrateError::Json(e),
        }
    }
}
