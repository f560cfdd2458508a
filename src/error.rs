//! Custom error types for rustpubsearch.
//!
//! This module defines all error types used throughout the application.
//! All functions return `Result<T, PubSearchError>` instead of using `unwrap()`.
//!
//! Only whole-submission failures live here. Missing or wrong-typed fields
//! inside a single search record are never errors; the normalizer resolves
//! them to fallbacks instead.

use thiserror::Error;

/// Main error type for rustpubsearch operations.
#[derive(Debug, Error)]
pub enum PubSearchError {
    /// Request could not be sent or the response was not received
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    /// Search service answered with a non-2xx status.
    ///
    /// Displays the response body verbatim so it can be shown to the user as-is.
    #[error("{body}")]
    Remote {
        /// HTTP status code
        status: u16,
        /// Raw response body text
        body: String,
    },

    /// Top-level payload was not a JSON array
    #[error("Malformed response: {0}")]
    MalformedResponse(String),

    /// Export was requested but there are no records to write
    #[error("Nothing to export")]
    NothingToExport,

    /// File I/O error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// CSV writing error
    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// Configuration error
    #[error("Config error: {0}")]
    Config(String),

    /// Validation error
    #[error("Validation error: {0}")]
    Validation(String),
}

impl PubSearchError {
    /// Message suitable for the user-visible error banner.
    ///
    /// Transport failures collapse to a generic message; remote rejections
    /// surface the service's own text.
    pub fn user_message(&self) -> String {
        match self {
            PubSearchError::Network(_) => {
                "Unable to reach the search service. Please try again.".to_string()
            }
            other => other.to_string(),
        }
    }
}

/// Result type alias using `PubSearchError`
pub type Result<T> = std::result::Result<T, PubSearchError>;
