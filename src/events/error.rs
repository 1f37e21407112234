//! Error types for fetching calendar events.

use thiserror::Error;

/// Errors surfaced by [`GoogleCalendarClient`](super::GoogleCalendarClient).
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("The calendar API key is not configured")]
    NotConfigured,

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Failed to build calendar API URL: {0}")]
    Url(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Calendar API returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("Failed to decode calendar API response: {0}")]
    Decode(#[from] serde_json::Error),
}

impl FetchError {
    /// Short machine-readable category, reported alongside tool errors.
    pub fn kind(&self) -> &'static str {
        match self {
            FetchError::NotConfigured => "failed-precondition",
            FetchError::InvalidArgument(_) => "invalid-argument",
            FetchError::Url(_) => "invalid-argument",
            FetchError::Http(_) | FetchError::Upstream { .. } | FetchError::Decode(_) => {
                "internal"
            }
        }
    }
}

/// Result type alias for fetch operations.
pub type FetchResult<T> = Result<T, FetchError>;
