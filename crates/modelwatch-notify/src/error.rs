//! Error types for notification delivery.

use thiserror::Error;

/// Errors a transport can report. The notifier turns every one of them
/// into a warning; none reaches the turn handler.
#[derive(Debug, Error)]
pub enum NotifyError {
    /// The API answered with a non-success status.
    #[error("send failed with status {status}: {body}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Response body, for diagnostics.
        body: String,
    },

    /// The request never produced a response.
    #[error("HTTP error: {0}")]
    Http(String),
}

/// Result type for notification operations.
pub type Result<T> = std::result::Result<T, NotifyError>;

impl From<reqwest::Error> for NotifyError {
    fn from(e: reqwest::Error) -> Self {
        NotifyError::Http(e.to_string())
    }
}
