//! Error types for the modelwatch CLI.
//!
//! The turn handler itself has no error path; these only cover the
//! command-line bridge.

use thiserror::Error;

/// Errors that can occur in the CLI.
#[derive(Debug, Error)]
pub enum WatchError {
    /// Reading the event stream failed.
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    /// An explicit send was requested without a full delivery target.
    #[error("no delivery target: missing {0}")]
    IncompleteTarget(&'static str),
}

/// Result type for CLI operations.
pub type Result<T> = std::result::Result<T, WatchError>;
