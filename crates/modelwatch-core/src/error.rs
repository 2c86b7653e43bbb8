//! Error types for best-effort reads.
//!
//! Nothing in this crate surfaces these to callers of the public lookups:
//! they are logged at `debug` and collapsed into `None`.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while reading modelwatch inputs.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Failed to read a file.
    #[error("failed to read {path}: {source}")]
    ReadError {
        /// Path of the file.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to parse a JSON document.
    #[error("failed to parse {path}: {source}")]
    ParseError {
        /// Path of the document.
        path: PathBuf,
        /// Underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
