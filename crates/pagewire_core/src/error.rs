//! Error types for pagewire core.

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Result type for core operations.
pub type CoreResult<T> = Result<T, CoreError>;

/// Errors that can occur in pagewire core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// Patch payload could not be parsed or violates structural constraints.
    ///
    /// The patch is rejected as a whole; nothing was applied.
    #[error("malformed patch: {message}")]
    MalformedPatch {
        /// Description of the problem.
        message: String,
    },

    /// Page url is empty or contains whitespace.
    #[error("invalid url: {url:?}")]
    InvalidUrl {
        /// The rejected url.
        url: String,
    },

    /// A log line could not be interpreted. Replay skips such lines.
    #[error("log corruption at line {line}: {message}")]
    LogCorruption {
        /// 1-based line number.
        line: u64,
        /// Description of the corruption.
        message: String,
    },

    /// The durability log could not be opened.
    #[error("log unavailable at {path:?}: {source}")]
    LogUnavailable {
        /// Path of the log file.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// Log compaction was requested but is not implemented.
    #[error("log compaction is not supported")]
    CompactionUnsupported,

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl CoreError {
    /// Creates a malformed patch error.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::MalformedPatch {
            message: message.into(),
        }
    }

    /// Creates a log corruption error.
    pub fn corruption(line: u64, message: impl Into<String>) -> Self {
        Self::LogCorruption {
            line,
            message: message.into(),
        }
    }

    /// Returns true if the error was caused by caller input rather than the system.
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            CoreError::MalformedPatch { .. } | CoreError::InvalidUrl { .. }
        )
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::malformed(err.to_string())
    }
}
