//! Error types for the bridge protocol.

use thiserror::Error;

/// Result type for protocol operations.
pub type ProtocolResult<T> = Result<T, ProtocolError>;

/// Errors that can occur while encoding or decoding bridge messages.
#[derive(Error, Debug)]
pub enum ProtocolError {
    /// Frame is not a valid message.
    #[error("invalid message: {0}")]
    InvalidMessage(#[from] serde_json::Error),

    /// Message carried a patch or url that failed validation.
    #[error("invalid payload: {0}")]
    InvalidPayload(#[from] pagewire_core::CoreError),

    /// Peer speaks another protocol version.
    #[error("protocol version mismatch: local={local}, remote={remote}")]
    VersionMismatch {
        /// Local protocol version.
        local: u16,
        /// Remote protocol version.
        remote: u16,
    },

    /// A message arrived that is not valid in the current session phase.
    #[error("unexpected message: expected {expected}, got {actual}")]
    Unexpected {
        /// What the session was waiting for.
        expected: &'static str,
        /// What arrived.
        actual: &'static str,
    },
}
