//! Error types for the broker.

use pagewire_core::CoreError;
use pagewire_protocol::ProtocolError;
use thiserror::Error;

/// Result type for broker operations.
pub type BrokerResult<T> = Result<T, BrokerError>;

/// Errors that can occur in the broker and its bridges.
#[derive(Error, Debug)]
pub enum BrokerError {
    /// Store or log error (malformed patch, invalid url, log failures).
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Bridge peer sent something we could not understand.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// Could not open a bridge connection.
    #[error("connect to {host} failed: {message}")]
    ConnectFailed {
        /// Peer host.
        host: String,
        /// Reason.
        message: String,
    },

    /// An established bridge connection dropped.
    #[error("connection lost: {0}")]
    ConnectionLost(String),

    /// The subscription could not keep up and was disconnected.
    #[error("subscriber too slow, disconnected")]
    SlowConsumer,

    /// No bridge exists for the given url and host.
    #[error("no bridge for {url} to {host}")]
    BridgeNotFound {
        /// Page url.
        url: String,
        /// Peer host.
        host: String,
    },

    /// The broker has shut down.
    #[error("broker closed")]
    Closed,

    /// I/O error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

impl BrokerError {
    /// Creates a connect failure.
    pub fn connect_failed(host: impl Into<String>, message: impl ToString) -> Self {
        Self::ConnectFailed {
            host: host.into(),
            message: message.to_string(),
        }
    }

    /// Returns true if a bridge should retry after this error.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BrokerError::ConnectFailed { .. }
                | BrokerError::ConnectionLost(_)
                | BrokerError::SlowConsumer
                | BrokerError::Protocol(_)
                | BrokerError::Io(_)
        )
    }

    /// Returns true if the caller's input was at fault.
    pub fn is_client_error(&self) -> bool {
        matches!(self, BrokerError::Core(e) if e.is_client_error())
    }
}
