//! Error types for RespLite
//!
//! Provides a unified error type for all operations.

use std::time::Duration;

use thiserror::Error;

use crate::protocol::ReplyKind;

/// Result type alias using RespError
pub type Result<T> = std::result::Result<T, RespError>;

/// Unified error type for RespLite operations
#[derive(Debug, Error)]
pub enum RespError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("Connect to {endpoint} failed: {reason}")]
    Connect { endpoint: String, reason: String },

    #[error("Transport is not connected")]
    NotConnected,

    #[error("Connection closed while waiting for a reply")]
    ConnectionClosed,

    #[error("Timed out after {0:?} waiting for a reply")]
    Timeout(Duration),

    // -------------------------------------------------------------------------
    // Capacity Errors
    // -------------------------------------------------------------------------
    #[error("Command too large: needs {needed} bytes, buffer holds {capacity}")]
    CommandTooLarge { needed: usize, capacity: usize },

    #[error("Incomplete command: declared {declared} arguments, appended {appended}")]
    IncompleteCommand { declared: usize, appended: usize },

    #[error("Destination too small: reply needs {needed} bytes, destination holds {capacity}")]
    DestinationTooSmall { needed: usize, capacity: usize },

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Unexpected reply: expected {expected:?}, got {actual:?}")]
    UnexpectedReply {
        expected: ReplyKind,
        actual: ReplyKind,
    },

    #[error("Server error: {0}")]
    Server(String),

    #[error("Value out of range: {0}")]
    OutOfRange(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl RespError {
    /// Whether the byte stream may be left mid-reply after this error.
    ///
    /// Capacity and range errors on the reply side are raised only after the
    /// whole value has been consumed, so they leave the stream aligned.
    pub fn desynchronizes(&self) -> bool {
        matches!(
            self,
            RespError::Io(_)
                | RespError::ConnectionClosed
                | RespError::Timeout(_)
                | RespError::Protocol(_)
        )
    }
}
