//! Error types for MapKV
//!
//! Provides a unified error type for all operations.

use thiserror::Error;

/// Result type alias using MapError
pub type Result<T> = std::result::Result<T, MapError>;

/// Unified error type for MapKV operations
#[derive(Debug, Error)]
pub enum MapError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // Codec Errors
    // -------------------------------------------------------------------------
    /// Stored blob failed to decode. Never treated as an empty map.
    #[error("corrupt map value: {0}")]
    CorruptValue(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    // -------------------------------------------------------------------------
    // Storage Errors
    // -------------------------------------------------------------------------
    #[error("Storage error: {0}")]
    Storage(String),

    // -------------------------------------------------------------------------
    // Protocol Errors
    // -------------------------------------------------------------------------
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// Request framing cannot be recovered; the connection must close
    #[error("Framing error: {0}")]
    Framing(String),

    #[error("Unknown command: {0}")]
    UnknownCommand(String),

    /// Client side: argument rejected before any request was sent
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    /// Client side: server answered `SERVER_ERROR <msg>`
    #[error("Server error: {0}")]
    ServerError(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),
}

impl MapError {
    /// True for I/O failures that mean the peer went away
    pub fn is_disconnect(&self) -> bool {
        match self {
            MapError::Io(e) => matches!(
                e.kind(),
                std::io::ErrorKind::UnexpectedEof
                    | std::io::ErrorKind::ConnectionReset
                    | std::io::ErrorKind::ConnectionAborted
                    | std::io::ErrorKind::BrokenPipe
            ),
            _ => false,
        }
    }
}
