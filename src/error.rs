//! Error types for QuillDB
//!
//! Provides a unified error type for all operations, plus the mapping between
//! errors and the protocol-level [`ErrorType`] carried in replies.

use thiserror::Error;

use crate::protocol::ErrorType;

/// Result type alias using QuillError
pub type Result<T> = std::result::Result<T, QuillError>;

/// Unified error type for QuillDB operations
#[derive(Debug, Error)]
pub enum QuillError {
    // -------------------------------------------------------------------------
    // I/O Errors
    // -------------------------------------------------------------------------
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // -------------------------------------------------------------------------
    // WAL Errors
    // -------------------------------------------------------------------------
    #[error("WAL corruption detected: {0}")]
    WalCorruption(String),

    #[error("WAL write failed: {0}")]
    WalWrite(String),

    #[error("Reached the end of the write-ahead log")]
    EndOfLog,

    // -------------------------------------------------------------------------
    // Datastore Conditions (one per ErrorType)
    // -------------------------------------------------------------------------
    #[error("Optimistic lock violation: {0}")]
    OptimisticLock(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("JSON serialization error: {0}")]
    JsonSerialization(String),

    #[error("Protocol serialization error: {0}")]
    ProtocolSerialization(String),

    #[error("Persistence error: {0}")]
    Persistence(String),

    // -------------------------------------------------------------------------
    // Document Errors
    // -------------------------------------------------------------------------
    #[error("Invalid document: {0}")]
    InvalidDocument(String),

    // -------------------------------------------------------------------------
    // Configuration Errors
    // -------------------------------------------------------------------------
    #[error("Configuration error: {0}")]
    Config(String),

    // -------------------------------------------------------------------------
    // Transport Errors
    // -------------------------------------------------------------------------
    #[error("Transport error: {0}")]
    Transport(String),
}

impl QuillError {
    /// The protocol error kind this error is reported as.
    ///
    /// Anything touching the log or the disk is a persistence failure;
    /// malformed documents are reported with the generic serialization kind.
    pub fn error_type(&self) -> ErrorType {
        match self {
            QuillError::OptimisticLock(_) => ErrorType::OptimisticLock,
            QuillError::Serialization(_) | QuillError::InvalidDocument(_) => {
                ErrorType::Serialization
            }
            QuillError::JsonSerialization(_) => ErrorType::JsonSerialization,
            QuillError::ProtocolSerialization(_) => ErrorType::ProtocolSerialization,
            QuillError::Io(_)
            | QuillError::WalCorruption(_)
            | QuillError::WalWrite(_)
            | QuillError::EndOfLog
            | QuillError::Persistence(_)
            | QuillError::Config(_)
            | QuillError::Transport(_) => ErrorType::Persistence,
        }
    }
}

impl From<bincode::Error> for QuillError {
    fn from(err: bincode::Error) -> Self {
        QuillError::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for QuillError {
    fn from(err: serde_json::Error) -> Self {
        QuillError::JsonSerialization(err.to_string())
    }
}
