//! Reply definitions
//!
//! Every reply carries exactly one error condition; `NONE` means success.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{QuillError, Result};

/// Failure kinds a reply can report
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[repr(u8)]
pub enum ErrorType {
    #[default]
    None = 0x00,
    OptimisticLock = 0x01,
    Serialization = 0x02,
    JsonSerialization = 0x03,
    /// Request/reply message encode or decode failure
    ProtocolSerialization = 0x04,
    Persistence = 0x05,
}

impl fmt::Display for ErrorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorType::None => "NONE",
            ErrorType::OptimisticLock => "OPTIMISTIC_LOCK_EXCEPTION",
            ErrorType::Serialization => "SERIALIZATION_EXCEPTION",
            ErrorType::JsonSerialization => "JSON_SERIALIZATION_EXCEPTION",
            ErrorType::ProtocolSerialization => "PROTOCOL_BUFFER_SERIALIZATION_EXCEPTION",
            ErrorType::Persistence => "PERSISTENCE_EXCEPTION",
        };
        f.write_str(name)
    }
}

/// Outcome of a request
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ErrorCondition {
    pub error_type: ErrorType,
    pub description: String,
}

impl ErrorCondition {
    /// Success
    pub fn none() -> Self {
        Self::default()
    }

    pub fn new(error_type: ErrorType, description: impl Into<String>) -> Self {
        Self {
            error_type,
            description: description.into(),
        }
    }

    pub fn is_none(&self) -> bool {
        self.error_type == ErrorType::None
    }

    /// Map back to the error a client surfaces, one variant per kind
    pub fn into_result(self) -> Result<()> {
        let description = self.description;
        match self.error_type {
            ErrorType::None => Ok(()),
            ErrorType::OptimisticLock => Err(QuillError::OptimisticLock(description)),
            ErrorType::Serialization => Err(QuillError::Serialization(description)),
            ErrorType::JsonSerialization => Err(QuillError::JsonSerialization(description)),
            ErrorType::ProtocolSerialization => {
                Err(QuillError::ProtocolSerialization(description))
            }
            ErrorType::Persistence => Err(QuillError::Persistence(description)),
        }
    }
}

impl From<&QuillError> for ErrorCondition {
    fn from(err: &QuillError) -> Self {
        let description = match err {
            QuillError::OptimisticLock(msg)
            | QuillError::Serialization(msg)
            | QuillError::JsonSerialization(msg)
            | QuillError::ProtocolSerialization(msg)
            | QuillError::Persistence(msg) => msg.clone(),
            other => other.to_string(),
        };
        Self::new(err.error_type(), description)
    }
}

/// Reply to a write or delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteReply {
    pub request_id: u64,
    pub error_condition: ErrorCondition,
}

/// Reply to a get or range get
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetReply {
    pub request_id: u64,

    /// Wire-encoded documents, one per key found
    pub document_bytes: Vec<Vec<u8>>,

    pub error_condition: ErrorCondition,
}

/// Any reply
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Reply {
    Write(WriteReply),
    Get(GetReply),
}

impl Reply {
    pub fn write(request_id: u64, error_condition: ErrorCondition) -> Self {
        Reply::Write(WriteReply {
            request_id,
            error_condition,
        })
    }

    pub fn get(request_id: u64, document_bytes: Vec<Vec<u8>>) -> Self {
        Reply::Get(GetReply {
            request_id,
            document_bytes,
            error_condition: ErrorCondition::none(),
        })
    }

    pub fn get_failed(request_id: u64, error_condition: ErrorCondition) -> Self {
        Reply::Get(GetReply {
            request_id,
            document_bytes: Vec::new(),
            error_condition,
        })
    }

    pub fn request_id(&self) -> u64 {
        match self {
            Reply::Write(r) => r.request_id,
            Reply::Get(r) => r.request_id,
        }
    }

    pub fn error_condition(&self) -> &ErrorCondition {
        match self {
            Reply::Write(r) => &r.error_condition,
            Reply::Get(r) => &r.error_condition,
        }
    }

    /// Unwrap a write reply; any other reply is a protocol error
    pub fn into_write(self) -> Result<WriteReply> {
        match self {
            Reply::Write(r) => Ok(r),
            Reply::Get(_) => Err(QuillError::ProtocolSerialization(
                "expected a write reply, got a get reply".to_string(),
            )),
        }
    }

    /// Unwrap a get reply; any other reply is a protocol error
    pub fn into_get(self) -> Result<GetReply> {
        match self {
            Reply::Get(r) => Ok(r),
            Reply::Write(_) => Err(QuillError::ProtocolSerialization(
                "expected a get reply, got a write reply".to_string(),
            )),
        }
    }
}
