//! Request definitions
//!
//! Every request is a header plus a body specific to its kind.

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::document::Document;

static NEXT_REQUEST_ID: AtomicU64 = AtomicU64::new(1);

/// Request kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[repr(u8)]
pub enum RequestType {
    Write = 0x01,
    Get = 0x02,
    GetRange = 0x03,
    Delete = 0x04,
}

impl RequestType {
    pub fn from_u8(byte: u8) -> Option<Self> {
        match byte {
            0x01 => Some(RequestType::Write),
            0x02 => Some(RequestType::Get),
            0x03 => Some(RequestType::GetRange),
            0x04 => Some(RequestType::Delete),
            _ => None,
        }
    }

    /// Whether requests of this kind go through the log
    pub fn is_mutation(&self) -> bool {
        matches!(self, RequestType::Write | RequestType::Delete)
    }
}

/// Request metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Header {
    /// Discriminator used for dispatch; must agree with the body
    pub request_type: RequestType,

    /// Process-unique id, echoed in the reply
    pub request_id: u64,

    /// Unix millis when the request was built
    pub timestamp_ms: u64,
}

impl Header {
    pub fn new(request_type: RequestType) -> Self {
        Self {
            request_type,
            request_id: NEXT_REQUEST_ID.fetch_add(1, Ordering::Relaxed),
            timestamp_ms: SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .map(|d| d.as_millis() as u64)
                .unwrap_or(0),
        }
    }
}

/// Documents to write
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WriteRequestBody {
    pub documents: Vec<Document>,
}

/// Keys to look up
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetRequestBody {
    pub keys: Vec<Vec<u8>>,
}

/// Keys in `[start_key, end_key)`; an empty end key means no upper bound
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GetRangeRequestBody {
    pub start_key: Vec<u8>,
    pub end_key: Vec<u8>,
}

/// Keys to delete
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeleteRequestBody {
    pub keys: Vec<Vec<u8>>,
}

impl DeleteRequestBody {
    pub fn from_documents(documents: &[Document]) -> Self {
        Self {
            keys: documents.iter().map(|d| d.key().to_vec()).collect(),
        }
    }
}

/// The kind-specific part of a request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestBody {
    Write(WriteRequestBody),
    Get(GetRequestBody),
    GetRange(GetRangeRequestBody),
    Delete(DeleteRequestBody),
}

impl RequestBody {
    pub fn request_type(&self) -> RequestType {
        match self {
            RequestBody::Write(_) => RequestType::Write,
            RequestBody::Get(_) => RequestType::Get,
            RequestBody::GetRange(_) => RequestType::GetRange,
            RequestBody::Delete(_) => RequestType::Delete,
        }
    }
}

/// A client request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Request {
    pub header: Header,
    pub body: RequestBody,
}

impl Request {
    /// Wrap a body with a freshly stamped header
    pub fn new(body: RequestBody) -> Self {
        Self {
            header: Header::new(body.request_type()),
            body,
        }
    }

    pub fn write(documents: Vec<Document>) -> Self {
        Self::new(RequestBody::Write(WriteRequestBody { documents }))
    }

    pub fn get(keys: Vec<Vec<u8>>) -> Self {
        Self::new(RequestBody::Get(GetRequestBody { keys }))
    }

    pub fn get_range(start_key: impl Into<Vec<u8>>, end_key: impl Into<Vec<u8>>) -> Self {
        Self::new(RequestBody::GetRange(GetRangeRequestBody {
            start_key: start_key.into(),
            end_key: end_key.into(),
        }))
    }

    pub fn delete(keys: Vec<Vec<u8>>) -> Self {
        Self::new(RequestBody::Delete(DeleteRequestBody { keys }))
    }

    pub fn request_type(&self) -> RequestType {
        self.header.request_type
    }

    pub fn request_id(&self) -> u64 {
        self.header.request_id
    }

    /// Whether the header's discriminator matches the body
    pub fn is_consistent(&self) -> bool {
        self.header.request_type == self.body.request_type()
    }
}
