//! WAL Entry definitions
//!
//! Defines the payload stored in each WAL record.

use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::{QuillError, Result};
use crate::protocol::Request;

/// Bytes of CRC32 in front of every encoded entry
pub const CHECKSUM_SIZE: usize = 4;

/// A single entry in the WAL
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalEntry {
    /// Log Sequence Number - monotonically increasing, starts at 1
    pub lsn: u64,

    /// Timestamp (unix millis) when the entry was created
    pub timestamp_ms: u64,

    /// The accepted write or delete request
    pub request: Request,
}

impl WalEntry {
    pub fn new(lsn: u64, request: Request) -> Self {
        Self {
            lsn,
            timestamp_ms: now_millis(),
            request,
        }
    }

    /// Encode as `crc32 (BE) || bincode(entry)`
    pub fn encode(&self) -> Result<Vec<u8>> {
        let body = bincode::serialize(self)?;
        let crc = crc32fast::hash(&body);

        let mut bytes = Vec::with_capacity(CHECKSUM_SIZE + body.len());
        bytes.extend_from_slice(&crc.to_be_bytes());
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    /// Decode and verify an entry produced by [`encode`](Self::encode)
    pub fn decode(bytes: &[u8]) -> Result<Self> {
        if bytes.len() < CHECKSUM_SIZE {
            return Err(QuillError::WalCorruption(format!(
                "record of {} bytes is shorter than its checksum",
                bytes.len()
            )));
        }

        let (crc_bytes, body) = bytes.split_at(CHECKSUM_SIZE);
        let stored = u32::from_be_bytes([crc_bytes[0], crc_bytes[1], crc_bytes[2], crc_bytes[3]]);
        let computed = crc32fast::hash(body);
        if stored != computed {
            return Err(QuillError::WalCorruption(format!(
                "checksum mismatch: stored {:#010x}, computed {:#010x}",
                stored, computed
            )));
        }

        bincode::deserialize(body)
            .map_err(|e| QuillError::WalCorruption(format!("undecodable entry: {}", e)))
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}
