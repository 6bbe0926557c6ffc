//! Codec Module
//!
//! The content pipeline that turns a typed payload into the opaque
//! `contents` bytes of a [`Document`](crate::document::Document) and back.
//!
//! ## Pipeline
//! ```text
//!   payload ──serialize──► bytes ──compress──► bytes ──encrypt──► contents
//!   payload ◄─deserialize─ bytes ◄─decompress─ bytes ◄─decrypt─── contents
//! ```
//!
//! Every pipe has a strategy tag (`json`, `bincode+lz4`,
//! `json+lz4+aes256gcm`, ...). The tag is recorded as the document's content
//! type, and a [`CodecRegistry`] maps it back to the pipe that can read it.
//! The document and engine layers only see [`ContentsPipe`] and
//! [`ByteStage`]; concrete strategies are picked at configuration time.

mod pipe;
mod stages;

pub use pipe::{CodecRegistry, ContentsPipe};
pub use stages::{AesGcmEncryption, Lz4Compression};

use std::fmt::Debug;

use serde::{Deserialize, Serialize};

use crate::error::Result;

/// A reversible byte-to-byte transform applied after serialization
pub trait ByteStage: Send + Sync + Debug {
    /// Short name used in the pipe's strategy tag
    fn name(&self) -> &'static str;

    /// Transform outgoing bytes (compress, encrypt)
    fn apply(&self, input: &[u8]) -> Result<Vec<u8>>;

    /// Undo [`apply`](Self::apply)
    fn reverse(&self, input: &[u8]) -> Result<Vec<u8>>;
}

/// How payloads are serialized before any byte stage runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum SerializerType {
    #[default]
    Json,
    Bincode,
}

impl SerializerType {
    pub fn tag(&self) -> &'static str {
        match self {
            SerializerType::Json => "json",
            SerializerType::Bincode => "bincode",
        }
    }
}

/// Compression applied to serialized contents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum CompressionType {
    #[default]
    None,
    Lz4,
}

/// Encryption applied after compression
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum EncryptionType {
    #[default]
    None,
    Aes256Gcm,
}
