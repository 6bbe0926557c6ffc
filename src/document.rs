//! Document Module
//!
//! The immutable, versioned value wrapper that clients read and write.
//!
//! ## Versioning
//! - A freshly created document is at instance version 0
//! - Deriving a document from an existing one bumps the version by exactly 1
//! - The store accepts a write only when `instance_version == stored + 1`
//!   (or 0 when nothing is stored under the key)
//!
//! Documents are never mutated in place: every "update" builds a new value.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::codec::{CodecRegistry, ContentsPipe};
use crate::error::{QuillError, Result};

/// A typed payload that can live inside a document
pub trait DocumentContents: Serialize + DeserializeOwned {
    /// Identifies the concrete payload type for reconstruction
    const CONTENT_CLASS: &'static str;

    /// Version of the payload's own schema
    const SCHEMA_VERSION: u16 = 0;
}

impl DocumentContents for serde_json::Value {
    const CONTENT_CLASS: &'static str = "json.Value";
}

/// A versioned document
///
/// Field order here is the wire order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    key: Vec<u8>,
    contents: Vec<u8>,
    content_class: String,
    content_type: String,
    schema_version: u16,
    instance_version: u64,

    /// Logical delete marker; in-memory only
    #[serde(skip)]
    deleted: bool,
}

impl Document {
    /// Create a document at version 0 from already-encoded contents
    pub fn new(
        key: impl Into<Vec<u8>>,
        contents: Vec<u8>,
        content_class: impl Into<String>,
        content_type: impl Into<String>,
    ) -> Self {
        Self {
            key: key.into(),
            contents,
            content_class: content_class.into(),
            content_type: content_type.into(),
            schema_version: 0,
            instance_version: 0,
            deleted: false,
        }
    }

    /// Create a document at version 0 by running `payload` through `pipe`
    pub fn create<T: DocumentContents>(
        key: impl Into<Vec<u8>>,
        payload: &T,
        pipe: &ContentsPipe,
    ) -> Result<Self> {
        let contents = pipe.contents_to_bytes(payload)?;
        let mut document = Self::new(key, contents, T::CONTENT_CLASS, pipe.tag());
        document.schema_version = T::SCHEMA_VERSION;
        Ok(document)
    }

    /// Reassemble a document from all of its wire fields
    pub fn from_parts(
        key: Vec<u8>,
        contents: Vec<u8>,
        content_class: String,
        content_type: String,
        schema_version: u16,
        instance_version: u64,
    ) -> Self {
        Self {
            key,
            contents,
            content_class,
            content_type,
            schema_version,
            instance_version,
            deleted: false,
        }
    }

    /// The next version of this document with unchanged contents
    pub fn next_version(&self) -> Self {
        Self {
            instance_version: self.instance_version + 1,
            deleted: false,
            ..self.clone()
        }
    }

    /// The next version of this document carrying new contents
    ///
    /// The content type is fixed for a document's lifetime, so the new
    /// payload must go through a pipe with the same tag.
    pub fn with_contents<T: DocumentContents>(
        &self,
        payload: &T,
        pipe: &ContentsPipe,
    ) -> Result<Self> {
        if pipe.tag() != self.content_type {
            return Err(QuillError::InvalidDocument(format!(
                "content type is '{}', cannot re-encode with '{}'",
                self.content_type,
                pipe.tag()
            )));
        }

        Ok(Self {
            key: self.key.clone(),
            contents: pipe.contents_to_bytes(payload)?,
            content_class: T::CONTENT_CLASS.to_string(),
            content_type: self.content_type.clone(),
            schema_version: T::SCHEMA_VERSION,
            instance_version: self.instance_version + 1,
            deleted: false,
        })
    }

    /// A copy of this document flagged as deleted
    pub fn tombstone(&self) -> Self {
        Self {
            deleted: true,
            ..self.clone()
        }
    }

    /// Decode the contents using the pipe registered for this content type
    pub fn contents_as<T: DocumentContents>(&self, registry: &CodecRegistry) -> Result<T> {
        if self.content_class != T::CONTENT_CLASS {
            return Err(QuillError::Serialization(format!(
                "document holds '{}', not '{}'",
                self.content_class,
                T::CONTENT_CLASS
            )));
        }

        let pipe = registry.resolve(&self.content_type)?;
        pipe.bytes_to_contents(&self.contents)
    }

    // =========================================================================
    // Wire form
    // =========================================================================

    /// Encode the wire form (without the delete marker)
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self)
            .map_err(|e| QuillError::ProtocolSerialization(format!("document encode: {}", e)))
    }

    /// Decode a document from its wire form
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        bincode::deserialize(bytes)
            .map_err(|e| QuillError::ProtocolSerialization(format!("document decode: {}", e)))
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    pub fn key(&self) -> &[u8] {
        &self.key
    }

    pub fn contents(&self) -> &[u8] {
        &self.contents
    }

    pub fn content_class(&self) -> &str {
        &self.content_class
    }

    pub fn content_type(&self) -> &str {
        &self.content_type
    }

    pub fn schema_version(&self) -> u16 {
        self.schema_version
    }

    pub fn instance_version(&self) -> u64 {
        self.instance_version
    }

    pub fn is_deleted(&self) -> bool {
        self.deleted
    }
}
