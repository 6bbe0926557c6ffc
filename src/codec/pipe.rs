//! Contents pipe and codec registry

use std::collections::HashMap;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{QuillError, Result};

use super::{
    AesGcmEncryption, ByteStage, CompressionType, EncryptionType, Lz4Compression, SerializerType,
};

/// A serializer followed by an ordered list of byte stages
#[derive(Debug, Clone)]
pub struct ContentsPipe {
    serializer: SerializerType,
    stages: Vec<Arc<dyn ByteStage>>,
    tag: String,
}

impl ContentsPipe {
    /// A pipe that only serializes
    pub fn new(serializer: SerializerType) -> Self {
        Self {
            serializer,
            stages: Vec::new(),
            tag: serializer.tag().to_string(),
        }
    }

    /// Build a pipe from named strategies
    ///
    /// Compression always runs before encryption. A password is required
    /// when encryption is selected.
    pub fn create(
        serializer: SerializerType,
        compression: CompressionType,
        encryption: EncryptionType,
        password: Option<&str>,
    ) -> Result<Self> {
        let mut pipe = Self::new(serializer);

        if compression == CompressionType::Lz4 {
            pipe = pipe.with_stage(Arc::new(Lz4Compression));
        }

        if encryption == EncryptionType::Aes256Gcm {
            let password = password.ok_or_else(|| {
                QuillError::Config("encryption selected but no password given".to_string())
            })?;
            pipe = pipe.with_stage(Arc::new(AesGcmEncryption::from_password(password)?));
        }

        Ok(pipe)
    }

    /// Append a byte stage; it runs after every stage already present
    pub fn with_stage(mut self, stage: Arc<dyn ByteStage>) -> Self {
        self.tag.push('+');
        self.tag.push_str(stage.name());
        self.stages.push(stage);
        self
    }

    /// Strategy tag, stored as a document's content type
    pub fn tag(&self) -> &str {
        &self.tag
    }

    pub fn serializer(&self) -> SerializerType {
        self.serializer
    }

    /// Run a payload through the pipe
    pub fn contents_to_bytes<T: Serialize + ?Sized>(&self, payload: &T) -> Result<Vec<u8>> {
        let mut bytes = match self.serializer {
            SerializerType::Json => serde_json::to_vec(payload)?,
            SerializerType::Bincode => bincode::serialize(payload)?,
        };

        for stage in &self.stages {
            bytes = stage.apply(&bytes)?;
        }

        Ok(bytes)
    }

    /// Reverse the pipe back into a payload
    pub fn bytes_to_contents<T: DeserializeOwned>(&self, contents: &[u8]) -> Result<T> {
        let mut bytes = contents.to_vec();
        for stage in self.stages.iter().rev() {
            bytes = stage.reverse(&bytes)?;
        }

        let payload = match self.serializer {
            SerializerType::Json => serde_json::from_slice(&bytes)?,
            SerializerType::Bincode => bincode::deserialize(&bytes)?,
        };
        Ok(payload)
    }
}

/// Maps strategy tags to the pipes that can decode them
#[derive(Debug, Clone, Default)]
pub struct CodecRegistry {
    pipes: HashMap<String, Arc<ContentsPipe>>,
}

impl CodecRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry with one pipe already registered
    pub fn with_pipe(pipe: ContentsPipe) -> Self {
        let mut registry = Self::new();
        registry.register(pipe);
        registry
    }

    /// Register a pipe under its tag, replacing any previous pipe with that tag
    pub fn register(&mut self, pipe: ContentsPipe) -> Arc<ContentsPipe> {
        let pipe = Arc::new(pipe);
        self.pipes.insert(pipe.tag().to_string(), Arc::clone(&pipe));
        pipe
    }

    /// Find the pipe for a content type
    pub fn resolve(&self, tag: &str) -> Result<Arc<ContentsPipe>> {
        self.pipes.get(tag).cloned().ok_or_else(|| {
            QuillError::Serialization(format!("no codec registered for content type '{}'", tag))
        })
    }

    pub fn contains(&self, tag: &str) -> bool {
        self.pipes.contains_key(tag)
    }
}
