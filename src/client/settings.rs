//! Client settings
//!
//! Which content pipeline a client writes documents with. Clients sharing a
//! store should agree on these, or register each other's pipes so they can
//! read one another's documents.

use std::fmt;

use crate::codec::{CompressionType, ContentsPipe, EncryptionType, SerializerType};
use crate::error::{QuillError, Result};

/// Content pipeline selection for a client
#[derive(Clone)]
pub struct ClientSettings {
    serializer: SerializerType,
    compression: CompressionType,
    encryption: EncryptionType,
    encryption_password: Option<String>,
}

impl Default for ClientSettings {
    fn default() -> Self {
        Self {
            serializer: SerializerType::Json,
            compression: CompressionType::Lz4,
            encryption: EncryptionType::None,
            encryption_password: None,
        }
    }
}

impl ClientSettings {
    /// Create a new settings builder
    pub fn builder() -> ClientSettingsBuilder {
        ClientSettingsBuilder::default()
    }

    /// Build the pipe these settings describe
    pub fn contents_pipe(&self) -> Result<ContentsPipe> {
        ContentsPipe::create(
            self.serializer,
            self.compression,
            self.encryption,
            self.encryption_password.as_deref(),
        )
    }

    pub fn serializer(&self) -> SerializerType {
        self.serializer
    }

    pub fn compression(&self) -> CompressionType {
        self.compression
    }

    pub fn encryption(&self) -> EncryptionType {
        self.encryption
    }
}

impl fmt::Debug for ClientSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSettings")
            .field("serializer", &self.serializer)
            .field("compression", &self.compression)
            .field("encryption", &self.encryption)
            .field(
                "encryption_password",
                &self.encryption_password.as_ref().map(|_| "[REDACTED]"),
            )
            .finish()
    }
}

/// Builder for ClientSettings
#[derive(Default)]
pub struct ClientSettingsBuilder {
    settings: ClientSettings,
}

impl ClientSettingsBuilder {
    pub fn serializer(mut self, serializer: SerializerType) -> Self {
        self.settings.serializer = serializer;
        self
    }

    pub fn compression(mut self, compression: CompressionType) -> Self {
        self.settings.compression = compression;
        self
    }

    pub fn encryption(mut self, encryption: EncryptionType) -> Self {
        self.settings.encryption = encryption;
        self
    }

    pub fn encryption_password(mut self, password: impl Into<String>) -> Self {
        self.settings.encryption_password = Some(password.into());
        self
    }

    /// Fails if encryption is on without a non-empty password
    pub fn build(self) -> Result<ClientSettings> {
        let settings = self.settings;

        let has_password = settings
            .encryption_password
            .as_deref()
            .is_some_and(|p| !p.is_empty());

        if settings.encryption != EncryptionType::None && !has_password {
            return Err(QuillError::Config(
                "encryption is enabled but no password is set".to_string(),
            ));
        }

        Ok(settings)
    }
}
