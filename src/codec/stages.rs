//! Byte stages
//!
//! LZ4 compression and AES-256-GCM encryption.

use std::fmt;

use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Nonce};
use hkdf::Hkdf;
use rand::RngCore;
use sha2::Sha256;

use crate::error::{QuillError, Result};

use super::ByteStage;

/// Size of the AES-256 key in bytes
pub const KEY_SIZE: usize = 32;
/// Size of the GCM nonce in bytes
pub const NONCE_SIZE: usize = 12;
/// Size of the GCM authentication tag in bytes
pub const TAG_SIZE: usize = 16;

/// Salt and info used when deriving the content key from a password.
/// Fixed so every client configured with the same password can read
/// every other client's documents.
const KEY_SALT: &[u8] = b"quilldb-contents";
const KEY_INFO: &[u8] = b"quilldb-contents-key-v1";

// =============================================================================
// LZ4
// =============================================================================

/// LZ4 block compression with the uncompressed size prepended
#[derive(Debug, Default, Clone, Copy)]
pub struct Lz4Compression;

impl ByteStage for Lz4Compression {
    fn name(&self) -> &'static str {
        "lz4"
    }

    fn apply(&self, input: &[u8]) -> Result<Vec<u8>> {
        Ok(lz4_flex::compress_prepend_size(input))
    }

    fn reverse(&self, input: &[u8]) -> Result<Vec<u8>> {
        lz4_flex::decompress_size_prepended(input)
            .map_err(|e| QuillError::Serialization(format!("LZ4 decompression failed: {}", e)))
    }
}

// =============================================================================
// AES-256-GCM
// =============================================================================

/// Authenticated encryption of document contents
///
/// Output format: `nonce (12 bytes) || ciphertext || tag (16 bytes)`
pub struct AesGcmEncryption {
    cipher: Aes256Gcm,
}

impl AesGcmEncryption {
    /// Derive the content key from a password with HKDF-SHA256
    pub fn from_password(password: &str) -> Result<Self> {
        if password.is_empty() {
            return Err(QuillError::Config(
                "encryption requires a non-empty password".to_string(),
            ));
        }

        let hk = Hkdf::<Sha256>::new(Some(KEY_SALT), password.as_bytes());
        let mut key = [0u8; KEY_SIZE];
        hk.expand(KEY_INFO, &mut key)
            .map_err(|_| QuillError::Config("key derivation failed".to_string()))?;

        Self::from_key(&key)
    }

    /// Build from a raw 32-byte key
    pub fn from_key(key: &[u8]) -> Result<Self> {
        let cipher = Aes256Gcm::new_from_slice(key).map_err(|_| {
            QuillError::Config(format!(
                "invalid key size: expected {} bytes, got {}",
                KEY_SIZE,
                key.len()
            ))
        })?;
        Ok(Self { cipher })
    }
}

impl fmt::Debug for AesGcmEncryption {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AesGcmEncryption")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

impl ByteStage for AesGcmEncryption {
    fn name(&self) -> &'static str {
        "aes256gcm"
    }

    fn apply(&self, input: &[u8]) -> Result<Vec<u8>> {
        let mut nonce_bytes = [0u8; NONCE_SIZE];
        rand::thread_rng().fill_bytes(&mut nonce_bytes);
        let nonce = Nonce::from_slice(&nonce_bytes);

        let ciphertext = self
            .cipher
            .encrypt(nonce, input)
            .map_err(|_| QuillError::Serialization("encryption failed".to_string()))?;

        let mut out = Vec::with_capacity(NONCE_SIZE + ciphertext.len());
        out.extend_from_slice(&nonce_bytes);
        out.extend(ciphertext);
        Ok(out)
    }

    fn reverse(&self, input: &[u8]) -> Result<Vec<u8>> {
        if input.len() < NONCE_SIZE + TAG_SIZE {
            return Err(QuillError::Serialization("ciphertext too short".to_string()));
        }

        let nonce = Nonce::from_slice(&input[..NONCE_SIZE]);
        self.cipher
            .decrypt(nonce, &input[NONCE_SIZE..])
            .map_err(|_| QuillError::Serialization("decryption failed".to_string()))
    }
}
