//! Tests for the content pipeline
//!
//! These tests verify:
//! - Strategy tags
//! - Serializer and byte-stage combinations
//! - Encryption keys and passwords
//! - Codec registry lookups
//! - Client settings validation

use std::sync::Arc;

use quilldb::client::ClientSettings;
use quilldb::codec::{
    AesGcmEncryption, ByteStage, CodecRegistry, CompressionType, ContentsPipe, EncryptionType,
    Lz4Compression, SerializerType,
};
use quilldb::error::QuillError;
use serde::{Deserialize, Serialize};
use serde_json::json;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Reading {
    sensor: String,
    values: Vec<f64>,
}

fn reading() -> Reading {
    Reading {
        sensor: "t-100".to_string(),
        values: vec![1.5; 256],
    }
}

fn pipe(
    serializer: SerializerType,
    compression: CompressionType,
    encryption: EncryptionType,
    password: Option<&str>,
) -> ContentsPipe {
    ContentsPipe::create(serializer, compression, encryption, password).unwrap()
}

// =============================================================================
// Tag Tests
// =============================================================================

#[test]
fn test_tags_name_every_stage() {
    let plain = pipe(SerializerType::Json, CompressionType::None, EncryptionType::None, None);
    let lz4 = pipe(SerializerType::Bincode, CompressionType::Lz4, EncryptionType::None, None);
    let full = pipe(
        SerializerType::Json,
        CompressionType::Lz4,
        EncryptionType::Aes256Gcm,
        Some("secret"),
    );

    assert_eq!(plain.tag(), "json");
    assert_eq!(lz4.tag(), "bincode+lz4");
    assert_eq!(full.tag(), "json+lz4+aes256gcm");
}

// =============================================================================
// Pipeline Tests
// =============================================================================

#[test]
fn test_json_contents_are_plain_json() {
    let p = pipe(SerializerType::Json, CompressionType::None, EncryptionType::None, None);
    let bytes = p.contents_to_bytes(&json!({"a": 1})).unwrap();

    assert_eq!(bytes, br#"{"a":1}"#);
}

#[test]
fn test_every_combination_decodes() {
    for serializer in [SerializerType::Json, SerializerType::Bincode] {
        for compression in [CompressionType::None, CompressionType::Lz4] {
            for encryption in [EncryptionType::None, EncryptionType::Aes256Gcm] {
                let p = pipe(serializer, compression, encryption, Some("pw"));
                let bytes = p.contents_to_bytes(&reading()).unwrap();
                let back: Reading = p.bytes_to_contents(&bytes).unwrap();
                assert_eq!(back, reading(), "pipe {}", p.tag());
            }
        }
    }
}

#[test]
fn test_lz4_shrinks_repetitive_contents() {
    let plain = pipe(SerializerType::Json, CompressionType::None, EncryptionType::None, None);
    let lz4 = pipe(SerializerType::Json, CompressionType::Lz4, EncryptionType::None, None);

    let raw = plain.contents_to_bytes(&reading()).unwrap();
    let packed = lz4.contents_to_bytes(&reading()).unwrap();
    assert!(packed.len() < raw.len());
}

#[test]
fn test_encryption_uses_fresh_nonce() {
    let p = pipe(
        SerializerType::Json,
        CompressionType::None,
        EncryptionType::Aes256Gcm,
        Some("pw"),
    );

    let a = p.contents_to_bytes(&json!("same")).unwrap();
    let b = p.contents_to_bytes(&json!("same")).unwrap();
    assert_ne!(a, b);
}

#[test]
fn test_same_password_reads_across_pipes() {
    let writer = pipe(SerializerType::Json, CompressionType::Lz4, EncryptionType::Aes256Gcm, Some("shared"));
    let reader = pipe(SerializerType::Json, CompressionType::Lz4, EncryptionType::Aes256Gcm, Some("shared"));

    let bytes = writer.contents_to_bytes(&reading()).unwrap();
    let back: Reading = reader.bytes_to_contents(&bytes).unwrap();
    assert_eq!(back, reading());
}

#[test]
fn test_wrong_password_fails() {
    let writer = pipe(SerializerType::Json, CompressionType::None, EncryptionType::Aes256Gcm, Some("right"));
    let reader = pipe(SerializerType::Json, CompressionType::None, EncryptionType::Aes256Gcm, Some("wrong"));

    let bytes = writer.contents_to_bytes(&json!(1)).unwrap();
    let result: Result<serde_json::Value, _> = reader.bytes_to_contents(&bytes);
    assert!(matches!(result, Err(QuillError::Serialization(_))));
}

#[test]
fn test_tampered_ciphertext_fails() {
    let stage = AesGcmEncryption::from_key(&[7u8; 32]).unwrap();
    let mut sealed = stage.apply(b"payload").unwrap();
    let last = sealed.len() - 1;
    sealed[last] ^= 0x01;

    assert!(stage.reverse(&sealed).is_err());
}

#[test]
fn test_ciphertext_shorter_than_nonce_and_tag_fails() {
    let stage = AesGcmEncryption::from_key(&[7u8; 32]).unwrap();

    assert!(matches!(
        stage.reverse(&[0u8; 27]),
        Err(QuillError::Serialization(_))
    ));
    assert!(matches!(stage.reverse(&[]), Err(QuillError::Serialization(_))));
}

#[test]
fn test_bad_key_and_password() {
    assert!(matches!(
        AesGcmEncryption::from_key(&[0u8; 16]),
        Err(QuillError::Config(_))
    ));
    assert!(matches!(
        AesGcmEncryption::from_password(""),
        Err(QuillError::Config(_))
    ));
    assert!(matches!(
        ContentsPipe::create(
            SerializerType::Json,
            CompressionType::None,
            EncryptionType::Aes256Gcm,
            None
        ),
        Err(QuillError::Config(_))
    ));
}

#[test]
fn test_custom_stage_order() {
    let p = ContentsPipe::new(SerializerType::Bincode)
        .with_stage(Arc::new(Lz4Compression))
        .with_stage(Arc::new(AesGcmEncryption::from_key(&[1u8; 32]).unwrap()));

    assert_eq!(p.tag(), "bincode+lz4+aes256gcm");
    let bytes = p.contents_to_bytes(&reading()).unwrap();
    assert_eq!(p.bytes_to_contents::<Reading>(&bytes).unwrap(), reading());
}

#[test]
fn test_corrupt_lz4_input() {
    let result = Lz4Compression.reverse(&[10, 0, 0, 0, 0xFF, 0xFF]);
    assert!(matches!(result, Err(QuillError::Serialization(_))));
}

// =============================================================================
// Registry Tests
// =============================================================================

#[test]
fn test_registry_resolves_by_tag() {
    let mut registry = CodecRegistry::new();
    registry.register(pipe(SerializerType::Json, CompressionType::None, EncryptionType::None, None));
    registry.register(pipe(SerializerType::Bincode, CompressionType::Lz4, EncryptionType::None, None));

    assert!(registry.contains("json"));
    assert!(registry.contains("bincode+lz4"));
    assert!(!registry.contains("json+lz4"));

    let resolved = registry.resolve("bincode+lz4").unwrap();
    assert_eq!(resolved.serializer(), SerializerType::Bincode);
}

#[test]
fn test_registry_unknown_tag() {
    let registry = CodecRegistry::new();
    assert!(matches!(
        registry.resolve("msgpack"),
        Err(QuillError::Serialization(_))
    ));
}

// =============================================================================
// Settings Tests
// =============================================================================

#[test]
fn test_default_settings_pipe() {
    let settings = ClientSettings::default();
    assert_eq!(settings.contents_pipe().unwrap().tag(), "json+lz4");
}

#[test]
fn test_settings_require_password_for_encryption() {
    let missing = ClientSettings::builder()
        .encryption(EncryptionType::Aes256Gcm)
        .build();
    assert!(matches!(missing, Err(QuillError::Config(_))));

    let empty = ClientSettings::builder()
        .encryption(EncryptionType::Aes256Gcm)
        .encryption_password("")
        .build();
    assert!(matches!(empty, Err(QuillError::Config(_))));

    let ok = ClientSettings::builder()
        .serializer(SerializerType::Bincode)
        .compression(CompressionType::None)
        .encryption(EncryptionType::Aes256Gcm)
        .encryption_password("pw")
        .build()
        .unwrap();
    assert_eq!(ok.contents_pipe().unwrap().tag(), "bincode+aes256gcm");
}

#[test]
fn test_settings_debug_hides_password() {
    let settings = ClientSettings::builder()
        .encryption(EncryptionType::Aes256Gcm)
        .encryption_password("hunter2")
        .build()
        .unwrap();

    let debug = format!("{:?}", settings);
    assert!(!debug.contains("hunter2"));
    assert!(debug.contains("REDACTED"));
}
