//! Tests for Document
//!
//! These tests verify:
//! - Version derivation (create, next_version, with_contents)
//! - Content type pinning
//! - Typed contents through a codec registry
//! - Wire form

use quilldb::codec::{CodecRegistry, CompressionType, ContentsPipe, EncryptionType, SerializerType};
use quilldb::error::QuillError;
use quilldb::{Document, DocumentContents};
use serde::{Deserialize, Serialize};
use serde_json::json;

// =============================================================================
// Helper Types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Account {
    owner: String,
    balance: i64,
}

impl DocumentContents for Account {
    const CONTENT_CLASS: &'static str = "test.Account";
    const SCHEMA_VERSION: u16 = 3;
}

fn json_pipe() -> ContentsPipe {
    ContentsPipe::new(SerializerType::Json)
}

fn lz4_pipe() -> ContentsPipe {
    ContentsPipe::create(
        SerializerType::Json,
        CompressionType::Lz4,
        EncryptionType::None,
        None,
    )
    .unwrap()
}

// =============================================================================
// Versioning Tests
// =============================================================================

#[test]
fn test_create_starts_at_version_zero() {
    let doc = Document::create("k1", &json!({"a": 1}), &json_pipe()).unwrap();

    assert_eq!(doc.key(), b"k1");
    assert_eq!(doc.instance_version(), 0);
    assert_eq!(doc.content_type(), "json");
    assert_eq!(doc.content_class(), "json.Value");
    assert_eq!(doc.schema_version(), 0);
    assert!(!doc.is_deleted());
}

#[test]
fn test_create_records_schema_version() {
    let account = Account {
        owner: "ada".to_string(),
        balance: 10,
    };
    let doc = Document::create("acct", &account, &json_pipe()).unwrap();

    assert_eq!(doc.content_class(), "test.Account");
    assert_eq!(doc.schema_version(), 3);
}

#[test]
fn test_next_version_increments_by_one() {
    let v0 = Document::create("k", &json!(1), &json_pipe()).unwrap();
    let v1 = v0.next_version();
    let v2 = v1.next_version();

    assert_eq!(v1.instance_version(), 1);
    assert_eq!(v2.instance_version(), 2);
    assert_eq!(v2.contents(), v0.contents());

    // The original is untouched
    assert_eq!(v0.instance_version(), 0);
}

#[test]
fn test_with_contents_replaces_payload_and_bumps_version() {
    let pipe = json_pipe();
    let v0 = Document::create("k", &json!({"n": 1}), &pipe).unwrap();
    let v1 = v0.with_contents(&json!({"n": 2}), &pipe).unwrap();

    assert_eq!(v1.instance_version(), 1);
    assert_eq!(v1.key(), v0.key());
    assert_ne!(v1.contents(), v0.contents());

    let registry = CodecRegistry::with_pipe(pipe);
    let value: serde_json::Value = v1.contents_as(&registry).unwrap();
    assert_eq!(value, json!({"n": 2}));
}

#[test]
fn test_with_contents_rejects_other_content_type() {
    let v0 = Document::create("k", &json!(1), &json_pipe()).unwrap();
    let result = v0.with_contents(&json!(2), &lz4_pipe());

    assert!(matches!(result, Err(QuillError::InvalidDocument(_))));
}

#[test]
fn test_tombstone_keeps_version() {
    let doc = Document::create("k", &json!(1), &json_pipe()).unwrap().next_version();
    let dead = doc.tombstone();

    assert!(dead.is_deleted());
    assert_eq!(dead.instance_version(), 1);
    assert!(!dead.next_version().is_deleted());
}

// =============================================================================
// Contents Tests
// =============================================================================

#[test]
fn test_contents_as_typed_payload() {
    let pipe = lz4_pipe();
    let account = Account {
        owner: "grace".to_string(),
        balance: -5,
    };
    let doc = Document::create("acct", &account, &pipe).unwrap();

    let registry = CodecRegistry::with_pipe(pipe);
    let decoded: Account = doc.contents_as(&registry).unwrap();
    assert_eq!(decoded, account);
}

#[test]
fn test_contents_as_wrong_class() {
    let pipe = json_pipe();
    let doc = Document::create("k", &json!({"owner": "x", "balance": 1}), &pipe).unwrap();

    let registry = CodecRegistry::with_pipe(pipe);
    let result: Result<Account, _> = doc.contents_as(&registry);
    assert!(matches!(result, Err(QuillError::Serialization(_))));
}

#[test]
fn test_contents_as_unregistered_type() {
    let doc = Document::create("k", &json!(1), &lz4_pipe()).unwrap();

    let registry = CodecRegistry::with_pipe(json_pipe());
    let result: Result<serde_json::Value, _> = doc.contents_as(&registry);
    assert!(matches!(result, Err(QuillError::Serialization(_))));
}

// =============================================================================
// Wire Form Tests
// =============================================================================

#[test]
fn test_wire_form_preserves_fields() {
    let doc = Document::from_parts(
        b"key".to_vec(),
        vec![1, 2, 3],
        "cls".to_string(),
        "bincode".to_string(),
        7,
        42,
    );

    let decoded = Document::from_bytes(&doc.to_bytes().unwrap()).unwrap();
    assert_eq!(decoded, doc);
}

#[test]
fn test_wire_form_drops_delete_marker() {
    let doc = Document::create("k", &json!(1), &json_pipe()).unwrap().tombstone();

    let decoded = Document::from_bytes(&doc.to_bytes().unwrap()).unwrap();
    assert!(!decoded.is_deleted());
}

#[test]
fn test_from_bytes_garbage() {
    let result = Document::from_bytes(&[0xFF, 0x01]);
    assert!(matches!(result, Err(QuillError::ProtocolSerialization(_))));
}
