//! Tests for OrderedStore
//!
//! These tests verify:
//! - Upsert, delete, point and multi-get
//! - Lexicographic byte ordering
//! - Range bounds
//! - Snapshot iteration
//! - Concurrent readers alongside a writer

use std::sync::Arc;
use std::thread;

use quilldb::storage::OrderedStore;

fn pairs(entries: &[(&str, &str)]) -> Vec<(Vec<u8>, Vec<u8>)> {
    entries
        .iter()
        .map(|(k, v)| (k.as_bytes().to_vec(), v.as_bytes().to_vec()))
        .collect()
}

fn keys(iter: impl Iterator<Item = (Vec<u8>, Vec<u8>)>) -> Vec<Vec<u8>> {
    iter.map(|(k, _)| k).collect()
}

// =============================================================================
// Basic Operations Tests
// =============================================================================

#[test]
fn test_new_store_is_empty() {
    let store = OrderedStore::new();
    assert!(store.is_empty());
    assert_eq!(store.len(), 0);
    assert_eq!(store.scan().count(), 0);
}

#[test]
fn test_write_and_get() {
    let store = OrderedStore::new();
    store.write(pairs(&[("a", "1"), ("b", "2")]));

    assert_eq!(store.get_one(b"a"), Some(b"1".to_vec()));
    assert_eq!(store.get_one(b"b"), Some(b"2".to_vec()));
    assert_eq!(store.get_one(b"c"), None);
    assert!(store.contains_key(b"a"));
    assert_eq!(store.len(), 2);
}

#[test]
fn test_write_overwrites() {
    let store = OrderedStore::new();
    store.write(pairs(&[("k", "old")]));
    store.write(pairs(&[("k", "new")]));

    assert_eq!(store.get_one(b"k"), Some(b"new".to_vec()));
    assert_eq!(store.len(), 1);
}

#[test]
fn test_get_skips_missing_keys_and_keeps_input_order() {
    let store = OrderedStore::new();
    store.write(pairs(&[("a", "1"), ("b", "2"), ("c", "3")]));

    let values = store.get(&[b"c".to_vec(), b"zz".to_vec(), b"a".to_vec()]);
    assert_eq!(values, vec![b"3".to_vec(), b"1".to_vec()]);
}

#[test]
fn test_delete_ignores_absent_keys() {
    let store = OrderedStore::new();
    store.write(pairs(&[("a", "1"), ("b", "2")]));

    let removed = store.delete(&[b"a".as_slice(), b"missing".as_slice()]);
    assert_eq!(removed, 1);
    assert!(!store.contains_key(b"a"));
    assert!(store.contains_key(b"b"));

    assert_eq!(store.delete(&[b"a".as_slice()]), 0);
}

#[test]
fn test_clear() {
    let store = OrderedStore::new();
    store.write(pairs(&[("a", "1")]));
    store.clear();
    assert!(store.is_empty());
}

// =============================================================================
// Ordering Tests
// =============================================================================

#[test]
fn test_scan_is_lexicographic_by_bytes() {
    let store = OrderedStore::new();
    store.write(vec![
        (vec![0x02], b"x".to_vec()),
        (vec![0x01, 0xFF], b"x".to_vec()),
        (vec![0x01], b"x".to_vec()),
        (vec![0x00, 0x05], b"x".to_vec()),
    ]);

    assert_eq!(
        keys(store.scan()),
        vec![vec![0x00, 0x05], vec![0x01], vec![0x01, 0xFF], vec![0x02]]
    );
}

#[test]
fn test_shorter_key_sorts_first_on_shared_prefix() {
    let store = OrderedStore::new();
    store.write(pairs(&[("abc", "3"), ("ab", "2"), ("a", "1")]));

    assert_eq!(
        keys(store.scan()),
        vec![b"a".to_vec(), b"ab".to_vec(), b"abc".to_vec()]
    );
}

#[test]
fn test_scan_is_a_snapshot() {
    let store = OrderedStore::new();
    store.write(pairs(&[("a", "1"), ("b", "2")]));

    let iter = store.scan();
    store.write(pairs(&[("c", "3")]));
    store.delete(&[b"a".as_slice()]);

    assert_eq!(iter.len(), 2);
    assert_eq!(keys(iter), vec![b"a".to_vec(), b"b".to_vec()]);
    assert_eq!(keys(store.scan()), vec![b"b".to_vec(), b"c".to_vec()]);
}

// =============================================================================
// Range Tests
// =============================================================================

fn range_store() -> OrderedStore {
    let store = OrderedStore::new();
    store.write(pairs(&[
        ("apple", "1"),
        ("banana", "2"),
        ("cherry", "3"),
        ("date", "4"),
        ("elder", "5"),
    ]));
    store
}

#[test]
fn test_range_start_inclusive_end_exclusive() {
    let store = range_store();

    assert_eq!(
        keys(store.range(b"banana", b"date")),
        vec![b"banana".to_vec(), b"cherry".to_vec()]
    );
}

#[test]
fn test_range_bounds_between_keys() {
    let store = range_store();

    assert_eq!(
        keys(store.range(b"b", b"d")),
        vec![b"banana".to_vec(), b"cherry".to_vec()]
    );
}

#[test]
fn test_range_empty_end_is_unbounded() {
    let store = range_store();

    assert_eq!(
        keys(store.range(b"cherry", b"")),
        vec![b"cherry".to_vec(), b"date".to_vec(), b"elder".to_vec()]
    );
    assert_eq!(store.range(b"", b"").count(), 5);
}

#[test]
fn test_range_start_not_below_end_is_empty() {
    let store = range_store();

    assert_eq!(store.range(b"date", b"date").count(), 0);
    assert_eq!(store.range(b"elder", b"apple").count(), 0);
}

#[test]
fn test_range_past_last_key() {
    let store = range_store();
    assert_eq!(store.range(b"zzz", b"").count(), 0);
}

// =============================================================================
// Concurrency Tests
// =============================================================================

#[test]
fn test_readers_see_whole_batches() {
    let store = Arc::new(OrderedStore::new());

    let writer = {
        let store = Arc::clone(&store);
        thread::spawn(move || {
            for i in 0..200u32 {
                let batch: Vec<_> = (0..10u32)
                    .map(|j| (format!("k{:02}", j).into_bytes(), i.to_be_bytes().to_vec()))
                    .collect();
                store.write(batch);
            }
        })
    };

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let store = Arc::clone(&store);
            thread::spawn(move || {
                for _ in 0..200 {
                    let values: Vec<_> = store.scan().map(|(_, v)| v).collect();
                    if let Some(first) = values.first() {
                        assert!(values.iter().all(|v| v == first));
                    }
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }

    assert_eq!(store.len(), 10);
}
