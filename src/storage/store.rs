//! OrderedStore implementation
//!
//! BTreeMap-based store with RwLock for concurrency.

use std::collections::BTreeMap;
use std::ops::Bound;

use parking_lot::RwLock;

/// In-memory ordered mapping from key bytes to value bytes
#[derive(Debug, Default)]
pub struct OrderedStore {
    data: RwLock<BTreeMap<Vec<u8>, Vec<u8>>>,
}

impl OrderedStore {
    /// Create a new empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Upsert every pair (write lock held for the whole batch)
    pub fn write<I>(&self, entries: I)
    where
        I: IntoIterator<Item = (Vec<u8>, Vec<u8>)>,
    {
        let mut data = self.data.write();
        for (key, value) in entries {
            data.insert(key, value);
        }
    }

    /// Remove each key if present; absent keys are ignored
    ///
    /// Returns how many keys were actually removed.
    pub fn delete<K: AsRef<[u8]>>(&self, keys: &[K]) -> usize {
        let mut data = self.data.write();
        keys.iter()
            .filter(|key| data.remove(key.as_ref()).is_some())
            .count()
    }

    /// Values for the keys that exist, in input order
    ///
    /// Missing keys contribute nothing, so the result may be shorter than
    /// the input.
    pub fn get<K: AsRef<[u8]>>(&self, keys: &[K]) -> Vec<Vec<u8>> {
        let data = self.data.read();
        keys.iter()
            .filter_map(|key| data.get(key.as_ref()).cloned())
            .collect()
    }

    /// Value for a single key
    pub fn get_one(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.data.read().get(key).cloned()
    }

    pub fn contains_key(&self, key: &[u8]) -> bool {
        self.data.read().contains_key(key)
    }

    /// Snapshot of every entry in ascending key order
    ///
    /// Call again to restart; later writes do not affect a snapshot
    /// already taken.
    pub fn scan(&self) -> StoreIter {
        let data = self.data.read();
        let entries: Vec<_> = data.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        StoreIter {
            inner: entries.into_iter(),
        }
    }

    /// Snapshot of entries with `start <= key < end`
    ///
    /// An empty `end` means no upper bound. A bounded range whose start is
    /// not below its end is empty.
    pub fn range(&self, start: &[u8], end: &[u8]) -> StoreIter {
        let upper = if end.is_empty() {
            Bound::Unbounded
        } else if start >= end {
            return StoreIter::empty();
        } else {
            Bound::Excluded(end)
        };

        let data = self.data.read();
        let entries: Vec<_> = data
            .range::<[u8], _>((Bound::Included(start), upper))
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        StoreIter {
            inner: entries.into_iter(),
        }
    }

    /// Number of keys
    pub fn len(&self) -> usize {
        self.data.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.read().is_empty()
    }

    /// Drop every entry
    pub fn clear(&self) {
        self.data.write().clear();
    }
}

/// Owned, ordered iterator over a store snapshot
pub struct StoreIter {
    inner: std::vec::IntoIter<(Vec<u8>, Vec<u8>)>,
}

impl StoreIter {
    fn empty() -> Self {
        Self {
            inner: Vec::new().into_iter(),
        }
    }
}

impl Iterator for StoreIter {
    type Item = (Vec<u8>, Vec<u8>);

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl ExactSizeIterator for StoreIter {}
