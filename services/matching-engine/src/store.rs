//! Transactional key-value store abstraction
//!
//! The engine persists all book state through this interface. Keys are plain
//! byte strings and iterate in byte-lexicographic order; the index key
//! encodings in [`crate::keys`] rely on that. `BTreeMap` backs both the
//! in-memory store and the write buffer so iteration order is deterministic.

use std::collections::BTreeMap;

/// Byte-ordered key-value storage
///
/// Implementations must return scan results sorted ascending by key.
pub trait Store {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>>;

    fn set(&mut self, key: Vec<u8>, value: Vec<u8>);

    fn delete(&mut self, key: &[u8]);

    fn has(&self, key: &[u8]) -> bool {
        self.get(key).is_some()
    }

    /// All pairs whose key starts with `prefix`, ascending. An empty prefix
    /// scans the entire store.
    fn scan_prefix(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)>;

    /// First pair under `prefix`, if any
    fn first_under_prefix(&self, prefix: &[u8]) -> Option<(Vec<u8>, Vec<u8>)> {
        self.scan_prefix(prefix).into_iter().next()
    }
}

/// Smallest byte string strictly greater than every key with this prefix,
/// or None when the prefix is all 0xff and no upper bound exists.
fn prefix_end(prefix: &[u8]) -> Option<Vec<u8>> {
    let mut end = prefix.to_vec();
    while let Some(last) = end.pop() {
        if last < 0xff {
            end.push(last + 1);
            return Some(end);
        }
    }
    None
}

/// In-memory store
#[derive(Debug, Default, Clone)]
pub struct MemStore {
    map: BTreeMap<Vec<u8>, Vec<u8>>,
}

impl MemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

impl Store for MemStore {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        self.map.get(key).cloned()
    }

    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.map.insert(key, value);
    }

    fn delete(&mut self, key: &[u8]) {
        self.map.remove(key);
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        let range: Vec<(Vec<u8>, Vec<u8>)> = match prefix_end(prefix) {
            Some(end) => self
                .map
                .range(prefix.to_vec()..end)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
            None => self
                .map
                .range(prefix.to_vec()..)
                .map(|(k, v)| (k.clone(), v.clone()))
                .collect(),
        };
        range
    }

    fn first_under_prefix(&self, prefix: &[u8]) -> Option<(Vec<u8>, Vec<u8>)> {
        match prefix_end(prefix) {
            Some(end) => self
                .map
                .range(prefix.to_vec()..end)
                .next()
                .map(|(k, v)| (k.clone(), v.clone())),
            None => self
                .map
                .range(prefix.to_vec()..)
                .next()
                .map(|(k, v)| (k.clone(), v.clone())),
        }
    }
}

/// Write-buffering overlay providing the per-operation transaction scope
///
/// Reads fall through to the base store unless shadowed; writes and deletes
/// stay in the overlay until [`CacheStore::commit`]. Dropping the cache
/// without committing discards every buffered mutation, which is how failed
/// operations leave no trace.
pub struct CacheStore<'a, S: Store + ?Sized> {
    base: &'a mut S,
    // None marks a deletion
    overlay: BTreeMap<Vec<u8>, Option<Vec<u8>>>,
}

impl<'a, S: Store + ?Sized> CacheStore<'a, S> {
    pub fn new(base: &'a mut S) -> Self {
        Self {
            base,
            overlay: BTreeMap::new(),
        }
    }

    /// Apply all buffered mutations to the base store
    pub fn commit(self) {
        for (key, value) in self.overlay {
            match value {
                Some(v) => self.base.set(key, v),
                None => self.base.delete(&key),
            }
        }
    }
}

impl<S: Store + ?Sized> Store for CacheStore<'_, S> {
    fn get(&self, key: &[u8]) -> Option<Vec<u8>> {
        match self.overlay.get(key) {
            Some(Some(v)) => Some(v.clone()),
            Some(None) => None,
            None => self.base.get(key),
        }
    }

    fn set(&mut self, key: Vec<u8>, value: Vec<u8>) {
        self.overlay.insert(key, Some(value));
    }

    fn delete(&mut self, key: &[u8]) {
        self.overlay.insert(key.to_vec(), None);
    }

    fn scan_prefix(&self, prefix: &[u8]) -> Vec<(Vec<u8>, Vec<u8>)> {
        let mut merged: BTreeMap<Vec<u8>, Vec<u8>> =
            self.base.scan_prefix(prefix).into_iter().collect();

        let shadowed = match prefix_end(prefix) {
            Some(end) => self.overlay.range(prefix.to_vec()..end),
            None => self.overlay.range(prefix.to_vec()..),
        };
        for (key, value) in shadowed {
            match value {
                Some(v) => {
                    merged.insert(key.clone(), v.clone());
                }
                None => {
                    merged.remove(key);
                }
            }
        }

        merged.into_iter().collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kv(k: &str, v: &str) -> (Vec<u8>, Vec<u8>) {
        (k.as_bytes().to_vec(), v.as_bytes().to_vec())
    }

    #[test]
    fn test_mem_store_roundtrip() {
        let mut store = MemStore::new();
        store.set(b"a".to_vec(), b"1".to_vec());
        assert_eq!(store.get(b"a"), Some(b"1".to_vec()));
        assert!(store.has(b"a"));

        store.delete(b"a");
        assert_eq!(store.get(b"a"), None);
    }

    #[test]
    fn test_scan_prefix_is_sorted_and_bounded() {
        let mut store = MemStore::new();
        store.set(b"P/b".to_vec(), b"2".to_vec());
        store.set(b"P/a".to_vec(), b"1".to_vec());
        store.set(b"Q/a".to_vec(), b"3".to_vec());

        let pairs = store.scan_prefix(b"P/");
        assert_eq!(pairs, vec![kv("P/a", "1"), kv("P/b", "2")]);
    }

    #[test]
    fn test_empty_prefix_scans_everything() {
        let mut store = MemStore::new();
        store.set(b"a".to_vec(), b"1".to_vec());
        store.set(b"b".to_vec(), b"2".to_vec());
        assert_eq!(store.scan_prefix(b"").len(), 2);
    }

    #[test]
    fn test_first_under_prefix() {
        let mut store = MemStore::new();
        store.set(b"P/b".to_vec(), b"2".to_vec());
        store.set(b"P/a".to_vec(), b"1".to_vec());
        assert_eq!(store.first_under_prefix(b"P/"), Some(kv("P/a", "1")));
        assert_eq!(store.first_under_prefix(b"X/"), None);
    }

    #[test]
    fn test_prefix_end_carries() {
        assert_eq!(prefix_end(b"a\xff"), Some(b"b".to_vec()));
        assert_eq!(prefix_end(b"\xff\xff"), None);
    }

    #[test]
    fn test_cache_store_commit() {
        let mut base = MemStore::new();
        base.set(b"a".to_vec(), b"1".to_vec());

        let mut cache = CacheStore::new(&mut base);
        cache.set(b"b".to_vec(), b"2".to_vec());
        cache.delete(b"a");
        assert_eq!(cache.get(b"a"), None);
        assert_eq!(cache.get(b"b"), Some(b"2".to_vec()));
        cache.commit();

        assert_eq!(base.get(b"a"), None);
        assert_eq!(base.get(b"b"), Some(b"2".to_vec()));
    }

    #[test]
    fn test_cache_store_discard() {
        let mut base = MemStore::new();
        base.set(b"a".to_vec(), b"1".to_vec());

        {
            let mut cache = CacheStore::new(&mut base);
            cache.delete(b"a");
            cache.set(b"b".to_vec(), b"2".to_vec());
            // dropped without commit
        }

        assert_eq!(base.get(b"a"), Some(b"1".to_vec()));
        assert_eq!(base.get(b"b"), None);
    }

    #[test]
    fn test_cache_store_merged_scan() {
        let mut base = MemStore::new();
        base.set(b"P/a".to_vec(), b"1".to_vec());
        base.set(b"P/c".to_vec(), b"3".to_vec());

        let mut cache = CacheStore::new(&mut base);
        cache.set(b"P/b".to_vec(), b"2".to_vec());
        cache.delete(b"P/c");
        cache.set(b"P/a".to_vec(), b"10".to_vec());

        let pairs = cache.scan_prefix(b"P/");
        assert_eq!(pairs, vec![kv("P/a", "10"), kv("P/b", "2")]);
    }

    #[test]
    fn test_nested_cache_stores() {
        let mut base = MemStore::new();
        base.set(b"a".to_vec(), b"1".to_vec());

        let mut outer = CacheStore::new(&mut base);
        {
            let mut inner = CacheStore::new(&mut outer);
            inner.set(b"b".to_vec(), b"2".to_vec());
            inner.commit();
        }
        assert_eq!(outer.get(b"b"), Some(b"2".to_vec()));
        outer.commit();
        assert_eq!(base.get(b"b"), Some(b"2".to_vec()));
    }
}
