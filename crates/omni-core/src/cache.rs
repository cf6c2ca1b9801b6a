//! Explicit memoization cache.
//!
//! Memoizes expensive lookups for the lifetime of the owning object. There is
//! no invalidation; drop the cache to forget.

use std::hash::Hash;

use dashmap::DashMap;

/// A concurrent, insert-only memo table.
#[derive(Debug)]
pub struct MemoCache<K: Eq + Hash, V> {
    entries: DashMap<K, V>,
}

impl<K: Eq + Hash, V: Clone> MemoCache<K, V> {
    /// Create an empty cache.
    pub fn new() -> Self {
        Self {
            entries: DashMap::new(),
        }
    }

    /// Cached value for `key`, if any.
    pub fn get(&self, key: &K) -> Option<V> {
        self.entries.get(key).map(|v| v.value().clone())
    }

    /// Return the cached value for `key`, computing it with `load` on a miss.
    ///
    /// Errors are not cached. When two callers miss at once both run `load`
    /// and the first insert wins.
    pub fn get_or_try_insert_with<E>(
        &self,
        key: K,
        load: impl FnOnce() -> Result<V, E>,
    ) -> Result<V, E> {
        if let Some(hit) = self.get(&key) {
            return Ok(hit);
        }
        let value = load()?;
        Ok(self.entries.entry(key).or_insert(value).value().clone())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K: Eq + Hash, V: Clone> Default for MemoCache<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
