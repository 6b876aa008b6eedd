//! Duplicate-suppression cache for recently seen transaction keys.
//!
//! Fixed capacity with least-recently-inserted eviction. Recency is
//! refreshed when a key is pushed again, never on lookup: this is a
//! deduplication fence, not a working-set cache. Capacity is independent
//! of the mempool's tx-count limit.

use crate::clist::TxList;
use forgecore_types::TxKey;

/// Bounded set of recently seen transaction keys.
pub struct TxCache {
    entries: TxList<()>,
    capacity: usize,
}

impl TxCache {
    /// Creates a cache holding at most `capacity` keys. A capacity of zero
    /// disables the cache: every push reports the key as unseen.
    pub fn new(capacity: usize) -> Self {
        Self {
            entries: TxList::new(),
            capacity,
        }
    }

    /// Number of keys currently held.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no keys are held.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Marks a key as seen.
    ///
    /// Returns false if the key was already present, refreshing its
    /// eviction position. Returns true otherwise, evicting the oldest key
    /// if the cache is at capacity.
    pub fn push(&mut self, key: TxKey) -> bool {
        if self.capacity == 0 {
            return true;
        }
        if self.entries.remove(&key).is_some() {
            self.entries.push_back(key, ());
            return false;
        }
        if self.entries.len() >= self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(key, ());
        true
    }

    /// Forgets a key, allowing its transaction to be submitted again.
    pub fn remove(&mut self, key: &TxKey) -> bool {
        self.entries.remove(key).is_some()
    }

    /// True if the key has been seen and not evicted.
    pub fn contains(&self, key: &TxKey) -> bool {
        self.entries.contains(key)
    }

    /// Forgets every key.
    pub fn reset(&mut self) {
        self.entries.clear();
    }
}
