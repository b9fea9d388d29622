use std::collections::VecDeque;
use tracing::debug;

/// Bounded cache keyed by book id, evicting the least recently used entry
/// once capacity is exceeded.
///
/// The cache is a read accelerator, not an authority: there is no TTL, and
/// freshness depends entirely on writers invalidating an id before their
/// write takes effect. A read racing an invalidate-then-write sequence can
/// repopulate the cache with a value that is about to go stale; that window
/// is part of the protocol.
///
/// Recency order is held in a [`VecDeque`] with the most recently used entry
/// at the back. Linear scans are fine at the capacities this runs with.
#[derive(Debug)]
pub struct LruCache<V> {
    capacity: usize,
    entries: VecDeque<(u64, V)>,
}

impl<V: Clone> LruCache<V> {
    pub fn new(capacity: usize) -> LruCache<V> {
        LruCache {
            capacity,
            entries: VecDeque::with_capacity(capacity + 1),
        }
    }

    /// Look up a key, promoting it to most recently used on a hit.
    /// A miss has no side effect.
    pub fn get(&mut self, key: u64) -> Option<V> {
        let pos = self.entries.iter().position(|(k, _)| *k == key)?;
        let entry = self.entries.remove(pos).unwrap();
        let value = entry.1.clone();
        self.entries.push_back(entry);
        Some(value)
    }

    /// Insert or overwrite a key and promote it to most recently used,
    /// evicting the least recently used entry if over capacity.
    pub fn put(&mut self, key: u64, value: V) {
        if let Some(pos) = self.entries.iter().position(|(k, _)| *k == key) {
            self.entries.remove(pos);
        }
        self.entries.push_back((key, value));
        if self.entries.len() > self.capacity {
            if let Some((evicted, _)) = self.entries.pop_front() {
                debug!(key = evicted, "Evicted least recently used entry");
            }
        }
    }

    /// Drop a key if present. An absent key is not an error.
    pub fn invalidate(&mut self, key: u64) {
        self.entries.retain(|(k, _)| *k != key);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
