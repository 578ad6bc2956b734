//! # Least Recently Used (LRU) engine
//!
//! The recency primitive the rest of the crate builds on: W-TinyLFU composes
//! two of these, LRU-K runs one as its history store and one as its main
//! store, and the adaptive multiplexer shadows one.
//!
//! ## Architecture
//!
//! ```text
//!   ┌───────────────────────────────────────────────────────────────┐
//!   │                        LruCore<K, V>                          │
//!   │                                                               │
//!   │   index: FxHashMap<K, EntryId>                                │
//!   │   ┌─────────┬──────────┐                                      │
//!   │   │   Key   │ EntryId  │──────────────┐                       │
//!   │   └─────────┴──────────┘              ▼                       │
//!   │   list: OrderList<Slot { key, value }>                        │
//!   │                                                               │
//!   │   front ──► [C] ◄──► [A] ◄──► [B] ◄── back                    │
//!   │            (MRU)                (LRU, eviction candidate)     │
//!   └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! | Operation      | Effect                                        | Cost |
//! |----------------|-----------------------------------------------|------|
//! | `insert` (new) | evict back if full, link at front             | O(1) |
//! | `insert` (dup) | replace value, move to front                  | O(1) |
//! | `get`          | move to front                                 | O(1) |
//! | `peek`         | none                                          | O(1) |
//! | `oldest_key`   | none                                          | O(1) |
//! | `pop_lru`      | unlink back                                   | O(1) |
//!
//! `LruCore` is single-threaded; [`ConcurrentLruCache`] is the thread-safe
//! engine surface, holding the core behind one `parking_lot::Mutex` for the
//! whole duration of each operation. Even reads take the lock because a hit
//! reorders the list.

use std::hash::Hash;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::ds::arena::EntryId;
use crate::ds::linked::OrderList;
use crate::traits::{ConcurrentCache, CoreCache, LruCacheTrait, MutableCache};

#[derive(Debug)]
struct Slot<K, V> {
    key: K,
    value: V,
}

/// Single-threaded LRU core: hash index plus recency list.
#[derive(Debug)]
pub struct LruCore<K, V>
where
    K: Eq + Hash + Clone,
{
    index: FxHashMap<K, EntryId>,
    list: OrderList<Slot<K, V>>,
    capacity: usize,
}

impl<K, V> LruCore<K, V>
where
    K: Eq + Hash + Clone,
{
    /// Creates an LRU core holding at most `capacity` entries. Capacity 0 is
    /// legal and rejects every insert.
    pub fn new(capacity: usize) -> Self {
        Self {
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            list: OrderList::with_capacity(capacity),
            capacity,
        }
    }

    /// Insert that also reports the entry evicted to make room, if any.
    ///
    /// Returns `(previous_value, evicted_entry)`. Used by callers that must
    /// keep side tables coherent with this cache's evictions.
    pub fn insert_with_eviction(&mut self, key: K, value: V) -> (Option<V>, Option<(K, V)>) {
        if let Some(&id) = self.index.get(&key) {
            let slot = self.list.get_mut(id).expect("indexed entry missing");
            let previous = std::mem::replace(&mut slot.value, value);
            self.list.move_to_front(id);
            return (Some(previous), None);
        }

        if self.capacity == 0 {
            return (None, None);
        }

        let evicted = if self.list.len() >= self.capacity {
            self.list.pop_back().map(|slot| {
                self.index.remove(&slot.key);
                (slot.key, slot.value)
            })
        } else {
            None
        };

        let id = self.list.push_front(Slot {
            key: key.clone(),
            value,
        });
        self.index.insert(key, id);
        (None, evicted)
    }

    /// Read-only lookup: no reordering.
    pub fn peek(&self, key: &K) -> Option<&V> {
        let id = *self.index.get(key)?;
        self.list.get(id).map(|slot| &slot.value)
    }

    /// Key currently at the least-recent end, or `None` when empty.
    pub fn oldest_key(&self) -> Option<&K> {
        self.list.back().map(|slot| &slot.key)
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        assert_eq!(self.index.len(), self.list.len());
        assert!(self.list.len() <= self.capacity);
        self.list.debug_validate_invariants();
        for &id in self.index.values() {
            assert!(self.list.contains(id));
        }
    }
}

impl<K, V> CoreCache<K, V> for LruCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn insert(&mut self, key: K, value: V) -> Option<V> {
        self.insert_with_eviction(key, value).0
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        let id = *self.index.get(key)?;
        self.list.move_to_front(id);
        self.list.get(id).map(|slot| &slot.value)
    }

    fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    fn len(&self) -> usize {
        self.list.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn clear(&mut self) {
        self.index.clear();
        self.list.clear();
    }
}

impl<K, V> MutableCache<K, V> for LruCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn remove(&mut self, key: &K) -> Option<V> {
        let id = self.index.remove(key)?;
        self.list.remove(id).map(|slot| slot.value)
    }
}

impl<K, V> LruCacheTrait<K, V> for LruCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn pop_lru(&mut self) -> Option<(K, V)> {
        let slot = self.list.pop_back()?;
        self.index.remove(&slot.key);
        Some((slot.key, slot.value))
    }

    fn peek_lru(&self) -> Option<(&K, &V)> {
        self.list.back().map(|slot| (&slot.key, &slot.value))
    }

    fn touch(&mut self, key: &K) -> bool {
        match self.index.get(key) {
            Some(&id) => self.list.move_to_front(id),
            None => false,
        }
    }
}

/// Thread-safe LRU engine: one mutex held for each whole operation.
#[derive(Debug)]
pub struct ConcurrentLruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    inner: Mutex<LruCore<K, V>>,
}

impl<K, V> ConcurrentLruCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(LruCore::new(capacity)),
        }
    }

    /// Inserts or updates; returns the previous value.
    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.inner.lock().insert(key, value)
    }

    /// Lookup with the usual move-to-front side effect.
    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.inner.lock().get(key).cloned()
    }

    /// Lookup without reordering.
    pub fn peek(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
        self.inner.lock().peek(key).cloned()
    }

    pub fn remove(&self, key: &K) -> Option<V> {
        self.inner.lock().remove(key)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.inner.lock().contains(key)
    }

    pub fn len(&self) -> usize {
        self.inner.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.inner.lock().capacity()
    }

    pub fn oldest_key(&self) -> Option<K> {
        self.inner.lock().oldest_key().cloned()
    }

    pub fn clear(&self) {
        self.inner.lock().clear()
    }
}

impl<K, V> ConcurrentCache for ConcurrentLruCache<K, V> where K: Eq + Hash + Clone + Send, V: Send {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn evicts_least_recent_on_overflow() {
        let mut cache = LruCore::new(3);
        cache.insert(1, "a");
        cache.insert(2, "b");
        cache.insert(3, "c");

        // Touching 1 protects it; 2 becomes the victim.
        assert_eq!(cache.get(&1), Some(&"a"));
        cache.insert(4, "d");

        assert!(!cache.contains(&2));
        assert_eq!(cache.get(&1), Some(&"a"));
        assert_eq!(cache.get(&3), Some(&"c"));
        assert_eq!(cache.get(&4), Some(&"d"));
        cache.debug_validate_invariants();
    }

    #[test]
    fn update_refreshes_recency_and_returns_previous() {
        let mut cache = LruCore::new(2);
        cache.insert(1, "a");
        cache.insert(2, "b");

        assert_eq!(cache.insert(1, "a2"), Some("a"));
        // 2 is now the oldest.
        assert_eq!(cache.oldest_key(), Some(&2));

        cache.insert(3, "c");
        assert!(!cache.contains(&2));
        assert_eq!(cache.get(&1), Some(&"a2"));
    }

    #[test]
    fn peek_does_not_reorder() {
        let mut cache = LruCore::new(2);
        cache.insert(1, "a");
        cache.insert(2, "b");

        assert_eq!(cache.peek(&1), Some(&"a"));
        assert_eq!(cache.oldest_key(), Some(&1));

        cache.insert(3, "c");
        assert!(!cache.contains(&1));
    }

    #[test]
    fn zero_capacity_rejects_inserts() {
        let mut cache = LruCore::new(0);
        assert_eq!(cache.insert(1, "a"), None);
        assert_eq!(cache.len(), 0);
        assert_eq!(cache.get(&1), None);
        assert_eq!(cache.oldest_key(), None);
    }

    #[test]
    fn remove_and_pop_lru() {
        let mut cache = LruCore::new(3);
        cache.insert(1, "a");
        cache.insert(2, "b");
        cache.insert(3, "c");

        assert_eq!(cache.remove(&2), Some("b"));
        assert_eq!(cache.remove(&2), None);
        assert_eq!(cache.pop_lru(), Some((1, "a")));
        assert_eq!(cache.pop_lru(), Some((3, "c")));
        assert_eq!(cache.pop_lru(), None);
    }

    #[test]
    fn insert_with_eviction_reports_victim() {
        let mut cache = LruCore::new(2);
        assert_eq!(cache.insert_with_eviction(1, "a"), (None, None));
        assert_eq!(cache.insert_with_eviction(2, "b"), (None, None));
        assert_eq!(cache.insert_with_eviction(3, "c"), (None, Some((1, "a"))));
        assert_eq!(
            cache.insert_with_eviction(3, "c2"),
            (Some("c"), None),
        );
    }

    #[test]
    fn touch_refreshes_without_value_access() {
        let mut cache = LruCore::new(2);
        cache.insert(1, "a");
        cache.insert(2, "b");

        assert!(cache.touch(&1));
        assert!(!cache.touch(&99));
        assert_eq!(cache.peek_lru().map(|(k, _)| *k), Some(2));
    }

    #[test]
    fn concurrent_wrapper_basic_ops() {
        let cache = ConcurrentLruCache::new(2);
        cache.insert(1, 10);
        cache.insert(2, 20);
        assert_eq!(cache.get(&1), Some(10));
        assert_eq!(cache.len(), 2);

        cache.insert(3, 30);
        assert!(!cache.contains(&2));
        assert_eq!(cache.oldest_key(), Some(1));

        assert_eq!(cache.remove(&1), Some(10));
        cache.clear();
        assert!(cache.is_empty());
    }

    #[test]
    fn concurrent_wrapper_shared_across_threads() {
        use std::sync::Arc;

        let cache = Arc::new(ConcurrentLruCache::new(64));
        let handles: Vec<_> = (0..4)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..100u64 {
                        cache.insert(t * 100 + i, i);
                        cache.get(&(t * 100 + i));
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(cache.len() <= 64);
    }
}
