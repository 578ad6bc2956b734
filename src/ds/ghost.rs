//! Bounded key-only recency list for evicted entries.
//!
//! Adaptive policies keep a "ghost" of each eviction: the key, but not the
//! value. A later request for a ghosted key means the cache threw away
//! something it was about to need again, and the owning half of an ARC-style
//! cache reacts by stealing capacity from its sibling.
//!
//! Layout is an [`OrderList`] of keys plus a hash index for O(1) membership:
//!
//! ```text
//!   index: FxHashMap<K, EntryId> ──► list: [k3] ◄──► [k1] ◄──► [k0]
//!                                     newest                 oldest
//! ```
//!
//! Recording an already-present key refreshes it to the newest position.
//! When full, the oldest ghost is dropped. Capacity 0 makes every operation
//! a no-op.

use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::ds::arena::EntryId;
use crate::ds::linked::OrderList;

/// Fixed-capacity record of recently evicted keys.
#[derive(Debug)]
pub struct GhostList<K> {
    list: OrderList<K>,
    index: FxHashMap<K, EntryId>,
    capacity: usize,
}

impl<K> GhostList<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            list: OrderList::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            capacity,
        }
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.list.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    /// Ghost-hit check: is `key` among the recently evicted?
    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    /// Records `key` as the newest ghost, dropping the oldest if full.
    ///
    /// Re-recording a present key refreshes its position instead of growing
    /// the list.
    pub fn record(&mut self, key: K) {
        if self.capacity == 0 {
            return;
        }

        if let Some(&id) = self.index.get(&key) {
            self.list.move_to_front(id);
            return;
        }

        if self.list.len() >= self.capacity {
            if let Some(oldest) = self.list.pop_back() {
                self.index.remove(&oldest);
            }
        }

        let id = self.list.push_front(key.clone());
        self.index.insert(key, id);
    }

    /// Forgets `key`; returns whether it was tracked.
    ///
    /// Called after a ghost hit so the same eviction is not counted twice.
    pub fn remove(&mut self, key: &K) -> bool {
        match self.index.remove(key) {
            Some(id) => {
                self.list.remove(id);
                true
            },
            None => false,
        }
    }

    pub fn clear(&mut self) {
        self.list.clear();
        self.index.clear();
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        assert_eq!(self.list.len(), self.index.len());
        assert!(self.list.len() <= self.capacity);
        for &id in self.index.values() {
            assert!(self.list.contains(id));
        }
    }
}
