//! # Adaptive Replacement Cache (ARC) engine
//!
//! Two cooperating halves, each with its own main structure and its own
//! ghost list, re-partitioning total capacity between them as the workload
//! shifts.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                            ArcCore<K, V>                            │
//! │                                                                     │
//! │   Recency half (LRU)                  Frequency half (LFU)          │
//! │   ┌─────────────────────────┐         ┌─────────────────────────┐   │
//! │   │ MRU ──► [..] ──► LRU    │ promote │ freq buckets, min-freq  │   │
//! │   │ nodes carry hit counts  │ ──────► │ FIFO inside each bucket │   │
//! │   └───────────┬─────────────┘  copy   └───────────┬─────────────┘   │
//! │               │ evict                             │ evict           │
//! │               ▼                                   ▼                 │
//! │   ┌─────────────────────────┐         ┌─────────────────────────┐   │
//! │   │ recency ghost (keys)    │         │ frequency ghost (keys)  │   │
//! │   └─────────────────────────┘         └─────────────────────────┘   │
//! │                                                                     │
//! │   ghost hit in one half ──► steal one unit of capacity from the     │
//! │                             other half                              │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every request runs ghost arbitration first: a hit in the frequency
//! half's ghost proves a frequency-worthy key was evicted too early, so the
//! recency half gives up one unit of capacity (evicting if it is full) and
//! the frequency half gains one. The recency ghost works symmetrically.
//! The two ghost sets are disjoint, so at most one side can match.
//!
//! Entries enter through the recency half. Each hit there bumps a per-node
//! access counter; at `transform_threshold` the entry is *copied* into the
//! frequency half under insert semantics. The recency copy stays where it
//! is and is cleaned up by normal recency eviction, so a key can transiently
//! reside in both halves; `len()` counts unique keys.
//!
//! `ArcCore` is single-threaded; [`ConcurrentArcCache`] is the thread-safe
//! engine surface with one mutex per engine.

use std::hash::Hash;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::ds::arena::EntryId;
use crate::ds::freq_buckets::FreqBuckets;
use crate::ds::ghost::GhostList;
use crate::ds::linked::OrderList;
use crate::traits::{ConcurrentCache, CoreCache, MutableCache};

pub const DEFAULT_TRANSFORM_THRESHOLD: u64 = 2;

#[derive(Debug)]
struct RecencySlot<K, V> {
    key: K,
    value: V,
    hits: u64,
}

/// Recency-biased half: an LRU list whose nodes carry access counters.
#[derive(Debug)]
struct RecencyHalf<K, V>
where
    K: Eq + Hash + Clone,
{
    index: FxHashMap<K, EntryId>,
    list: OrderList<RecencySlot<K, V>>,
    ghost: GhostList<K>,
    capacity: usize,
    promote_threshold: u64,
}

impl<K, V> RecencyHalf<K, V>
where
    K: Eq + Hash + Clone,
{
    fn new(capacity: usize, promote_threshold: u64) -> Self {
        Self {
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            list: OrderList::with_capacity(capacity),
            ghost: GhostList::new(capacity),
            capacity,
            promote_threshold,
        }
    }

    fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    fn value(&self, key: &K) -> Option<&V> {
        let id = *self.index.get(key)?;
        self.list.get(id).map(|slot| &slot.value)
    }

    /// Hit path: refresh recency, bump the counter, report whether the
    /// entry has crossed the promotion threshold.
    fn record_access(&mut self, key: &K) -> Option<bool> {
        let id = *self.index.get(key)?;
        self.list.move_to_front(id);
        let slot = self.list.get_mut(id)?;
        slot.hits = slot.hits.saturating_add(1);
        Some(slot.hits >= self.promote_threshold)
    }

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(&id) = self.index.get(&key) {
            let slot = self.list.get_mut(id).expect("indexed entry missing");
            let previous = std::mem::replace(&mut slot.value, value);
            self.list.move_to_front(id);
            return Some(previous);
        }

        if self.capacity == 0 {
            return None;
        }

        if self.list.len() >= self.capacity {
            self.evict_lru();
        }

        // A key becoming resident is no longer "recently evicted".
        self.ghost.remove(&key);
        let id = self.list.push_front(RecencySlot {
            key: key.clone(),
            value,
            hits: 1,
        });
        self.index.insert(key, id);
        None
    }

    fn evict_lru(&mut self) {
        if let Some(slot) = self.list.pop_back() {
            self.index.remove(&slot.key);
            self.ghost.record(slot.key);
        }
    }

    fn check_ghost(&mut self, key: &K) -> bool {
        self.ghost.remove(key)
    }

    fn grow(&mut self) {
        self.capacity += 1;
    }

    /// Gives up one unit of capacity, evicting first if full. Refuses at
    /// zero.
    fn shrink(&mut self) -> bool {
        if self.capacity == 0 {
            return false;
        }
        if self.list.len() >= self.capacity {
            self.evict_lru();
        }
        self.capacity -= 1;
        true
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let id = self.index.remove(key)?;
        self.list.remove(id).map(|slot| slot.value)
    }

    fn len(&self) -> usize {
        self.list.len()
    }

    fn clear(&mut self) {
        self.index.clear();
        self.list.clear();
        self.ghost.clear();
    }
}

/// Frequency-biased half: the LFU structure without aging.
#[derive(Debug)]
struct FrequencyHalf<K, V>
where
    K: Eq + Hash + Clone,
{
    values: FxHashMap<K, V>,
    order: FreqBuckets<K>,
    ghost: GhostList<K>,
    capacity: usize,
}

impl<K, V> FrequencyHalf<K, V>
where
    K: Eq + Hash + Clone,
{
    fn new(capacity: usize) -> Self {
        Self {
            values: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            order: FreqBuckets::with_capacity(capacity),
            ghost: GhostList::new(capacity),
            capacity,
        }
    }

    fn contains(&self, key: &K) -> bool {
        self.values.contains_key(key)
    }

    fn value(&self, key: &K) -> Option<&V> {
        self.values.get(key)
    }

    fn keys(&self) -> impl Iterator<Item = &K> {
        self.values.keys()
    }

    fn record_access(&mut self, key: &K) -> bool {
        self.order.touch(key).is_some()
    }

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(slot) = self.values.get_mut(&key) {
            let previous = std::mem::replace(slot, value);
            self.order.touch(&key);
            return Some(previous);
        }

        if self.capacity == 0 {
            return None;
        }

        if self.values.len() >= self.capacity {
            self.evict_lfu();
        }

        self.ghost.remove(&key);
        self.order.insert(key.clone());
        self.values.insert(key, value);
        None
    }

    fn evict_lfu(&mut self) {
        if let Some((key, _)) = self.order.pop_min() {
            self.values.remove(&key);
            self.ghost.record(key);
        }
    }

    fn check_ghost(&mut self, key: &K) -> bool {
        self.ghost.remove(key)
    }

    fn grow(&mut self) {
        self.capacity += 1;
    }

    fn shrink(&mut self) -> bool {
        if self.capacity == 0 {
            return false;
        }
        if self.values.len() >= self.capacity {
            self.evict_lfu();
        }
        self.capacity -= 1;
        true
    }

    fn remove(&mut self, key: &K) -> Option<V> {
        let value = self.values.remove(key)?;
        self.order.remove(key);
        Some(value)
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn clear(&mut self) {
        self.values.clear();
        self.order.clear();
        self.ghost.clear();
    }
}

/// Single-threaded ARC core.
#[derive(Debug)]
pub struct ArcCore<K, V>
where
    K: Eq + Hash + Clone,
{
    recency: RecencyHalf<K, V>,
    frequency: FrequencyHalf<K, V>,
    capacity: usize,
    transform_threshold: u64,
}

impl<K, V> ArcCore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// ARC with the default promotion threshold of 2 accesses.
    pub fn new(capacity: usize) -> Self {
        Self::with_threshold(capacity, DEFAULT_TRANSFORM_THRESHOLD)
    }

    /// ARC with an explicit promotion threshold (clamped to at least 1).
    ///
    /// Both halves start with the full engine capacity and a ghost list of
    /// the same size; ghost hits then move capacity units between them.
    pub fn with_threshold(capacity: usize, transform_threshold: u64) -> Self {
        let threshold = transform_threshold.max(1);
        Self {
            recency: RecencyHalf::new(capacity, threshold),
            frequency: FrequencyHalf::new(capacity),
            capacity,
            transform_threshold: threshold,
        }
    }

    pub fn transform_threshold(&self) -> u64 {
        self.transform_threshold
    }

    /// Residents of the recency half (promoted copies included).
    pub fn recency_len(&self) -> usize {
        self.recency.len()
    }

    /// Residents of the frequency half.
    pub fn frequency_len(&self) -> usize {
        self.frequency.len()
    }

    /// Current capacity of the recency half.
    pub fn recency_capacity(&self) -> usize {
        self.recency.capacity
    }

    /// Current capacity of the frequency half.
    pub fn frequency_capacity(&self) -> usize {
        self.frequency.capacity
    }

    pub fn recency_ghost_len(&self) -> usize {
        self.recency.ghost.len()
    }

    pub fn frequency_ghost_len(&self) -> usize {
        self.frequency.ghost.len()
    }

    /// Read-only lookup across both halves.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.recency.value(key).or_else(|| self.frequency.value(key))
    }

    /// Ghost arbitration: a hit in one half's ghost steals one unit of
    /// capacity from the other half. The ghost sets are disjoint, so at
    /// most one branch fires.
    fn arbitrate(&mut self, key: &K) {
        if self.frequency.check_ghost(key) {
            if self.recency.shrink() {
                self.frequency.grow();
            }
        } else if self.recency.check_ghost(key) {
            if self.frequency.shrink() {
                self.recency.grow();
            }
        }
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        assert!(self.recency.len() <= self.recency.capacity);
        assert!(self.frequency.len() <= self.frequency.capacity);
        self.recency.list.debug_validate_invariants();
        self.frequency.order.debug_validate_invariants();
        self.recency.ghost.debug_validate_invariants();
        self.frequency.ghost.debug_validate_invariants();
        for key in self.recency.index.keys() {
            assert!(!self.recency.ghost.contains(key));
        }
        for key in self.frequency.keys() {
            assert!(!self.frequency.ghost.contains(key));
        }
    }
}

impl<K, V> CoreCache<K, V> for ArcCore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn get(&mut self, key: &K) -> Option<&V> {
        self.arbitrate(key);

        if let Some(promote) = self.recency.record_access(key) {
            if promote {
                // Copy into the frequency half; the recency copy stays and
                // is cleaned up by its own eviction.
                if let Some(value) = self.recency.value(key).cloned() {
                    self.frequency.insert(key.clone(), value);
                }
            }
            return self.recency.value(key);
        }

        if self.frequency.record_access(key) {
            return self.frequency.value(key);
        }
        None
    }

    fn insert(&mut self, key: K, value: V) -> Option<V> {
        if self.capacity == 0 {
            return None;
        }
        self.arbitrate(&key);

        // Keep a promoted copy fresh, then always write through the recency
        // half.
        let freq_previous = if self.frequency.contains(&key) {
            self.frequency.insert(key.clone(), value.clone())
        } else {
            None
        };
        let rec_previous = self.recency.insert(key, value);
        rec_previous.or(freq_previous)
    }

    fn contains(&self, key: &K) -> bool {
        self.recency.contains(key) || self.frequency.contains(key)
    }

    fn len(&self) -> usize {
        let overlap = self
            .frequency
            .keys()
            .filter(|key| self.recency.contains(key))
            .count();
        self.recency.len() + self.frequency.len() - overlap
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn clear(&mut self) {
        self.recency.clear();
        self.frequency.clear();
        self.recency.capacity = self.capacity;
        self.frequency.capacity = self.capacity;
    }
}

impl<K, V> MutableCache<K, V> for ArcCore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn remove(&mut self, key: &K) -> Option<V> {
        let from_recency = self.recency.remove(key);
        let from_frequency = self.frequency.remove(key);
        from_recency.or(from_frequency)
    }
}

/// Thread-safe ARC engine.
#[derive(Debug)]
pub struct ConcurrentArcCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    inner: Mutex<ArcCore<K, V>>,
}

impl<K, V> ConcurrentArcCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(ArcCore::new(capacity)),
        }
    }

    pub fn with_threshold(capacity: usize, transform_threshold: u64) -> Self {
        Self {
            inner: Mutex::new(ArcCore::with_threshold(capacity, transform_threshold)),
        }
    }

    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.inner.lock().insert(key, value)
    }

    pub fn get(&self, key: &K) -> Option<V> {
        self.inner.lock().get(key).cloned()
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

    pub fn clear(&self) {
        self.inner.lock().clear()
    }
}

impl<K, V> ConcurrentCache for ConcurrentArcCache<K, V>
where
    K: Eq + Hash + Clone + Send,
    V: Clone + Send,
{
}
