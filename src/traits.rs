//! # Cache trait hierarchy
//!
//! One contract shared by every eviction engine in the crate, plus small
//! policy-specific extensions where an engine can honestly offer more.
//!
//! ```text
//!                 ┌────────────────────────────────────┐
//!                 │          CoreCache<K, V>           │
//!                 │                                    │
//!                 │  insert(&mut, K, V) → Option<V>    │
//!                 │  get(&mut, &K) → Option<&V>        │
//!                 │  contains / len / capacity / clear │
//!                 └──────────────────┬─────────────────┘
//!                                    │
//!                 ┌──────────────────▼─────────────────┐
//!                 │         MutableCache<K, V>         │
//!                 │  remove(&K) → Option<V>            │
//!                 └───────┬────────────────────┬───────┘
//!                         │                    │
//!            ┌────────────▼──────────┐  ┌──────▼───────────────┐
//!            │  LruCacheTrait<K, V>  │  │  LfuCacheTrait<K, V> │
//!            │  pop_lru / peek_lru   │  │  pop_lfu / peek_lfu  │
//!            │  touch                │  │  frequency           │
//!            └───────────────────────┘  └──────────────────────┘
//! ```
//!
//! Contracts common to every engine:
//!
//! - `insert` of a present key updates the value **and** counts as one access
//!   for the engine's ordering or frequency metadata.
//! - Capacity 0 is a null sink: every insert is a no-op, every get misses.
//! - `len() <= capacity()` holds whenever a public call returns; transient
//!   overflow inside an operation is resolved before it returns.
//! - Data-plane calls never fail. A missed get is `None`, removing an absent
//!   key is a no-op.
//!
//! The thread-safe surface lives on the `Concurrent*` wrapper types in
//! `policy::*`, each of which holds its core behind a single
//! `parking_lot::Mutex` for the full duration of every operation.

/// Operations every eviction engine supports.
///
/// # Example
///
/// ```
/// use cachemux::policy::lru::LruCore;
/// use cachemux::traits::CoreCache;
///
/// fn warm<C: CoreCache<u64, String>>(cache: &mut C, data: &[(u64, &str)]) {
///     for (key, value) in data {
///         cache.insert(*key, value.to_string());
///     }
/// }
///
/// let mut cache = LruCore::new(16);
/// warm(&mut cache, &[(1, "one"), (2, "two")]);
/// assert_eq!(cache.len(), 2);
/// ```
pub trait CoreCache<K, V> {
    /// Inserts or updates, returning the previous value if the key existed.
    ///
    /// When the key is absent and the engine is full, exactly one entry is
    /// evicted first. Updating an existing key counts as one access.
    fn insert(&mut self, key: K, value: V) -> Option<V>;

    /// Looks up a value, updating the engine's ordering/frequency metadata
    /// on a hit.
    fn get(&mut self, key: &K) -> Option<&V>;

    /// Membership check with no metadata side effects.
    fn contains(&self, key: &K) -> bool;

    /// Current resident entry count.
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum resident entry count.
    fn capacity(&self) -> usize;

    /// Drops every entry and resets internal metadata.
    fn clear(&mut self);
}

/// Engines that support arbitrary key removal.
pub trait MutableCache<K, V>: CoreCache<K, V> {
    /// Removes a key, returning its value. Absent keys are a no-op.
    fn remove(&mut self, key: &K) -> Option<V>;
}

/// Recency-ordered engines.
///
/// # Example
///
/// ```
/// use cachemux::policy::lru::LruCore;
/// use cachemux::traits::{CoreCache, LruCacheTrait};
///
/// let mut cache = LruCore::new(3);
/// cache.insert(1, "a");
/// cache.insert(2, "b");
///
/// // Key 1 is the eviction candidate until touched.
/// assert_eq!(cache.peek_lru().map(|(k, _)| *k), Some(1));
/// assert!(cache.touch(&1));
/// assert_eq!(cache.peek_lru().map(|(k, _)| *k), Some(2));
/// ```
pub trait LruCacheTrait<K, V>: MutableCache<K, V> {
    /// Removes and returns the least recently used entry.
    fn pop_lru(&mut self) -> Option<(K, V)>;

    /// The least recently used entry, without removal or reordering.
    fn peek_lru(&self) -> Option<(&K, &V)>;

    /// Marks a key as most recently used without reading its value.
    /// Returns whether the key was present.
    fn touch(&mut self, key: &K) -> bool;
}

/// Frequency-ordered engines.
pub trait LfuCacheTrait<K, V>: MutableCache<K, V> {
    /// Removes and returns the least frequently used entry (FIFO among
    /// frequency ties).
    fn pop_lfu(&mut self) -> Option<(K, V)>;

    /// The current eviction candidate, without removal.
    fn peek_lfu(&self) -> Option<(&K, &V)>;

    /// Access frequency of a key, if resident.
    fn frequency(&self, key: &K) -> Option<u64>;
}

/// Marker for engine surfaces that are safe to share across threads.
pub trait ConcurrentCache: Send + Sync {}
