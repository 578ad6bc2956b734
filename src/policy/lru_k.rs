//! # LRU-K promoter
//!
//! Two-tier scan protection in front of a plain LRU. A key does not touch
//! the main cache until it has been asked for `k` times; until then it lives
//! only in a history counter (itself a bounded LRU, sized at
//! `history_ratio` times the main capacity) with its most recent value
//! stashed to the side. One-shot scans therefore churn the history, never
//! the main cache.
//!
//! ```text
//!   request(k, v)
//!       │
//!       ▼
//!   main LRU ──hit──► serve / update
//!       │ miss
//!       ▼
//!   history LRU: count += 1, stash value
//!       │ count == K
//!       ▼
//!   promote: drop history entry, insert stashed value into main LRU
//! ```
//!
//! Only main-cache residents count toward `len()`; a key still in its
//! history phase is not resident and `get` misses it. A `get` that performs
//! the promotion returns the stashed value.

use std::hash::Hash;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::error::ConfigError;
use crate::policy::lru::LruCore;
use crate::traits::{ConcurrentCache, CoreCache, MutableCache};

pub const DEFAULT_K: usize = 2;
pub const DEFAULT_HISTORY_RATIO: f64 = 2.5;

/// Single-threaded LRU-K core.
#[derive(Debug)]
pub struct LrukCore<K, V>
where
    K: Eq + Hash + Clone,
{
    main: LruCore<K, V>,
    history: LruCore<K, usize>,
    stash: FxHashMap<K, V>,
    k: usize,
}

impl<K, V> LrukCore<K, V>
where
    K: Eq + Hash + Clone,
{
    /// LRU-2 with the default history sizing.
    pub fn new(capacity: usize) -> Self {
        Self::with_params(capacity, DEFAULT_K, DEFAULT_HISTORY_RATIO)
    }

    /// LRU-K with explicit promotion count and history sizing. `k` is
    /// coerced to at least 1 and `history_ratio` to a positive value; use
    /// [`try_with_params`](Self::try_with_params) to reject bad parameters.
    pub fn with_params(capacity: usize, k: usize, history_ratio: f64) -> Self {
        let ratio = if history_ratio > 0.0 {
            history_ratio
        } else {
            DEFAULT_HISTORY_RATIO
        };
        let history_capacity = (capacity as f64 * ratio).ceil() as usize;
        Self {
            main: LruCore::new(capacity),
            history: LruCore::new(history_capacity),
            stash: FxHashMap::default(),
            k: k.max(1),
        }
    }

    /// Validating constructor.
    pub fn try_with_params(
        capacity: usize,
        k: usize,
        history_ratio: f64,
    ) -> Result<Self, ConfigError> {
        if k == 0 {
            return Err(ConfigError::ZeroParameter { name: "k" });
        }
        if !(history_ratio > 0.0) {
            return Err(ConfigError::RatioOutOfRange {
                name: "history_ratio",
                value: history_ratio,
                expected: "(0, ∞)",
            });
        }
        Ok(Self::with_params(capacity, k, history_ratio))
    }

    /// Promotion count.
    pub fn k_value(&self) -> usize {
        self.k
    }

    /// Accesses recorded for a key still in its history phase.
    pub fn history_count(&self, key: &K) -> Option<usize> {
        self.history.peek(key).copied()
    }

    /// Records one history access; returns the updated count. Keeps the
    /// stash coherent when the history LRU evicts a bystander.
    fn bump_history(&mut self, key: &K) -> usize {
        let count = self.history.peek(key).copied().unwrap_or(0) + 1;
        let (_, evicted) = self.history.insert_with_eviction(key.clone(), count);
        if let Some((evicted_key, _)) = evicted {
            self.stash.remove(&evicted_key);
        }
        count
    }

    /// Drops the history state for `key` and admits the stashed value to the
    /// main cache, if one was seen.
    fn promote(&mut self, key: &K) -> bool {
        match self.stash.remove(key) {
            Some(value) => {
                self.history.remove(key);
                self.main.insert(key.clone(), value);
                true
            },
            None => false,
        }
    }
}

impl<K, V> CoreCache<K, V> for LrukCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn insert(&mut self, key: K, value: V) -> Option<V> {
        if self.main.capacity() == 0 {
            return None;
        }
        if self.main.contains(&key) {
            return self.main.insert(key, value);
        }

        let count = self.bump_history(&key);
        self.stash.insert(key.clone(), value);

        if count >= self.k {
            self.promote(&key);
        }
        None
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        if self.main.capacity() == 0 {
            return None;
        }
        if self.main.contains(key) {
            return self.main.get(key);
        }

        let count = self.bump_history(key);
        if count >= self.k && self.promote(key) {
            // The promoting access serves the stashed value.
            return self.main.get(key);
        }
        None
    }

    fn contains(&self, key: &K) -> bool {
        self.main.contains(key)
    }

    fn len(&self) -> usize {
        self.main.len()
    }

    fn capacity(&self) -> usize {
        self.main.capacity()
    }

    fn clear(&mut self) {
        self.main.clear();
        self.history.clear();
        self.stash.clear();
    }
}

impl<K, V> MutableCache<K, V> for LrukCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn remove(&mut self, key: &K) -> Option<V> {
        self.history.remove(key);
        self.stash.remove(key);
        self.main.remove(key)
    }
}

/// Thread-safe LRU-K engine.
#[derive(Debug)]
pub struct ConcurrentLrukCache<K, V>
where
    K: Eq + Hash + Clone,
{
    inner: Mutex<LrukCore<K, V>>,
}

impl<K, V> ConcurrentLrukCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(LrukCore::new(capacity)),
        }
    }

    pub fn with_params(capacity: usize, k: usize, history_ratio: f64) -> Self {
        Self {
            inner: Mutex::new(LrukCore::with_params(capacity, k, history_ratio)),
        }
    }

    pub fn insert(&self, key: K, value: V) -> Option<V> {
        self.inner.lock().insert(key, value)
    }

    pub fn get(&self, key: &K) -> Option<V>
    where
        V: Clone,
    {
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

impl<K, V> ConcurrentCache for ConcurrentLrukCache<K, V> where K: Eq + Hash + Clone + Send, V: Send {}
