//! # Least Frequently Used (LFU) engine with aging
//!
//! Entries are ordered by (frequency, arrival-within-frequency) in
//! [`FreqBuckets`]; eviction pops the oldest entry of the lowest bucket.
//! Pure LFU has a well-known failure mode: a key that was hot last hour
//! keeps a towering frequency and can never be displaced by the keys that
//! are hot now. Two aging passes counter that:
//!
//! 1. **Proportional aging** — every `aging_threshold` operations (both
//!    inserts and gets are counted), every frequency is scaled by
//!    `aging_factor`: `f ← max(1, ⌊f · factor⌋)`.
//! 2. **Shift-down** — whenever the running mean frequency exceeds
//!    `max_average_freq`, every frequency drops by `max_average_freq / 2`,
//!    clamped at 1.
//!
//! Both passes rebucket stably: within a bucket the pre-aging order is
//! retained, so aging never reshuffles eviction order among ties.
//!
//! An `insert` of a present key updates the value and counts as exactly one
//! access.
//!
//! `LfuCore` is single-threaded; [`ConcurrentLfuCache`] is the thread-safe
//! engine surface with one mutex per engine.

use std::hash::Hash;

use parking_lot::Mutex;
use rustc_hash::FxHashMap;

use crate::ds::freq_buckets::FreqBuckets;
use crate::error::ConfigError;
use crate::traits::{ConcurrentCache, CoreCache, LfuCacheTrait, MutableCache};

/// Aging tunables for [`LfuCore`].
#[derive(Debug, Clone, Copy)]
pub struct AgingConfig {
    /// Mean frequency that triggers a shift-down pass.
    pub max_average_freq: u64,
    /// Operation count between proportional aging passes.
    pub aging_threshold: u64,
    /// Multiplier applied by the proportional pass, in `(0, 1)`.
    pub aging_factor: f64,
}

impl Default for AgingConfig {
    fn default() -> Self {
        Self {
            max_average_freq: 1_000_000,
            aging_threshold: 10_000,
            aging_factor: 0.8,
        }
    }
}

/// Single-threaded LFU core with periodic frequency aging.
#[derive(Debug)]
pub struct LfuCore<K, V>
where
    K: Eq + Hash + Clone,
{
    values: FxHashMap<K, V>,
    order: FreqBuckets<K>,
    capacity: usize,
    config: AgingConfig,
    ops: u64,
}

impl<K, V> LfuCore<K, V>
where
    K: Eq + Hash + Clone,
{
    /// LFU core with default aging tunables (aging is effectively rare).
    pub fn new(capacity: usize) -> Self {
        Self::with_config(capacity, AgingConfig::default())
    }

    /// LFU core with explicit aging tunables. A zero `aging_threshold` is
    /// coerced to 1; use [`try_with_config`](Self::try_with_config) to
    /// reject bad tunables instead.
    pub fn with_config(capacity: usize, mut config: AgingConfig) -> Self {
        config.aging_threshold = config.aging_threshold.max(1);
        Self {
            values: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            order: FreqBuckets::with_capacity(capacity),
            capacity,
            config,
            ops: 0,
        }
    }

    /// Validating constructor: `aging_factor` must lie in `(0, 1)` and the
    /// integer tunables must be at least 1.
    pub fn try_with_config(capacity: usize, config: AgingConfig) -> Result<Self, ConfigError> {
        if !(config.aging_factor > 0.0 && config.aging_factor < 1.0) {
            return Err(ConfigError::RatioOutOfRange {
                name: "aging_factor",
                value: config.aging_factor,
                expected: "(0, 1)",
            });
        }
        if config.aging_threshold == 0 {
            return Err(ConfigError::ZeroParameter {
                name: "aging_threshold",
            });
        }
        if config.max_average_freq == 0 {
            return Err(ConfigError::ZeroParameter {
                name: "max_average_freq",
            });
        }
        Ok(Self::with_config(capacity, config))
    }

    /// Current aging tunables.
    pub fn config(&self) -> AgingConfig {
        self.config
    }

    /// Mean frequency across residents, zero when empty.
    pub fn average_frequency(&self) -> u64 {
        if self.values.is_empty() {
            0
        } else {
            self.order.total_freq() / self.values.len() as u64
        }
    }

    /// Read-only lookup: no frequency bump, no aging tick.
    pub fn peek(&self, key: &K) -> Option<&V> {
        self.values.get(key)
    }

    /// Ticks the operation counter and runs whichever aging pass is due.
    fn note_operation(&mut self) {
        self.ops += 1;

        if self.ops % self.config.aging_threshold == 0 {
            let factor = self.config.aging_factor;
            self.order.remap(|f| (f as f64 * factor).floor() as u64);
        }

        if self.average_frequency() > self.config.max_average_freq {
            let delta = self.config.max_average_freq / 2;
            self.order.remap(|f| f.saturating_sub(delta));
        }
    }

    fn evict_one(&mut self) {
        if let Some((key, _)) = self.order.pop_min() {
            self.values.remove(&key);
        }
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        assert_eq!(self.values.len(), self.order.len());
        assert!(self.values.len() <= self.capacity);
        self.order.debug_validate_invariants();
    }
}

impl<K, V> CoreCache<K, V> for LfuCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn insert(&mut self, key: K, value: V) -> Option<V> {
        if let Some(slot) = self.values.get_mut(&key) {
            let previous = std::mem::replace(slot, value);
            self.order.touch(&key);
            self.note_operation();
            return Some(previous);
        }

        if self.capacity == 0 {
            return None;
        }

        if self.values.len() >= self.capacity {
            self.evict_one();
        }

        self.order.insert(key.clone());
        self.values.insert(key, value);
        self.note_operation();
        None
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        let hit = self.order.touch(key).is_some();
        self.note_operation();
        if hit {
            self.values.get(key)
        } else {
            None
        }
    }

    fn contains(&self, key: &K) -> bool {
        self.values.contains_key(key)
    }

    fn len(&self) -> usize {
        self.values.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn clear(&mut self) {
        self.values.clear();
        self.order.clear();
        self.ops = 0;
    }
}

impl<K, V> MutableCache<K, V> for LfuCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn remove(&mut self, key: &K) -> Option<V> {
        let value = self.values.remove(key)?;
        self.order.remove(key);
        Some(value)
    }
}

impl<K, V> LfuCacheTrait<K, V> for LfuCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn pop_lfu(&mut self) -> Option<(K, V)> {
        let (key, _) = self.order.pop_min()?;
        let value = self.values.remove(&key)?;
        Some((key, value))
    }

    fn peek_lfu(&self) -> Option<(&K, &V)> {
        let (key, _) = self.order.peek_min()?;
        let value = self.values.get(key)?;
        Some((key, value))
    }

    fn frequency(&self, key: &K) -> Option<u64> {
        self.order.frequency(key)
    }
}

/// Thread-safe LFU-aging engine.
#[derive(Debug)]
pub struct ConcurrentLfuCache<K, V>
where
    K: Eq + Hash + Clone,
{
    inner: Mutex<LfuCore<K, V>>,
}

impl<K, V> ConcurrentLfuCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(LfuCore::new(capacity)),
        }
    }

    pub fn with_config(capacity: usize, config: AgingConfig) -> Self {
        Self {
            inner: Mutex::new(LfuCore::with_config(capacity, config)),
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

    pub fn frequency(&self, key: &K) -> Option<u64> {
        self.inner.lock().frequency(key)
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

impl<K, V> ConcurrentCache for ConcurrentLfuCache<K, V> where K: Eq + Hash + Clone + Send, V: Send {}
