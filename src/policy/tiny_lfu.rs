//! # W-TinyLFU engine
//!
//! Window + main LRU pair guarded by a Count-Min-Sketch admission filter.
//!
//! ## Architecture
//!
//! ```text
//!                     new key
//!                        │
//!                        ▼
//!   ┌───────────────────────────┐   window LRU victim    ┌──────────────────────────┐
//!   │  Window LRU (~1% of cap)  │ ─────────────────────► │  Admission filter        │
//!   │  absorbs new arrivals     │                        │  est(candidate) ≥        │
//!   └───────────────────────────┘                        │  est(main oldest) ?      │
//!                                                        └───────┬──────────┬───────┘
//!                                                            yes │          │ no
//!                                                                ▼          ▼
//!                                                  ┌──────────────────┐   dropped
//!                                                  │  Victim LRU      │
//!                                                  │  (rest of cap)   │
//!                                                  └──────────────────┘
//! ```
//!
//! Every `insert` and `get` feeds the sketch. New keys enter the window,
//! which gives them a short recency grace period; when the window overflows,
//! its LRU entry must win a frequency duel against the victim cache's oldest
//! entry to displace it. One-hit wonders lose that duel and vanish without
//! ever touching the main cache.
//!
//! A hit in the victim cache promotes within the victim's own LRU order; it
//! never migrates back to the window. Every 1000 admission attempts the
//! sketch is halved so stale popularity decays with the workload rather than
//! with wall-clock time.
//!
//! The sketch owns its own lock and the engine lock is taken around it, in
//! that order only, so the pair cannot deadlock.

use std::hash::Hash;

use parking_lot::Mutex;

use crate::ds::sketch::FrequencySketch;
use crate::error::ConfigError;
use crate::policy::lru::LruCore;
use crate::traits::{ConcurrentCache, CoreCache, LruCacheTrait, MutableCache};

pub const DEFAULT_WINDOW_RATIO: f64 = 0.01;

/// Admission attempts between sketch decays.
const DECAY_PERIOD: u64 = 1000;

/// Single-threaded W-TinyLFU core.
#[derive(Debug)]
pub struct WTinyLfuCore<K, V>
where
    K: Eq + Hash + Clone,
{
    window: LruCore<K, V>,
    victim: LruCore<K, V>,
    sketch: FrequencySketch<K>,
    capacity: usize,
    admissions: u64,
    admission_wins: u64,
    admission_losses: u64,
    lookups: u64,
    hits: u64,
    window_hits: u64,
    victim_hits: u64,
}

impl<K, V> WTinyLfuCore<K, V>
where
    K: Eq + Hash + Clone,
{
    /// W-TinyLFU with the default 1% window.
    pub fn new(capacity: usize) -> Self {
        Self::with_window_ratio(capacity, DEFAULT_WINDOW_RATIO)
    }

    /// W-TinyLFU with an explicit window share. Ratios outside `(0, 1]`
    /// fall back to the default; use
    /// [`try_with_window_ratio`](Self::try_with_window_ratio) to reject
    /// them instead.
    pub fn with_window_ratio(capacity: usize, window_ratio: f64) -> Self {
        let ratio = if window_ratio.is_finite() && window_ratio > 0.0 && window_ratio <= 1.0 {
            window_ratio
        } else {
            DEFAULT_WINDOW_RATIO
        };

        let (window_capacity, victim_capacity) = if capacity == 0 {
            (0, 0)
        } else {
            let window = ((capacity as f64 * ratio).ceil() as usize).max(1);
            (window, capacity.saturating_sub(window).max(1))
        };

        Self {
            window: LruCore::new(window_capacity),
            victim: LruCore::new(victim_capacity),
            sketch: FrequencySketch::for_capacity(capacity),
            capacity,
            admissions: 0,
            admission_wins: 0,
            admission_losses: 0,
            lookups: 0,
            hits: 0,
            window_hits: 0,
            victim_hits: 0,
        }
    }

    /// Validating constructor: `window_ratio` must lie in `(0, 1]`.
    pub fn try_with_window_ratio(capacity: usize, window_ratio: f64) -> Result<Self, ConfigError> {
        if !(window_ratio.is_finite() && window_ratio > 0.0 && window_ratio <= 1.0) {
            return Err(ConfigError::RatioOutOfRange {
                name: "window_ratio",
                value: window_ratio,
                expected: "(0, 1]",
            });
        }
        Ok(Self::with_window_ratio(capacity, window_ratio))
    }

    pub fn window_capacity(&self) -> usize {
        self.window.capacity()
    }

    pub fn victim_capacity(&self) -> usize {
        self.victim.capacity()
    }

    /// Estimated access count for a key, straight from the sketch.
    pub fn estimate(&self, key: &K) -> u32 {
        self.sketch.estimate(key)
    }

    /// Hits over lookups, zero before any lookup.
    pub fn hit_rate(&self) -> f64 {
        if self.lookups == 0 {
            0.0
        } else {
            self.hits as f64 / self.lookups as f64
        }
    }

    /// Share of hits served by the window.
    pub fn window_hit_rate(&self) -> f64 {
        if self.hits == 0 {
            0.0
        } else {
            self.window_hits as f64 / self.hits as f64
        }
    }

    /// Share of hits served by the victim cache.
    pub fn victim_hit_rate(&self) -> f64 {
        if self.hits == 0 {
            0.0
        } else {
            self.victim_hits as f64 / self.hits as f64
        }
    }

    pub fn admission_wins(&self) -> u64 {
        self.admission_wins
    }

    pub fn admission_losses(&self) -> u64 {
        self.admission_losses
    }

    /// Share of admission duels the newcomer won.
    pub fn admission_win_rate(&self) -> f64 {
        let total = self.admission_wins + self.admission_losses;
        if total == 0 {
            0.0
        } else {
            self.admission_wins as f64 / total as f64
        }
    }

    /// Zeroes the hit and admission counters; residents are untouched.
    pub fn reset_stats(&mut self) {
        self.admissions = 0;
        self.admission_wins = 0;
        self.admission_losses = 0;
        self.lookups = 0;
        self.hits = 0;
        self.window_hits = 0;
        self.victim_hits = 0;
    }

    /// Attempts to move a window eviction into the victim cache.
    ///
    /// Free victim slots are filled unconditionally. Against a full victim
    /// cache the newcomer must match or beat the sketch estimate of the
    /// victim's oldest entry, which then gets evicted; otherwise the
    /// newcomer is dropped on the floor.
    fn admit(&mut self, key: K, value: V) {
        self.admissions += 1;
        if self.admissions % DECAY_PERIOD == 0 {
            self.sketch.decay();
        }

        if self.victim.len() < self.victim.capacity() {
            self.victim.insert(key, value);
            return;
        }

        let candidate = match self.victim.oldest_key().cloned() {
            Some(candidate) => candidate,
            None => {
                self.victim.insert(key, value);
                return;
            },
        };

        if self.sketch.estimate(&key) >= self.sketch.estimate(&candidate) {
            self.victim.remove(&candidate);
            self.victim.insert(key, value);
            self.admission_wins += 1;
        } else {
            self.admission_losses += 1;
        }
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        self.window.debug_validate_invariants();
        self.victim.debug_validate_invariants();
        assert!(self.window.len() <= self.window.capacity());
        assert!(self.victim.len() <= self.victim.capacity());
    }
}

impl<K, V> CoreCache<K, V> for WTinyLfuCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn insert(&mut self, key: K, value: V) -> Option<V> {
        if self.capacity == 0 {
            return None;
        }
        self.sketch.increment(&key);

        if self.window.contains(&key) {
            return self.window.insert(key, value);
        }
        if self.victim.contains(&key) {
            // Update in place; residents never migrate between tiers on put.
            return self.victim.insert(key, value);
        }

        if self.window.len() >= self.window.capacity() {
            if let Some((evicted_key, evicted_value)) = self.window.pop_lru() {
                self.admit(evicted_key, evicted_value);
            }
        }
        self.window.insert(key, value)
    }

    fn get(&mut self, key: &K) -> Option<&V> {
        if self.capacity == 0 {
            return None;
        }
        self.sketch.increment(key);
        self.lookups += 1;

        if self.window.contains(key) {
            self.hits += 1;
            self.window_hits += 1;
            return self.window.get(key);
        }
        if self.victim.contains(key) {
            self.hits += 1;
            self.victim_hits += 1;
            // The victim's own LRU promotion applies; no move to the window.
            return self.victim.get(key);
        }
        None
    }

    fn contains(&self, key: &K) -> bool {
        self.window.contains(key) || self.victim.contains(key)
    }

    fn len(&self) -> usize {
        self.window.len() + self.victim.len()
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn clear(&mut self) {
        self.window.clear();
        self.victim.clear();
        self.sketch.reset();
        self.reset_stats();
    }
}

impl<K, V> MutableCache<K, V> for WTinyLfuCore<K, V>
where
    K: Eq + Hash + Clone,
{
    fn remove(&mut self, key: &K) -> Option<V> {
        let from_window = self.window.remove(key);
        let from_victim = self.victim.remove(key);
        from_window.or(from_victim)
    }
}

/// Thread-safe W-TinyLFU engine.
#[derive(Debug)]
pub struct ConcurrentWTinyLfuCache<K, V>
where
    K: Eq + Hash + Clone,
{
    inner: Mutex<WTinyLfuCore<K, V>>,
}

impl<K, V> ConcurrentWTinyLfuCache<K, V>
where
    K: Eq + Hash + Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(WTinyLfuCore::new(capacity)),
        }
    }

    pub fn with_window_ratio(capacity: usize, window_ratio: f64) -> Self {
        Self {
            inner: Mutex::new(WTinyLfuCore::with_window_ratio(capacity, window_ratio)),
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

    pub fn hit_rate(&self) -> f64 {
        self.inner.lock().hit_rate()
    }

    pub fn admission_win_rate(&self) -> f64 {
        self.inner.lock().admission_win_rate()
    }

    pub fn clear(&self) {
        self.inner.lock().clear()
    }
}

impl<K, V> ConcurrentCache for ConcurrentWTinyLfuCache<K, V>
where
    K: Eq + Hash + Clone + Send,
    V: Send,
{
}
