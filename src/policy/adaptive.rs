//! # Adaptive multiplexer
//!
//! Runs the four canonical engines — LRU, LFU, LFU with aggressive aging,
//! and ARC — side by side and serves from whichever one is currently
//! winning on measured hit rate.
//!
//! Every `insert` is broadcast to all engines so the shadows stay warm.
//! Every `get` consults all engines, records a per-engine (hits, totals)
//! sample, and returns the serving engine's answer. Once every
//! `eval_period` gets the running hit rates are compared: if the best
//! engine beats the serving one by more than `switch_threshold` (absolute),
//! it becomes the serving engine. Counters are not reset on a switch, so a
//! lucky burst cannot flap the selection back and forth.
//!
//! The engine set is a closed enum, dispatched by `match`; engines are
//! never synthesized at runtime.
//!
//! `AdaptiveCore` is single-threaded; [`ConcurrentAdaptiveCache`] holds it
//! behind one mutex, which also linearizes the broadcast: all shadow
//! engines observe operations in the same order.

use std::hash::Hash;

use parking_lot::Mutex;

use crate::policy::arc::ArcCore;
use crate::policy::lfu::{AgingConfig, LfuCore};
use crate::policy::lru::LruCore;
use crate::traits::{ConcurrentCache, CoreCache, MutableCache};

pub const DEFAULT_EVAL_PERIOD: u64 = 1000;
pub const DEFAULT_SWITCH_THRESHOLD: f64 = 0.02;

/// The closed set of engines the multiplexer arbitrates between.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Strategy {
    Lru,
    Lfu,
    LfuAging,
    Arc,
}

impl Strategy {
    pub const ALL: [Strategy; 4] = [
        Strategy::Lru,
        Strategy::Lfu,
        Strategy::LfuAging,
        Strategy::Arc,
    ];

    #[inline]
    fn index(self) -> usize {
        match self {
            Strategy::Lru => 0,
            Strategy::Lfu => 1,
            Strategy::LfuAging => 2,
            Strategy::Arc => 3,
        }
    }
}

#[derive(Debug, Default, Clone, Copy)]
struct HitStats {
    hits: u64,
    total: u64,
}

impl HitStats {
    fn record(&mut self, hit: bool) {
        self.total += 1;
        if hit {
            self.hits += 1;
        }
    }

    fn hit_rate(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            self.hits as f64 / self.total as f64
        }
    }
}

/// Single-threaded adaptive core over the four shadow engines.
#[derive(Debug)]
pub struct AdaptiveCore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    lru: LruCore<K, V>,
    lfu: LfuCore<K, V>,
    lfu_aging: LfuCore<K, V>,
    arc: ArcCore<K, V>,
    stats: [HitStats; 4],
    serving: Strategy,
    gets: u64,
    eval_period: u64,
    switch_threshold: f64,
    capacity: usize,
}

/// Aggressive aging for the LFU_AGING shadow: ages every 1000 operations by
/// half, shift-down at a mean of 8000.
fn aggressive_aging() -> AgingConfig {
    AgingConfig {
        max_average_freq: 8000,
        aging_threshold: 1000,
        aging_factor: 0.5,
    }
}

impl<K, V> AdaptiveCore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Multiplexer with the default evaluation cadence (every 1000 gets)
    /// and switch threshold (0.02 absolute hit rate).
    pub fn new(capacity: usize) -> Self {
        Self::with_params(capacity, DEFAULT_EVAL_PERIOD, DEFAULT_SWITCH_THRESHOLD)
    }

    /// Multiplexer with explicit evaluation cadence and switch threshold.
    /// `eval_period` is clamped to at least 1.
    pub fn with_params(capacity: usize, eval_period: u64, switch_threshold: f64) -> Self {
        Self {
            lru: LruCore::new(capacity),
            lfu: LfuCore::new(capacity),
            lfu_aging: LfuCore::with_config(capacity, aggressive_aging()),
            arc: ArcCore::new(capacity),
            stats: [HitStats::default(); 4],
            serving: Strategy::LfuAging,
            gets: 0,
            eval_period: eval_period.max(1),
            switch_threshold,
            capacity,
        }
    }

    /// Engine currently answering `get`.
    pub fn current_strategy(&self) -> Strategy {
        self.serving
    }

    /// Running hit rate per shadow engine.
    pub fn hit_rates(&self) -> [(Strategy, f64); 4] {
        [
            (Strategy::Lru, self.stats[0].hit_rate()),
            (Strategy::Lfu, self.stats[1].hit_rate()),
            (Strategy::LfuAging, self.stats[2].hit_rate()),
            (Strategy::Arc, self.stats[3].hit_rate()),
        ]
    }

    pub fn eval_period(&self) -> u64 {
        self.eval_period
    }

    pub fn switch_threshold(&self) -> f64 {
        self.switch_threshold
    }

    fn touch_engine(&mut self, strategy: Strategy, key: &K) -> bool {
        match strategy {
            Strategy::Lru => self.lru.get(key).is_some(),
            Strategy::Lfu => self.lfu.get(key).is_some(),
            Strategy::LfuAging => self.lfu_aging.get(key).is_some(),
            Strategy::Arc => self.arc.get(key).is_some(),
        }
    }

    fn peek_engine(&self, strategy: Strategy, key: &K) -> Option<&V> {
        match strategy {
            Strategy::Lru => self.lru.peek(key),
            Strategy::Lfu => self.lfu.peek(key),
            Strategy::LfuAging => self.lfu_aging.peek(key),
            Strategy::Arc => self.arc.peek(key),
        }
    }

    fn engine_insert(&mut self, strategy: Strategy, key: K, value: V) -> Option<V> {
        match strategy {
            Strategy::Lru => self.lru.insert(key, value),
            Strategy::Lfu => self.lfu.insert(key, value),
            Strategy::LfuAging => self.lfu_aging.insert(key, value),
            Strategy::Arc => self.arc.insert(key, value),
        }
    }

    fn engine_remove(&mut self, strategy: Strategy, key: &K) -> Option<V> {
        match strategy {
            Strategy::Lru => self.lru.remove(key),
            Strategy::Lfu => self.lfu.remove(key),
            Strategy::LfuAging => self.lfu_aging.remove(key),
            Strategy::Arc => self.arc.remove(key),
        }
    }

    fn engine_contains(&self, strategy: Strategy, key: &K) -> bool {
        match strategy {
            Strategy::Lru => self.lru.contains(key),
            Strategy::Lfu => self.lfu.contains(key),
            Strategy::LfuAging => self.lfu_aging.contains(key),
            Strategy::Arc => self.arc.contains(key),
        }
    }

    fn engine_len(&self, strategy: Strategy) -> usize {
        match strategy {
            Strategy::Lru => self.lru.len(),
            Strategy::Lfu => self.lfu.len(),
            Strategy::LfuAging => self.lfu_aging.len(),
            Strategy::Arc => self.arc.len(),
        }
    }

    /// Compares running hit rates and switches to the best engine when it
    /// leads the serving one by more than the threshold. Counters are kept.
    fn evaluate(&mut self) {
        let mut best = self.serving;
        let mut best_rate = self.stats[self.serving.index()].hit_rate();
        for strategy in Strategy::ALL {
            let rate = self.stats[strategy.index()].hit_rate();
            if rate > best_rate {
                best = strategy;
                best_rate = rate;
            }
        }

        let current_rate = self.stats[self.serving.index()].hit_rate();
        if best_rate - current_rate > self.switch_threshold {
            self.serving = best;
        }
    }
}

impl<K, V> CoreCache<K, V> for AdaptiveCore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Broadcast write: every shadow engine sees the same operation, so
    /// their hit rates stay comparable.
    fn insert(&mut self, key: K, value: V) -> Option<V> {
        let mut previous = None;
        for strategy in Strategy::ALL {
            let result = self.engine_insert(strategy, key.clone(), value.clone());
            if strategy == self.serving {
                previous = result;
            }
        }
        previous
    }

    /// Consults every engine (updating their metadata and hit counters) and
    /// answers from the engine that was serving when the call began.
    fn get(&mut self, key: &K) -> Option<&V> {
        let mut serving_hit = false;
        for strategy in Strategy::ALL {
            let hit = self.touch_engine(strategy, key);
            self.stats[strategy.index()].record(hit);
            if strategy == self.serving {
                serving_hit = hit;
            }
        }

        self.gets += 1;
        let responder = self.serving;
        if self.gets % self.eval_period == 0 {
            self.evaluate();
        }

        if serving_hit {
            self.peek_engine(responder, key)
        } else {
            None
        }
    }

    fn contains(&self, key: &K) -> bool {
        self.engine_contains(self.serving, key)
    }

    fn len(&self) -> usize {
        self.engine_len(self.serving)
    }

    fn capacity(&self) -> usize {
        self.capacity
    }

    fn clear(&mut self) {
        self.lru.clear();
        self.lfu.clear();
        self.lfu_aging.clear();
        self.arc.clear();
        self.stats = [HitStats::default(); 4];
        self.gets = 0;
        self.serving = Strategy::LfuAging;
    }
}

impl<K, V> MutableCache<K, V> for AdaptiveCore<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    fn remove(&mut self, key: &K) -> Option<V> {
        let mut previous = None;
        for strategy in Strategy::ALL {
            let result = self.engine_remove(strategy, key);
            if strategy == self.serving {
                previous = result;
            }
        }
        previous
    }
}

/// Thread-safe adaptive engine.
#[derive(Debug)]
pub struct ConcurrentAdaptiveCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    inner: Mutex<AdaptiveCore<K, V>>,
}

impl<K, V> ConcurrentAdaptiveCache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(AdaptiveCore::new(capacity)),
        }
    }

    pub fn with_params(capacity: usize, eval_period: u64, switch_threshold: f64) -> Self {
        Self {
            inner: Mutex::new(AdaptiveCore::with_params(
                capacity,
                eval_period,
                switch_threshold,
            )),
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

    pub fn current_strategy(&self) -> Strategy {
        self.inner.lock().current_strategy()
    }

    pub fn hit_rates(&self) -> [(Strategy, f64); 4] {
        self.inner.lock().hit_rates()
    }

    pub fn clear(&self) {
        self.inner.lock().clear()
    }
}

impl<K, V> ConcurrentCache for ConcurrentAdaptiveCache<K, V>
where
    K: Eq + Hash + Clone + Send,
    V: Clone + Send,
{
}
