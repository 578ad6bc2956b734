//! Unified cache builder over the closed set of engine kinds.
//!
//! Callers that pick a policy at runtime get one wrapper type with a
//! consistent API instead of six concrete engine types. The engine set is a
//! tagged enum dispatched by `match`.
//!
//! ## Example
//!
//! ```
//! use cachemux::builder::{CacheBuilder, PolicyKind};
//!
//! let mut cache = CacheBuilder::new(100).build::<u64, String>(PolicyKind::Lru);
//! cache.insert(1, "hello".to_string());
//! assert_eq!(cache.get(&1), Some(&"hello".to_string()));
//! ```

use std::hash::Hash;

use crate::policy::adaptive::AdaptiveCore;
use crate::policy::arc::ArcCore;
use crate::policy::lfu::{AgingConfig, LfuCore};
use crate::policy::lru::LruCore;
use crate::policy::lru_k::LrukCore;
use crate::policy::tiny_lfu::WTinyLfuCore;
use crate::traits::{CoreCache, MutableCache};

/// Available eviction policies.
#[derive(Debug, Clone)]
pub enum PolicyKind {
    /// Least Recently Used eviction.
    Lru,
    /// Least Frequently Used eviction with default (rare) aging.
    Lfu,
    /// LFU with explicit aging tunables.
    LfuAging(AgingConfig),
    /// LRU-K promotion with configurable K and history sizing.
    LruK { k: usize, history_ratio: f64 },
    /// W-TinyLFU with a configurable window share.
    WTinyLfu { window_ratio: f64 },
    /// ARC with a configurable promotion threshold.
    Arc { transform_threshold: u64 },
    /// Adaptive multiplexer over LRU / LFU / LFU-aging / ARC.
    Adaptive,
}

/// Policy-erased cache with a uniform API.
pub struct Cache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    inner: CacheInner<K, V>,
}

enum CacheInner<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    Lru(LruCore<K, V>),
    Lfu(LfuCore<K, V>),
    LruK(LrukCore<K, V>),
    WTinyLfu(WTinyLfuCore<K, V>),
    Arc(ArcCore<K, V>),
    Adaptive(AdaptiveCore<K, V>),
}

impl<K, V> Cache<K, V>
where
    K: Eq + Hash + Clone,
    V: Clone,
{
    /// Insert or update; returns the previous value where the policy tracks
    /// one.
    pub fn insert(&mut self, key: K, value: V) -> Option<V> {
        match &mut self.inner {
            CacheInner::Lru(cache) => cache.insert(key, value),
            CacheInner::Lfu(cache) => cache.insert(key, value),
            CacheInner::LruK(cache) => cache.insert(key, value),
            CacheInner::WTinyLfu(cache) => cache.insert(key, value),
            CacheInner::Arc(cache) => cache.insert(key, value),
            CacheInner::Adaptive(cache) => cache.insert(key, value),
        }
    }

    /// Lookup with the policy's usual metadata side effects.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        match &mut self.inner {
            CacheInner::Lru(cache) => cache.get(key),
            CacheInner::Lfu(cache) => cache.get(key),
            CacheInner::LruK(cache) => cache.get(key),
            CacheInner::WTinyLfu(cache) => cache.get(key),
            CacheInner::Arc(cache) => cache.get(key),
            CacheInner::Adaptive(cache) => cache.get(key),
        }
    }

    pub fn remove(&mut self, key: &K) -> Option<V> {
        match &mut self.inner {
            CacheInner::Lru(cache) => cache.remove(key),
            CacheInner::Lfu(cache) => cache.remove(key),
            CacheInner::LruK(cache) => cache.remove(key),
            CacheInner::WTinyLfu(cache) => cache.remove(key),
            CacheInner::Arc(cache) => cache.remove(key),
            CacheInner::Adaptive(cache) => cache.remove(key),
        }
    }

    pub fn contains(&self, key: &K) -> bool {
        match &self.inner {
            CacheInner::Lru(cache) => cache.contains(key),
            CacheInner::Lfu(cache) => cache.contains(key),
            CacheInner::LruK(cache) => cache.contains(key),
            CacheInner::WTinyLfu(cache) => cache.contains(key),
            CacheInner::Arc(cache) => cache.contains(key),
            CacheInner::Adaptive(cache) => cache.contains(key),
        }
    }

    pub fn len(&self) -> usize {
        match &self.inner {
            CacheInner::Lru(cache) => cache.len(),
            CacheInner::Lfu(cache) => cache.len(),
            CacheInner::LruK(cache) => cache.len(),
            CacheInner::WTinyLfu(cache) => cache.len(),
            CacheInner::Arc(cache) => cache.len(),
            CacheInner::Adaptive(cache) => cache.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        match &self.inner {
            CacheInner::Lru(cache) => cache.capacity(),
            CacheInner::Lfu(cache) => cache.capacity(),
            CacheInner::LruK(cache) => cache.capacity(),
            CacheInner::WTinyLfu(cache) => cache.capacity(),
            CacheInner::Arc(cache) => cache.capacity(),
            CacheInner::Adaptive(cache) => cache.capacity(),
        }
    }

    pub fn clear(&mut self) {
        match &mut self.inner {
            CacheInner::Lru(cache) => cache.clear(),
            CacheInner::Lfu(cache) => cache.clear(),
            CacheInner::LruK(cache) => cache.clear(),
            CacheInner::WTinyLfu(cache) => cache.clear(),
            CacheInner::Arc(cache) => cache.clear(),
            CacheInner::Adaptive(cache) => cache.clear(),
        }
    }
}

/// Builder carrying the shared capacity.
pub struct CacheBuilder {
    capacity: usize,
}

impl CacheBuilder {
    pub fn new(capacity: usize) -> Self {
        Self { capacity }
    }

    /// Builds a cache with the chosen policy.
    ///
    /// ```
    /// use cachemux::builder::{CacheBuilder, PolicyKind};
    ///
    /// let lru = CacheBuilder::new(100).build::<u64, String>(PolicyKind::Lru);
    /// assert_eq!(lru.capacity(), 100);
    ///
    /// let arc = CacheBuilder::new(100)
    ///     .build::<u64, String>(PolicyKind::Arc { transform_threshold: 2 });
    /// assert!(arc.is_empty());
    /// ```
    pub fn build<K, V>(self, policy: PolicyKind) -> Cache<K, V>
    where
        K: Eq + Hash + Clone,
        V: Clone,
    {
        let inner = match policy {
            PolicyKind::Lru => CacheInner::Lru(LruCore::new(self.capacity)),
            PolicyKind::Lfu => CacheInner::Lfu(LfuCore::new(self.capacity)),
            PolicyKind::LfuAging(config) => {
                CacheInner::Lfu(LfuCore::with_config(self.capacity, config))
            },
            PolicyKind::LruK { k, history_ratio } => {
                CacheInner::LruK(LrukCore::with_params(self.capacity, k, history_ratio))
            },
            PolicyKind::WTinyLfu { window_ratio } => {
                CacheInner::WTinyLfu(WTinyLfuCore::with_window_ratio(self.capacity, window_ratio))
            },
            PolicyKind::Arc {
                transform_threshold,
            } => CacheInner::Arc(ArcCore::with_threshold(self.capacity, transform_threshold)),
            PolicyKind::Adaptive => CacheInner::Adaptive(AdaptiveCore::new(self.capacity)),
        };

        Cache { inner }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn policies() -> Vec<PolicyKind> {
        vec![
            PolicyKind::Lru,
            PolicyKind::Lfu,
            PolicyKind::LfuAging(AgingConfig::default()),
            PolicyKind::WTinyLfu { window_ratio: 0.1 },
            PolicyKind::Arc {
                transform_threshold: 2,
            },
            PolicyKind::Adaptive,
        ]
    }

    #[test]
    fn all_policies_share_the_basic_contract() {
        for policy in policies() {
            let mut cache = CacheBuilder::new(10).build::<u64, String>(policy.clone());

            assert_eq!(cache.insert(1, "one".to_string()), None);
            cache.insert(2, "two".to_string());

            assert_eq!(cache.get(&1), Some(&"one".to_string()), "{policy:?}");
            assert_eq!(cache.get(&3), None, "{policy:?}");
            assert!(cache.contains(&1), "{policy:?}");
            assert_eq!(cache.len(), 2, "{policy:?}");

            assert_eq!(
                cache.insert(1, "ONE".to_string()),
                Some("one".to_string()),
                "{policy:?}"
            );
            assert_eq!(cache.get(&1), Some(&"ONE".to_string()), "{policy:?}");

            cache.clear();
            assert!(cache.is_empty(), "{policy:?}");
        }
    }

    #[test]
    fn lru_k_defers_residency_until_promotion() {
        let mut cache = CacheBuilder::new(10).build::<u64, String>(PolicyKind::LruK {
            k: 2,
            history_ratio: 2.5,
        });

        cache.insert(1, "one".to_string());
        assert!(!cache.contains(&1));
        cache.insert(1, "one".to_string());
        assert!(cache.contains(&1));
    }

    #[test]
    fn capacity_is_enforced_across_policies() {
        for policy in policies() {
            let mut cache = CacheBuilder::new(2).build::<u64, u64>(policy.clone());
            for key in 0..10 {
                cache.insert(key, key);
            }
            assert!(cache.len() <= 2, "{policy:?}");
        }
    }
}
