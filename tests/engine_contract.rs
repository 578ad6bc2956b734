// ==============================================
// CROSS-ENGINE CONTRACT TESTS (integration)
// ==============================================
//
// Behavior every engine must share, plus end-to-end eviction scenarios that
// span several modules. Module-local details live next to their engines;
// what belongs here is the uniform contract and the interplay of eviction,
// ghosts, admission, and the adaptive switch.

use cachemux::ds::FrequencySketch;
use cachemux::policy::adaptive::AdaptiveCore;
use cachemux::policy::arc::ArcCore;
use cachemux::policy::lfu::{AgingConfig, LfuCore};
use cachemux::policy::lru::LruCore;
use cachemux::policy::tiny_lfu::WTinyLfuCore;
use cachemux::policy::Strategy;
use cachemux::traits::{CoreCache, LfuCacheTrait, MutableCache};

// ==============================================
// Literal eviction scenarios
// ==============================================

#[test]
fn lru_protects_touched_key_over_untouched() {
    let mut cache = LruCore::new(3);
    cache.insert(1, "a");
    cache.insert(2, "b");
    cache.insert(3, "c");
    assert_eq!(cache.get(&1), Some(&"a"));

    cache.insert(4, "d");

    assert_eq!(cache.get(&2), None);
    assert_eq!(cache.get(&1), Some(&"a"));
    assert_eq!(cache.get(&3), Some(&"c"));
    assert_eq!(cache.get(&4), Some(&"d"));
}

#[test]
fn lfu_evicts_the_least_frequent() {
    let mut cache = LfuCore::new(3);
    cache.insert(1, "a");
    cache.insert(2, "b");
    cache.insert(3, "c");
    cache.get(&1);
    cache.get(&1);
    cache.get(&2);

    cache.insert(4, "d");

    assert_eq!(cache.get(&3), None);
    assert_eq!(cache.get(&1), Some(&"a"));
    assert_eq!(cache.get(&2), Some(&"b"));
    assert_eq!(cache.get(&4), Some(&"d"));
}

#[test]
fn lfu_aging_lets_a_cold_giant_fall() {
    // Aggressive aging: halve frequencies every 4 operations.
    let config = AgingConfig {
        max_average_freq: 1_000_000,
        aging_threshold: 4,
        aging_factor: 0.5,
    };
    let mut cache = LfuCore::with_config(2, config);

    cache.insert(1, "a");
    for _ in 0..10 {
        cache.get(&1);
    }
    cache.insert(2, "b");
    cache.get(&2);

    // Aging passes have pulled key 1 far below its raw count of 11.
    assert!(cache.frequency(&1).unwrap() <= 5);

    // Key 2's post-aging frequency is lower still, so it is the victim.
    cache.insert(3, "c");
    assert!(!cache.contains(&2));
    assert!(cache.contains(&1));
    assert!(cache.contains(&3));
}

#[test]
fn arc_ghost_hit_rebalances_and_serves_fresh_value() {
    let mut cache = ArcCore::with_threshold(2, 2);

    cache.insert(1, "a");
    cache.insert(2, "b");
    cache.get(&1);
    cache.get(&1); // key 1 has been copied into the frequency half
    assert!(cache.frequency_len() >= 1);

    cache.insert(3, "c"); // recency half evicts 2 into its ghost
    assert!(!cache.contains(&2));
    assert_eq!(cache.recency_ghost_len(), 1);

    let freq_cap = cache.frequency_capacity();
    cache.insert(2, "b'"); // ghost hit: capacity shifts toward recency
    assert_eq!(cache.frequency_capacity(), freq_cap - 1);

    assert_eq!(cache.get(&2), Some(&"b'"));
    cache.debug_validate_invariants();
}

#[test]
fn tiny_lfu_admission_protects_the_hot_key() {
    // window 1, victim 9.
    let mut cache = WTinyLfuCore::with_window_ratio(10, 0.1);

    for key in 0..100u64 {
        cache.insert(key, key);
    }

    // Re-establish key 7 and pump its estimated frequency sky-high.
    for _ in 0..100 {
        cache.insert(7, 7);
    }

    // The fresh single-access key evicts 7 from the window, but 7 wins the
    // admission duel and displaces a one-hit wonder in the victim cache.
    cache.insert(100, 100);

    assert!(cache.contains(&7));
    assert!(cache.contains(&100));
    assert!(cache.len() <= cache.capacity());
}

#[test]
fn adaptive_switches_exactly_at_the_evaluation_tick() {
    let mut cache: AdaptiveCore<u64, u64> = AdaptiveCore::new(30);

    // Warm all shadows with 30 residents and give them frequency weight.
    for key in 0..30 {
        cache.insert(key, key);
    }
    for _ in 0..5 {
        for key in 0..30 {
            assert_eq!(cache.get(&key), Some(&key));
        }
    }

    // A second wave of inserts: LRU keeps the new keys, the LFU shadows
    // keep the old frequent ones.
    for key in 30..60 {
        cache.insert(key, key);
    }

    // Gets on the new keys hit LRU but miss the serving LFU-aging shadow.
    // 150 warm-up gets have happened; run up to get #999.
    for i in 0..849u64 {
        let key = 30 + (i % 30);
        cache.get(&key);
    }
    assert_eq!(cache.current_strategy(), Strategy::LfuAging);

    // Get #1000 triggers the evaluation and the switch.
    cache.get(&30);
    assert_eq!(cache.current_strategy(), Strategy::Lru);

    // LRU now leads; its hit rate is visibly ahead of the old serving one.
    let rates = cache.hit_rates();
    assert!(rates[0].1 > rates[2].1 + 0.02);
}

// ==============================================
// Universal invariants
// ==============================================

/// Tiny deterministic LCG so the op mix is reproducible.
struct Lcg(u64);

impl Lcg {
    fn next(&mut self) -> u64 {
        self.0 = self.0.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        self.0 >> 33
    }
}

fn hammer<C: MutableCache<u64, u64>>(cache: &mut C, seed: u64, check: impl Fn(&C)) {
    let mut rng = Lcg(seed);
    for _ in 0..2000 {
        let key = rng.next() % 48;
        match rng.next() % 4 {
            0 | 1 => {
                cache.insert(key, key * 10);
            },
            2 => {
                cache.get(&key);
            },
            _ => {
                cache.remove(&key);
            },
        }
        check(cache);
    }
}

#[test]
fn size_never_exceeds_capacity_under_churn() {
    let mut lru = LruCore::new(16);
    hammer(&mut lru, 1, |c| assert!(c.len() <= 16));

    let mut lfu = LfuCore::with_config(
        16,
        AgingConfig {
            max_average_freq: 64,
            aging_threshold: 100,
            aging_factor: 0.5,
        },
    );
    hammer(&mut lfu, 2, |c| assert!(c.len() <= 16));

    let mut tiny = WTinyLfuCore::with_window_ratio(16, 0.25);
    hammer(&mut tiny, 3, |c| assert!(c.len() <= 16));

    let mut adaptive = AdaptiveCore::new(16);
    hammer(&mut adaptive, 4, |c| assert!(c.len() <= 16));
}

#[test]
fn arc_halves_stay_within_their_capacities_under_churn() {
    let mut arc = ArcCore::new(16);
    let mut rng = Lcg(5);
    for _ in 0..2000 {
        let key = rng.next() % 48;
        match rng.next() % 4 {
            0 | 1 => {
                arc.insert(key, key);
            },
            2 => {
                arc.get(&key);
            },
            _ => {
                arc.remove(&key);
            },
        }
        assert!(arc.recency_len() <= arc.recency_capacity());
        assert!(arc.frequency_len() <= arc.frequency_capacity());
        assert_eq!(
            arc.recency_capacity() + arc.frequency_capacity(),
            32,
            "capacity steals move units, never create or destroy them"
        );
    }
    arc.debug_validate_invariants();
}

#[test]
fn insert_then_get_round_trips_without_pressure() {
    let mut lru = LruCore::new(8);
    let mut lfu = LfuCore::new(8);
    let mut arc = ArcCore::new(8);
    let mut tiny = WTinyLfuCore::new(8);
    let mut adaptive = AdaptiveCore::new(8);

    for key in 0..4u64 {
        lru.insert(key, key);
        lfu.insert(key, key);
        arc.insert(key, key);
        tiny.insert(key, key);
        adaptive.insert(key, key);
    }
    for key in 0..4u64 {
        assert_eq!(lru.get(&key), Some(&key));
        assert_eq!(lfu.get(&key), Some(&key));
        assert_eq!(arc.get(&key), Some(&key));
        assert_eq!(tiny.get(&key), Some(&key));
        assert_eq!(adaptive.get(&key), Some(&key));
    }
}

#[test]
fn repeated_insert_is_idempotent_on_the_value() {
    let mut cache = LfuCore::new(4);
    for _ in 0..10 {
        cache.insert(1, "same");
        assert_eq!(cache.peek(&1), Some(&"same"));
    }
    assert_eq!(cache.len(), 1);
}

#[test]
fn remove_then_get_misses_everywhere() {
    let mut lru = LruCore::new(8);
    let mut arc = ArcCore::new(8);
    let mut tiny = WTinyLfuCore::new(8);

    lru.insert(1, "a");
    arc.insert(1, "a");
    tiny.insert(1, "a");

    assert_eq!(lru.remove(&1), Some("a"));
    assert_eq!(arc.remove(&1), Some("a"));
    assert_eq!(tiny.remove(&1), Some("a"));

    assert_eq!(lru.get(&1), None);
    assert_eq!(arc.get(&1), None);
    assert_eq!(tiny.get(&1), None);
}

#[test]
fn zero_capacity_engines_are_null_sinks() {
    let mut lru = LruCore::new(0);
    let mut lfu = LfuCore::new(0);
    let mut arc: ArcCore<u64, u64> = ArcCore::new(0);
    let mut tiny = WTinyLfuCore::new(0);
    let mut adaptive = AdaptiveCore::new(0);

    for key in 0..8u64 {
        lru.insert(key, key);
        lfu.insert(key, key);
        arc.insert(key, key);
        tiny.insert(key, key);
        adaptive.insert(key, key);
    }

    assert_eq!(lru.len(), 0);
    assert_eq!(lfu.len(), 0);
    assert_eq!(arc.len(), 0);
    assert_eq!(tiny.len(), 0);
    assert_eq!(adaptive.len(), 0);
    assert_eq!(lru.get(&1), None);
    assert_eq!(adaptive.get(&1), None);
}

#[test]
fn sketch_estimates_are_monotone_between_decays() {
    let sketch: FrequencySketch<u64> = FrequencySketch::new(512, 4, 100);

    let mut last = 0;
    for _ in 0..40 {
        sketch.increment(&9);
        let estimate = sketch.estimate(&9);
        assert!(estimate >= last);
        last = estimate;
    }

    sketch.decay();
    assert_eq!(sketch.estimate(&9), last / 2);

    sketch.reset();
    assert_eq!(sketch.estimate(&9), 0);
}

#[test]
fn tiny_lfu_rejected_newcomer_is_not_resident() {
    // window 1, victim 1: the victim's only entry is also its oldest.
    let mut cache = WTinyLfuCore::with_window_ratio(2, 0.1);
    cache.insert(1, "a");
    cache.insert(2, "b"); // key 1 fills the victim's free slot
    for _ in 0..3 {
        cache.get(&1); // estimate(1) = 4
    }

    // Key 2 leaves the window with estimate 1 < estimate(1): rejected.
    cache.insert(3, "c");
    assert!(!cache.contains(&2));
    assert!(cache.contains(&1));
    assert_eq!(cache.admission_losses(), 1);
}

// ==============================================
// Concurrency smoke
// ==============================================

mod concurrency {
    use cachemux::policy::adaptive::ConcurrentAdaptiveCache;
    use cachemux::policy::tiny_lfu::ConcurrentWTinyLfuCache;
    use std::sync::Arc;

    #[test]
    fn adaptive_survives_parallel_churn() {
        let cache = Arc::new(ConcurrentAdaptiveCache::new(32));
        let handles: Vec<_> = (0..4u64)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..500u64 {
                        let key = (t * 13 + i) % 64;
                        cache.insert(key, key);
                        cache.get(&key);
                        if i % 7 == 0 {
                            cache.remove(&key);
                        }
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(cache.len() <= 32);
    }

    #[test]
    fn tiny_lfu_survives_parallel_churn() {
        let cache = Arc::new(ConcurrentWTinyLfuCache::new(32));
        let handles: Vec<_> = (0..4u64)
            .map(|t| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for i in 0..500u64 {
                        let key = (t * 31 + i) % 64;
                        cache.insert(key, key);
                        cache.get(&key);
                    }
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert!(cache.len() <= 32);
    }
}
