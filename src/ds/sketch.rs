//! Count-Min Sketch frequency estimator.
//!
//! A `depth × width` matrix of saturating 8-bit counters. `increment` bumps
//! one counter per row (the row's seeded hash of the key) and `estimate`
//! reads the minimum across rows, so estimates carry one-sided error: they
//! can only over-count, never under-count. Counters saturate at 255, which
//! caps the dynamic range but keeps `estimate` monotone between two `decay`
//! calls. `decay` halves every counter so stale popularity fades.
//!
//! The sketch owns its lock, disjoint from any engine lock. The W-TinyLFU
//! engine calls in while holding its own lock; the sketch never calls back
//! out, so the lock order is fixed and deadlock-free.

use std::hash::{Hash, Hasher};
use std::marker::PhantomData;

use parking_lot::Mutex;
use rustc_hash::FxHasher;

/// Default number of hash rows.
pub const DEFAULT_DEPTH: usize = 4;

/// Finalizer from splitmix64; spreads row seeds over the hash output.
#[inline]
fn mix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}

/// Approximate per-key access counter backed by saturating `u8` cells.
#[derive(Debug)]
pub struct FrequencySketch<K> {
    cells: Mutex<Box<[u8]>>,
    seeds: Vec<u64>,
    width: usize,
    depth: usize,
    sample_size: usize,
    _key: PhantomData<fn(&K)>,
}

impl<K> FrequencySketch<K>
where
    K: Hash,
{
    /// Builds a sketch with explicit dimensions. Width and depth are clamped
    /// to at least 1. Row seeds are fixed at construction.
    pub fn new(width: usize, depth: usize, sample_size: usize) -> Self {
        let width = width.max(1);
        let depth = depth.max(1);

        let mut state = 0x517C_C1B7_2722_0A95u64;
        let seeds = (0..depth)
            .map(|_| {
                state = mix64(state);
                state
            })
            .collect();

        Self {
            cells: Mutex::new(vec![0u8; width * depth].into_boxed_slice()),
            seeds,
            width,
            depth,
            sample_size,
            _key: PhantomData,
        }
    }

    /// Sketch sized for a cache of `capacity` entries: width
    /// `max(256, 4 * capacity)`, default depth, sample size `capacity`.
    pub fn for_capacity(capacity: usize) -> Self {
        Self::new(capacity.saturating_mul(4).max(256), DEFAULT_DEPTH, capacity)
    }

    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn depth(&self) -> usize {
        self.depth
    }

    #[inline]
    pub fn sample_size(&self) -> usize {
        self.sample_size
    }

    /// Adds one observation of `key`, saturating each row cell at 255.
    pub fn increment(&self, key: &K) {
        let fingerprint = self.fingerprint(key);
        let mut cells = self.cells.lock();
        for (row, &seed) in self.seeds.iter().enumerate() {
            let idx = row * self.width + self.column(fingerprint, seed);
            cells[idx] = cells[idx].saturating_add(1);
        }
    }

    /// Estimated observation count: the minimum cell across rows.
    pub fn estimate(&self, key: &K) -> u32 {
        let fingerprint = self.fingerprint(key);
        let cells = self.cells.lock();
        self.seeds
            .iter()
            .enumerate()
            .map(|(row, &seed)| cells[row * self.width + self.column(fingerprint, seed)] as u32)
            .min()
            .unwrap_or(0)
    }

    /// Halves every counter.
    pub fn decay(&self) {
        let mut cells = self.cells.lock();
        for cell in cells.iter_mut() {
            *cell >>= 1;
        }
    }

    /// Zeroes every counter.
    pub fn reset(&self) {
        let mut cells = self.cells.lock();
        for cell in cells.iter_mut() {
            *cell = 0;
        }
    }

    #[inline]
    fn fingerprint(&self, key: &K) -> u64 {
        let mut hasher = FxHasher::default();
        key.hash(&mut hasher);
        hasher.finish()
    }

    #[inline]
    fn column(&self, fingerprint: u64, seed: u64) -> usize {
        (mix64(fingerprint ^ seed) % self.width as u64) as usize
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unseen_key_estimates_zero() {
        let sketch: FrequencySketch<&str> = FrequencySketch::new(64, 4, 100);
        assert_eq!(sketch.estimate(&"never"), 0);
    }

    #[test]
    fn estimate_grows_with_increments() {
        let sketch: FrequencySketch<u64> = FrequencySketch::new(256, 4, 100);
        for i in 1..=10u32 {
            sketch.increment(&42);
            assert!(sketch.estimate(&42) >= i);
        }
    }

    #[test]
    fn counters_saturate_at_255() {
        let sketch: FrequencySketch<u64> = FrequencySketch::new(64, 4, 100);
        for _ in 0..600 {
            sketch.increment(&7);
        }
        assert_eq!(sketch.estimate(&7), 255);
    }

    #[test]
    fn decay_halves_estimates() {
        let sketch: FrequencySketch<u64> = FrequencySketch::new(256, 4, 100);
        for _ in 0..8 {
            sketch.increment(&1);
        }
        let before = sketch.estimate(&1);
        sketch.decay();
        assert_eq!(sketch.estimate(&1), before / 2);
    }

    #[test]
    fn reset_zeroes_everything() {
        let sketch: FrequencySketch<u64> = FrequencySketch::new(64, 4, 100);
        for key in 0..32u64 {
            sketch.increment(&key);
        }
        sketch.reset();
        for key in 0..32u64 {
            assert_eq!(sketch.estimate(&key), 0);
        }
    }

    #[test]
    fn capacity_sizing_has_floor() {
        let small: FrequencySketch<u64> = FrequencySketch::for_capacity(10);
        assert_eq!(small.width(), 256);
        assert_eq!(small.depth(), DEFAULT_DEPTH);

        let large: FrequencySketch<u64> = FrequencySketch::for_capacity(1000);
        assert_eq!(large.width(), 4000);
        assert_eq!(large.sample_size(), 1000);
    }

    #[test]
    fn hot_key_outscores_cold_key() {
        let sketch: FrequencySketch<u64> = FrequencySketch::new(1024, 4, 100);
        for _ in 0..50 {
            sketch.increment(&1);
        }
        sketch.increment(&2);
        assert!(sketch.estimate(&1) > sketch.estimate(&2));
    }
}
