use std::hash::Hash;

use rustc_hash::FxHashMap;

use crate::ds::arena::{Arena, EntryId};

#[derive(Debug)]
struct Entry<K> {
    key: K,
    freq: u64,
    prev: Option<EntryId>,
    next: Option<EntryId>,
}

/// One frequency class: a doubly linked run of entries, oldest at the head.
#[derive(Debug, Default, Clone, Copy)]
struct Bucket {
    head: Option<EntryId>,
    tail: Option<EntryId>,
}

/// Keys ordered by (frequency, arrival-within-frequency).
///
/// Entries enter at frequency 1 and climb one bucket per touch. Within a
/// bucket the order is FIFO, so `pop_min` evicts the entry that has sat
/// longest at the lowest frequency. `min_freq` is exact whenever at least one
/// entry exists and is recomputed by scanning the bucket keys after
/// operations that can strand it (`pop_min`, `remove`, `remap`).
///
/// `remap` applies an aging function to every entry and rebuckets stably:
/// buckets are processed in ascending frequency order and each bucket's
/// internal order is preserved, so ties introduced by the aging function
/// keep their pre-aging relative order.
#[derive(Debug)]
pub struct FreqBuckets<K> {
    entries: Arena<Entry<K>>,
    index: FxHashMap<K, EntryId>,
    buckets: FxHashMap<u64, Bucket>,
    min_freq: u64,
    total_freq: u64,
}

impl<K> FreqBuckets<K>
where
    K: Eq + Hash + Clone,
{
    pub fn new() -> Self {
        Self {
            entries: Arena::new(),
            index: FxHashMap::default(),
            buckets: FxHashMap::default(),
            min_freq: 0,
            total_freq: 0,
        }
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            entries: Arena::with_capacity(capacity),
            index: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            buckets: FxHashMap::default(),
            min_freq: 0,
            total_freq: 0,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        self.index.contains_key(key)
    }

    pub fn frequency(&self, key: &K) -> Option<u64> {
        let id = *self.index.get(key)?;
        self.entries.get(id).map(|entry| entry.freq)
    }

    /// Smallest frequency with at least one entry, or `None` when empty.
    pub fn min_freq(&self) -> Option<u64> {
        if self.min_freq == 0 {
            None
        } else {
            Some(self.min_freq)
        }
    }

    /// Sum of all entry frequencies; `total_freq() / len()` is the running
    /// mean that drives shift-down aging.
    #[inline]
    pub fn total_freq(&self) -> u64 {
        self.total_freq
    }

    /// Adds `key` at frequency 1. Returns `false` if it is already tracked.
    pub fn insert(&mut self, key: K) -> bool {
        if self.index.contains_key(&key) {
            return false;
        }

        let id = self.entries.alloc(Entry {
            key: key.clone(),
            freq: 1,
            prev: None,
            next: None,
        });
        self.index.insert(key, id);
        self.bucket_push_tail(1, id);
        self.min_freq = 1;
        self.total_freq = self.total_freq.saturating_add(1);
        true
    }

    /// Counts one access: moves `key` from bucket `f` to the tail of bucket
    /// `f + 1`. Returns the new frequency.
    pub fn touch(&mut self, key: &K) -> Option<u64> {
        let id = *self.index.get(key)?;
        let freq = self.entries.get(id)?.freq;

        if freq == u64::MAX {
            // Saturated: refresh position within the bucket only.
            self.bucket_detach(freq, id);
            self.bucket_push_tail(freq, id);
            return Some(freq);
        }

        let next_freq = freq + 1;
        let emptied = self.bucket_detach(freq, id);
        if emptied && self.min_freq == freq {
            // The entry itself lands in freq + 1, so the new minimum is exact.
            self.min_freq = next_freq;
        }

        if let Some(entry) = self.entries.get_mut(id) {
            entry.freq = next_freq;
        }
        self.bucket_push_tail(next_freq, id);
        self.total_freq = self.total_freq.saturating_add(1);
        Some(next_freq)
    }

    /// Entry that `pop_min` would evict.
    pub fn peek_min(&self) -> Option<(&K, u64)> {
        if self.min_freq == 0 {
            return None;
        }
        let id = self.buckets.get(&self.min_freq)?.head?;
        let entry = self.entries.get(id)?;
        Some((&entry.key, entry.freq))
    }

    /// Removes the oldest entry of the lowest-frequency bucket.
    pub fn pop_min(&mut self) -> Option<(K, u64)> {
        if self.min_freq == 0 {
            return None;
        }
        let freq = self.min_freq;
        let id = self.buckets.get(&freq)?.head?;
        if self.bucket_detach(freq, id) {
            self.rescan_min_freq();
        }
        let entry = self.entries.free(id)?;
        self.index.remove(&entry.key);
        self.total_freq = self.total_freq.saturating_sub(entry.freq);
        Some((entry.key, entry.freq))
    }

    /// Drops `key` from whatever bucket holds it. Returns its frequency.
    pub fn remove(&mut self, key: &K) -> Option<u64> {
        let id = self.index.remove(key)?;
        let freq = self.entries.get(id)?.freq;
        if self.bucket_detach(freq, id) && self.min_freq == freq {
            self.rescan_min_freq();
        }
        self.entries.free(id);
        self.total_freq = self.total_freq.saturating_sub(freq);
        Some(freq)
    }

    /// Applies `age` to every entry's frequency (clamped to at least 1) and
    /// rebuckets stably.
    ///
    /// Buckets are visited in ascending frequency order and entries within a
    /// bucket in FIFO order, so entries that collide on the same new
    /// frequency retain their pre-aging relative order.
    pub fn remap(&mut self, mut age: impl FnMut(u64) -> u64) {
        if self.entries.is_empty() {
            return;
        }

        let mut freqs: Vec<u64> = self.buckets.keys().copied().collect();
        freqs.sort_unstable();
        let old_buckets = std::mem::take(&mut self.buckets);
        self.min_freq = 0;
        self.total_freq = 0;

        for freq in freqs {
            let new_freq = age(freq).max(1);
            let mut cursor = old_buckets[&freq].head;
            while let Some(id) = cursor {
                cursor = self.entries.get(id).and_then(|entry| entry.next);
                if let Some(entry) = self.entries.get_mut(id) {
                    entry.freq = new_freq;
                    entry.prev = None;
                    entry.next = None;
                }
                self.bucket_push_tail(new_freq, id);
                self.total_freq = self.total_freq.saturating_add(new_freq);
            }
            if self.min_freq == 0 || new_freq < self.min_freq {
                self.min_freq = new_freq;
            }
        }
    }

    pub fn clear(&mut self) {
        self.entries.clear();
        self.index.clear();
        self.buckets.clear();
        self.min_freq = 0;
        self.total_freq = 0;
    }

    fn rescan_min_freq(&mut self) {
        self.min_freq = self.buckets.keys().copied().min().unwrap_or(0);
    }

    fn bucket_push_tail(&mut self, freq: u64, id: EntryId) {
        let bucket = self.buckets.entry(freq).or_default();
        let old_tail = bucket.tail;
        if let Some(entry) = self.entries.get_mut(id) {
            entry.prev = old_tail;
            entry.next = None;
        }
        match old_tail {
            Some(tail_id) => {
                if let Some(entry) = self.entries.get_mut(tail_id) {
                    entry.next = Some(id);
                }
            },
            None => bucket.head = Some(id),
        }
        bucket.tail = Some(id);
    }

    /// Unlinks `id` from bucket `freq`; removes the bucket and returns `true`
    /// if it became empty.
    fn bucket_detach(&mut self, freq: u64, id: EntryId) -> bool {
        let (prev, next) = match self.entries.get(id) {
            Some(entry) => (entry.prev, entry.next),
            None => return false,
        };

        {
            let bucket = match self.buckets.get_mut(&freq) {
                Some(bucket) => bucket,
                None => return false,
            };
            match prev {
                Some(prev_id) => {
                    if let Some(entry) = self.entries.get_mut(prev_id) {
                        entry.next = next;
                    }
                },
                None => bucket.head = next,
            }
            match next {
                Some(next_id) => {
                    if let Some(entry) = self.entries.get_mut(next_id) {
                        entry.prev = prev;
                    }
                },
                None => bucket.tail = prev,
            }
        }

        if let Some(entry) = self.entries.get_mut(id) {
            entry.prev = None;
            entry.next = None;
        }

        if self.buckets.get(&freq).is_some_and(|b| b.head.is_none()) {
            self.buckets.remove(&freq);
            true
        } else {
            false
        }
    }

    #[cfg(any(test, debug_assertions))]
    pub fn debug_validate_invariants(&self) {
        assert_eq!(self.entries.len(), self.index.len());

        if self.is_empty() {
            assert!(self.buckets.is_empty());
            assert_eq!(self.min_freq, 0);
            assert_eq!(self.total_freq, 0);
            return;
        }

        assert!(self.min_freq > 0);
        assert!(self.buckets.contains_key(&self.min_freq));
        assert_eq!(self.min_freq, *self.buckets.keys().min().unwrap());

        let mut seen = 0usize;
        let mut freq_sum = 0u64;
        for (&freq, bucket) in &self.buckets {
            let mut cursor = bucket.head;
            let mut last = None;
            assert!(bucket.head.is_some() && bucket.tail.is_some());
            while let Some(id) = cursor {
                let entry = self.entries.get(id).expect("bucket entry missing");
                assert_eq!(entry.freq, freq);
                assert_eq!(entry.prev, last);
                assert_eq!(self.index.get(&entry.key), Some(&id));
                last = Some(id);
                cursor = entry.next;
                seen += 1;
                freq_sum += freq;
                assert!(seen <= self.len());
            }
            assert_eq!(bucket.tail, last);
        }
        assert_eq!(seen, self.len());
        assert_eq!(freq_sum, self.total_freq);
    }
}

impl<K> Default for FreqBuckets<K>
where
    K: Eq + Hash + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_touch_pop_flow() {
        let mut buckets = FreqBuckets::new();
        assert!(buckets.insert("a"));
        assert!(buckets.insert("b"));

        assert_eq!(buckets.frequency(&"a"), Some(1));
        assert_eq!(buckets.min_freq(), Some(1));

        assert_eq!(buckets.touch(&"a"), Some(2));
        assert_eq!(buckets.min_freq(), Some(1));

        assert_eq!(buckets.pop_min(), Some(("b", 1)));
        assert_eq!(buckets.min_freq(), Some(2));
        assert_eq!(buckets.pop_min(), Some(("a", 2)));
        assert!(buckets.is_empty());
        assert_eq!(buckets.pop_min(), None);
    }

    #[test]
    fn duplicate_insert_is_rejected() {
        let mut buckets = FreqBuckets::new();
        assert!(buckets.insert("a"));
        assert!(!buckets.insert("a"));
        assert_eq!(buckets.len(), 1);
    }

    #[test]
    fn fifo_within_one_bucket() {
        let mut buckets = FreqBuckets::new();
        buckets.insert(1);
        buckets.insert(2);
        buckets.insert(3);

        assert_eq!(buckets.pop_min(), Some((1, 1)));
        assert_eq!(buckets.pop_min(), Some((2, 1)));
        assert_eq!(buckets.pop_min(), Some((3, 1)));
    }

    #[test]
    fn touch_missing_is_none() {
        let mut buckets: FreqBuckets<&str> = FreqBuckets::new();
        assert_eq!(buckets.touch(&"nope"), None);
        assert_eq!(buckets.remove(&"nope"), None);
    }

    #[test]
    fn remove_updates_min_freq() {
        let mut buckets = FreqBuckets::new();
        buckets.insert("a");
        buckets.insert("b");
        buckets.touch(&"b");

        assert_eq!(buckets.remove(&"a"), Some(1));
        assert_eq!(buckets.min_freq(), Some(2));
        assert_eq!(buckets.peek_min(), Some((&"b", 2)));
        buckets.debug_validate_invariants();
    }

    #[test]
    fn total_freq_tracks_sum() {
        let mut buckets = FreqBuckets::new();
        buckets.insert("a");
        buckets.insert("b");
        buckets.touch(&"a");
        buckets.touch(&"a");
        assert_eq!(buckets.total_freq(), 4);

        buckets.remove(&"a");
        assert_eq!(buckets.total_freq(), 1);
    }

    #[test]
    fn remap_scales_and_clamps() {
        let mut buckets = FreqBuckets::new();
        buckets.insert("hot");
        for _ in 0..9 {
            buckets.touch(&"hot");
        }
        buckets.insert("cold");
        assert_eq!(buckets.frequency(&"hot"), Some(10));

        buckets.remap(|f| f / 2);
        assert_eq!(buckets.frequency(&"hot"), Some(5));
        assert_eq!(buckets.frequency(&"cold"), Some(1));
        assert_eq!(buckets.min_freq(), Some(1));
        assert_eq!(buckets.total_freq(), 6);
        buckets.debug_validate_invariants();
    }

    #[test]
    fn remap_merges_buckets_stably() {
        let mut buckets = FreqBuckets::new();
        // a at freq 2, b at freq 3, c at freq 1.
        buckets.insert("a");
        buckets.touch(&"a");
        buckets.insert("b");
        buckets.touch(&"b");
        buckets.touch(&"b");
        buckets.insert("c");

        // Collapse everything to freq 1. Ascending-bucket processing puts
        // c (old freq 1) before a (2) before b (3).
        buckets.remap(|_| 1);
        assert_eq!(buckets.pop_min(), Some(("c", 1)));
        assert_eq!(buckets.pop_min(), Some(("a", 1)));
        assert_eq!(buckets.pop_min(), Some(("b", 1)));
    }

    #[test]
    fn clear_resets_state() {
        let mut buckets = FreqBuckets::new();
        buckets.insert("a");
        buckets.touch(&"a");
        buckets.clear();
        assert!(buckets.is_empty());
        assert_eq!(buckets.min_freq(), None);
        assert_eq!(buckets.total_freq(), 0);
        buckets.debug_validate_invariants();
    }
}
