//! Bounded key-value cache for recently rendered feed items.
//!
//! Keeps at most `capacity` entries. Inserting a new key into a full cache
//! evicts exactly one entry first: the least recently used one under
//! [`EvictionPolicy::Lru`], or the least recently inserted one under
//! [`EvictionPolicy::Insertion`].

use crate::model::ConfigurationError;
use lru::LruCache;
use std::hash::Hash;
use std::num::NonZeroUsize;

/// Which entry a full cache gives up on insert.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EvictionPolicy {
    /// Reads and writes both refresh recency.
    #[default]
    Lru,
    /// Only writes refresh recency; reads leave the order untouched.
    Insertion,
}

/// Occupancy and hit statistics.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CacheStats {
    /// Current number of entries.
    pub size: usize,
    /// Maximum number of entries.
    pub capacity: usize,
    /// Successful lookups since creation or the last `reset_stats`.
    pub hits: u64,
    /// Failed lookups since creation or the last `reset_stats`.
    pub misses: u64,
}

impl CacheStats {
    /// Fill ratio in percent.
    pub fn utilization(&self) -> f64 {
        self.size as f64 / self.capacity as f64 * 100.0
    }

    /// Hit ratio in percent, 0 when nothing was looked up yet.
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64 * 100.0
        }
    }
}

/// Fixed-capacity cache with oldest-eviction.
pub struct BoundedCache<K: Hash + Eq, V> {
    entries: LruCache<K, V>,
    policy: EvictionPolicy,
    hits: u64,
    misses: u64,
}

impl<K: Hash + Eq, V> BoundedCache<K, V> {
    /// Create an LRU cache.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::NonPositiveCapacity`] when `capacity` is 0.
    ///
    /// # Examples
    ///
    /// ```
    /// # use vtimeline::timeline::cache::BoundedCache;
    /// let mut cache = BoundedCache::new(2).unwrap();
    /// cache.set("a", 1);
    /// assert_eq!(cache.get(&"a"), Some(&1));
    /// assert!(BoundedCache::<&str, i32>::new(0).is_err());
    /// ```
    pub fn new(capacity: usize) -> Result<Self, ConfigurationError> {
        Self::with_policy(capacity, EvictionPolicy::Lru)
    }

    /// Create a cache with an explicit eviction policy.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigurationError::NonPositiveCapacity`] when `capacity` is 0.
    pub fn with_policy(capacity: usize, policy: EvictionPolicy) -> Result<Self, ConfigurationError> {
        let cap = NonZeroUsize::new(capacity)
            .ok_or(ConfigurationError::NonPositiveCapacity { capacity })?;
        Ok(Self {
            entries: LruCache::new(cap),
            policy,
            hits: 0,
            misses: 0,
        })
    }

    /// Look up `key`.
    ///
    /// Under [`EvictionPolicy::Lru`] a hit moves the key to the most recently
    /// used position.
    pub fn get(&mut self, key: &K) -> Option<&V> {
        let found = match self.policy {
            EvictionPolicy::Lru => self.entries.get(key),
            EvictionPolicy::Insertion => self.entries.peek(key),
        };
        if found.is_some() {
            self.hits += 1;
        } else {
            self.misses += 1;
        }
        found
    }

    /// Insert or replace `key`.
    ///
    /// Replacing refreshes the key's position. Inserting a new key into a full
    /// cache evicts one entry first, which is returned.
    pub fn set(&mut self, key: K, value: V) -> Option<(K, V)> {
        if self.entries.contains(&key) {
            self.entries.put(key, value);
            return None;
        }
        self.entries.push(key, value)
    }

    /// Whether `key` is present. Does not touch recency.
    pub fn has(&self, key: &K) -> bool {
        self.entries.contains(key)
    }

    /// Remove `key`, returning its value.
    pub fn delete(&mut self, key: &K) -> Option<V> {
        self.entries.pop(key)
    }

    /// Remove every entry.
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Drop the `count` oldest entries, or a quarter of the capacity when
    /// `count` is `None`. Returns how many were removed.
    pub fn trim(&mut self, count: Option<usize>) -> usize {
        let target = count.unwrap_or(self.capacity() / 4);
        let mut removed = 0;
        while removed < target && self.entries.pop_lru().is_some() {
            removed += 1;
        }
        removed
    }

    /// Number of entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether the cache holds no entries.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> usize {
        self.entries.cap().get()
    }

    /// Eviction policy in effect.
    pub fn policy(&self) -> EvictionPolicy {
        self.policy
    }

    /// Snapshot of occupancy and hit counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            size: self.len(),
            capacity: self.capacity(),
            hits: self.hits,
            misses: self.misses,
        }
    }

    /// Reset hit/miss counters.
    pub fn reset_stats(&mut self) {
        self.hits = 0;
        self.misses = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    // ===== Construction =====

    #[test]
    fn zero_capacity_is_a_configuration_error() {
        let result = BoundedCache::<u32, u32>::new(0);
        assert_eq!(
            result.err(),
            Some(ConfigurationError::NonPositiveCapacity { capacity: 0 })
        );
    }

    #[test]
    fn new_cache_is_empty() {
        let cache = BoundedCache::<u32, u32>::new(3).unwrap();
        assert!(cache.is_empty());
        assert_eq!(cache.capacity(), 3);
        assert_eq!(cache.policy(), EvictionPolicy::Lru);
    }

    // ===== Lookup =====

    #[test]
    fn get_returns_none_for_missing_key() {
        let mut cache = BoundedCache::<&str, u32>::new(3).unwrap();
        assert_eq!(cache.get(&"missing"), None);
    }

    #[test]
    fn set_overwrites_existing_key() {
        let mut cache = BoundedCache::new(3).unwrap();
        cache.set("a", 1);
        assert_eq!(cache.set("a", 2), None, "replacing must not evict");
        assert_eq!(cache.get(&"a"), Some(&2));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn has_and_delete() {
        let mut cache = BoundedCache::new(3).unwrap();
        cache.set("a", 1);
        assert!(cache.has(&"a"));
        assert_eq!(cache.delete(&"a"), Some(1));
        assert!(!cache.has(&"a"));
        assert_eq!(cache.delete(&"a"), None);
    }

    #[test]
    fn clear_removes_everything() {
        let mut cache = BoundedCache::new(3).unwrap();
        cache.set(1, 1);
        cache.set(2, 2);
        cache.clear();
        assert!(cache.is_empty());
    }

    // ===== Eviction =====

    #[test]
    fn lru_eviction_removes_least_recently_used() {
        let mut cache = BoundedCache::new(3).unwrap();
        cache.set("k1", 1);
        cache.set("k2", 2);
        cache.set("k3", 3);

        // Touch k1 so k2 becomes the oldest
        cache.get(&"k1");

        let evicted = cache.set("k4", 4);
        assert_eq!(evicted, Some(("k2", 2)));
        assert_eq!(cache.len(), 3);
        assert!(cache.has(&"k1"));
        assert!(!cache.has(&"k2"));
    }

    #[test]
    fn insertion_policy_ignores_reads() {
        let mut cache = BoundedCache::with_policy(3, EvictionPolicy::Insertion).unwrap();
        cache.set("k1", 1);
        cache.set("k2", 2);
        cache.set("k3", 3);

        cache.get(&"k1");

        let evicted = cache.set("k4", 4);
        assert_eq!(evicted, Some(("k1", 1)), "reads must not refresh k1");
    }

    #[test]
    fn insertion_policy_rewrite_refreshes_position() {
        let mut cache = BoundedCache::with_policy(2, EvictionPolicy::Insertion).unwrap();
        cache.set("k1", 1);
        cache.set("k2", 2);
        cache.set("k1", 10);

        let evicted = cache.set("k3", 3);
        assert_eq!(evicted, Some(("k2", 2)));
    }

    // ===== Trim & stats =====

    #[test]
    fn trim_defaults_to_a_quarter_of_capacity() {
        let mut cache = BoundedCache::new(8).unwrap();
        for i in 0..8 {
            cache.set(i, i);
        }
        assert_eq!(cache.trim(None), 2);
        assert!(!cache.has(&0));
        assert!(!cache.has(&1));
        assert!(cache.has(&2));
    }

    #[test]
    fn trim_stops_when_empty() {
        let mut cache = BoundedCache::new(4).unwrap();
        cache.set(1, 1);
        assert_eq!(cache.trim(Some(10)), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn stats_count_hits_and_misses() {
        let mut cache = BoundedCache::new(4).unwrap();
        cache.set(1, 1);
        cache.get(&1);
        cache.get(&1);
        cache.get(&2);

        let stats = cache.stats();
        assert_eq!(stats.hits, 2);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.size, 1);
        assert!((stats.utilization() - 25.0).abs() < f64::EPSILON);
        assert!((stats.hit_rate() - 200.0 / 3.0).abs() < 1e-9);

        cache.reset_stats();
        assert_eq!(cache.stats().hit_rate(), 0.0);
    }

    proptest! {
        /// Size never exceeds capacity, and inserting N+1 distinct keys into
        /// a fresh cache of capacity N evicts exactly the first key.
        #[test]
        fn prop_capacity_bound(capacity in 1usize..32, extra in 1usize..32) {
            let mut cache = BoundedCache::new(capacity).unwrap();
            for key in 0..capacity + extra {
                cache.set(key, key);
                prop_assert!(cache.len() <= capacity);
            }
            prop_assert_eq!(cache.len(), capacity);
            for key in 0..extra {
                prop_assert!(!cache.has(&key));
            }
        }
    }
}
