// Bounded cache module
// Strict LRU map with optional time-to-live, shared by the embedding client
// and the search engine

#[cfg(test)]
mod tests;

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

use tracing::debug;

/// Counters describing cache behaviour since construction
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    pub evictions: u64,
    pub expirations: u64,
    pub entries: usize,
    pub capacity: usize,
}

impl CacheStats {
    #[inline]
    pub fn hit_ratio(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }
}

#[derive(Debug)]
struct Slot<V> {
    value: V,
    last_access: u64,
    inserted_at: Instant,
}

#[derive(Debug)]
struct LruState<K, V> {
    entries: HashMap<K, Slot<V>>,
    // access tick -> key, oldest first
    recency: BTreeMap<u64, K>,
    tick: u64,
    stats: CacheStats,
}

impl<K: Eq + Hash + Clone, V> LruState<K, V> {
    fn next_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    fn remove(&mut self, key: &K) -> Option<Slot<V>> {
        let slot = self.entries.remove(key)?;
        self.recency.remove(&slot.last_access);
        Some(slot)
    }

    fn evict_oldest(&mut self) -> bool {
        let Some((_, key)) = self.recency.pop_first() else {
            return false;
        };
        self.entries.remove(&key);
        self.stats.evictions += 1;
        true
    }
}

/// Least-recently-used cache bounded by entry count.
///
/// Inserting a new key at capacity evicts the least recently accessed entry
/// first, so the cache never holds more than `capacity` entries. Entries
/// older than the TTL (when set) are dropped on access.
#[derive(Debug)]
pub struct LruCache<K, V> {
    state: Mutex<LruState<K, V>>,
    capacity: usize,
    ttl: Option<Duration>,
}

impl<K: Eq + Hash + Clone, V: Clone> LruCache<K, V> {
    #[inline]
    pub fn new(capacity: usize) -> Self {
        Self::build(capacity, None)
    }

    #[inline]
    pub fn with_ttl(capacity: usize, ttl: Duration) -> Self {
        Self::build(capacity, Some(ttl))
    }

    fn build(capacity: usize, ttl: Option<Duration>) -> Self {
        Self {
            state: Mutex::new(LruState {
                entries: HashMap::with_capacity(capacity.min(1024)),
                recency: BTreeMap::new(),
                tick: 0,
                stats: CacheStats {
                    capacity,
                    ..CacheStats::default()
                },
            }),
            capacity,
            ttl,
        }
    }

    fn lock(&self) -> MutexGuard<'_, LruState<K, V>> {
        // a panic while holding the lock cannot leave a half-written slot
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn is_expired(&self, slot: &Slot<V>) -> bool {
        self.ttl
            .is_some_and(|ttl| slot.inserted_at.elapsed() >= ttl)
    }

    /// Look up a value, marking it most recently used
    #[inline]
    pub fn get(&self, key: &K) -> Option<V> {
        let mut state = self.lock();

        let Some(expired) = state.entries.get(key).map(|slot| self.is_expired(slot)) else {
            state.stats.misses += 1;
            return None;
        };

        if expired {
            state.remove(key);
            state.stats.expirations += 1;
            state.stats.misses += 1;
            return None;
        }

        let tick = state.next_tick();
        let previous = match state.entries.get_mut(key) {
            Some(slot) => std::mem::replace(&mut slot.last_access, tick),
            None => return None,
        };
        state.recency.remove(&previous);
        state.recency.insert(tick, key.clone());
        state.stats.hits += 1;

        state.entries.get(key).map(|slot| slot.value.clone())
    }

    /// Check presence without touching recency or statistics
    #[inline]
    pub fn contains(&self, key: &K) -> bool {
        let state = self.lock();
        state
            .entries
            .get(key)
            .is_some_and(|slot| !self.is_expired(slot))
    }

    /// Insert a value, evicting the least recently used entry when full
    #[inline]
    pub fn insert(&self, key: K, value: V) {
        if self.capacity == 0 {
            return;
        }

        let mut state = self.lock();
        state.remove(&key);

        while state.entries.len() >= self.capacity {
            if !state.evict_oldest() {
                break;
            }
        }

        let tick = state.next_tick();
        state.recency.insert(tick, key.clone());
        state.entries.insert(
            key,
            Slot {
                value,
                last_access: tick,
                inserted_at: Instant::now(),
            },
        );
    }

    #[inline]
    pub fn remove(&self, key: &K) -> Option<V> {
        self.lock().remove(key).map(|slot| slot.value)
    }

    /// Drop every expired entry, returning how many were removed
    #[inline]
    pub fn purge_expired(&self) -> usize {
        let Some(ttl) = self.ttl else {
            return 0;
        };

        let mut state = self.lock();
        let expired: Vec<K> = state
            .entries
            .iter()
            .filter(|(_, slot)| slot.inserted_at.elapsed() >= ttl)
            .map(|(key, _)| key.clone())
            .collect();

        for key in &expired {
            state.remove(key);
        }
        state.stats.expirations += expired.len() as u64;

        if !expired.is_empty() {
            debug!("Purged {} expired cache entries", expired.len());
        }
        expired.len()
    }

    #[inline]
    pub fn clear(&self) {
        let mut state = self.lock();
        state.entries.clear();
        state.recency.clear();
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    #[inline]
    pub fn stats(&self) -> CacheStats {
        let state = self.lock();
        CacheStats {
            entries: state.entries.len(),
            ..state.stats
        }
    }
}
