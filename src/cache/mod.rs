//! Memoization store for computed Fibonacci values.
//!
//! [`FibCache`] is a capacity-bounded LRU map from index to value. It is
//! created once at startup and shared through an [`Arc`](std::sync::Arc) by
//! every request, so all access goes through a [`Mutex`]. Values are stored as
//! `Arc<BigUint>`; the lock is held only to look up or swap a pointer, never
//! while a number is being computed or copied.

use std::num::NonZeroUsize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use lru::LruCache;
use num_bigint::BigUint;

use crate::fib::FibIndex;

/// Number of entries kept when no capacity is configured.
pub const DEFAULT_CAPACITY: NonZeroUsize = match NonZeroUsize::new(1000) {
    Some(n) => n,
    None => unreachable!(),
};

/// Hit and miss counters, as observed by [`FibCache::get`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
}

/// Thread-safe LRU cache of Fibonacci values keyed by index.
///
/// # Examples
///
/// ```
/// use std::num::NonZeroUsize;
/// use std::sync::Arc;
/// use fibserve::cache::FibCache;
/// use fibserve::fib::FibIndex;
/// use num_bigint::BigUint;
///
/// let ten = FibIndex::try_from(10).unwrap();
/// let cache = FibCache::new(NonZeroUsize::new(2).unwrap());
/// cache.insert(ten, Arc::new(BigUint::from(55u32)));
///
/// assert_eq!(cache.get(ten).as_deref(), Some(&BigUint::from(55u32)));
/// assert!(cache.get(FibIndex::try_from(11).unwrap()).is_none());
/// ```
#[derive(Debug)]
pub struct FibCache {
    entries: Mutex<LruCache<FibIndex, Arc<BigUint>>>,
    hits: AtomicU64,
    misses: AtomicU64,
}

impl FibCache {
    /// Creates an empty cache holding at most `capacity` entries.
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            entries: Mutex::new(LruCache::new(capacity)),
            hits: AtomicU64::new(0),
            misses: AtomicU64::new(0),
        }
    }

    /// Looks up `n`, marking it most recently used on a hit.
    pub fn get(&self, n: FibIndex) -> Option<Arc<BigUint>> {
        let found = self.lock().get(&n).cloned();
        let counter = if found.is_some() {
            &self.hits
        } else {
            &self.misses
        };
        counter.fetch_add(1, Ordering::Relaxed);
        found
    }

    /// Stores `value` under `n`, evicting the least recently used entry when full.
    ///
    /// An existing entry for `n` is replaced; since values are deterministic
    /// the replacement is identical.
    pub fn insert(&self, n: FibIndex, value: Arc<BigUint>) {
        self.lock().put(n, value);
    }

    /// Returns `true` if `n` is resident, without touching its recency.
    pub fn contains(&self, n: FibIndex) -> bool {
        self.lock().contains(&n)
    }

    /// Number of resident entries.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Maximum number of entries.
    pub fn capacity(&self) -> NonZeroUsize {
        self.lock().cap()
    }

    /// Snapshot of the hit and miss counters.
    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.hits.load(Ordering::Relaxed),
            misses: self.misses.load(Ordering::Relaxed),
        }
    }

    // Every critical section is a single LRU call; poisoning is ignored.
    fn lock(&self) -> MutexGuard<'_, LruCache<FibIndex, Arc<BigUint>>> {
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for FibCache {
    fn default() -> Self {
        Self::new(DEFAULT_CAPACITY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn big(v: u32) -> Arc<BigUint> {
        Arc::new(BigUint::from(v))
    }

    fn cap(n: usize) -> NonZeroUsize {
        NonZeroUsize::new(n).unwrap()
    }

    fn ix(n: u32) -> FibIndex {
        FibIndex::try_from(n).unwrap()
    }

    #[test]
    fn starts_empty_with_default_capacity() {
        let cache = FibCache::default();
        assert!(cache.is_empty());
        assert_eq!(cache.capacity().get(), 1000);
        assert_eq!(cache.stats(), CacheStats::default());
    }

    #[test]
    fn get_counts_hits_and_misses() {
        let cache = FibCache::new(cap(4));
        assert!(cache.get(ix(3)).is_none());
        cache.insert(ix(3), big(2));
        assert_eq!(cache.get(ix(3)), Some(big(2)));
        assert_eq!(cache.get(ix(3)), Some(big(2)));
        assert_eq!(cache.stats(), CacheStats { hits: 2, misses: 1 });
    }

    #[test]
    fn evicts_least_recently_used() {
        let cache = FibCache::new(cap(2));
        cache.insert(ix(1), big(1));
        cache.insert(ix(2), big(1));
        // touch 1 so that 2 becomes the eviction candidate
        assert!(cache.get(ix(1)).is_some());
        cache.insert(ix(3), big(2));

        assert_eq!(cache.len(), 2);
        assert!(cache.contains(ix(1)));
        assert!(!cache.contains(ix(2)));
        assert!(cache.contains(ix(3)));
    }

    #[test]
    fn reinsert_does_not_grow() {
        let cache = FibCache::new(cap(2));
        cache.insert(ix(5), big(5));
        cache.insert(ix(5), big(5));
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn shared_across_threads() {
        let cache = Arc::new(FibCache::new(cap(64)));
        let handles: Vec<_> = (1..=8u32)
            .map(|i| {
                let cache = Arc::clone(&cache);
                std::thread::spawn(move || {
                    for n in 1..=8u32 {
                        cache.insert(ix(n * i), big(n));
                        cache.get(ix(n));
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }
        assert!(cache.len() <= 64);
        assert!(cache.contains(ix(64)));
    }
}
