//! Fibonacci computation and its memoizing wrapper.

use std::sync::Arc;

use num_bigint::BigUint;
use tracing::debug;

use super::FibIndex;
use crate::cache::FibCache;

/// Computes `fib(n)` with `fib(1) = fib(2) = 1`.
///
/// Iterates pairwise from index 3, keeping only the last two values, so the
/// cost is `n` big-integer additions.
///
/// # Examples
///
/// ```
/// use fibserve::fib::{fibonacci, FibIndex};
/// use num_bigint::BigUint;
///
/// let ten = FibIndex::try_from(10).unwrap();
/// assert_eq!(fibonacci(ten), BigUint::from(55u32));
/// ```
pub fn fibonacci(n: FibIndex) -> BigUint {
    let mut a = BigUint::from(1u32);
    let mut b = BigUint::from(1u32);
    for _ in 3..=n.get() {
        let next = &a + &b;
        a = std::mem::replace(&mut b, next);
    }
    b
}

/// Blocking computation executed on a worker thread by
/// [`FibService`](super::FibService).
pub trait Engine: Send + Sync + 'static {
    /// Returns `fib(n)`. May block for as long as the computation takes.
    fn compute(&self, n: FibIndex) -> Arc<BigUint>;
}

/// [`Engine`] that consults a shared [`FibCache`] before iterating.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use fibserve::cache::FibCache;
/// use fibserve::fib::{Engine, FibEngine, FibIndex};
///
/// let cache = Arc::new(FibCache::default());
/// let engine = FibEngine::new(Arc::clone(&cache));
///
/// let n = FibIndex::try_from(90).unwrap();
/// let first = engine.compute(n);
/// let second = engine.compute(n);
/// assert_eq!(first, second);
/// assert_eq!(cache.stats().hits, 1);
/// ```
#[derive(Debug, Clone)]
pub struct FibEngine {
    cache: Arc<FibCache>,
}

impl FibEngine {
    pub fn new(cache: Arc<FibCache>) -> Self {
        Self { cache }
    }

    pub fn cache(&self) -> &Arc<FibCache> {
        &self.cache
    }
}

impl Engine for FibEngine {
    fn compute(&self, n: FibIndex) -> Arc<BigUint> {
        if let Some(hit) = self.cache.get(n) {
            debug!(n = n.get(), "fib cache hit");
            return hit;
        }

        let value = Arc::new(fibonacci(n));
        self.cache.insert(n, Arc::clone(&value));
        debug!(
            n = n.get(),
            cached = self.cache.len(),
            capacity = self.cache.capacity().get(),
            "fib computed and cached"
        );
        value
    }
}

#[cfg(test)]
mod tests {
    use std::num::NonZeroUsize;

    use super::*;

    fn fib(n: u32) -> BigUint {
        fibonacci(ix(n))
    }

    fn ix(n: u32) -> FibIndex {
        FibIndex::try_from(n).unwrap()
    }

    #[test]
    fn regression_anchors() {
        let expected: [(u32, u64); 8] = [
            (1, 1),
            (2, 1),
            (3, 2),
            (4, 3),
            (5, 5),
            (10, 55),
            (50, 12_586_269_025),
            (93, 12_200_160_415_121_876_738),
        ];
        for (n, value) in expected {
            assert_eq!(fib(n), BigUint::from(value), "fib({n})");
        }
    }

    #[test]
    fn beyond_u64() {
        assert_eq!(fib(100).to_string(), "354224848179261915075");
    }

    #[test]
    fn largest_index_has_expected_size() {
        let digits = fib(100_000).to_string();
        assert_eq!(digits.len(), 20_899);
        assert!(digits.starts_with("2597406934722172416615503402127591541488"));
        assert!(digits.ends_with("28746875"));
    }

    #[test]
    fn recurrence_holds() {
        for n in 3..200 {
            assert_eq!(fib(n), fib(n - 1) + fib(n - 2));
        }
    }

    #[test]
    fn engine_memoizes_by_index() {
        let cache = Arc::new(FibCache::new(NonZeroUsize::new(8).unwrap()));
        let engine = FibEngine::new(Arc::clone(&cache));

        let first = engine.compute(ix(1_000));
        assert!(cache.contains(ix(1_000)));
        let second = engine.compute(ix(1_000));

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(*first, fib(1_000));
        assert_eq!(cache.stats().hits, 1);
        assert_eq!(cache.stats().misses, 1);
    }

    #[test]
    fn engine_recomputes_after_eviction() {
        let cache = Arc::new(FibCache::new(NonZeroUsize::new(1).unwrap()));
        let engine = FibEngine::new(Arc::clone(&cache));

        let before = engine.compute(ix(20));
        engine.compute(ix(21));
        assert!(!cache.contains(ix(20)));
        let after = engine.compute(ix(20));

        assert_eq!(before, after);
        assert_eq!(cache.stats().misses, 3);
    }
}
