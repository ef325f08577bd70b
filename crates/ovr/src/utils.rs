//! Common utilities used across the crate.
//!
//! This module provides parallelism configuration, thread pool setup and the
//! arg-max helper shared by the scoring paths.

use rayon::prelude::*;

// =============================================================================
// Parallelism Configuration
// =============================================================================

/// Whether parallel execution is allowed.
///
/// This is a simple flag passed to the closure run by [`run_with_threads`].
/// When `Parallel`, callers may use `rayon` parallel iterators; the iterators
/// then run on the pool installed by `run_with_threads`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parallelism {
    Sequential,
    Parallel,
}

impl Parallelism {
    /// Create from thread count semantics.
    ///
    /// - 0 = auto (parallel if rayon pool has multiple threads, sequential otherwise)
    /// - 1 = sequential
    /// - >1 = parallel
    #[inline]
    pub fn from_threads(n_threads: usize) -> Self {
        if n_threads == 1 || (n_threads == 0 && rayon::current_num_threads() == 1) {
            Parallelism::Sequential
        } else {
            Parallelism::Parallel
        }
    }

    /// Returns `true` if parallel execution is allowed.
    #[inline]
    pub fn is_parallel(self) -> bool {
        matches!(self, Parallelism::Parallel)
    }

    /// Map every item, in parallel when allowed.
    ///
    /// Output order always matches input order, whatever the thread count.
    #[inline]
    pub fn maybe_par_map<T, B, I, F>(self, iter: I, f: F) -> Vec<B>
    where
        T: Send,
        B: Send,
        I: IntoIterator<Item = T> + IntoParallelIterator<Item = T>,
        F: Fn(T) -> B + Sync + Send,
    {
        if self.is_parallel() {
            iter.into_par_iter().map(f).collect()
        } else {
            iter.into_iter().map(f).collect()
        }
    }
}

// =============================================================================
// Thread Pool Setup
// =============================================================================

/// Run a closure with the appropriate thread pool.
///
/// Thread count semantics:
/// - `0` = auto (use all available cores)
/// - `1` = sequential (no thread pool, runs on the caller thread)
/// - `n > 1` = use exactly `n` threads
///
/// The call blocks until the closure returns.
///
/// # Errors
///
/// Returns the rayon error if the pool cannot be built.
#[inline]
pub fn run_with_threads<T: Send>(
    n_threads: usize,
    f: impl FnOnce(Parallelism) -> T + Send,
) -> Result<T, rayon::ThreadPoolBuildError> {
    match Parallelism::from_threads(n_threads) {
        Parallelism::Sequential => Ok(f(Parallelism::Sequential)),
        Parallelism::Parallel => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n_threads)
                .build()?;
            Ok(pool.install(|| f(Parallelism::Parallel)))
        }
    }
}

// =============================================================================
// Arg-max
// =============================================================================

/// Key of the first maximum in `scores`.
///
/// Ties go to the entry seen first, so callers iterating in ascending index
/// order get the lowest index among equal maxima. A NaN never replaces the
/// current best. Returns `None` for an empty input.
pub fn argmax<I>(scores: I) -> Option<usize>
where
    I: IntoIterator<Item = (usize, f64)>,
{
    let mut iter = scores.into_iter();
    let (mut best_idx, mut best) = iter.next()?;
    for (idx, value) in iter {
        if value > best || (best.is_nan() && !value.is_nan()) {
            best = value;
            best_idx = idx;
        }
    }
    Some(best_idx)
}
