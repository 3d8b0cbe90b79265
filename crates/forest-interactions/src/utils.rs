//! Parallelism configuration and thread pool setup.
//!
//! Every batch in the analysis (per-pair linkage scans, Fisher tests, slope
//! extraction) is a pure map over an immutable input. Components take a
//! [`Parallelism`] flag and use [`Parallelism::maybe_par_filter_map`], which
//! keeps the input order so results are identical for any thread count.

use rayon::prelude::*;

// =============================================================================
// Parallelism Configuration
// =============================================================================

/// How a test batch iterates over its pairs.
///
/// Decided once per analysis by [`run_with_threads`]; the testers only read
/// it and never build pools of their own.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Parallelism {
    Sequential,
    Parallel,
}

impl Parallelism {
    /// `1` is sequential, more is parallel. `0` means "whatever the current
    /// rayon pool has", so it is sequential only on a single-threaded pool.
    #[inline]
    pub fn from_threads(n_threads: usize) -> Self {
        if n_threads == 1 || (n_threads == 0 && rayon::current_num_threads() == 1) {
            Parallelism::Sequential
        } else {
            Parallelism::Parallel
        }
    }

    #[inline]
    pub fn is_parallel(self) -> bool {
        matches!(self, Parallelism::Parallel)
    }

    /// Map every item and drop the `None`s, in parallel when allowed. Output
    /// order matches input order.
    #[inline]
    pub fn maybe_par_filter_map<T, B, I, F>(self, iter: I, f: F) -> Vec<B>
    where
        T: Send,
        B: Send,
        I: IntoIterator<Item = T> + IntoParallelIterator<Item = T>,
        F: Fn(T) -> Option<B> + Sync + Send,
    {
        if self.is_parallel() {
            iter.into_par_iter().filter_map(f).collect()
        } else {
            iter.into_iter().filter_map(f).collect()
        }
    }
}

// =============================================================================
// Thread Pool Setup
// =============================================================================

/// Run `f` on a pool sized by `n_threads` (`0` = all cores, `1` = on the
/// calling thread, no pool).
///
/// # Errors
///
/// Returns the rayon error if a dedicated pool cannot be built.
///
/// # Example
///
/// ```
/// use forest_interactions::run_with_threads;
///
/// let answer = run_with_threads(1, |_| 42).unwrap();
/// assert_eq!(answer, 42);
/// ```
#[inline]
pub fn run_with_threads<T: Send>(
    n_threads: usize,
    f: impl FnOnce(Parallelism) -> T + Send,
) -> Result<T, rayon::ThreadPoolBuildError> {
    let parallelism = Parallelism::from_threads(n_threads);

    match parallelism {
        Parallelism::Sequential => Ok(f(Parallelism::Sequential)),
        Parallelism::Parallel => {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(n_threads)
                .build()?;
            Ok(pool.install(|| f(Parallelism::Parallel)))
        }
    }
}
