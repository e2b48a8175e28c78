#[cfg(feature = "parallel")]
use rayon::prelude::*;
use statrs::function::gamma::{digamma as statrs_digamma, gamma as statrs_gamma};

/// Euler-Mascheroni constant.
pub const EULER_GAMMA: f64 = 0.577_215_664_901_532_9;

/// zeta(2) = pi^2 / 6.
pub const ZETA_2: f64 = std::f64::consts::PI * std::f64::consts::PI / 6.0;

/// zeta(3), Apery's constant.
pub const ZETA_3: f64 = 1.202_056_903_159_594_3;

/// Threshold for using parallel computation (below this, sequential is faster).
///
/// Below 10k observations the Rayon overhead (work splitting, synchronization)
/// exceeds the cost of the closed-form per-observation work done here.
#[cfg(feature = "parallel")]
const PARALLEL_THRESHOLD: usize = 10_000;

/// Digamma function: psi(x) = d/dx log(Gamma(x))
///
/// Re-exported from statrs for consistency and accuracy.
#[inline]
pub fn digamma(x: f64) -> f64 {
    statrs_digamma(x)
}

/// Gamma function, from statrs (Lanczos approximation).
#[inline]
pub fn gamma(x: f64) -> f64 {
    statrs_gamma(x)
}

/// Evaluates `f(i)` for every index in `0..n`, collecting in index order.
///
/// # Parallelization
/// When the `parallel` feature is enabled and n >= 10,000 the indices are
/// spread over Rayon's pool. The output is identical to the sequential path
/// because every evaluation is independent and results are collected in order.
pub(crate) fn batch_map<T, F>(n: usize, f: F) -> Vec<T>
where
    T: Send,
    F: Fn(usize) -> T + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        if n >= PARALLEL_THRESHOLD {
            return (0..n).into_par_iter().map(f).collect();
        }
        (0..n).map(f).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        (0..n).map(f).collect()
    }
}

/// Like [`batch_map`], but short-circuits on the first error encountered.
pub(crate) fn try_batch_map<T, E, F>(n: usize, f: F) -> Result<Vec<T>, E>
where
    T: Send,
    E: Send,
    F: Fn(usize) -> Result<T, E> + Sync + Send,
{
    #[cfg(feature = "parallel")]
    {
        if n >= PARALLEL_THRESHOLD {
            return (0..n).into_par_iter().map(f).collect();
        }
        (0..n).map(f).collect()
    }
    #[cfg(not(feature = "parallel"))]
    {
        (0..n).map(f).collect()
    }
}
