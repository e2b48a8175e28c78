//! The Generalized Extreme Value distribution.
//!
//! Parameterization: location mu, scale sigma > 0, shape xi, with
//!
//!   F(x) = exp(-[1 + xi (x - mu) / sigma]_+^(-1/xi))
//!
//! and the Gumbel limit F(x) = exp(-exp(-(x - mu) / sigma)) at xi = 0.
//! xi > 0 gives a heavy (Frechet-type) upper tail with a finite lower endpoint,
//! xi < 0 a bounded (reverse Weibull) upper tail.

use ndarray::Array1;
use rand::Rng;
use rand_distr::{Distribution, Open01};
use statrs::distribution::{Continuous, ContinuousCDF};
use statrs::statistics::{Max, Min};

use crate::error::GevError;
use crate::math::{gamma, EULER_GAMMA, ZETA_2, ZETA_3};
use crate::types::{check_broadcast, broadcast_get, ParamVectors};
use crate::validation;

/// Below this |xi| the Gumbel limit is used.
pub(crate) const GUMBEL_XI: f64 = 1e-7;

const VARIANCE_SERIES_XI: f64 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Gev {
    mu: f64,
    sigma: f64,
    xi: f64,
}

impl Gev {
    /// Fails on non-finite mu or xi and on sigma <= 0.
    ///
    /// Any finite xi is accepted here; the xi > -0.5 restriction needed for
    /// regular likelihood theory is enforced by the family, not the distribution.
    pub fn new(mu: f64, sigma: f64, xi: f64) -> Result<Self, GevError> {
        validation::check_location_value(0, mu)?;
        validation::check_scale_value(0, sigma)?;
        if !xi.is_finite() {
            return Err(GevError::Input(format!(
                "Shape parameter xi must be finite, got {}",
                xi
            )));
        }
        Ok(Self { mu, sigma, xi })
    }

    pub fn gumbel(mu: f64, sigma: f64) -> Result<Self, GevError> {
        Self::new(mu, sigma, 0.0)
    }

    pub fn location(&self) -> f64 {
        self.mu
    }

    pub fn scale(&self) -> f64 {
        self.sigma
    }

    pub fn shape(&self) -> f64 {
        self.xi
    }

    pub fn is_gumbel(&self) -> bool {
        self.xi.abs() < GUMBEL_XI
    }

    /// Lower endpoint of the support (finite only for xi > 0).
    pub fn lower_bound(&self) -> f64 {
        if self.xi >= GUMBEL_XI {
            self.mu - self.sigma / self.xi
        } else {
            f64::NEG_INFINITY
        }
    }

    /// Upper endpoint of the support (finite only for xi < 0).
    pub fn upper_bound(&self) -> f64 {
        if self.xi <= -GUMBEL_XI {
            self.mu - self.sigma / self.xi
        } else {
            f64::INFINITY
        }
    }

    /// True when `x` lies strictly inside the support.
    pub fn in_support(&self, x: f64) -> bool {
        in_support(x, self.mu, self.sigma, self.xi)
    }

    pub fn ln_pdf(&self, x: f64) -> f64 {
        log_density(x, self.mu, self.sigma, self.xi)
    }

    pub fn pdf(&self, x: f64) -> f64 {
        self.ln_pdf(x).exp()
    }

    pub fn ln_cdf(&self, x: f64) -> f64 {
        log_cdf(x, self.mu, self.sigma, self.xi)
    }

    pub fn cdf(&self, x: f64) -> f64 {
        self.ln_cdf(x).exp()
    }

    /// Survival function 1 - F(x), computed without cancellation in the upper tail.
    pub fn sf(&self, x: f64) -> f64 {
        -self.ln_cdf(x).exp_m1()
    }

    /// Inverse CDF. p = 0 and p = 1 map to the support endpoints.
    pub fn quantile(&self, p: f64) -> Result<f64, GevError> {
        validation::check_probability_value(0, p)?;
        Ok(quantile_from_log_lower(p.ln(), self.mu, self.sigma, self.xi))
    }

    /// Level exceeded on average once every `period` blocks: the 1 - 1/period quantile.
    pub fn return_level(&self, period: f64) -> Result<f64, GevError> {
        if !(period > 1.0) {
            return Err(GevError::Input(format!(
                "Return period must exceed 1, got {}",
                period
            )));
        }
        Ok(quantile_from_log_lower(
            (-1.0 / period).ln_1p(),
            self.mu,
            self.sigma,
            self.xi,
        ))
    }

    /// Finite only for xi < 1.
    pub fn mean(&self) -> Option<f64> {
        if self.is_gumbel() {
            Some(self.mu + self.sigma * EULER_GAMMA)
        } else if self.xi < 1.0 {
            Some(self.mu + self.sigma * (gamma(1.0 - self.xi) - 1.0) / self.xi)
        } else {
            None
        }
    }

    /// Finite only for xi < 0.5.
    ///
    /// For |xi| < 1e-4 the closed form loses digits to cancellation; the
    /// first-order expansion sigma^2 (zeta(2) + 2 (zeta(3) + gamma zeta(2)) xi)
    /// is used instead.
    pub fn variance(&self) -> Option<f64> {
        let sigma_sq = self.sigma * self.sigma;
        if self.xi.abs() < VARIANCE_SERIES_XI {
            Some(sigma_sq * (ZETA_2 + 2.0 * (ZETA_3 + EULER_GAMMA * ZETA_2) * self.xi))
        } else if self.xi < 0.5 {
            let g1 = gamma(1.0 - self.xi);
            let g2 = gamma(1.0 - 2.0 * self.xi);
            Some(sigma_sq * (g2 - g1 * g1) / (self.xi * self.xi))
        } else {
            None
        }
    }

    pub fn median(&self) -> f64 {
        quantile_from_log_lower(-std::f64::consts::LN_2, self.mu, self.sigma, self.xi)
    }

    pub fn mode(&self) -> f64 {
        if self.is_gumbel() {
            self.mu
        } else {
            self.mu + self.sigma * ((1.0 + self.xi).powf(-self.xi) - 1.0) / self.xi
        }
    }
}

impl Distribution<f64> for Gev {
    /// Inverse-CDF transform of an open-interval uniform draw.
    fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        let u: f64 = rng.sample(Open01);
        quantile_from_log_lower(u.ln(), self.mu, self.sigma, self.xi)
    }
}

impl Continuous<f64, f64> for Gev {
    fn pdf(&self, x: f64) -> f64 {
        Gev::pdf(self, x)
    }

    fn ln_pdf(&self, x: f64) -> f64 {
        Gev::ln_pdf(self, x)
    }
}

impl ContinuousCDF<f64, f64> for Gev {
    fn cdf(&self, x: f64) -> f64 {
        Gev::cdf(self, x)
    }

    fn sf(&self, x: f64) -> f64 {
        Gev::sf(self, x)
    }

    /// NaN for p outside [0, 1]; use [`Gev::quantile`] for a checked version.
    fn inverse_cdf(&self, p: f64) -> f64 {
        self.quantile(p).unwrap_or(f64::NAN)
    }
}

impl Min<f64> for Gev {
    fn min(&self) -> f64 {
        self.lower_bound()
    }
}

impl Max<f64> for Gev {
    fn max(&self) -> f64 {
        self.upper_bound()
    }
}

// ----- Scalar kernels shared by the vectorized functions and the family

#[inline]
pub(crate) fn in_support(x: f64, mu: f64, sigma: f64, xi: f64) -> bool {
    if !x.is_finite() {
        return false;
    }
    if xi.abs() < GUMBEL_XI {
        return true;
    }
    1.0 + xi * (x - mu) / sigma > 0.0
}

#[inline]
pub(crate) fn log_density(x: f64, mu: f64, sigma: f64, xi: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    if x.is_infinite() {
        return f64::NEG_INFINITY;
    }
    let z = (x - mu) / sigma;
    if xi.abs() < GUMBEL_XI {
        return -sigma.ln() - z - (-z).exp();
    }
    let s = xi * z;
    if s <= -1.0 {
        return f64::NEG_INFINITY;
    }
    let log_t = s.ln_1p();
    -sigma.ln() - (1.0 + 1.0 / xi) * log_t - (-log_t / xi).exp()
}

/// ln F(x) = -t^(-1/xi).
#[inline]
pub(crate) fn log_cdf(x: f64, mu: f64, sigma: f64, xi: f64) -> f64 {
    if x.is_nan() {
        return f64::NAN;
    }
    let z = (x - mu) / sigma;
    if xi.abs() < GUMBEL_XI {
        return -(-z).exp();
    }
    let s = xi * z;
    if s <= -1.0 {
        // below the lower endpoint (xi > 0) or above the upper endpoint (xi < 0)
        return if xi > 0.0 { f64::NEG_INFINITY } else { 0.0 };
    }
    -(-s.ln_1p() / xi).exp()
}

/// Quantile from ln(p) of the lower tail. ln(p) = 0 and -inf give the endpoints.
#[inline]
pub(crate) fn quantile_from_log_lower(log_p: f64, mu: f64, sigma: f64, xi: f64) -> f64 {
    // w = -ln p is standard exponential under the model
    let log_w = (-log_p).ln();
    if xi.abs() < GUMBEL_XI {
        mu - sigma * log_w
    } else {
        mu + sigma * (-xi * log_w).exp_m1() / xi
    }
}

// ----- Vectorized d/p/q/r functions

fn common_len(first: usize, params: [usize; 3]) -> usize {
    if first == 0 {
        0
    } else {
        params.into_iter().fold(first, usize::max)
    }
}

fn checked_params<'a>(
    mu: &'a Array1<f64>,
    sigma: &'a Array1<f64>,
    xi: &'a Array1<f64>,
    n: usize,
) -> Result<ParamVectors<'a>, GevError> {
    // zero-length input yields zero-length output; parameters are still checked at their own length
    let pv = if n == 0 {
        ParamVectors::new(mu, sigma, xi)?
    } else {
        ParamVectors::with_len(mu, sigma, xi, n)?
    };
    validation::check_location(&pv)?;
    validation::check_scale(&pv)?;
    validation::check_finite_shape(&pv)?;
    Ok(pv)
}

/// Density (or log-density) of each `x`, broadcasting length-1 parameters.
///
/// Values outside the support have density 0. Errors on sigma <= 0.
pub fn d_gev(
    x: &Array1<f64>,
    mu: &Array1<f64>,
    sigma: &Array1<f64>,
    xi: &Array1<f64>,
    log: bool,
) -> Result<Array1<f64>, GevError> {
    let n = common_len(x.len(), [mu.len(), sigma.len(), xi.len()]);
    check_broadcast("x", x.len(), n)?;
    let pv = checked_params(mu, sigma, xi, n)?;
    let xv = x.view();

    let out = crate::math::batch_map(n, |i| {
        let (m, s, k) = pv.at(i);
        let ld = log_density(broadcast_get(&xv, i), m, s, k);
        if log {
            ld
        } else {
            ld.exp()
        }
    });
    Ok(Array1::from_vec(out))
}

/// Distribution function at each `q`.
pub fn p_gev(
    q: &Array1<f64>,
    mu: &Array1<f64>,
    sigma: &Array1<f64>,
    xi: &Array1<f64>,
    lower_tail: bool,
    log_p: bool,
) -> Result<Array1<f64>, GevError> {
    let n = common_len(q.len(), [mu.len(), sigma.len(), xi.len()]);
    check_broadcast("q", q.len(), n)?;
    let pv = checked_params(mu, sigma, xi, n)?;
    let qv = q.view();

    let out = crate::math::batch_map(n, |i| {
        let (m, s, k) = pv.at(i);
        let lc = log_cdf(broadcast_get(&qv, i), m, s, k);
        match (lower_tail, log_p) {
            (true, true) => lc,
            (true, false) => lc.exp(),
            (false, false) => -lc.exp_m1(),
            (false, true) => (-lc.exp_m1()).ln(),
        }
    });
    Ok(Array1::from_vec(out))
}

/// Quantile function at each `p`. Probabilities outside [0, 1] (or positive
/// log-probabilities when `log_p`) are an error.
pub fn q_gev(
    p: &Array1<f64>,
    mu: &Array1<f64>,
    sigma: &Array1<f64>,
    xi: &Array1<f64>,
    lower_tail: bool,
    log_p: bool,
) -> Result<Array1<f64>, GevError> {
    let n = common_len(p.len(), [mu.len(), sigma.len(), xi.len()]);
    check_broadcast("p", p.len(), n)?;
    let pv = checked_params(mu, sigma, xi, n)?;
    let prob = p.view();

    let out = crate::math::try_batch_map(n, |i| {
        let value = broadcast_get(&prob, i);
        let log_lower = if log_p {
            validation::check_log_probability_value(i, value)?;
            if lower_tail {
                value
            } else {
                (-value.exp_m1()).ln()
            }
        } else {
            validation::check_probability_value(i, value)?;
            if lower_tail {
                value.ln()
            } else {
                (-value).ln_1p()
            }
        };
        let (m, s, k) = pv.at(i);
        Ok(quantile_from_log_lower(log_lower, m, s, k))
    })?;
    Ok(Array1::from_vec(out))
}

/// `n` random variates; each parameter vector must have length `n` or 1.
pub fn r_gev<R: Rng + ?Sized>(
    n: usize,
    mu: &Array1<f64>,
    sigma: &Array1<f64>,
    xi: &Array1<f64>,
    rng: &mut R,
) -> Result<Array1<f64>, GevError> {
    let pv = checked_params(mu, sigma, xi, n)?;
    let out = (0..n)
        .map(|i| {
            let (m, s, k) = pv.at(i);
            let u: f64 = rng.sample(Open01);
            quantile_from_log_lower(u.ln(), m, s, k)
        })
        .collect::<Vec<_>>();
    Ok(Array1::from_vec(out))
}
