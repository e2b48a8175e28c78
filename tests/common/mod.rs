#![allow(dead_code)]

use gamlss_gev::Gev;
use ndarray::Array1;
use rand::prelude::*;
use rand_distr::Distribution;

pub struct Generator {
    pub rng: StdRng,
}

impl Generator {
    pub fn new(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// i.i.d. draws from GEV(mu, sigma, xi).
    pub fn gev_sample(&mut self, n: usize, mu: f64, sigma: f64, xi: f64) -> Array1<f64> {
        let dist = Gev::new(mu, sigma, xi).unwrap();
        (0..n).map(|_| dist.sample(&mut self.rng)).collect()
    }

    /// Annual-maximum style data with a linear trend in the location.
    ///
    /// Returns (y, mu) where mu_i = intercept + slope * x_i and x runs over [0, 1).
    pub fn trending_maxima(
        &mut self,
        n: usize,
        intercept: f64,
        slope: f64,
        sigma: f64,
        xi: f64,
    ) -> (Array1<f64>, Array1<f64>) {
        let mu: Array1<f64> = (0..n)
            .map(|i| intercept + slope * i as f64 / n as f64)
            .collect();
        let y = mu
            .iter()
            .map(|&m| Gev::new(m, sigma, xi).unwrap().sample(&mut self.rng))
            .collect();
        (y, mu)
    }
}

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// E[g(Y)] for Y ~ GEV(mu, sigma, xi) by quadrature.
///
/// Substitutes w = exp(s), where w = t^(-1/xi) is standard exponential, so
/// E[g] = ∫ g(y(w)) exp(-w) w ds over s in [-40, 4] with the trapezoid rule.
pub fn gev_expectation<F>(mu: f64, sigma: f64, xi: f64, g: F) -> f64
where
    F: Fn(f64) -> f64,
{
    let (lo, hi, h) = (-40.0f64, 4.0f64, 1e-3);
    let steps = ((hi - lo) / h).round() as usize;
    let mut total = 0.0;
    for k in 0..=steps {
        let s = lo + k as f64 * h;
        let w = s.exp();
        let y = if xi.abs() < 1e-12 {
            mu - sigma * s
        } else {
            mu + sigma * (w.powf(-xi) - 1.0) / xi
        };
        let weight = if k == 0 || k == steps { 0.5 } else { 1.0 };
        total += weight * g(y) * (-w).exp() * w;
    }
    total * h
}
