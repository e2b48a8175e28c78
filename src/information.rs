//! Scores and information for a single GEV observation.
//!
//! Parameter order throughout is (mu, sigma, xi). With z = (y - mu)/sigma,
//! t = 1 + xi z and w = t^(-1/xi) the log-density is
//!
//!   l = -ln(sigma) - (1 + 1/xi) ln(t) - w
//!
//! The expected information follows Prescott & Walden (1980), rewritten for the
//! xi sign convention used here. With p = (1+xi)^2 Gamma(1+2xi),
//! q = Gamma(2+xi) (psi(1+xi) + (1+xi)/xi) and Euler's constant g:
//!
//!   I_mm = p / sigma^2
//!   I_ms = -(p - Gamma(2+xi)) / (sigma^2 xi)
//!   I_mx = -(q - p/xi) / (sigma xi)
//!   I_ss = (1 - 2 Gamma(2+xi) + p) / (sigma^2 xi^2)
//!   I_sx = -(1 - g + (1 - Gamma(2+xi))/xi - q + p/xi) / (sigma xi^2)
//!   I_xx = (pi^2/6 + (1 - g + 1/xi)^2 - 2q/xi + p/xi^2) / xi^2
//!
//! All entries are finite only for xi > -0.5.

use crate::gev::GUMBEL_XI;
use crate::math::{digamma, gamma, EULER_GAMMA, ZETA_2};

/// Half-width of the band around xi = 0 where the closed form is replaced by
/// linear interpolation between its values at -XI_BAND and +XI_BAND.
pub(crate) const XI_BAND: f64 = 1e-2;

/// Analytic first derivatives of the log-density.
///
/// The caller guarantees sigma > 0 and that y lies inside the support.
#[inline]
pub fn score(y: f64, mu: f64, sigma: f64, xi: f64) -> [f64; 3] {
    let z = (y - mu) / sigma;

    if xi.abs() < GUMBEL_XI {
        let e = (-z).exp();
        let a = 1.0 - e;
        return [a / sigma, (z * a - 1.0) / sigma, 0.5 * z * z * a - z];
    }

    let log_t = (xi * z).ln_1p();
    let t = log_t.exp();
    let w = (-log_t / xi).exp();
    // a = (1 + xi - w) / t appears in all three
    let a = (1.0 + xi - w) / t;

    let d_mu = a / sigma;
    let d_sigma = (z * a - 1.0) / sigma;
    let d_xi = (1.0 - w) * log_t / (xi * xi) - z * a / xi;
    [d_mu, d_sigma, d_xi]
}

/// Observed score outer product s s^T (the quasi-Newton information).
#[inline]
pub fn score_outer_product(y: f64, mu: f64, sigma: f64, xi: f64) -> [[f64; 3]; 3] {
    let s = score(y, mu, sigma, xi);
    let mut out = [[0.0; 3]; 3];
    for r in 0..3 {
        for c in 0..3 {
            out[r][c] = s[r] * s[c];
        }
    }
    out
}

/// Expected Fisher information of one observation. Does not depend on mu.
///
/// Near xi = 0 the closed form loses all precision to cancellation (the xi-xi
/// entry divides by xi^4), so inside |xi| < XI_BAND the entries are linearly
/// interpolated between the closed forms at the band edges.
pub fn expected_information(sigma: f64, xi: f64) -> [[f64; 3]; 3] {
    if xi.abs() < XI_BAND {
        log::trace!("interpolating expected information near xi = 0 (xi = {})", xi);
        let lo = expected_information_closed(sigma, -XI_BAND);
        let hi = expected_information_closed(sigma, XI_BAND);
        let frac = (xi + XI_BAND) / (2.0 * XI_BAND);
        let mut out = [[0.0; 3]; 3];
        for r in 0..3 {
            for c in 0..3 {
                out[r][c] = lo[r][c] + frac * (hi[r][c] - lo[r][c]);
            }
        }
        return out;
    }
    expected_information_closed(sigma, xi)
}

fn expected_information_closed(sigma: f64, xi: f64) -> [[f64; 3]; 3] {
    let g = EULER_GAMMA;
    let gam2 = gamma(2.0 + xi);
    let p = (1.0 + xi).powi(2) * gamma(1.0 + 2.0 * xi);
    let q = gam2 * (digamma(1.0 + xi) + (1.0 + xi) / xi);

    let sigma_sq = sigma * sigma;
    let xi_sq = xi * xi;

    let i_mm = p / sigma_sq;
    let i_ms = -(p - gam2) / (sigma_sq * xi);
    let i_mx = -(q - p / xi) / (sigma * xi);
    let i_ss = (1.0 - 2.0 * gam2 + p) / (sigma_sq * xi_sq);
    let i_sx = -(1.0 - g + (1.0 - gam2) / xi - q + p / xi) / (sigma * xi_sq);
    let i_xx = (ZETA_2 + (1.0 - g + 1.0 / xi).powi(2) - 2.0 * q / xi + p / xi_sq) / xi_sq;

    [
        [i_mm, i_ms, i_mx],
        [i_ms, i_ss, i_sx],
        [i_mx, i_sx, i_xx],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gev::log_density;
    use approx::assert_relative_eq;

    fn numeric_score(y: f64, mu: f64, sigma: f64, xi: f64) -> [f64; 3] {
        let h = 1e-6;
        let f = |m: f64, s: f64, k: f64| log_density(y, m, s, k);
        [
            (f(mu + h, sigma, xi) - f(mu - h, sigma, xi)) / (2.0 * h),
            (f(mu, sigma + h, xi) - f(mu, sigma - h, xi)) / (2.0 * h),
            (f(mu, sigma, xi + h) - f(mu, sigma, xi - h)) / (2.0 * h),
        ]
    }

    #[test]
    fn test_score_matches_finite_differences() {
        for &(y, mu, sigma, xi) in &[
            (1.3, 0.5, 1.2, 0.25),
            (-0.4, 0.0, 0.7, -0.3),
            (4.0, 1.0, 2.0, 0.45),
            (0.2, 0.0, 1.0, -0.1),
        ] {
            let analytic = score(y, mu, sigma, xi);
            let numeric = numeric_score(y, mu, sigma, xi);
            for k in 0..3 {
                assert_relative_eq!(analytic[k], numeric[k], epsilon = 1e-6, max_relative = 1e-5);
            }
        }
    }

    #[test]
    fn test_gumbel_score_limit() {
        // xi = 0 uses the analytic limit; compare against a tiny nonzero xi
        let at_zero = score(0.8, 0.1, 1.5, 0.0);
        let near_zero = score(0.8, 0.1, 1.5, 1e-5);
        for k in 0..3 {
            assert_relative_eq!(at_zero[k], near_zero[k], epsilon = 1e-4);
        }
    }

    #[test]
    fn test_gumbel_information_limits() {
        // Known Gumbel information: I_mm = 1/s^2, I_ms = -(1-g)/s^2,
        // I_ss = (pi^2/6 + (1-g)^2)/s^2
        let sigma = 2.0;
        let info = expected_information(sigma, 0.0);
        let s2 = sigma * sigma;
        assert_relative_eq!(info[0][0], 1.0 / s2, max_relative = 1e-3);
        assert_relative_eq!(info[0][1], -(1.0 - EULER_GAMMA) / s2, max_relative = 1e-3);
        assert_relative_eq!(
            info[1][1],
            (ZETA_2 + (1.0 - EULER_GAMMA).powi(2)) / s2,
            max_relative = 1e-3
        );
        // I_mx(0) = ((pi^2/6 + g^2)/2 - g) / s
        let i_mx0 = (0.5 * (ZETA_2 + EULER_GAMMA * EULER_GAMMA) - EULER_GAMMA) / sigma;
        assert_relative_eq!(info[0][2], i_mx0, max_relative = 5e-3);
    }

    #[test]
    fn test_band_edges_are_continuous() {
        let inside = expected_information(1.0, XI_BAND * 0.999_999);
        let outside = expected_information(1.0, XI_BAND * 1.000_001);
        for r in 0..3 {
            for c in 0..3 {
                assert_relative_eq!(inside[r][c], outside[r][c], max_relative = 1e-4);
            }
        }
    }

    #[test]
    fn test_information_is_symmetric() {
        let info = expected_information(1.3, 0.2);
        for r in 0..3 {
            for c in 0..3 {
                assert_eq!(info[r][c], info[c][r]);
            }
        }
    }

    #[test]
    fn test_outer_product_diagonal_is_squared_score() {
        let s = score(0.3, 0.0, 1.0, 0.1);
        let op = score_outer_product(0.3, 0.0, 1.0, 0.1);
        for k in 0..3 {
            assert_relative_eq!(op[k][k], s[k] * s[k]);
        }
    }
}
