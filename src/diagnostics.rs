//! Model diagnostic functions: residuals, log-likelihoods, and information criteria.

use crate::error::GevError;
use crate::family::GevFamily;
use crate::gev::{log_density, Gev};
use crate::math::{batch_map, try_batch_map};
use crate::types::ParamVectors;
use crate::validation::validate_inputs;
use ndarray::Array1;

/// Aggregated diagnostics for a GEV fit evaluated at given parameters.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct ModelDiagnostics {
    pub quantile_residuals: Array1<f64>,
    pub response_residuals: Array1<f64>,
    pub total_edf: f64,
    pub aic: f64,
    pub bic: f64,
    pub log_likelihood: f64,
    pub global_deviance: f64,
    pub n_obs: usize,
}

impl ModelDiagnostics {
    /// `total_edf` is the effective degrees of freedom reported by the host
    /// (3 for a model with constant mu, sigma and xi).
    pub fn compute(
        family: &GevFamily,
        y: &Array1<f64>,
        params: &ParamVectors<'_>,
        total_edf: f64,
    ) -> Result<Self, GevError> {
        let log_likelihood = log_likelihood(y, params)?;
        let n_obs = y.len();
        Ok(Self {
            quantile_residuals: family.quantile_residuals(y, params)?,
            response_residuals: response_residuals(y, params)?,
            total_edf,
            aic: compute_aic(log_likelihood, total_edf),
            bic: compute_bic(log_likelihood, total_edf, n_obs),
            log_likelihood,
            global_deviance: -2.0 * log_likelihood,
            n_obs,
        })
    }
}

/// Computes the GEV log-likelihood: Σ ln f(y_i; mu_i, sigma_i, xi_i).
pub fn log_likelihood(y: &Array1<f64>, params: &ParamVectors<'_>) -> Result<f64, GevError> {
    validate_inputs(y, params)?;
    Ok(batch_map(y.len(), |i| {
        let (mu, sigma, xi) = params.at(i);
        log_density(y[i], mu, sigma, xi)
    })
    .into_iter()
    .sum())
}

/// Computes raw response residuals y - E[Y].
///
/// E[Y] is infinite for xi >= 1; those residuals are NaN.
pub fn response_residuals(
    y: &Array1<f64>,
    params: &ParamVectors<'_>,
) -> Result<Array1<f64>, GevError> {
    validate_inputs(y, params)?;
    let out = try_batch_map(y.len(), |i| {
        let (mu, sigma, xi) = params.at(i);
        let mean = Gev::new(mu, sigma, xi)?.mean().unwrap_or(f64::NAN);
        Ok::<f64, GevError>(y[i] - mean)
    })?;
    Ok(Array1::from_vec(out))
}

/// Computes Akaike Information Criterion: -2*loglik + 2*EDF.
pub fn compute_aic(log_likelihood: f64, total_edf: f64) -> f64 {
    -2.0 * log_likelihood + 2.0 * total_edf
}

/// Computes Bayesian Information Criterion: -2*loglik + log(n)*EDF.
pub fn compute_bic(log_likelihood: f64, total_edf: f64, n_obs: usize) -> f64 {
    -2.0 * log_likelihood + (n_obs as f64).ln() * total_edf
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_information_criteria() {
        assert_relative_eq!(compute_aic(-10.0, 3.0), 26.0);
        assert_relative_eq!(compute_bic(-10.0, 3.0, 100), 20.0 + 100f64.ln() * 3.0);
    }

    #[test]
    fn test_log_likelihood_matches_density() {
        let y = array![0.2, 1.5];
        let (mu, sigma, xi) = (array![0.0], array![1.0], array![0.0]);
        let pv = ParamVectors::with_len(&mu, &sigma, &xi, 2).unwrap();
        let g = Gev::gumbel(0.0, 1.0).unwrap();
        assert_relative_eq!(
            log_likelihood(&y, &pv).unwrap(),
            g.ln_pdf(0.2) + g.ln_pdf(1.5),
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_diagnostics_bundle() {
        let family = GevFamily::default();
        let y = array![0.2, 1.5, -0.3, 2.2];
        let (mu, sigma, xi) = (array![0.0], array![1.0], array![0.1]);
        let pv = ParamVectors::with_len(&mu, &sigma, &xi, 4).unwrap();
        let diag = ModelDiagnostics::compute(&family, &y, &pv, 3.0).unwrap();
        assert_eq!(diag.n_obs, 4);
        assert_relative_eq!(diag.aic, diag.global_deviance + 6.0, epsilon = 1e-12);
        assert_relative_eq!(
            diag.global_deviance,
            family.global_deviance(&y, &pv).unwrap(),
            epsilon = 1e-12
        );
        let mean = Gev::new(0.0, 1.0, 0.1).unwrap().mean().unwrap();
        assert_relative_eq!(diag.response_residuals[1], 1.5 - mean, epsilon = 1e-12);
    }
}
