// Integration tests cannot run with the `python` feature due to PyO3's extension-module linking
#![cfg(not(feature = "python"))]

mod common;

use common::{init_logging, Generator};
use gamlss_gev::{GevFamily, ParamVectors};
use ndarray::{array, Array1};

/// Global deviance at constant parameters, None when theta is invalid or leaves
/// an observation outside the support.
fn deviance_at(family: &GevFamily, y: &Array1<f64>, theta: [f64; 3]) -> Option<f64> {
    let (mu, sigma, xi) = (array![theta[0]], array![theta[1]], array![theta[2]]);
    if !(family.sigma_valid(&sigma) && family.xi_valid(&xi)) {
        return None;
    }
    let pv = ParamVectors::with_len(&mu, &sigma, &xi, y.len()).ok()?;
    family.global_deviance(y, &pv).ok()
}

/// Minimal host loop: theta <- theta + (sum I)^-1 (sum s), with step halving.
fn scoring_loop(family: &GevFamily, y: &Array1<f64>, start: [f64; 3], iterations: usize) -> [f64; 3] {
    let mut theta = start;
    for _ in 0..iterations {
        let (mu, sigma, xi) = (array![theta[0]], array![theta[1]], array![theta[2]]);
        let pv = ParamVectors::with_len(&mu, &sigma, &xi, y.len()).unwrap();
        let scores = family.first_derivatives(y, &pv).unwrap();
        let cov = family.parameter_covariance(y, &pv).unwrap();
        let grad = array![scores.mu.sum(), scores.sigma.sum(), scores.xi.sum()];
        let step = cov.dot(&grad);
        let current = family.global_deviance(y, &pv).unwrap();

        let mut scale = 1.0;
        loop {
            let candidate = [
                theta[0] + scale * step[0],
                theta[1] + scale * step[1],
                theta[2] + scale * step[2],
            ];
            match deviance_at(family, y, candidate) {
                Some(dev) if dev <= current + 1e-9 => {
                    theta = candidate;
                    break;
                }
                _ => scale *= 0.5,
            }
            if scale < 1e-10 {
                return theta;
            }
        }
    }
    theta
}

#[test]
fn test_initial_values_recover_gumbel_parameters() {
    let mut generator = Generator::new(42);
    let y = generator.gev_sample(5_000, 10.0, 2.0, 0.0);
    let start = GevFamily::default().initial_values(&y).unwrap();

    // method of moments is exact for the Gumbel case
    assert!((start.mu[0] - 10.0).abs() < 0.15, "mu start {}", start.mu[0]);
    assert!((start.sigma[0] - 2.0).abs() < 0.15, "sigma start {}", start.sigma[0]);
}

#[test]
fn test_fisher_scoring_recovers_parameters() {
    init_logging();
    let mut generator = Generator::new(2024);
    let (true_mu, true_sigma, true_xi) = (10.0, 2.0, 0.1);
    let y = generator.gev_sample(3_000, true_mu, true_sigma, true_xi);

    let family = GevFamily::fisher("identity", "log", "identity").unwrap();
    let start = family.initial_values(&y).unwrap();
    let theta = scoring_loop(&family, &y, [start.mu[0], start.sigma[0], start.xi[0]], 50);

    println!("Fitted (mu, sigma, xi): {:?}", theta);

    assert!((theta[0] - true_mu).abs() < 0.2, "Mu failed: {}", theta[0]);
    assert!((theta[1] - true_sigma).abs() < 0.2, "Sigma failed: {}", theta[1]);
    // shape is the hardest to pin down
    assert!((theta[2] - true_xi).abs() < 0.07, "Xi failed: {}", theta[2]);

    // the truth lies within a few standard errors of the estimate
    let (mu, sigma, xi) = (array![theta[0]], array![theta[1]], array![theta[2]]);
    let pv = ParamVectors::with_len(&mu, &sigma, &xi, y.len()).unwrap();
    let se = family.parameter_covariance(&y, &pv).unwrap().standard_errors();
    let truth = [true_mu, true_sigma, true_xi];
    for j in 0..3 {
        assert!(
            (theta[j] - truth[j]).abs() < 5.0 * se[j],
            "parameter {}: estimate {} truth {} se {}",
            j,
            theta[j],
            truth[j],
            se[j]
        );
    }
}

#[test]
fn test_quasi_scoring_reaches_same_estimate() {
    let mut generator = Generator::new(99);
    let y = generator.gev_sample(2_000, 0.0, 1.0, -0.2);

    let fisher = GevFamily::fisher("identity", "log", "identity").unwrap();
    let quasi = GevFamily::quasi("identity", "log", "identity").unwrap();
    let start = fisher.initial_values(&y).unwrap();
    let start = [start.mu[0], start.sigma[0], start.xi[0]];

    let a = scoring_loop(&fisher, &y, start, 100);
    let b = scoring_loop(&quasi, &y, start, 200);

    let dev_a = deviance_at(&fisher, &y, a).unwrap();
    let dev_b = deviance_at(&quasi, &y, b).unwrap();
    assert!((dev_a - dev_b).abs() < 1e-3, "deviances {} vs {}", dev_a, dev_b);
    for j in 0..3 {
        assert!((a[j] - b[j]).abs() < 1e-2, "{:?} vs {:?}", a, b);
    }
}
