use gamlss_gev::{r_gev, Gev, GevError, GevFamily, ModelDiagnostics, Param, ParamVectors};
use ndarray::{array, Array1};
use rand::rngs::StdRng;
use rand::SeedableRng;

fn main() -> Result<(), GevError> {
    env_logger::init();

    // Synthetic annual maxima
    let mut rng = StdRng::seed_from_u64(1871);
    let n = 150;
    let y = r_gev(n, &array![30.0], &array![6.0], &array![0.12], &mut rng)?;

    for family in [
        GevFamily::fisher("identity", "log", "identity")?,
        GevFamily::quasi("identity", "log", "identity")?,
    ] {
        println!("=== {} ===", family.name());
        let start = family.initial_values(&y)?;
        println!(
            "start: mu = {:.3}, sigma = {:.3}, xi = {:.3}",
            start.mu[0], start.sigma[0], start.xi[0]
        );

        // a few unit-step scoring iterations from the moment estimates
        let mut theta = [start.mu[0], start.sigma[0], start.xi[0]];
        for iter in 0..15 {
            let (mu, sigma, xi) = (array![theta[0]], array![theta[1]], array![theta[2]]);
            let pv = ParamVectors::with_len(&mu, &sigma, &xi, n)?;
            let scores = family.first_derivatives(&y, &pv)?;
            let cov = family.parameter_covariance(&y, &pv)?;
            let grad = array![scores.mu.sum(), scores.sigma.sum(), scores.xi.sum()];
            let step = cov.0.dot(&grad);

            let candidate = [theta[0] + step[0], theta[1] + step[1], theta[2] + step[2]];
            let accepted = (0..3).all(|j| candidate[j].is_finite())
                && candidate[1] > 0.0
                && family.xi_valid(&array![candidate[2]])
                && Gev::new(candidate[0], candidate[1], candidate[2])
                    .map(|d| y.iter().all(|&v| d.in_support(v)))
                    .unwrap_or(false);
            if !accepted {
                println!("iteration {}: step leaves the parameter space, stopping", iter);
                break;
            }
            theta = candidate;
            println!(
                "iteration {}: deviance = {:.4}",
                iter,
                family.global_deviance(&y, &pv)?
            );
        }

        let (mu, sigma, xi) = (array![theta[0]], array![theta[1]], array![theta[2]]);
        let pv = ParamVectors::with_len(&mu, &sigma, &xi, n)?;
        let cov = family.parameter_covariance(&y, &pv)?;
        let se = cov.standard_errors();
        for param in Param::ALL {
            let j = param.index();
            println!("{:>6} = {:8.4} (se {:.4})", param.name(), theta[j], se[j]);
        }

        let fitted = Gev::new(theta[0], theta[1], theta[2])?;
        for period in [10.0, 50.0, 100.0] {
            println!("{}-year return level: {:.2}", period, fitted.return_level(period)?);
        }

        let diagnostics = ModelDiagnostics::compute(&family, &y, &pv, 3.0)?;
        let residuals: &Array1<f64> = &diagnostics.quantile_residuals;
        println!(
            "AIC = {:.2}, BIC = {:.2}, mean residual = {:.4}",
            diagnostics.aic,
            diagnostics.bic,
            residuals.mean().unwrap_or(f64::NAN)
        );
    }

    Ok(())
}
