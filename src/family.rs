//! The GEV family record handed to a GAMLSS host.
//!
//! A host fits location, scale and shape through an iteratively reweighted loop
//! and only needs per-observation quantities from the family: first
//! derivatives, curvature (negated information), validity predicates, starting
//! values and deviance increments. Two scoring variants share everything except
//! the curvature:
//!
//! - [`Scoring::Fisher`]: expected information, independent of y.
//! - [`Scoring::Quasi`]: outer product of the observed score.

use log::{debug, warn};
use ndarray::Array1;
use statrs::distribution::{ContinuousCDF, Normal};
use std::collections::HashMap;
use std::fmt::{self, Debug};
use std::str::FromStr;

use crate::config::{FamilyConfig, DEFAULT_XI_START};
use crate::error::GevError;
use crate::gev::{log_cdf, log_density};
use crate::information::{expected_information, score, score_outer_product};
use crate::linalg;
use crate::links::{default_link_name, link_for_param, link_from_name, IdentityLink, Link, LogLink};
use crate::math::{batch_map, EULER_GAMMA};
use crate::types::{
    CovarianceMatrix, InformationMatrix, InitialValues, Param, ParamVectors, Scores,
    SecondDerivatives,
};
use crate::validation::{self, validate_inputs, XI_LOWER_LIMIT};

const PARAMETERS: [&str; 3] = ["mu", "sigma", "xi"];

/// How the second derivatives are approximated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Scoring {
    #[default]
    Fisher,
    Quasi,
}

impl Scoring {
    pub fn name(self) -> &'static str {
        match self {
            Scoring::Fisher => "fisher",
            Scoring::Quasi => "quasi",
        }
    }
}

impl fmt::Display for Scoring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Scoring {
    type Err = GevError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "fisher" => Ok(Scoring::Fisher),
            "quasi" => Ok(Scoring::Quasi),
            other => Err(GevError::Input(format!(
                "Unknown scoring '{}' (expected 'fisher' or 'quasi')",
                other
            ))),
        }
    }
}

// These traits help make sure the actual distributions are implemented correctly
pub trait Distribution: Debug + Send + Sync {
    fn parameters(&self) -> &[&'static str];
    fn default_link(&self, param: &str) -> Result<Box<dyn Link>, GevError>;
    /// Per parameter, the working score u = dl/dtheta * dtheta/deta and the
    /// working weight w = I_theta_theta * (dtheta/deta)^2, one entry per observation.
    #[allow(clippy::type_complexity)]
    fn derivatives(
        &self,
        y: &Array1<f64>,
        params: &HashMap<&str, &Array1<f64>>,
    ) -> Result<HashMap<String, (Array1<f64>, Array1<f64>)>, GevError>;
    fn name(&self) -> &'static str;
}

/// Generalized Extreme Value family with location mu, scale sigma and shape xi.
#[derive(Debug)]
pub struct GevFamily {
    scoring: Scoring,
    // indexed by Param::index()
    links: [Box<dyn Link>; 3],
    xi_start: f64,
}

impl Default for GevFamily {
    /// Fisher scoring with identity, log and identity links.
    fn default() -> Self {
        Self {
            scoring: Scoring::Fisher,
            links: [
                Box::new(IdentityLink),
                Box::new(LogLink),
                Box::new(IdentityLink),
            ],
            xi_start: DEFAULT_XI_START,
        }
    }
}

impl GevFamily {
    /// Fails on an unknown link name or a link not allowed for its parameter.
    pub fn new(
        scoring: Scoring,
        mu_link: &str,
        sigma_link: &str,
        xi_link: &str,
    ) -> Result<Self, GevError> {
        let links = [
            link_for_param(Param::Mu, mu_link)?,
            link_for_param(Param::Sigma, sigma_link)?,
            link_for_param(Param::Xi, xi_link)?,
        ];
        let family = Self {
            scoring,
            links,
            xi_start: DEFAULT_XI_START,
        };
        debug!(
            "Created {} (mu: {}, sigma: {}, xi: {})",
            family.name(),
            mu_link,
            sigma_link,
            xi_link
        );
        Ok(family)
    }

    pub fn fisher(mu_link: &str, sigma_link: &str, xi_link: &str) -> Result<Self, GevError> {
        Self::new(Scoring::Fisher, mu_link, sigma_link, xi_link)
    }

    pub fn quasi(mu_link: &str, sigma_link: &str, xi_link: &str) -> Result<Self, GevError> {
        Self::new(Scoring::Quasi, mu_link, sigma_link, xi_link)
    }

    pub fn from_config(config: &FamilyConfig) -> Result<Self, GevError> {
        Self::new(
            config.scoring,
            &config.mu_link,
            &config.sigma_link,
            &config.xi_link,
        )?
        .with_xi_start(config.xi_start)
    }

    /// The starting xi must itself be a valid shape inside the domain of the xi link.
    pub fn with_xi_start(mut self, xi_start: f64) -> Result<Self, GevError> {
        validation::check_shape_value(0, xi_start)?;
        self.check_link_domain(Param::Xi, 0, xi_start)?;
        self.xi_start = xi_start;
        Ok(self)
    }

    fn check_link_domain(&self, param: Param, index: usize, theta: f64) -> Result<(), GevError> {
        let link = self.link(param);
        if link.valid_theta(theta) {
            Ok(())
        } else {
            Err(GevError::OutsideLinkDomain {
                param: param.name().to_string(),
                link: link.name().to_string(),
                index,
                value: theta,
            })
        }
    }

    /// Every parameter value must be mappable onto the eta scale.
    fn check_link_domains(&self, params: &ParamVectors<'_>) -> Result<(), GevError> {
        for param in Param::ALL {
            for (i, &theta) in params.get(param).iter().enumerate() {
                self.check_link_domain(param, i, theta)?;
            }
        }
        Ok(())
    }

    pub fn config(&self) -> FamilyConfig {
        FamilyConfig {
            scoring: self.scoring,
            mu_link: self.links[0].name().to_string(),
            sigma_link: self.links[1].name().to_string(),
            xi_link: self.links[2].name().to_string(),
            xi_start: self.xi_start,
        }
    }

    // ----- Record fields

    pub fn name(&self) -> &'static str {
        match self.scoring {
            Scoring::Fisher => "GEVfisher",
            Scoring::Quasi => "GEVquasi",
        }
    }

    /// (short name, long name).
    pub fn family(&self) -> (&'static str, &'static str) {
        ("GEV", "Generalized Extreme Value")
    }

    pub fn scoring(&self) -> Scoring {
        self.scoring
    }

    pub fn parameters(&self) -> &'static [&'static str] {
        &PARAMETERS
    }

    pub fn link(&self, param: Param) -> &dyn Link {
        self.links[param.index()].as_ref()
    }

    pub fn link_names(&self) -> [&'static str; 3] {
        [
            self.links[0].name(),
            self.links[1].name(),
            self.links[2].name(),
        ]
    }

    pub fn xi_start(&self) -> f64 {
        self.xi_start
    }

    // ----- Derivatives

    /// Information of one observation under this family's scoring.
    #[inline]
    fn observation_information(&self, y: f64, mu: f64, sigma: f64, xi: f64) -> [[f64; 3]; 3] {
        match self.scoring {
            Scoring::Fisher => expected_information(sigma, xi),
            Scoring::Quasi => score_outer_product(y, mu, sigma, xi),
        }
    }

    /// dl/dmu, dl/dsigma, dl/dxi for every observation. Identical for both variants.
    pub fn first_derivatives(
        &self,
        y: &Array1<f64>,
        params: &ParamVectors<'_>,
    ) -> Result<Scores, GevError> {
        validate_inputs(y, params)?;
        let rows = batch_map(y.len(), |i| {
            let (mu, sigma, xi) = params.at(i);
            score(y[i], mu, sigma, xi)
        });
        Ok(Scores {
            mu: rows.iter().map(|s| s[0]).collect(),
            sigma: rows.iter().map(|s| s[1]).collect(),
            xi: rows.iter().map(|s| s[2]).collect(),
        })
    }

    /// The six second derivatives the host plugs into its weight update:
    /// the negated expected (Fisher) or outer-product (quasi) information.
    pub fn second_derivatives(
        &self,
        y: &Array1<f64>,
        params: &ParamVectors<'_>,
    ) -> Result<SecondDerivatives, GevError> {
        validate_inputs(y, params)?;
        let rows = batch_map(y.len(), |i| {
            let (mu, sigma, xi) = params.at(i);
            self.observation_information(y[i], mu, sigma, xi)
        });
        let column = |a: Param, b: Param| -> Array1<f64> {
            rows.iter().map(|m| -m[a.index()][b.index()]).collect()
        };
        Ok(SecondDerivatives {
            mu_mu: column(Param::Mu, Param::Mu),
            sigma_sigma: column(Param::Sigma, Param::Sigma),
            xi_xi: column(Param::Xi, Param::Xi),
            mu_sigma: column(Param::Mu, Param::Sigma),
            mu_xi: column(Param::Mu, Param::Xi),
            sigma_xi: column(Param::Sigma, Param::Xi),
        })
    }

    /// Per-observation 3x3 information matrices (non-negative diagonal).
    pub fn information(
        &self,
        y: &Array1<f64>,
        params: &ParamVectors<'_>,
    ) -> Result<Vec<InformationMatrix>, GevError> {
        validate_inputs(y, params)?;
        Ok(batch_map(y.len(), |i| {
            let (mu, sigma, xi) = params.at(i);
            InformationMatrix::from_entries(self.observation_information(y[i], mu, sigma, xi))
        }))
    }

    /// Information summed over observations.
    pub fn total_information(
        &self,
        y: &Array1<f64>,
        params: &ParamVectors<'_>,
    ) -> Result<InformationMatrix, GevError> {
        let per_obs = self.information(y, params)?;
        let mut total = InformationMatrix::from_entries([[0.0; 3]; 3]);
        for m in &per_obs {
            total.0 += &m.0;
        }
        Ok(total)
    }

    /// Asymptotic covariance of (mu, sigma, xi) when every observation shares
    /// the same parameters: the inverse of the summed information.
    pub fn parameter_covariance(
        &self,
        y: &Array1<f64>,
        params: &ParamVectors<'_>,
    ) -> Result<CovarianceMatrix, GevError> {
        let total = self.total_information(y, params)?;
        linalg::spd_inverse(&total).map(CovarianceMatrix).map_err(|e| {
            warn!(
                "{}: summed information is not positive definite over {} observations",
                self.name(),
                y.len()
            );
            e
        })
    }

    fn component(
        &self,
        y: &Array1<f64>,
        mu: &Array1<f64>,
        sigma: &Array1<f64>,
        xi: &Array1<f64>,
        param: Param,
    ) -> Result<Array1<f64>, GevError> {
        let pv = ParamVectors::with_len(mu, sigma, xi, y.len())?;
        validate_inputs(y, &pv)?;
        let j = param.index();
        Ok(Array1::from_vec(batch_map(y.len(), |i| {
            let (m, s, k) = pv.at(i);
            score(y[i], m, s, k)[j]
        })))
    }

    fn curvature(
        &self,
        y: &Array1<f64>,
        mu: &Array1<f64>,
        sigma: &Array1<f64>,
        xi: &Array1<f64>,
        a: Param,
        b: Param,
    ) -> Result<Array1<f64>, GevError> {
        let pv = ParamVectors::with_len(mu, sigma, xi, y.len())?;
        validate_inputs(y, &pv)?;
        let (r, c) = (a.index(), b.index());
        Ok(Array1::from_vec(batch_map(y.len(), |i| {
            let (m, s, k) = pv.at(i);
            -self.observation_information(y[i], m, s, k)[r][c]
        })))
    }

    /// dl/dmu.
    pub fn dldm(
        &self,
        y: &Array1<f64>,
        mu: &Array1<f64>,
        sigma: &Array1<f64>,
        xi: &Array1<f64>,
    ) -> Result<Array1<f64>, GevError> {
        self.component(y, mu, sigma, xi, Param::Mu)
    }

    /// dl/dsigma.
    pub fn dldd(
        &self,
        y: &Array1<f64>,
        mu: &Array1<f64>,
        sigma: &Array1<f64>,
        xi: &Array1<f64>,
    ) -> Result<Array1<f64>, GevError> {
        self.component(y, mu, sigma, xi, Param::Sigma)
    }

    /// dl/dxi.
    pub fn dldv(
        &self,
        y: &Array1<f64>,
        mu: &Array1<f64>,
        sigma: &Array1<f64>,
        xi: &Array1<f64>,
    ) -> Result<Array1<f64>, GevError> {
        self.component(y, mu, sigma, xi, Param::Xi)
    }

    pub fn d2ldm2(
        &self,
        y: &Array1<f64>,
        mu: &Array1<f64>,
        sigma: &Array1<f64>,
        xi: &Array1<f64>,
    ) -> Result<Array1<f64>, GevError> {
        self.curvature(y, mu, sigma, xi, Param::Mu, Param::Mu)
    }

    pub fn d2ldd2(
        &self,
        y: &Array1<f64>,
        mu: &Array1<f64>,
        sigma: &Array1<f64>,
        xi: &Array1<f64>,
    ) -> Result<Array1<f64>, GevError> {
        self.curvature(y, mu, sigma, xi, Param::Sigma, Param::Sigma)
    }

    pub fn d2ldv2(
        &self,
        y: &Array1<f64>,
        mu: &Array1<f64>,
        sigma: &Array1<f64>,
        xi: &Array1<f64>,
    ) -> Result<Array1<f64>, GevError> {
        self.curvature(y, mu, sigma, xi, Param::Xi, Param::Xi)
    }

    pub fn d2ldmdd(
        &self,
        y: &Array1<f64>,
        mu: &Array1<f64>,
        sigma: &Array1<f64>,
        xi: &Array1<f64>,
    ) -> Result<Array1<f64>, GevError> {
        self.curvature(y, mu, sigma, xi, Param::Mu, Param::Sigma)
    }

    pub fn d2ldmdv(
        &self,
        y: &Array1<f64>,
        mu: &Array1<f64>,
        sigma: &Array1<f64>,
        xi: &Array1<f64>,
    ) -> Result<Array1<f64>, GevError> {
        self.curvature(y, mu, sigma, xi, Param::Mu, Param::Xi)
    }

    pub fn d2lddv(
        &self,
        y: &Array1<f64>,
        mu: &Array1<f64>,
        sigma: &Array1<f64>,
        xi: &Array1<f64>,
    ) -> Result<Array1<f64>, GevError> {
        self.curvature(y, mu, sigma, xi, Param::Sigma, Param::Xi)
    }

    // ----- Validity predicates

    pub fn y_valid(&self, y: &Array1<f64>) -> bool {
        !y.is_empty() && y.iter().all(|v| v.is_finite())
    }

    pub fn mu_valid(&self, mu: &Array1<f64>) -> bool {
        !mu.is_empty() && mu.iter().all(|v| v.is_finite())
    }

    pub fn sigma_valid(&self, sigma: &Array1<f64>) -> bool {
        !sigma.is_empty() && sigma.iter().all(|&v| v > 0.0 && v.is_finite())
    }

    pub fn xi_valid(&self, xi: &Array1<f64>) -> bool {
        !xi.is_empty() && xi.iter().all(|&v| v > XI_LOWER_LIMIT && v.is_finite())
    }

    // ----- Starting values

    /// Gumbel method-of-moments start: sigma = sd * sqrt(6) / pi,
    /// mu = mean - gamma * sigma, xi = the configured start. One entry per
    /// observation, on the response scale.
    pub fn initial_values(&self, y: &Array1<f64>) -> Result<InitialValues, GevError> {
        let n = y.len();
        if n < 2 {
            return Err(GevError::InsufficientData {
                required: 2,
                found: n,
            });
        }
        validation::check_response(y)?;

        let mean = y.sum() / n as f64;
        let sd = y.std(1.0);
        if !(sd > 0.0 && sd.is_finite()) {
            return Err(GevError::Input(format!(
                "Response standard deviation must be positive to derive starting values, got {}",
                sd
            )));
        }

        let sigma0 = sd * 6f64.sqrt() / std::f64::consts::PI;
        let mu0 = mean - EULER_GAMMA * sigma0;
        debug!(
            "{} starting values: mu = {:.4}, sigma = {:.4}, xi = {}",
            self.name(),
            mu0,
            sigma0,
            self.xi_start
        );

        Ok(InitialValues {
            mu: Array1::from_elem(n, mu0),
            sigma: Array1::from_elem(n, sigma0),
            xi: Array1::from_elem(n, self.xi_start),
        })
    }

    /// [`Self::initial_values`] mapped onto the linear-predictor scale.
    pub fn eta_start(&self, y: &Array1<f64>) -> Result<InitialValues, GevError> {
        let start = self.initial_values(y)?;
        let mut eta = start.clone();
        for param in Param::ALL {
            let link = self.link(param);
            let target = match param {
                Param::Mu => &mut eta.mu,
                Param::Sigma => &mut eta.sigma,
                Param::Xi => &mut eta.xi,
            };
            for (i, (e, &theta)) in target.iter_mut().zip(start.get(param).iter()).enumerate() {
                self.check_link_domain(param, i, theta)?;
                let value = link.link(theta);
                if !link.valid_eta(value) {
                    return Err(GevError::Input(format!(
                        "Starting {} = {} cannot be mapped through the {} link",
                        param,
                        theta,
                        link.name()
                    )));
                }
                *e = value;
            }
        }
        Ok(eta)
    }

    // ----- Deviance and residuals

    /// -2 ln f(y) for every observation.
    pub fn deviance_increment(
        &self,
        y: &Array1<f64>,
        params: &ParamVectors<'_>,
    ) -> Result<Array1<f64>, GevError> {
        validate_inputs(y, params)?;
        Ok(Array1::from_vec(batch_map(y.len(), |i| {
            let (mu, sigma, xi) = params.at(i);
            -2.0 * log_density(y[i], mu, sigma, xi)
        })))
    }

    pub fn global_deviance(
        &self,
        y: &Array1<f64>,
        params: &ParamVectors<'_>,
    ) -> Result<f64, GevError> {
        Ok(self.deviance_increment(y, params)?.sum())
    }

    /// Normalized quantile residuals Phi^-1(F(y)).
    pub fn quantile_residuals(
        &self,
        y: &Array1<f64>,
        params: &ParamVectors<'_>,
    ) -> Result<Array1<f64>, GevError> {
        validate_inputs(y, params)?;
        let normal = Normal::new(0.0, 1.0).map_err(|e| GevError::Input(e.to_string()))?;
        Ok(Array1::from_vec(batch_map(y.len(), |i| {
            let (mu, sigma, xi) = params.at(i);
            let lc = log_cdf(y[i], mu, sigma, xi);
            let p = lc.exp();
            if p <= 0.5 {
                normal.inverse_cdf(p)
            } else {
                // upper tail through 1 - F to keep precision
                -normal.inverse_cdf(-lc.exp_m1())
            }
        })))
    }
}

impl Distribution for GevFamily {
    fn parameters(&self) -> &[&'static str] {
        GevFamily::parameters(self)
    }

    fn default_link(&self, param: &str) -> Result<Box<dyn Link>, GevError> {
        match Param::from_name(param) {
            Some(p) => link_from_name(default_link_name(p)),
            None => Err(GevError::UnknownParameter {
                distribution: self.name().to_string(),
                param: param.to_string(),
            }),
        }
    }

    fn derivatives(
        &self,
        y: &Array1<f64>,
        params: &HashMap<&str, &Array1<f64>>,
    ) -> Result<HashMap<String, (Array1<f64>, Array1<f64>)>, GevError> {
        if let Some(unknown) = params.keys().find(|k| Param::from_name(k).is_none()) {
            return Err(GevError::UnknownParameter {
                distribution: self.name().to_string(),
                param: unknown.to_string(),
            });
        }
        let pv = ParamVectors::from_map(params, y.len())?;
        validate_inputs(y, &pv)?;
        self.check_link_domains(&pv)?;

        let rows = batch_map(y.len(), |i| {
            let (mu, sigma, xi) = pv.at(i);
            let s = score(y[i], mu, sigma, xi);
            let info = self.observation_information(y[i], mu, sigma, xi);
            let theta = [mu, sigma, xi];
            let mut out = [(0.0, 0.0); 3];
            for (j, slot) in out.iter_mut().enumerate() {
                // chain rule onto the eta scale
                let link = &self.links[j];
                let d = link.mu_eta(link.link(theta[j]));
                *slot = (s[j] * d, info[j][j] * d * d);
            }
            out
        });

        Ok(Param::ALL
            .iter()
            .map(|p| {
                let j = p.index();
                let u: Array1<f64> = rows.iter().map(|r| r[j].0).collect();
                let w: Array1<f64> = rows.iter().map(|r| r[j].1).collect();
                (p.name().to_string(), (u, w))
            })
            .collect())
    }

    fn name(&self) -> &'static str {
        GevFamily::name(self)
    }
}
