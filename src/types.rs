use ndarray::{Array1, Array2, ArrayView1};
use std::collections::HashMap;
use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::error::GevError;

// ----- Parameter names

/// The three GEV parameters, in the order used by information matrices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Param {
    Mu,
    Sigma,
    Xi,
}

impl Param {
    pub const ALL: [Param; 3] = [Param::Mu, Param::Sigma, Param::Xi];

    pub fn name(self) -> &'static str {
        match self {
            Param::Mu => "mu",
            Param::Sigma => "sigma",
            Param::Xi => "xi",
        }
    }

    /// Row/column of this parameter in a 3x3 information matrix.
    pub fn index(self) -> usize {
        match self {
            Param::Mu => 0,
            Param::Sigma => 1,
            Param::Xi => 2,
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "mu" => Some(Param::Mu),
            "sigma" => Some(Param::Sigma),
            "xi" => Some(Param::Xi),
            _ => None,
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

// ----- Parameter vectors

/// Borrowed (mu, sigma, xi) vectors for n observations.
///
/// Each vector has length n or length 1; a length-1 vector is broadcast to
/// every observation. Validity of the values is checked separately by
/// [`crate::validation`].
#[derive(Debug, Clone, Copy)]
pub struct ParamVectors<'a> {
    mu: ArrayView1<'a, f64>,
    sigma: ArrayView1<'a, f64>,
    xi: ArrayView1<'a, f64>,
    n: usize,
}

impl<'a> ParamVectors<'a> {
    /// Length is taken as the longest of the three vectors.
    pub fn new(
        mu: &'a Array1<f64>,
        sigma: &'a Array1<f64>,
        xi: &'a Array1<f64>,
    ) -> Result<Self, GevError> {
        let n = mu.len().max(sigma.len()).max(xi.len());
        Self::with_len(mu, sigma, xi, n)
    }

    /// Every vector must have length `n` or 1.
    pub fn with_len(
        mu: &'a Array1<f64>,
        sigma: &'a Array1<f64>,
        xi: &'a Array1<f64>,
        n: usize,
    ) -> Result<Self, GevError> {
        for (param, values) in [(Param::Mu, mu), (Param::Sigma, sigma), (Param::Xi, xi)] {
            if values.is_empty() {
                return Err(GevError::MissingParameter {
                    param: param.name().to_string(),
                });
            }
            check_broadcast(param.name(), values.len(), n)?;
        }
        Ok(Self {
            mu: mu.view(),
            sigma: sigma.view(),
            xi: xi.view(),
            n,
        })
    }

    /// Looks up "mu", "sigma" and "xi" in a host-style parameter map.
    pub fn from_map(params: &HashMap<&str, &'a Array1<f64>>, n: usize) -> Result<Self, GevError> {
        let get = |p: Param| {
            params
                .get(p.name())
                .copied()
                .ok_or_else(|| GevError::MissingParameter {
                    param: p.name().to_string(),
                })
        };
        Self::with_len(get(Param::Mu)?, get(Param::Sigma)?, get(Param::Xi)?, n)
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    /// (mu, sigma, xi) for observation `i`.
    #[inline]
    pub fn at(&self, i: usize) -> (f64, f64, f64) {
        (
            broadcast_get(&self.mu, i),
            broadcast_get(&self.sigma, i),
            broadcast_get(&self.xi, i),
        )
    }

    pub fn get(&self, param: Param) -> ArrayView1<'a, f64> {
        match param {
            Param::Mu => self.mu,
            Param::Sigma => self.sigma,
            Param::Xi => self.xi,
        }
    }
}

#[inline]
pub(crate) fn broadcast_get(values: &ArrayView1<'_, f64>, i: usize) -> f64 {
    if values.len() == 1 {
        values[0]
    } else {
        values[i]
    }
}

pub(crate) fn check_broadcast(name: &str, found: usize, expected: usize) -> Result<(), GevError> {
    if found == expected || found == 1 {
        Ok(())
    } else {
        Err(GevError::LengthMismatch {
            name: name.to_string(),
            expected,
            found,
        })
    }
}

// ----- Derivative bundles

/// First derivatives of the log-density, one entry per observation.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Scores {
    pub mu: Array1<f64>,
    pub sigma: Array1<f64>,
    pub xi: Array1<f64>,
}

impl Scores {
    pub fn get(&self, param: Param) -> &Array1<f64> {
        match param {
            Param::Mu => &self.mu,
            Param::Sigma => &self.sigma,
            Param::Xi => &self.xi,
        }
    }

    pub fn len(&self) -> usize {
        self.mu.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mu.is_empty()
    }
}

/// The six distinct second derivatives of the log-density (or their
/// approximations), one entry per observation.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SecondDerivatives {
    pub mu_mu: Array1<f64>,
    pub sigma_sigma: Array1<f64>,
    pub xi_xi: Array1<f64>,
    pub mu_sigma: Array1<f64>,
    pub mu_xi: Array1<f64>,
    pub sigma_xi: Array1<f64>,
}

impl SecondDerivatives {
    pub fn get(&self, a: Param, b: Param) -> &Array1<f64> {
        match (a, b) {
            (Param::Mu, Param::Mu) => &self.mu_mu,
            (Param::Sigma, Param::Sigma) => &self.sigma_sigma,
            (Param::Xi, Param::Xi) => &self.xi_xi,
            (Param::Mu, Param::Sigma) | (Param::Sigma, Param::Mu) => &self.mu_sigma,
            (Param::Mu, Param::Xi) | (Param::Xi, Param::Mu) => &self.mu_xi,
            (Param::Sigma, Param::Xi) | (Param::Xi, Param::Sigma) => &self.sigma_xi,
        }
    }

    pub fn len(&self) -> usize {
        self.mu_mu.len()
    }

    pub fn is_empty(&self) -> bool {
        self.mu_mu.is_empty()
    }

    /// 3x3 matrix of observation `i`, ordered (mu, sigma, xi).
    pub fn matrix(&self, i: usize) -> Array2<f64> {
        Array2::from_shape_fn((3, 3), |(r, c)| self.get(Param::ALL[r], Param::ALL[c])[i])
    }

    /// Sum of the per-observation matrices.
    pub fn total(&self) -> Array2<f64> {
        Array2::from_shape_fn((3, 3), |(r, c)| {
            self.get(Param::ALL[r], Param::ALL[c]).sum()
        })
    }
}

/// Starting values on the response scale, one entry per observation.
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct InitialValues {
    pub mu: Array1<f64>,
    pub sigma: Array1<f64>,
    pub xi: Array1<f64>,
}

impl InitialValues {
    pub fn get(&self, param: Param) -> &Array1<f64> {
        match param {
            Param::Mu => &self.mu,
            Param::Sigma => &self.sigma,
            Param::Xi => &self.xi,
        }
    }
}

// ----- Newtypes for Safety (Matrices)

/// 3x3 information matrix ordered (mu, sigma, xi).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct InformationMatrix(pub Array2<f64>);

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct CovarianceMatrix(pub Array2<f64>);

impl InformationMatrix {
    pub fn from_entries(entries: [[f64; 3]; 3]) -> Self {
        Self(Array2::from_shape_fn((3, 3), |(r, c)| entries[r][c]))
    }

    pub fn entry(&self, a: Param, b: Param) -> f64 {
        self.0[[a.index(), b.index()]]
    }
}

impl CovarianceMatrix {
    /// Standard errors: square roots of the diagonal.
    pub fn standard_errors(&self) -> Array1<f64> {
        self.0.diag().mapv(|v| v.max(0.0).sqrt())
    }
}

macro_rules! impl_deref_for_matrix_wrapper {
    ($t:ty) => {
        impl Deref for $t {
            type Target = Array2<f64>;
            fn deref(&self) -> &Self::Target {
                &self.0
            }
        }
        impl DerefMut for $t {
            fn deref_mut(&mut self) -> &mut Self::Target {
                &mut self.0
            }
        }
    };
}

impl_deref_for_matrix_wrapper!(InformationMatrix);
impl_deref_for_matrix_wrapper!(CovarianceMatrix);

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_param_names_roundtrip() {
        for p in Param::ALL {
            assert_eq!(Param::from_name(p.name()), Some(p));
        }
        assert_eq!(Param::from_name("nu"), None);
    }

    #[test]
    fn test_param_vectors_broadcast() {
        let mu = array![1.0, 2.0, 3.0];
        let sigma = array![0.5];
        let xi = array![0.1];
        let pv = ParamVectors::new(&mu, &sigma, &xi).unwrap();
        assert_eq!(pv.len(), 3);
        assert_eq!(pv.at(2), (3.0, 0.5, 0.1));
    }

    #[test]
    fn test_param_vectors_length_mismatch() {
        let mu = array![1.0, 2.0, 3.0];
        let sigma = array![0.5, 0.6];
        let xi = array![0.1];
        let err = ParamVectors::new(&mu, &sigma, &xi).unwrap_err();
        assert!(matches!(
            err,
            GevError::LengthMismatch { expected: 3, found: 2, .. }
        ));
    }

    #[test]
    fn test_param_vectors_from_map_missing() {
        let mu = array![1.0];
        let sigma = array![1.0];
        let params: HashMap<&str, &Array1<f64>> = HashMap::from([("mu", &mu), ("sigma", &sigma)]);
        let err = ParamVectors::from_map(&params, 1).unwrap_err();
        assert!(matches!(err, GevError::MissingParameter { ref param } if param == "xi"));
    }

    #[test]
    fn test_second_derivatives_matrix_is_symmetric() {
        let sd = SecondDerivatives {
            mu_mu: array![-1.0],
            sigma_sigma: array![-2.0],
            xi_xi: array![-3.0],
            mu_sigma: array![0.1],
            mu_xi: array![0.2],
            sigma_xi: array![0.3],
        };
        let m = sd.matrix(0);
        assert_eq!(m, m.t());
        assert_eq!(m[[0, 2]], 0.2);
    }
}
