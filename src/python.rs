use ndarray::Array1;
use numpy::{PyArray1, PyReadonlyArray1, ToPyArray};
use pyo3::exceptions::PyValueError;
use pyo3::prelude::*;
use pyo3::types::PyDict;
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::{d_gev, p_gev, q_gev, r_gev, FamilyConfig, GevError, GevFamily, ParamVectors, Scoring};

impl From<GevError> for PyErr {
    fn from(err: GevError) -> PyErr {
        PyValueError::new_err(err.to_string())
    }
}

type Derivative = fn(
    &GevFamily,
    &Array1<f64>,
    &Array1<f64>,
    &Array1<f64>,
    &Array1<f64>,
) -> Result<Array1<f64>, GevError>;

fn owned(a: &PyReadonlyArray1<f64>) -> Array1<f64> {
    a.as_array().to_owned()
}

// Main family wrapper
#[pyclass(name = "GevFamily", frozen)]
struct PyGevFamily {
    inner: GevFamily,
}

impl PyGevFamily {
    fn apply<'py>(
        &self,
        py: Python<'py>,
        f: Derivative,
        y: PyReadonlyArray1<'py, f64>,
        mu: PyReadonlyArray1<'py, f64>,
        sigma: PyReadonlyArray1<'py, f64>,
        xi: PyReadonlyArray1<'py, f64>,
    ) -> PyResult<Bound<'py, PyArray1<f64>>> {
        let out = f(
            &self.inner,
            &owned(&y),
            &owned(&mu),
            &owned(&sigma),
            &owned(&xi),
        )?;
        Ok(out.to_pyarray(py))
    }
}

#[pymethods]
impl PyGevFamily {
    /// Build a GEV family record.
    ///
    /// Parameters
    /// ----------
    /// scoring : str
    ///     'fisher' (expected information) or 'quasi' (score outer product)
    /// mu_link, sigma_link, xi_link : str
    ///     Link names; unknown names raise ValueError immediately
    /// xi_start : float
    ///     Starting value for the shape parameter
    #[new]
    #[pyo3(signature = (scoring="fisher", mu_link="identity", sigma_link="log", xi_link="identity", xi_start=0.1))]
    fn new(
        scoring: &str,
        mu_link: &str,
        sigma_link: &str,
        xi_link: &str,
        xi_start: f64,
    ) -> PyResult<Self> {
        let config = FamilyConfig {
            scoring: scoring.parse::<Scoring>()?,
            mu_link: mu_link.to_string(),
            sigma_link: sigma_link.to_string(),
            xi_link: xi_link.to_string(),
            xi_start,
        };
        Ok(Self {
            inner: GevFamily::from_config(&config)?,
        })
    }

    #[getter]
    fn name(&self) -> &'static str {
        self.inner.name()
    }

    #[getter]
    fn family(&self) -> (&'static str, &'static str) {
        self.inner.family()
    }

    #[getter]
    fn parameters(&self) -> Vec<&'static str> {
        self.inner.parameters().to_vec()
    }

    #[getter]
    fn links(&self) -> Vec<&'static str> {
        self.inner.link_names().to_vec()
    }

    fn dldm<'py>(
        &self,
        py: Python<'py>,
        y: PyReadonlyArray1<'py, f64>,
        mu: PyReadonlyArray1<'py, f64>,
        sigma: PyReadonlyArray1<'py, f64>,
        xi: PyReadonlyArray1<'py, f64>,
    ) -> PyResult<Bound<'py, PyArray1<f64>>> {
        self.apply(py, GevFamily::dldm, y, mu, sigma, xi)
    }

    fn dldd<'py>(
        &self,
        py: Python<'py>,
        y: PyReadonlyArray1<'py, f64>,
        mu: PyReadonlyArray1<'py, f64>,
        sigma: PyReadonlyArray1<'py, f64>,
        xi: PyReadonlyArray1<'py, f64>,
    ) -> PyResult<Bound<'py, PyArray1<f64>>> {
        self.apply(py, GevFamily::dldd, y, mu, sigma, xi)
    }

    fn dldv<'py>(
        &self,
        py: Python<'py>,
        y: PyReadonlyArray1<'py, f64>,
        mu: PyReadonlyArray1<'py, f64>,
        sigma: PyReadonlyArray1<'py, f64>,
        xi: PyReadonlyArray1<'py, f64>,
    ) -> PyResult<Bound<'py, PyArray1<f64>>> {
        self.apply(py, GevFamily::dldv, y, mu, sigma, xi)
    }

    fn d2ldm2<'py>(
        &self,
        py: Python<'py>,
        y: PyReadonlyArray1<'py, f64>,
        mu: PyReadonlyArray1<'py, f64>,
        sigma: PyReadonlyArray1<'py, f64>,
        xi: PyReadonlyArray1<'py, f64>,
    ) -> PyResult<Bound<'py, PyArray1<f64>>> {
        self.apply(py, GevFamily::d2ldm2, y, mu, sigma, xi)
    }

    fn d2ldd2<'py>(
        &self,
        py: Python<'py>,
        y: PyReadonlyArray1<'py, f64>,
        mu: PyReadonlyArray1<'py, f64>,
        sigma: PyReadonlyArray1<'py, f64>,
        xi: PyReadonlyArray1<'py, f64>,
    ) -> PyResult<Bound<'py, PyArray1<f64>>> {
        self.apply(py, GevFamily::d2ldd2, y, mu, sigma, xi)
    }

    fn d2ldv2<'py>(
        &self,
        py: Python<'py>,
        y: PyReadonlyArray1<'py, f64>,
        mu: PyReadonlyArray1<'py, f64>,
        sigma: PyReadonlyArray1<'py, f64>,
        xi: PyReadonlyArray1<'py, f64>,
    ) -> PyResult<Bound<'py, PyArray1<f64>>> {
        self.apply(py, GevFamily::d2ldv2, y, mu, sigma, xi)
    }

    fn d2ldmdd<'py>(
        &self,
        py: Python<'py>,
        y: PyReadonlyArray1<'py, f64>,
        mu: PyReadonlyArray1<'py, f64>,
        sigma: PyReadonlyArray1<'py, f64>,
        xi: PyReadonlyArray1<'py, f64>,
    ) -> PyResult<Bound<'py, PyArray1<f64>>> {
        self.apply(py, GevFamily::d2ldmdd, y, mu, sigma, xi)
    }

    fn d2ldmdv<'py>(
        &self,
        py: Python<'py>,
        y: PyReadonlyArray1<'py, f64>,
        mu: PyReadonlyArray1<'py, f64>,
        sigma: PyReadonlyArray1<'py, f64>,
        xi: PyReadonlyArray1<'py, f64>,
    ) -> PyResult<Bound<'py, PyArray1<f64>>> {
        self.apply(py, GevFamily::d2ldmdv, y, mu, sigma, xi)
    }

    fn d2lddv<'py>(
        &self,
        py: Python<'py>,
        y: PyReadonlyArray1<'py, f64>,
        mu: PyReadonlyArray1<'py, f64>,
        sigma: PyReadonlyArray1<'py, f64>,
        xi: PyReadonlyArray1<'py, f64>,
    ) -> PyResult<Bound<'py, PyArray1<f64>>> {
        self.apply(py, GevFamily::d2lddv, y, mu, sigma, xi)
    }

    fn y_valid(&self, y: PyReadonlyArray1<f64>) -> bool {
        self.inner.y_valid(&owned(&y))
    }

    fn mu_valid(&self, mu: PyReadonlyArray1<f64>) -> bool {
        self.inner.mu_valid(&owned(&mu))
    }

    fn sigma_valid(&self, sigma: PyReadonlyArray1<f64>) -> bool {
        self.inner.sigma_valid(&owned(&sigma))
    }

    fn xi_valid(&self, xi: PyReadonlyArray1<f64>) -> bool {
        self.inner.xi_valid(&owned(&xi))
    }

    /// Starting values on the response scale.
    ///
    /// Returns
    /// -------
    /// dict
    ///     Dictionary mapping 'mu', 'sigma', 'xi' to 1D arrays of length len(y)
    fn initial_values<'py>(
        &self,
        py: Python<'py>,
        y: PyReadonlyArray1<'py, f64>,
    ) -> PyResult<Bound<'py, PyDict>> {
        let start = self.inner.initial_values(&owned(&y))?;
        let py_dict = PyDict::new(py);
        py_dict.set_item("mu", start.mu.to_pyarray(py))?;
        py_dict.set_item("sigma", start.sigma.to_pyarray(py))?;
        py_dict.set_item("xi", start.xi.to_pyarray(py))?;
        Ok(py_dict)
    }

    /// -2 * log density for each observation.
    fn deviance_increment<'py>(
        &self,
        py: Python<'py>,
        y: PyReadonlyArray1<'py, f64>,
        mu: PyReadonlyArray1<'py, f64>,
        sigma: PyReadonlyArray1<'py, f64>,
        xi: PyReadonlyArray1<'py, f64>,
    ) -> PyResult<Bound<'py, PyArray1<f64>>> {
        let y = owned(&y);
        let (mu, sigma, xi) = (owned(&mu), owned(&sigma), owned(&xi));
        let params = ParamVectors::with_len(&mu, &sigma, &xi, y.len())?;
        Ok(self.inner.deviance_increment(&y, &params)?.to_pyarray(py))
    }

    fn quantile_residuals<'py>(
        &self,
        py: Python<'py>,
        y: PyReadonlyArray1<'py, f64>,
        mu: PyReadonlyArray1<'py, f64>,
        sigma: PyReadonlyArray1<'py, f64>,
        xi: PyReadonlyArray1<'py, f64>,
    ) -> PyResult<Bound<'py, PyArray1<f64>>> {
        let y = owned(&y);
        let (mu, sigma, xi) = (owned(&mu), owned(&sigma), owned(&xi));
        let params = ParamVectors::with_len(&mu, &sigma, &xi, y.len())?;
        Ok(self.inner.quantile_residuals(&y, &params)?.to_pyarray(py))
    }
}

#[pyfunction]
#[pyo3(signature = (x, mu, sigma, xi, log=false))]
fn dgev<'py>(
    py: Python<'py>,
    x: PyReadonlyArray1<'py, f64>,
    mu: PyReadonlyArray1<'py, f64>,
    sigma: PyReadonlyArray1<'py, f64>,
    xi: PyReadonlyArray1<'py, f64>,
    log: bool,
) -> PyResult<Bound<'py, PyArray1<f64>>> {
    let out = d_gev(&owned(&x), &owned(&mu), &owned(&sigma), &owned(&xi), log)?;
    Ok(out.to_pyarray(py))
}

#[pyfunction]
#[pyo3(signature = (q, mu, sigma, xi, lower_tail=true, log_p=false))]
fn pgev<'py>(
    py: Python<'py>,
    q: PyReadonlyArray1<'py, f64>,
    mu: PyReadonlyArray1<'py, f64>,
    sigma: PyReadonlyArray1<'py, f64>,
    xi: PyReadonlyArray1<'py, f64>,
    lower_tail: bool,
    log_p: bool,
) -> PyResult<Bound<'py, PyArray1<f64>>> {
    let out = p_gev(
        &owned(&q),
        &owned(&mu),
        &owned(&sigma),
        &owned(&xi),
        lower_tail,
        log_p,
    )?;
    Ok(out.to_pyarray(py))
}

#[pyfunction]
#[pyo3(signature = (p, mu, sigma, xi, lower_tail=true, log_p=false))]
fn qgev<'py>(
    py: Python<'py>,
    p: PyReadonlyArray1<'py, f64>,
    mu: PyReadonlyArray1<'py, f64>,
    sigma: PyReadonlyArray1<'py, f64>,
    xi: PyReadonlyArray1<'py, f64>,
    lower_tail: bool,
    log_p: bool,
) -> PyResult<Bound<'py, PyArray1<f64>>> {
    let out = q_gev(
        &owned(&p),
        &owned(&mu),
        &owned(&sigma),
        &owned(&xi),
        lower_tail,
        log_p,
    )?;
    Ok(out.to_pyarray(py))
}

/// Random variates. Pass `seed` for reproducible draws.
#[pyfunction]
#[pyo3(signature = (n, mu, sigma, xi, seed=None))]
fn rgev<'py>(
    py: Python<'py>,
    n: usize,
    mu: PyReadonlyArray1<'py, f64>,
    sigma: PyReadonlyArray1<'py, f64>,
    xi: PyReadonlyArray1<'py, f64>,
    seed: Option<u64>,
) -> PyResult<Bound<'py, PyArray1<f64>>> {
    let (mu, sigma, xi) = (owned(&mu), owned(&sigma), owned(&xi));
    let out = match seed {
        Some(s) => r_gev(n, &mu, &sigma, &xi, &mut StdRng::seed_from_u64(s))?,
        None => r_gev(n, &mu, &sigma, &xi, &mut rand::rng())?,
    };
    Ok(out.to_pyarray(py))
}

#[pymodule]
fn gamlss_gev(m: &Bound<PyModule>) -> PyResult<()> {
    m.add_class::<PyGevFamily>()?;
    m.add_function(wrap_pyfunction!(dgev, m)?)?;
    m.add_function(wrap_pyfunction!(pgev, m)?)?;
    m.add_function(wrap_pyfunction!(qgev, m)?)?;
    m.add_function(wrap_pyfunction!(rgev, m)?)?;
    Ok(())
}
