//! Generalized Extreme Value (GEV) distribution family for GAMLSS hosts.
//!
//! The crate supplies what a GAMLSS fitting loop needs from a distribution:
//! the GEV d/p/q/r functions, link functions, analytic scores, expected
//! (Fisher) or outer-product (quasi-Newton) information, validity predicates,
//! starting values and deviance increments. Fitting itself belongs to the host.
//!
//! ```no_run
//! use gamlss_gev::{GevFamily, ParamVectors};
//! use ndarray::array;
//!
//! let family = GevFamily::fisher("identity", "log", "identity")?;
//! let y = array![1.2, 0.4, 3.1];
//! let (mu, sigma, xi) = (array![0.5], array![1.0], array![0.1]);
//! let params = ParamVectors::with_len(&mu, &sigma, &xi, y.len())?;
//! let scores = family.first_derivatives(&y, &params)?;
//! let curvature = family.second_derivatives(&y, &params)?;
//! # Ok::<(), gamlss_gev::GevError>(())
//! ```

#[cfg(not(any(feature = "pure-rust", feature = "openblas")))]
compile_error!("enable one linear algebra backend: `pure-rust` or `openblas`");

pub mod config;
pub mod diagnostics;
mod error;
pub mod family;
pub mod gev;
pub mod information;
mod linalg;
pub mod links;
mod math;
#[cfg(feature = "python")]
mod python;
mod types;
pub mod validation;

pub use config::FamilyConfig;
pub use diagnostics::ModelDiagnostics;
pub use error::GevError;
pub use family::{Distribution, GevFamily, Scoring};
pub use gev::{d_gev, p_gev, q_gev, r_gev, Gev};
pub use links::Link;
pub use math::{EULER_GAMMA, ZETA_2};
pub use types::*;
