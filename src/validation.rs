//! Validity checks for responses and GEV parameters.
//!
//! Every check reports the first offending observation instead of clamping.

use crate::error::GevError;
use crate::gev::in_support;
use crate::types::{Param, ParamVectors};
use ndarray::Array1;

/// Lower limit (exclusive) on the shape parameter for the family.
pub const XI_LOWER_LIMIT: f64 = -0.5;

pub(crate) fn check_location_value(index: usize, value: f64) -> Result<(), GevError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(GevError::InvalidLocation { index, value })
    }
}

pub(crate) fn check_scale_value(index: usize, value: f64) -> Result<(), GevError> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(GevError::InvalidScale { index, value })
    }
}

pub(crate) fn check_shape_value(index: usize, value: f64) -> Result<(), GevError> {
    if value > XI_LOWER_LIMIT && value.is_finite() {
        Ok(())
    } else {
        Err(GevError::InvalidShape { index, value })
    }
}

pub(crate) fn check_response_value(index: usize, value: f64) -> Result<(), GevError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(GevError::InvalidResponse { index, value })
    }
}

pub(crate) fn check_probability_value(index: usize, value: f64) -> Result<(), GevError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(GevError::InvalidProbability { index, value })
    }
}

pub(crate) fn check_log_probability_value(index: usize, value: f64) -> Result<(), GevError> {
    if value <= 0.0 {
        Ok(())
    } else {
        Err(GevError::InvalidProbability { index, value })
    }
}

fn check_each(
    values: ndarray::ArrayView1<'_, f64>,
    check: fn(usize, f64) -> Result<(), GevError>,
) -> Result<(), GevError> {
    values
        .iter()
        .enumerate()
        .try_for_each(|(i, &v)| check(i, v))
}

pub fn check_location(params: &ParamVectors<'_>) -> Result<(), GevError> {
    check_each(params.get(Param::Mu), check_location_value)
}

pub fn check_scale(params: &ParamVectors<'_>) -> Result<(), GevError> {
    check_each(params.get(Param::Sigma), check_scale_value)
}

/// Family restriction: xi > -0.5.
pub fn check_shape(params: &ParamVectors<'_>) -> Result<(), GevError> {
    check_each(params.get(Param::Xi), check_shape_value)
}

/// Distribution-function restriction: any finite xi.
pub fn check_finite_shape(params: &ParamVectors<'_>) -> Result<(), GevError> {
    params
        .get(Param::Xi)
        .iter()
        .enumerate()
        .try_for_each(|(i, &v)| {
            if v.is_finite() {
                Ok(())
            } else {
                Err(GevError::Input(format!(
                    "Shape parameter xi must be finite, got {} at index {}",
                    v, i
                )))
            }
        })
}

pub fn check_response(y: &Array1<f64>) -> Result<(), GevError> {
    check_each(y.view(), check_response_value)
}

/// Every observation must satisfy 1 + xi (y - mu) / sigma > 0.
pub fn check_support(y: &Array1<f64>, params: &ParamVectors<'_>) -> Result<(), GevError> {
    y.iter().enumerate().try_for_each(|(i, &yi)| {
        let (mu, sigma, xi) = params.at(i);
        if in_support(yi, mu, sigma, xi) {
            Ok(())
        } else {
            Err(GevError::OutsideSupport { index: i, y: yi })
        }
    })
}

/// Everything the family needs before evaluating derivatives: a non-empty finite
/// response, parameters of matching length, mu finite, sigma > 0, xi > -0.5,
/// and every observation inside the support.
pub fn validate_inputs(y: &Array1<f64>, params: &ParamVectors<'_>) -> Result<(), GevError> {
    if y.is_empty() {
        return Err(GevError::InsufficientData {
            required: 1,
            found: 0,
        });
    }
    if params.len() != y.len() {
        return Err(GevError::LengthMismatch {
            name: "parameters".to_string(),
            expected: y.len(),
            found: params.len(),
        });
    }
    check_response(y)?;
    check_location(params)?;
    check_scale(params)?;
    check_shape(params)?;
    check_support(y, params)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_scale_rejects_zero_and_negative() {
        assert!(check_scale_value(0, 1e-300).is_ok());
        assert!(matches!(
            check_scale_value(3, 0.0),
            Err(GevError::InvalidScale { index: 3, .. })
        ));
        assert!(check_scale_value(0, -1.0).is_err());
        assert!(check_scale_value(0, f64::NAN).is_err());
    }

    #[test]
    fn test_shape_boundary_is_exclusive() {
        assert!(check_shape_value(0, -0.4999).is_ok());
        assert!(check_shape_value(0, -0.5).is_err());
        assert!(check_shape_value(0, -0.7).is_err());
    }

    #[test]
    fn test_validate_inputs_reports_support_violation() {
        let y = array![0.0, -5.0];
        let mu = array![0.0];
        let sigma = array![1.0];
        let xi = array![0.5];
        let pv = ParamVectors::with_len(&mu, &sigma, &xi, 2).unwrap();
        let err = validate_inputs(&y, &pv).unwrap_err();
        assert!(matches!(err, GevError::OutsideSupport { index: 1, .. }));
    }

    #[test]
    fn test_validate_inputs_rejects_empty_response() {
        let y: Array1<f64> = Array1::zeros(0);
        let p = array![1.0];
        let pv = ParamVectors::with_len(&p, &p, &p, 0).unwrap();
        assert!(matches!(
            validate_inputs(&y, &pv),
            Err(GevError::InsufficientData { .. })
        ));
    }

    #[test]
    fn test_validate_inputs_rejects_non_finite_response() {
        let y = array![1.0, f64::INFINITY];
        let mu = array![0.0];
        let sigma = array![1.0];
        let xi = array![0.0];
        let pv = ParamVectors::with_len(&mu, &sigma, &xi, 2).unwrap();
        assert!(matches!(
            validate_inputs(&y, &pv),
            Err(GevError::InvalidResponse { index: 1, .. })
        ));
    }
}
