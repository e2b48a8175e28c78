//! Linear algebra backend abstraction layer.
//!
//! Only the small symmetric matrices of the family pass through here (3x3
//! information matrices), but the backend is still selected at compile time:
//! - `openblas`: Uses ndarray-linalg with OpenBLAS
//! - `pure-rust`: Uses faer (default)
//!
//! When both features are enabled `openblas` wins.

use crate::GevError;
use ndarray::Array2;

/// Result type for linear algebra operations.
pub type Result<T> = std::result::Result<T, GevError>;

// =============================================================================
// OpenBLAS Backend
// =============================================================================

#[cfg(feature = "openblas")]
pub fn cholesky_lower(a: &Array2<f64>) -> Result<Array2<f64>> {
    use ndarray_linalg::{Cholesky, UPLO};
    a.cholesky(UPLO::Lower)
        .map_err(|e| GevError::Linalg(format!("Cholesky decomposition failed: {}", e)))
}

/// Computes the inverse of a lower triangular matrix L by solving L * X = I.
#[cfg(feature = "openblas")]
pub fn inv_lower_triangular(l: &Array2<f64>) -> Result<Array2<f64>> {
    use ndarray_linalg::triangular::{Diag, SolveTriangular};
    use ndarray_linalg::UPLO;
    let n = l.nrows();
    let identity = Array2::<f64>::eye(n);
    l.solve_triangular(UPLO::Lower, Diag::NonUnit, &identity)
        .map_err(|e| GevError::Linalg(format!("Triangular inverse failed: {}", e)))
}

// =============================================================================
// Pure Rust Backend (faer)
// =============================================================================

#[cfg(all(feature = "pure-rust", not(feature = "openblas")))]
pub fn cholesky_lower(a: &Array2<f64>) -> Result<Array2<f64>> {
    let a_faer = ndarray_to_faer_mat(a);

    let chol = a_faer.cholesky(faer::Side::Lower).map_err(|_| {
        GevError::Linalg("Cholesky decomposition failed (matrix not positive definite)".to_string())
    })?;

    Ok(faer_mat_to_ndarray(&chol.compute_l()))
}

/// Computes the inverse of a lower triangular matrix L by solving L * X = I.
#[cfg(all(feature = "pure-rust", not(feature = "openblas")))]
pub fn inv_lower_triangular(l: &Array2<f64>) -> Result<Array2<f64>> {
    let l_faer = ndarray_to_faer_mat(l);
    let n = l_faer.nrows();
    let mut dst = faer::Mat::<f64>::zeros(n, n);
    faer::linalg::triangular_inverse::invert_lower_triangular(
        dst.as_mut(),
        l_faer.as_ref(),
        faer::Parallelism::None,
    );
    Ok(faer_mat_to_ndarray(&dst))
}

// =============================================================================
// Conversion Helpers: ndarray <-> faer
// =============================================================================

#[cfg(all(feature = "pure-rust", not(feature = "openblas")))]
fn ndarray_to_faer_mat(arr: &Array2<f64>) -> faer::Mat<f64> {
    let (nrows, ncols) = arr.dim();
    faer::Mat::from_fn(nrows, ncols, |i, j| arr[[i, j]])
}

#[cfg(all(feature = "pure-rust", not(feature = "openblas")))]
fn faer_mat_to_ndarray(mat: &faer::Mat<f64>) -> Array2<f64> {
    Array2::from_shape_fn((mat.nrows(), mat.ncols()), |(i, j)| mat.read(i, j))
}

// =============================================================================
// Backend-independent helpers
// =============================================================================

/// Inverse of a symmetric positive definite matrix: A^-1 = L^-T L^-1.
pub fn spd_inverse(a: &Array2<f64>) -> Result<Array2<f64>> {
    if a.nrows() != a.ncols() {
        return Err(GevError::Linalg(format!(
            "Expected a square matrix, got {}x{}",
            a.nrows(),
            a.ncols()
        )));
    }
    if a.iter().any(|v| !v.is_finite()) {
        return Err(GevError::Linalg("Matrix has non-finite entries".to_string()));
    }
    let l = cholesky_lower(a)?;
    let l_inv = inv_lower_triangular(&l)?;
    Ok(l_inv.t().dot(&l_inv))
}

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn test_cholesky() {
        let a = array![[4.0, 2.0, 0.5], [2.0, 3.0, 0.2], [0.5, 0.2, 1.0]];

        let l = cholesky_lower(&a).unwrap();

        // Check L * L^T ≈ A
        let reconstructed = l.dot(&l.t());
        for i in 0..3 {
            for j in 0..3 {
                assert!((reconstructed[[i, j]] - a[[i, j]]).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn test_cholesky_not_positive_definite() {
        // Not positive definite (negative eigenvalue)
        let a = array![[1.0, 2.0], [2.0, 1.0]];
        assert!(cholesky_lower(&a).is_err());
    }

    #[test]
    fn test_inv_lower_triangular() {
        let l = array![[2.0, 0.0], [1.0, 3.0]];

        let l_inv = inv_lower_triangular(&l).unwrap();

        let product = l.dot(&l_inv);
        assert!((product[[0, 0]] - 1.0).abs() < 1e-10);
        assert!((product[[1, 1]] - 1.0).abs() < 1e-10);
        assert!(product[[0, 1]].abs() < 1e-10);
        assert!(product[[1, 0]].abs() < 1e-10);
    }

    #[test]
    fn test_spd_inverse() {
        let a = array![[4.0, 2.0, 0.5], [2.0, 3.0, 0.2], [0.5, 0.2, 1.0]];
        let a_inv = spd_inverse(&a).unwrap();
        let identity = a.dot(&a_inv);
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!(
                    (identity[[i, j]] - expected).abs() < 1e-10,
                    "Mismatch at [{}, {}]: {}",
                    i,
                    j,
                    identity[[i, j]]
                );
            }
        }
    }

    #[test]
    fn test_spd_inverse_rejects_nan() {
        let a = array![[1.0, f64::NAN], [f64::NAN, 1.0]];
        assert!(matches!(spd_inverse(&a), Err(GevError::Linalg(_))));
    }
}
