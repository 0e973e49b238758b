//! Log-determinant of a symmetric positive-definite matrix with a gradient
//! that stays symmetric.
//!
//! The value is computed from a Cholesky factorization, `2 Σᵢ ln Lᵢᵢ`, never
//! through the determinant itself, which underflows or overflows for large or
//! ill-conditioned matrices. The raw derivative of a factorization-based
//! log-determinant is triangular; [`ln_det_pd_with_grad`] returns the
//! corrected form `½(M⁻¹ + M⁻ᵀ)` so that downstream derivatives see a
//! symmetric gradient.
use crate::error::Error;
use nalgebra::{Cholesky, DMatrix, Dyn};

/// Cholesky factorization of a positive-definite matrix.
///
/// Only the symmetric part `½(M + Mᵀ)` of the argument is consulted, so a
/// matrix assembled from a flat parameter vector does not need to be exactly
/// symmetric to the last bit.
///
/// # Errors
///
/// Fails with [`Error::NotPositiveDefinite`] when the factorization breaks
/// down, and with [`Error::MatrixNotSquare`] for a non-square argument.
pub fn pd_cholesky(mat: &DMatrix<f64>) -> Result<Cholesky<f64, Dyn>, Error> {
    if !mat.is_square() {
        return Err(Error::MatrixNotSquare {
            nrows: mat.nrows(),
            ncols: mat.ncols(),
        });
    }
    let sym = 0.5 * (mat + mat.transpose());
    sym.cholesky().ok_or(Error::NotPositiveDefinite {
        nrows: mat.nrows(),
    })
}

/// Natural logarithm of the determinant of a positive-definite matrix.
///
/// # Example
///
/// ```rust
/// use expfam::misc::ln_det_pd;
/// use nalgebra::DMatrix;
///
/// let eye = DMatrix::<f64>::identity(4, 4);
/// assert_eq!(ln_det_pd(&eye).unwrap(), 0.0);
///
/// let m = DMatrix::from_row_slice(2, 2, &[2.0, 1.0, 1.0, 2.0]);
/// assert!((ln_det_pd(&m).unwrap() - 3.0_f64.ln()).abs() < 1e-12);
/// ```
pub fn ln_det_pd(mat: &DMatrix<f64>) -> Result<f64, Error> {
    let chol = pd_cholesky(mat)?;
    Ok(ln_det_cholesky(&chol))
}

/// Log-determinant together with its gradient `½(M⁻¹ + M⁻ᵀ)`.
///
/// The averaging makes the gradient symmetric to the bit even though the
/// factorization-based inverse is only symmetric up to round-off.
pub fn ln_det_pd_with_grad(
    mat: &DMatrix<f64>,
) -> Result<(f64, DMatrix<f64>), Error> {
    let chol = pd_cholesky(mat)?;
    let val = ln_det_cholesky(&chol);
    let inv = chol.inverse();
    let grad = 0.5 * (&inv + inv.transpose());
    Ok((val, grad))
}

/// Log-determinant read off an existing Cholesky factorization,
/// `2 Σᵢ ln Lᵢᵢ`
pub fn ln_det_cholesky(chol: &Cholesky<f64, Dyn>) -> f64 {
    // Only the diagonal is read; the dirty upper triangle does not matter.
    let l = chol.l_dirty();
    2.0 * (0..l.nrows()).map(|i| l[(i, i)].ln()).sum::<f64>()
}
