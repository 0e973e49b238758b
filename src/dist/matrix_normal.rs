//! Matrix-Normal prior over a matrix of means
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::dist::normal_wishart::extend_row_major;
use crate::error::Error;
use crate::impl_display;
use crate::misc::{ln_det_cholesky, pd_cholesky};
use crate::prior::ExpFamilyPrior;
use crate::traits::ExpFamily;
use nalgebra::{DMatrix, DVector};

/// Matrix-Normal density over `q × d` mean matrices with a single `q × q`
/// row-covariance (the column-covariance is the identity),
///
/// ```math
/// p(M | M₀, Σ) = MN(M | M₀, Σ, I)
/// ```
///
/// The natural parameters concatenate the flattened matrix `-½Σ⁻¹` and the
/// flattened `q × d` matrix `Σ⁻¹ M₀`; the sufficient statistics of a mean
/// `M` are the matching pair `(MMᵀ, M)`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct MatrixNormal {
    nrows: usize,
    ncols: usize,
}

/// The two groups of the Matrix-Normal family
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct MatrixNormalStats {
    /// Matrix block pairing with `MMᵀ`
    pub quadratic: DMatrix<f64>,
    /// Matrix block pairing with `M`
    pub linear: DMatrix<f64>,
}

impl MatrixNormal {
    /// Create a Matrix-Normal family over `nrows × ncols` mean matrices
    pub fn new(nrows: usize, ncols: usize) -> Result<Self, Error> {
        if nrows == 0 {
            Err(Error::ParamTooLow {
                param: "nrows",
                value: 0.0,
            })
        } else if ncols == 0 {
            Err(Error::ParamTooLow {
                param: "ncols",
                value: 0.0,
            })
        } else {
            Ok(MatrixNormal { nrows, ncols })
        }
    }

    /// Creates a new MatrixNormal without checking whether the layout is
    /// valid
    #[inline]
    pub fn new_unchecked(nrows: usize, ncols: usize) -> Self {
        MatrixNormal { nrows, ncols }
    }

    /// Get the number of rows of the mean parameter
    #[inline]
    pub fn nrows(&self) -> usize {
        self.nrows
    }

    /// Get the number of columns of the mean parameter
    #[inline]
    pub fn ncols(&self) -> usize {
        self.ncols
    }

    /// Create a Matrix-Normal prior from its standard hyper-parameters.
    ///
    /// # Arguments
    /// - mean: Expected `q × d` mean matrix
    /// - cov: Positive-definite `q × q` row-covariance of the mean
    pub fn from_params(
        mean: &DMatrix<f64>,
        cov: &DMatrix<f64>,
    ) -> Result<ExpFamilyPrior<Self>, Error> {
        let (nrows, ncols) = mean.shape();
        if nrows == 0 || ncols == 0 {
            return Err(Error::EmptyParameter { param: "mean" });
        }
        for &value in mean.iter() {
            if !value.is_finite() {
                return Err(Error::ParamNotFinite {
                    param: "mean",
                    value,
                });
            }
        }
        if !cov.is_square() {
            return Err(Error::MatrixNotSquare {
                nrows: cov.nrows(),
                ncols: cov.ncols(),
            });
        } else if cov.nrows() != nrows {
            return Err(Error::DimensionMismatch {
                expected: nrows,
                actual: cov.nrows(),
            });
        }
        let prec = pd_cholesky(cov)?.inverse();

        let mut eta =
            Vec::with_capacity(nrows * nrows + nrows * ncols);
        extend_row_major(&mut eta, &(-0.5 * &prec));
        extend_row_major(&mut eta, &(&prec * mean));
        ExpFamilyPrior::new(
            MatrixNormal { nrows, ncols },
            DVector::from_vec(eta),
        )
    }
}

impl From<&MatrixNormal> for String {
    fn from(mn: &MatrixNormal) -> String {
        format!("Matrix-Normal(nrows: {}, ncols: {})", mn.nrows, mn.ncols)
    }
}

impl_display!(MatrixNormal);

impl ExpFamily for MatrixNormal {
    type Stats = MatrixNormalStats;

    #[inline]
    fn nparams(&self) -> usize {
        self.nrows * self.nrows + self.nrows * self.ncols
    }

    fn split_sufficient_statistics(
        &self,
        s_stats: &DVector<f64>,
    ) -> Result<MatrixNormalStats, Error> {
        self.check_len(s_stats)?;
        let (q, d) = (self.nrows, self.ncols);
        let s = s_stats.as_slice();
        Ok(MatrixNormalStats {
            quadratic: DMatrix::from_row_slice(q, q, &s[..q * q]),
            linear: DMatrix::from_row_slice(q, d, &s[q * q..]),
        })
    }

    fn log_norm(&self, natural_hparams: &DVector<f64>) -> Result<f64, Error> {
        let stats = self.split_sufficient_statistics(natural_hparams)?;
        let prec = -2.0 * &stats.quadratic;
        let chol = pd_cholesky(&prec)?;
        let solved = chol.solve(&stats.linear);
        Ok(-0.5 * self.ncols as f64 * ln_det_cholesky(&chol)
            + 0.5 * stats.linear.dot(&solved))
    }

    fn grad_log_norm(
        &self,
        natural_hparams: &DVector<f64>,
    ) -> Result<DVector<f64>, Error> {
        let stats = self.split_sufficient_statistics(natural_hparams)?;
        let prec = -2.0 * &stats.quadratic;
        let chol = pd_cholesky(&prec)?;
        let inv = chol.inverse();
        let cov = 0.5 * (&inv + inv.transpose());
        let mu = &cov * &stats.linear;

        // ⟨MMᵀ⟩ = dΣ + M₀M₀ᵀ and ⟨M⟩ = M₀.
        let mut grad = Vec::with_capacity(self.nparams());
        extend_row_major(
            &mut grad,
            &(self.ncols as f64 * &cov + &mu * mu.transpose()),
        );
        extend_row_major(&mut grad, &mu);
        Ok(DVector::from_vec(grad))
    }
}
