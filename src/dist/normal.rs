//! Normal priors over a mean vector, with full or isotropic covariance
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::dist::normal_gamma::validate_finite;
use crate::dist::normal_wishart::extend_row_major;
use crate::error::Error;
use crate::impl_display;
use crate::misc::{ln_det_cholesky, pd_cholesky};
use crate::prior::ExpFamilyPrior;
use crate::traits::ExpFamily;
use nalgebra::{DMatrix, DVector};

/// Normal density with a full covariance matrix,
///
/// ```math
/// p(μ | m, Σ) = N(μ | m, Σ)
/// ```
///
/// The natural parameters concatenate the flattened matrix `-½Σ⁻¹` and the
/// vector `Σ⁻¹ m`; the sufficient statistics of a mean `μ` are the matching
/// pair `(μμᵀ, μ)`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct NormalFullCovariance {
    dim: usize,
}

/// The two groups of the full-covariance Normal family
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct NormalStats {
    /// Matrix block pairing with `μμᵀ`
    pub quadratic: DMatrix<f64>,
    /// Vector block pairing with `μ`
    pub linear: DVector<f64>,
}

impl NormalFullCovariance {
    /// Create a full-covariance Normal family of dimension `dim`
    pub fn new(dim: usize) -> Result<Self, Error> {
        if dim == 0 {
            Err(Error::ParamTooLow {
                param: "dim",
                value: 0.0,
            })
        } else {
            Ok(NormalFullCovariance { dim })
        }
    }

    /// Creates a new NormalFullCovariance without checking whether the
    /// dimension is valid
    #[inline]
    pub fn new_unchecked(dim: usize) -> Self {
        NormalFullCovariance { dim }
    }

    /// Get the dimension of the mean parameter
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Create a Normal prior from its standard hyper-parameters.
    ///
    /// # Arguments
    /// - mean: Expected mean
    /// - cov: Positive-definite covariance of the mean
    pub fn from_params(
        mean: &DVector<f64>,
        cov: &DMatrix<f64>,
    ) -> Result<ExpFamilyPrior<Self>, Error> {
        let dim = mean.len();
        if dim == 0 {
            return Err(Error::EmptyParameter { param: "mean" });
        }
        validate_finite("mean", mean)?;
        if !cov.is_square() {
            return Err(Error::MatrixNotSquare {
                nrows: cov.nrows(),
                ncols: cov.ncols(),
            });
        } else if cov.nrows() != dim {
            return Err(Error::DimensionMismatch {
                expected: dim,
                actual: cov.nrows(),
            });
        }
        let prec = pd_cholesky(cov)?.inverse();

        let mut eta = Vec::with_capacity(dim * dim + dim);
        extend_row_major(&mut eta, &(-0.5 * &prec));
        eta.extend((&prec * mean).iter().copied());
        ExpFamilyPrior::new(
            NormalFullCovariance { dim },
            DVector::from_vec(eta),
        )
    }
}

impl From<&NormalFullCovariance> for String {
    fn from(nfc: &NormalFullCovariance) -> String {
        format!("Normal(dim: {})", nfc.dim)
    }
}

impl_display!(NormalFullCovariance);

impl ExpFamily for NormalFullCovariance {
    type Stats = NormalStats;

    #[inline]
    fn nparams(&self) -> usize {
        self.dim * self.dim + self.dim
    }

    fn split_sufficient_statistics(
        &self,
        s_stats: &DVector<f64>,
    ) -> Result<NormalStats, Error> {
        self.check_len(s_stats)?;
        let d = self.dim;
        let s = s_stats.as_slice();
        Ok(NormalStats {
            quadratic: DMatrix::from_row_slice(d, d, &s[..d * d]),
            linear: DVector::from_column_slice(&s[d * d..]),
        })
    }

    fn log_norm(&self, natural_hparams: &DVector<f64>) -> Result<f64, Error> {
        let stats = self.split_sufficient_statistics(natural_hparams)?;
        // η₁ = -½Σ⁻¹ is negative-definite; -2η₁ is the precision.
        let prec = -2.0 * &stats.quadratic;
        let chol = pd_cholesky(&prec)?;
        let solved = chol.solve(&stats.linear);
        Ok(-0.5 * ln_det_cholesky(&chol)
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

        // ⟨μμᵀ⟩ = Σ + μμᵀ and ⟨μ⟩ = μ.
        let mut grad = Vec::with_capacity(self.nparams());
        extend_row_major(&mut grad, &(&cov + &mu * mu.transpose()));
        grad.extend(mu.iter().copied());
        Ok(DVector::from_vec(grad))
    }
}

/// Normal density whose covariance is a scaled identity,
///
/// ```math
/// p(μ | m, σ²) = N(μ | m, σ² I)
/// ```
///
/// The natural parameters are the scalar `-½/σ²` followed by the vector
/// `m/σ²`; the sufficient statistics of a mean `μ` are `(μᵀμ, μ)`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct NormalIsotropic {
    dim: usize,
}

/// The two groups of the isotropic Normal family
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct IsotropicNormalStats {
    /// Scalar pairing with `μᵀμ`
    pub quadratic: f64,
    /// Vector block pairing with `μ`
    pub linear: DVector<f64>,
}

impl NormalIsotropic {
    /// Create an isotropic Normal family of dimension `dim`
    pub fn new(dim: usize) -> Result<Self, Error> {
        if dim == 0 {
            Err(Error::ParamTooLow {
                param: "dim",
                value: 0.0,
            })
        } else {
            Ok(NormalIsotropic { dim })
        }
    }

    /// Creates a new NormalIsotropic without checking whether the dimension
    /// is valid
    #[inline]
    pub fn new_unchecked(dim: usize) -> Self {
        NormalIsotropic { dim }
    }

    /// Get the dimension of the mean parameter
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Create an isotropic Normal prior from its standard hyper-parameters.
    ///
    /// # Arguments
    /// - mean: Expected mean
    /// - variance: The shared per-dimension variance; σ² > 0
    pub fn from_params(
        mean: &DVector<f64>,
        variance: f64,
    ) -> Result<ExpFamilyPrior<Self>, Error> {
        let dim = mean.len();
        if dim == 0 {
            return Err(Error::EmptyParameter { param: "mean" });
        }
        validate_finite("mean", mean)?;
        if !variance.is_finite() {
            return Err(Error::ParamNotFinite {
                param: "variance",
                value: variance,
            });
        } else if variance <= 0.0 {
            return Err(Error::ParamTooLow {
                param: "variance",
                value: variance,
            });
        }
        let prec = variance.recip();

        let mut eta = Vec::with_capacity(dim + 1);
        eta.push(-0.5 * prec);
        eta.extend((prec * mean).iter().copied());
        ExpFamilyPrior::new(NormalIsotropic { dim }, DVector::from_vec(eta))
    }
}

impl From<&NormalIsotropic> for String {
    fn from(niso: &NormalIsotropic) -> String {
        format!("Normal(dim: {}, isotropic)", niso.dim)
    }
}

impl_display!(NormalIsotropic);

impl ExpFamily for NormalIsotropic {
    type Stats = IsotropicNormalStats;

    #[inline]
    fn nparams(&self) -> usize {
        self.dim + 1
    }

    fn split_sufficient_statistics(
        &self,
        s_stats: &DVector<f64>,
    ) -> Result<IsotropicNormalStats, Error> {
        self.check_len(s_stats)?;
        let s = s_stats.as_slice();
        Ok(IsotropicNormalStats {
            quadratic: s[0],
            linear: DVector::from_column_slice(&s[1..]),
        })
    }

    fn log_norm(&self, natural_hparams: &DVector<f64>) -> Result<f64, Error> {
        let stats = self.split_sufficient_statistics(natural_hparams)?;
        let prec = checked_precision(stats.quadratic)?;
        let df = self.dim as f64;
        Ok(-0.5 * df * prec.ln()
            - 0.25 * stats.linear.dot(&stats.linear) / stats.quadratic)
    }

    fn grad_log_norm(
        &self,
        natural_hparams: &DVector<f64>,
    ) -> Result<DVector<f64>, Error> {
        let stats = self.split_sufficient_statistics(natural_hparams)?;
        checked_precision(stats.quadratic)?;
        let df = self.dim as f64;
        let q = stats.quadratic;
        let sq_norm = stats.linear.dot(&stats.linear);

        let mut grad = Vec::with_capacity(self.nparams());
        grad.push(-df / (2.0 * q) + 0.25 * sq_norm / (q * q));
        grad.extend((-0.5 / q * &stats.linear).iter().copied());
        Ok(DVector::from_vec(grad))
    }
}

/// Recover the precision `-2η₁`, rejecting points where the log-normalizer
/// is undefined.
fn checked_precision(quadratic: f64) -> Result<f64, Error> {
    let prec = -2.0 * quadratic;
    if prec <= 0.0 {
        Err(Error::ParamTooLow {
            param: "precision",
            value: prec,
        })
    } else {
        Ok(prec)
    }
}
