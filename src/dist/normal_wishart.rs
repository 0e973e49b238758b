//! Normal-Wishart prior over the mean and full precision of a Normal
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::consts::LN_PI;
use crate::dist::normal_gamma::validate_finite;
use crate::error::Error;
use crate::impl_display;
use crate::misc::{
    ln_det_pd, ln_det_pd_with_grad, lnmv_gamma, mv_digamma, pd_cholesky,
};
use crate::prior::ExpFamilyPrior;
use crate::traits::ExpFamily;
use nalgebra::{DMatrix, DVector};
use std::f64::consts::LN_2;

/// Normal-Wishart density
///
/// ```math
/// p(μ, Λ | m, κ, W, ν) = N(μ | m, (κΛ)⁻¹) W(Λ | W, ν)
/// ```
///
/// where `μ` and `Λ` are the mean and precision matrix of a multivariate
/// Normal, `m` and `κ` the hyper-parameter mean and scale of the Normal, and
/// `W` and `ν` the scale matrix and degrees of freedom of the Wishart.
///
/// The natural parameters concatenate the flattened `D × D` matrix
/// `κ m mᵀ + W⁻¹`, the vector `κ m`, and the scalars `κ` and `ν - D`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct NormalWishart {
    dim: usize,
}

/// The four groups of the Normal-Wishart family
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct NormalWishartStats {
    /// Matrix block pairing with `-½Λ`
    pub quadratic: DMatrix<f64>,
    /// Vector block pairing with `Λμ`
    pub linear: DVector<f64>,
    /// Scalar pairing with `-½μᵀΛμ`
    pub scale: f64,
    /// Scalar pairing with `½ ln |Λ|`
    pub dof: f64,
}

impl NormalWishart {
    /// Create a Normal-Wishart family of dimension `dim`
    pub fn new(dim: usize) -> Result<Self, Error> {
        if dim == 0 {
            Err(Error::ParamTooLow {
                param: "dim",
                value: 0.0,
            })
        } else {
            Ok(NormalWishart { dim })
        }
    }

    /// Creates a new NormalWishart without checking whether the dimension is
    /// valid
    #[inline]
    pub fn new_unchecked(dim: usize) -> Self {
        NormalWishart { dim }
    }

    /// Get the dimension of the mean parameter
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Create a Normal-Wishart prior from its standard hyper-parameters.
    ///
    /// # Arguments
    /// - mean: Mean of the Normal
    /// - scale: Scale of the Normal; κ > 0
    /// - scale_matrix: Positive-definite scale matrix of the Wishart
    /// - dof: Degrees of freedom of the Wishart; ν > dim - 1
    pub fn from_params(
        mean: &DVector<f64>,
        scale: f64,
        scale_matrix: &DMatrix<f64>,
        dof: f64,
    ) -> Result<ExpFamilyPrior<Self>, Error> {
        let dim = mean.len();
        if dim == 0 {
            return Err(Error::EmptyParameter { param: "mean" });
        }
        validate_finite("mean", mean)?;
        if !scale.is_finite() {
            return Err(Error::ParamNotFinite {
                param: "scale",
                value: scale,
            });
        } else if scale <= 0.0 {
            return Err(Error::ParamTooLow {
                param: "scale",
                value: scale,
            });
        }
        if !scale_matrix.is_square() {
            return Err(Error::MatrixNotSquare {
                nrows: scale_matrix.nrows(),
                ncols: scale_matrix.ncols(),
            });
        } else if scale_matrix.nrows() != dim {
            return Err(Error::DimensionMismatch {
                expected: dim,
                actual: scale_matrix.nrows(),
            });
        }
        if !dof.is_finite() {
            return Err(Error::ParamNotFinite {
                param: "dof",
                value: dof,
            });
        } else if dof <= dim as f64 - 1.0 {
            return Err(Error::DofTooLow { dof, dim });
        }
        let inv_scale = pd_cholesky(scale_matrix)?.inverse();

        let quad = scale * mean * mean.transpose() + inv_scale;
        let mut eta = Vec::with_capacity(dim * dim + dim + 2);
        extend_row_major(&mut eta, &quad);
        eta.extend((scale * mean).iter().copied());
        eta.push(scale);
        eta.push(dof - dim as f64);
        ExpFamilyPrior::new(NormalWishart { dim }, DVector::from_vec(eta))
    }
}

pub(crate) fn extend_row_major(buf: &mut Vec<f64>, mat: &DMatrix<f64>) {
    for i in 0..mat.nrows() {
        for j in 0..mat.ncols() {
            buf.push(mat[(i, j)]);
        }
    }
}

/// Σ_{i=1..dim} ln Γ((ν + 1 - i)/2), written through the multivariate gamma
/// function ln Γ_dim(ν/2) = dim(dim-1)/4 · ln π + Σ_i ln Γ((ν + 1 - i)/2).
pub(crate) fn wishart_gamma_term(dim: usize, nu: f64) -> f64 {
    lnmv_gamma(dim, 0.5 * nu) - (dim * (dim - 1)) as f64 / 4.0 * LN_PI
}

/// Derivative of [`wishart_gamma_term`] with respect to ν
pub(crate) fn wishart_gamma_term_grad(dim: usize, nu: f64) -> f64 {
    0.5 * mv_digamma(dim, 0.5 * nu)
}

impl From<&NormalWishart> for String {
    fn from(nw: &NormalWishart) -> String {
        format!("Normal-Wishart(dim: {})", nw.dim)
    }
}

impl_display!(NormalWishart);

impl ExpFamily for NormalWishart {
    type Stats = NormalWishartStats;

    #[inline]
    fn nparams(&self) -> usize {
        self.dim * self.dim + self.dim + 2
    }

    fn split_sufficient_statistics(
        &self,
        s_stats: &DVector<f64>,
    ) -> Result<NormalWishartStats, Error> {
        self.check_len(s_stats)?;
        let d = self.dim;
        let s = s_stats.as_slice();
        Ok(NormalWishartStats {
            quadratic: DMatrix::from_row_slice(d, d, &s[..d * d]),
            linear: DVector::from_column_slice(&s[d * d..d * d + d]),
            scale: s[d * d + d],
            dof: s[d * d + d + 1],
        })
    }

    fn log_norm(&self, natural_hparams: &DVector<f64>) -> Result<f64, Error> {
        let stats = self.split_sufficient_statistics(natural_hparams)?;
        let df = self.dim as f64;
        let nu = stats.dof + df;
        let kappa = checked_scale(stats.scale)?;
        let m = &stats.quadratic
            - (&stats.linear * stats.linear.transpose()) / kappa;
        let ln_det = ln_det_pd(&m)?;
        Ok(0.5 * (nu * df * LN_2 - df * kappa.ln()) - 0.5 * nu * ln_det
            + wishart_gamma_term(self.dim, nu))
    }

    fn grad_log_norm(
        &self,
        natural_hparams: &DVector<f64>,
    ) -> Result<DVector<f64>, Error> {
        let stats = self.split_sufficient_statistics(natural_hparams)?;
        let d = self.dim;
        let df = d as f64;
        let nu = stats.dof + df;
        let kappa = checked_scale(stats.scale)?;
        let m = &stats.quadratic
            - (&stats.linear * stats.linear.transpose()) / kappa;
        let (ln_det, m_inv) = ln_det_pd_with_grad(&m)?;
        let w = &m_inv * &stats.linear;

        let mut grad = Vec::with_capacity(self.nparams());
        extend_row_major(&mut grad, &(-0.5 * nu * &m_inv));
        grad.extend((nu / kappa * &w).iter().copied());
        grad.push(
            -df / (2.0 * kappa)
                - 0.5 * nu * stats.linear.dot(&w) / (kappa * kappa),
        );
        grad.push(
            0.5 * df * LN_2 - 0.5 * ln_det
                + wishart_gamma_term_grad(d, nu),
        );
        Ok(DVector::from_vec(grad))
    }
}

fn checked_scale(scale: f64) -> Result<f64, Error> {
    if scale <= 0.0 {
        Err(Error::ParamTooLow {
            param: "scale",
            value: scale,
        })
    } else {
        Ok(scale)
    }
}
