//! Joint Normal-Wishart prior: several means sharing one full precision
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::dist::normal_gamma::{validate_finite, validate_positive};
use crate::dist::normal_wishart::{
    extend_row_major, wishart_gamma_term, wishart_gamma_term_grad,
};
use crate::error::Error;
use crate::impl_display;
use crate::misc::{ln_det_pd, ln_det_pd_with_grad, pd_cholesky};
use crate::prior::ExpFamilyPrior;
use crate::traits::ExpFamily;
use nalgebra::{DMatrix, DVector};
use std::f64::consts::LN_2;

/// Joint Normal-Wishart density over a set of `K` mean vectors
/// `M = (μ₁, ..., μ_K)ᵀ` and a shared precision matrix `Λ`,
///
/// ```math
/// p(M, Λ | m, κ, W, ν) = [Π_k N(μ_k | m_k, (κ_k Λ)⁻¹)] W(Λ | W, ν)
/// ```
///
/// The natural parameters concatenate the flattened `D × D` matrix
/// `Σ_k κ_k m_k m_kᵀ + W⁻¹`, the `K × D` rows `κ_k m_k` flattened component
/// by component, the `K` scales, and the scalar `ν - D`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct JointNormalWishart {
    ncomp: usize,
    dim: usize,
}

/// The four groups of the joint Normal-Wishart family
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct JointNormalWishartStats {
    /// Matrix block pairing with `-½Λ`
    pub quadratic: DMatrix<f64>,
    /// Per-component blocks pairing with `Λμ_k`
    pub linear: DMatrix<f64>,
    /// Per-component scalars pairing with `-½μ_kᵀΛμ_k`
    pub scales: DVector<f64>,
    /// Scalar pairing with `½ ln |Λ|`
    pub dof: f64,
}

impl JointNormalWishart {
    /// Create a joint Normal-Wishart family over `ncomp` components of
    /// dimension `dim`
    pub fn new(ncomp: usize, dim: usize) -> Result<Self, Error> {
        if ncomp == 0 {
            Err(Error::ParamTooLow {
                param: "ncomp",
                value: 0.0,
            })
        } else if dim == 0 {
            Err(Error::ParamTooLow {
                param: "dim",
                value: 0.0,
            })
        } else {
            Ok(JointNormalWishart { ncomp, dim })
        }
    }

    /// Creates a new JointNormalWishart without checking whether the layout
    /// is valid
    #[inline]
    pub fn new_unchecked(ncomp: usize, dim: usize) -> Self {
        JointNormalWishart { ncomp, dim }
    }

    /// Get the number of Normal components
    #[inline]
    pub fn ncomp(&self) -> usize {
        self.ncomp
    }

    /// Get the dimension of the mean parameters
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Create a joint Normal-Wishart prior from its standard
    /// hyper-parameters.
    ///
    /// # Arguments
    /// - means: Means of the Normal components, one `dim`-row per component
    /// - scales: Scales of the Normal components; κ_k > 0
    /// - scale_matrix: Positive-definite scale matrix of the Wishart
    /// - dof: Degrees of freedom of the Wishart; ν > dim - 1
    pub fn from_params(
        means: &DMatrix<f64>,
        scales: &DVector<f64>,
        scale_matrix: &DMatrix<f64>,
        dof: f64,
    ) -> Result<ExpFamilyPrior<Self>, Error> {
        let (ncomp, dim) = means.shape();
        if ncomp == 0 || dim == 0 {
            return Err(Error::EmptyParameter { param: "means" });
        }
        if scales.len() != ncomp {
            return Err(Error::DimensionMismatch {
                expected: ncomp,
                actual: scales.len(),
            });
        }
        for k in 0..ncomp {
            validate_finite("means", &means.row(k).transpose())?;
        }
        validate_positive("scales", scales)?;
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

        let mut quad = inv_scale;
        for k in 0..ncomp {
            let mk = means.row(k).transpose();
            quad += scales[k] * &mk * mk.transpose();
        }
        let mut eta =
            Vec::with_capacity(dim * dim + ncomp * dim + ncomp + 1);
        extend_row_major(&mut eta, &quad);
        for k in 0..ncomp {
            for d in 0..dim {
                eta.push(scales[k] * means[(k, d)]);
            }
        }
        eta.extend(scales.iter().copied());
        eta.push(dof - dim as f64);
        ExpFamilyPrior::new(
            JointNormalWishart { ncomp, dim },
            DVector::from_vec(eta),
        )
    }
}

impl From<&JointNormalWishart> for String {
    fn from(jnw: &JointNormalWishart) -> String {
        format!(
            "Joint Normal-Wishart(ncomp: {}, dim: {})",
            jnw.ncomp, jnw.dim
        )
    }
}

impl_display!(JointNormalWishart);

impl ExpFamily for JointNormalWishart {
    type Stats = JointNormalWishartStats;

    #[inline]
    fn nparams(&self) -> usize {
        self.dim * self.dim + self.ncomp * self.dim + self.ncomp + 1
    }

    fn split_sufficient_statistics(
        &self,
        s_stats: &DVector<f64>,
    ) -> Result<JointNormalWishartStats, Error> {
        self.check_len(s_stats)?;
        let (k, d) = (self.ncomp, self.dim);
        let s = s_stats.as_slice();
        Ok(JointNormalWishartStats {
            quadratic: DMatrix::from_row_slice(d, d, &s[..d * d]),
            linear: DMatrix::from_row_slice(
                k,
                d,
                &s[d * d..d * d + k * d],
            ),
            scales: DVector::from_column_slice(
                &s[d * d + k * d..d * d + k * d + k],
            ),
            dof: s[d * d + k * d + k],
        })
    }

    fn log_norm(&self, natural_hparams: &DVector<f64>) -> Result<f64, Error> {
        let stats = self.split_sufficient_statistics(natural_hparams)?;
        let df = self.dim as f64;
        let nu = stats.dof + df;
        let m = explained_quadratic(&stats, self.ncomp)?;
        let ln_det = ln_det_pd(&m)?;
        let ln_scales: f64 = stats.scales.iter().map(|k| k.ln()).sum();
        Ok(0.5 * (nu * df * LN_2 - df * ln_scales) - 0.5 * nu * ln_det
            + wishart_gamma_term(self.dim, nu))
    }

    fn grad_log_norm(
        &self,
        natural_hparams: &DVector<f64>,
    ) -> Result<DVector<f64>, Error> {
        let stats = self.split_sufficient_statistics(natural_hparams)?;
        let df = self.dim as f64;
        let nu = stats.dof + df;
        let m = explained_quadratic(&stats, self.ncomp)?;
        let (ln_det, m_inv) = ln_det_pd_with_grad(&m)?;

        let mut grad = Vec::with_capacity(self.nparams());
        extend_row_major(&mut grad, &(-0.5 * nu * &m_inv));
        let mut scale_grads = Vec::with_capacity(self.ncomp);
        for k in 0..self.ncomp {
            let kappa = stats.scales[k];
            let lk = stats.linear.row(k).transpose();
            let w = &m_inv * &lk;
            grad.extend((nu / kappa * &w).iter().copied());
            scale_grads.push(
                -df / (2.0 * kappa)
                    - 0.5 * nu * lk.dot(&w) / (kappa * kappa),
            );
        }
        grad.extend(scale_grads);
        grad.push(
            0.5 * df * LN_2 - 0.5 * ln_det
                + wishart_gamma_term_grad(self.dim, nu),
        );
        Ok(DVector::from_vec(grad))
    }
}

/// The matrix η₁ - Σ_k η₂ₖ η₂ₖᵀ / η₃ₖ inside the log-determinant
fn explained_quadratic(
    stats: &JointNormalWishartStats,
    ncomp: usize,
) -> Result<DMatrix<f64>, Error> {
    let mut m = stats.quadratic.clone();
    for k in 0..ncomp {
        let kappa = stats.scales[k];
        if kappa <= 0.0 {
            return Err(Error::ParamTooLow {
                param: "scales",
                value: kappa,
            });
        }
        let lk = stats.linear.row(k).transpose();
        m -= &lk * lk.transpose() / kappa;
    }
    Ok(m)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dist::NormalWishart;

    const TOL: f64 = 1E-10;

    fn fixture() -> ExpFamilyPrior<JointNormalWishart> {
        let means =
            DMatrix::from_row_slice(3, 2, &[0.5, -0.5, 1.0, 2.0, 0.0, 1.5]);
        let scales = DVector::from_column_slice(&[1.0, 2.0, 0.5]);
        let scale_matrix =
            DMatrix::from_row_slice(2, 2, &[2.0, 0.5, 0.5, 1.0]);
        JointNormalWishart::from_params(&means, &scales, &scale_matrix, 4.0)
            .unwrap()
    }

    #[test]
    fn split_shapes_for_three_components_dim_two() {
        let prior = fixture();
        let stats = prior
            .split_sufficient_statistics(prior.natural_hparams())
            .unwrap();
        assert_eq!(stats.quadratic.shape(), (2, 2));
        assert_eq!(stats.linear.shape(), (3, 2));
        assert_eq!(stats.scales.len(), 3);
        assert_eq!(stats.dof, 2.0);
    }

    #[test]
    fn split_then_concatenate_is_the_identity() {
        let prior = fixture();
        let eta = prior.natural_hparams();
        let stats = prior.split_sufficient_statistics(eta).unwrap();

        let mut rebuilt = Vec::with_capacity(eta.len());
        extend_row_major(&mut rebuilt, &stats.quadratic);
        for k in 0..3 {
            for d in 0..2 {
                rebuilt.push(stats.linear[(k, d)]);
            }
        }
        rebuilt.extend(stats.scales.iter().copied());
        rebuilt.push(stats.dof);
        assert_eq!(eta.as_slice(), rebuilt.as_slice());
    }

    #[test]
    fn single_component_matches_normal_wishart() {
        let mean = DVector::from_column_slice(&[0.5, -1.0]);
        let scale_matrix =
            DMatrix::from_row_slice(2, 2, &[2.0, 0.5, 0.5, 1.0]);

        let joint = JointNormalWishart::from_params(
            &DMatrix::from_row_slice(1, 2, mean.as_slice()),
            &DVector::from_column_slice(&[2.0]),
            &scale_matrix,
            3.5,
        )
        .unwrap();
        let single =
            NormalWishart::from_params(&mean, 2.0, &scale_matrix, 3.5)
                .unwrap();

        assert_eq!(
            joint.natural_hparams().as_slice(),
            single.natural_hparams().as_slice(),
        );
        assert::close(joint.log_norm(), single.log_norm(), TOL);
        for i in 0..8 {
            assert::close(
                joint.expected_sufficient_statistics()[i],
                single.expected_sufficient_statistics()[i],
                TOL,
            );
        }
    }

    #[test]
    fn quadratic_block_recovers_inverse_scale_plus_outer_products() {
        // With a single zero mean the quadratic block is exactly W⁻¹.
        let means = DMatrix::zeros(1, 2);
        let scales = DVector::from_column_slice(&[1.0]);
        let prior = JointNormalWishart::from_params(
            &means,
            &scales,
            &DMatrix::identity(2, 2),
            3.0,
        )
        .unwrap();
        assert_eq!(
            prior.natural_hparams().as_slice(),
            &[1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0],
        );
    }

    #[test]
    fn from_params_rejects_mismatched_scales() {
        let means = DMatrix::zeros(2, 2);
        let scales = DVector::from_column_slice(&[1.0]);
        let res = JointNormalWishart::from_params(
            &means,
            &scales,
            &DMatrix::identity(2, 2),
            3.0,
        );
        assert!(res.is_err());
    }

    #[test]
    fn from_params_rejects_low_dof() {
        let means = DMatrix::zeros(2, 2);
        let scales = DVector::from_column_slice(&[1.0, 1.0]);
        let res = JointNormalWishart::from_params(
            &means,
            &scales,
            &DMatrix::identity(2, 2),
            0.5,
        );
        match res {
            Err(Error::DofTooLow { dim: 2, .. }) => (),
            other => panic!("unexpected result: {:?}", other),
        }
    }
}
