//! Joint Normal-Gamma prior: several means sharing one diagonal precision
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::dist::normal_gamma::{validate_finite, validate_positive};
use crate::error::Error;
use crate::impl_display;
use crate::prior::ExpFamilyPrior;
use crate::traits::ExpFamily;
use nalgebra::{DMatrix, DVector};
use special::Gamma as _;

/// Joint Normal-Gamma density over a set of `K` mean vectors
/// `M = (μ₁, ..., μ_K)ᵀ` and the shared diagonal `λ` of their precision
/// matrix,
///
/// ```math
/// p(M, λ | m, κ, a, b) = [Π_k N(μ_k | m_k, (κ_k diag(λ))⁻¹)] G(λ | a, b)
/// ```
///
/// The natural parameters concatenate a `dim` quadratic block, the
/// `ncomp × dim` linear and scale blocks flattened component by component,
/// and a `dim` shape block.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct JointNormalGamma {
    ncomp: usize,
    dim: usize,
}

/// The four groups of the joint Normal-Gamma family
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct JointNormalGammaStats {
    /// Per-dimension block pairing with `-½λ`
    pub quadratic: DVector<f64>,
    /// Per-component blocks pairing with `λμ_k`
    pub linear: DMatrix<f64>,
    /// Per-component blocks pairing with `-½λμ_k²`
    pub scale: DMatrix<f64>,
    /// Per-dimension block pairing with `½ ln λ`
    pub shape: DVector<f64>,
}

impl JointNormalGamma {
    /// Create a joint Normal-Gamma family over `ncomp` components of
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
            Ok(JointNormalGamma { ncomp, dim })
        }
    }

    /// Creates a new JointNormalGamma without checking whether the layout is
    /// valid
    #[inline]
    pub fn new_unchecked(ncomp: usize, dim: usize) -> Self {
        JointNormalGamma { ncomp, dim }
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

    /// Create a joint Normal-Gamma prior from its standard hyper-parameters.
    ///
    /// # Arguments
    /// - means: Means of the Normal components, one `dim`-row per component
    /// - scales: Scales of the Normal components, same shape as `means`
    /// - shape: Shape parameter of the Gamma, per dimension
    /// - rate: Rate parameter of the Gamma, per dimension
    pub fn from_params(
        means: &DMatrix<f64>,
        scales: &DMatrix<f64>,
        shape: &DVector<f64>,
        rate: &DVector<f64>,
    ) -> Result<ExpFamilyPrior<Self>, Error> {
        let (ncomp, dim) = means.shape();
        if ncomp == 0 || dim == 0 {
            return Err(Error::EmptyParameter { param: "means" });
        }
        if scales.shape() != (ncomp, dim) {
            return Err(Error::DimensionMismatch {
                expected: ncomp * dim,
                actual: scales.len(),
            });
        }
        for other in [shape, rate] {
            if other.len() != dim {
                return Err(Error::DimensionMismatch {
                    expected: dim,
                    actual: other.len(),
                });
            }
        }
        for k in 0..ncomp {
            validate_finite("means", &means.row(k).transpose())?;
            validate_positive("scales", &scales.row(k).transpose())?;
        }
        validate_positive("shape", shape)?;
        validate_positive("rate", rate)?;

        let mut eta = Vec::with_capacity(2 * dim + 2 * ncomp * dim);
        eta.extend((0..dim).map(|d| {
            let quad: f64 = (0..ncomp)
                .map(|k| scales[(k, d)] * means[(k, d)] * means[(k, d)])
                .sum();
            quad + 2.0 * rate[d]
        }));
        for k in 0..ncomp {
            for d in 0..dim {
                eta.push(scales[(k, d)] * means[(k, d)]);
            }
        }
        for k in 0..ncomp {
            for d in 0..dim {
                eta.push(scales[(k, d)]);
            }
        }
        eta.extend((0..dim).map(|d| 2.0 * shape[d] - 1.0));
        ExpFamilyPrior::new(
            JointNormalGamma { ncomp, dim },
            DVector::from_vec(eta),
        )
    }
}

impl From<&JointNormalGamma> for String {
    fn from(jng: &JointNormalGamma) -> String {
        format!(
            "Joint Normal-Gamma(ncomp: {}, dim: {})",
            jng.ncomp, jng.dim
        )
    }
}

impl_display!(JointNormalGamma);

impl ExpFamily for JointNormalGamma {
    type Stats = JointNormalGammaStats;

    #[inline]
    fn nparams(&self) -> usize {
        2 * self.dim + 2 * self.ncomp * self.dim
    }

    fn split_sufficient_statistics(
        &self,
        s_stats: &DVector<f64>,
    ) -> Result<JointNormalGammaStats, Error> {
        self.check_len(s_stats)?;
        let (k, d) = (self.ncomp, self.dim);
        let s = s_stats.as_slice();
        Ok(JointNormalGammaStats {
            quadratic: DVector::from_column_slice(&s[..d]),
            linear: DMatrix::from_row_slice(k, d, &s[d..d + k * d]),
            scale: DMatrix::from_row_slice(
                k,
                d,
                &s[d + k * d..d + 2 * k * d],
            ),
            shape: DVector::from_column_slice(&s[d + 2 * k * d..]),
        })
    }

    fn log_norm(&self, natural_hparams: &DVector<f64>) -> Result<f64, Error> {
        let stats = self.split_sufficient_statistics(natural_hparams)?;
        let mut lognorm = 0.0;
        for d in 0..self.dim {
            let (a, delta) = checked_shape_delta(&stats, self.ncomp, d)?;
            lognorm += a.ln_gamma().0 - a * delta.ln();
            for k in 0..self.ncomp {
                lognorm -= 0.5 * stats.scale[(k, d)].ln();
            }
        }
        Ok(lognorm)
    }

    fn grad_log_norm(
        &self,
        natural_hparams: &DVector<f64>,
    ) -> Result<DVector<f64>, Error> {
        let stats = self.split_sufficient_statistics(natural_hparams)?;
        let (ncomp, dim) = (self.ncomp, self.dim);
        let mut grad = DVector::zeros(self.nparams());
        for d in 0..dim {
            let (a, delta) = checked_shape_delta(&stats, ncomp, d)?;
            grad[d] = -a / (2.0 * delta);
            for k in 0..ncomp {
                let lin = stats.linear[(k, d)];
                let kappa = stats.scale[(k, d)];
                grad[dim + k * dim + d] = a * lin / (delta * kappa);
                grad[dim + ncomp * dim + k * dim + d] = -0.5 / kappa
                    - a * lin * lin / (2.0 * delta * kappa * kappa);
            }
            grad[dim + 2 * ncomp * dim + d] =
                0.5 * (a.digamma() - delta.ln());
        }
        Ok(grad)
    }
}

/// Recover the shape a = ½(η₄ + 1) and rate Δ = ½(η₁ - Σ_k η₂ₖ²/η₃ₖ) of
/// dimension `d`, rejecting points where the log-normalizer is undefined.
fn checked_shape_delta(
    stats: &JointNormalGammaStats,
    ncomp: usize,
    d: usize,
) -> Result<(f64, f64), Error> {
    let mut explained = 0.0;
    for k in 0..ncomp {
        let kappa = stats.scale[(k, d)];
        if kappa <= 0.0 {
            return Err(Error::ParamTooLow {
                param: "scales",
                value: kappa,
            });
        }
        explained += stats.linear[(k, d)] * stats.linear[(k, d)] / kappa;
    }
    let a = 0.5 * (stats.shape[d] + 1.0);
    if a <= 0.0 {
        return Err(Error::ParamTooLow {
            param: "shape",
            value: a,
        });
    }
    let delta = 0.5 * (stats.quadratic[d] - explained);
    if delta <= 0.0 {
        return Err(Error::ParamTooLow {
            param: "rate",
            value: delta,
        });
    }
    Ok((a, delta))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dist::NormalGamma;

    const TOL: f64 = 1E-10;

    fn vec(xs: &[f64]) -> DVector<f64> {
        DVector::from_column_slice(xs)
    }

    fn fixture() -> ExpFamilyPrior<JointNormalGamma> {
        let means =
            DMatrix::from_row_slice(3, 2, &[0.5, -0.5, 1.0, 2.0, 0.0, 1.5]);
        let scales = DMatrix::from_row_slice(
            3,
            2,
            &[1.0, 2.0, 0.5, 1.0, 2.0, 1.5],
        );
        JointNormalGamma::from_params(
            &means,
            &scales,
            &vec(&[2.0, 3.0]),
            &vec(&[1.0, 2.0]),
        )
        .unwrap()
    }

    #[test]
    fn split_shapes_for_three_components_dim_two() {
        let prior = fixture();
        let stats = prior
            .split_sufficient_statistics(prior.natural_hparams())
            .unwrap();
        assert_eq!(stats.quadratic.len(), 2);
        assert_eq!(stats.linear.shape(), (3, 2));
        assert_eq!(stats.scale.shape(), (3, 2));
        assert_eq!(stats.shape.len(), 2);
    }

    #[test]
    fn split_then_concatenate_is_the_identity() {
        let prior = fixture();
        let eta = prior.natural_hparams();
        let stats = prior.split_sufficient_statistics(eta).unwrap();

        let mut rebuilt = Vec::with_capacity(eta.len());
        rebuilt.extend(stats.quadratic.iter().copied());
        for k in 0..3 {
            for d in 0..2 {
                rebuilt.push(stats.linear[(k, d)]);
            }
        }
        for k in 0..3 {
            for d in 0..2 {
                rebuilt.push(stats.scale[(k, d)]);
            }
        }
        rebuilt.extend(stats.shape.iter().copied());
        assert_eq!(eta.as_slice(), rebuilt.as_slice());
    }

    #[test]
    fn single_component_matches_normal_gamma() {
        let mean = vec(&[0.5, -1.0]);
        let scale = vec(&[2.0, 1.5]);
        let shape = vec(&[3.0, 2.0]);
        let rate = vec(&[2.0, 0.5]);

        let joint = JointNormalGamma::from_params(
            &DMatrix::from_row_slice(1, 2, mean.as_slice()),
            &DMatrix::from_row_slice(1, 2, scale.as_slice()),
            &shape,
            &rate,
        )
        .unwrap();
        let single =
            NormalGamma::from_params(&mean, &scale, &shape, &rate).unwrap();

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
    fn from_params_rejects_mismatched_scales() {
        let means = DMatrix::from_row_slice(2, 2, &[0.0; 4]);
        let scales = DMatrix::from_row_slice(2, 1, &[1.0; 2]);
        let res = JointNormalGamma::from_params(
            &means,
            &scales,
            &vec(&[1.0, 1.0]),
            &vec(&[1.0, 1.0]),
        );
        assert!(res.is_err());
    }

    #[test]
    fn disallow_degenerate_layout() {
        assert!(JointNormalGamma::new(0, 2).is_err());
        assert!(JointNormalGamma::new(2, 0).is_err());
        assert!(JointNormalGamma::new(3, 2).is_ok());
    }
}
