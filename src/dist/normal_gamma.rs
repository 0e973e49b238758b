//! Normal-Gamma prior over the mean and diagonal precision of a Normal
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::impl_display;
use crate::prior::ExpFamilyPrior;
use crate::traits::ExpFamily;
use nalgebra::DVector;
use special::Gamma as _;

/// Normal-Gamma density
///
/// ```math
/// p(μ, λ | m, κ, a, b) = N(μ | m, (κ diag(λ))⁻¹) G(λ | a, b)
/// ```
///
/// Strictly speaking the Normal-Gamma is a density over a one-dimensional
/// mean and precision; here `μ` and `λ` are a `D`-dimensional mean and the
/// diagonal of a `D × D` precision matrix, so the family behaves as the
/// concatenation of `D` independent scalar Normal-Gamma densities.
///
/// The natural parameters are the four `D`-blocks
/// `η = (κ m² + 2b, κ m, κ, 2a - 1)`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct NormalGamma {
    dim: usize,
}

/// The four per-dimension groups of the Normal-Gamma family
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct NormalGammaStats {
    /// Block pairing with `-½λ` (quadratic contribution)
    pub quadratic: DVector<f64>,
    /// Block pairing with `λμ` (linear contribution)
    pub linear: DVector<f64>,
    /// Block pairing with `-½λμ²` (scale contribution)
    pub scale: DVector<f64>,
    /// Block pairing with `½ ln λ` (shape contribution)
    pub shape: DVector<f64>,
}

impl NormalGamma {
    /// Create a Normal-Gamma family over `dim` independent dimensions
    pub fn new(dim: usize) -> Result<Self, Error> {
        if dim == 0 {
            Err(Error::ParamTooLow {
                param: "dim",
                value: 0.0,
            })
        } else {
            Ok(NormalGamma { dim })
        }
    }

    /// Creates a new NormalGamma without checking whether the dimension is
    /// valid
    #[inline]
    pub fn new_unchecked(dim: usize) -> Self {
        NormalGamma { dim }
    }

    /// Get the number of dimensions
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Create a Normal-Gamma prior from its standard hyper-parameters.
    ///
    /// # Arguments
    /// - mean: Mean of the Normal, per dimension
    /// - scale: Scale of the Normal, per dimension; κ > 0
    /// - shape: Shape parameter of the Gamma, per dimension; a > 0
    /// - rate: Rate parameter of the Gamma, per dimension; b > 0
    ///
    /// # Example
    ///
    /// ```rust
    /// use expfam::dist::NormalGamma;
    /// use nalgebra::DVector;
    ///
    /// let mean = DVector::from_column_slice(&[0.0]);
    /// let ones = DVector::from_column_slice(&[1.0]);
    /// let prior = NormalGamma::from_params(&mean, &ones, &ones, &ones)
    ///     .unwrap();
    /// assert_eq!(
    ///     prior.natural_hparams().as_slice(),
    ///     &[2.0, 0.0, 1.0, 1.0],
    /// );
    /// ```
    pub fn from_params(
        mean: &DVector<f64>,
        scale: &DVector<f64>,
        shape: &DVector<f64>,
        rate: &DVector<f64>,
    ) -> Result<ExpFamilyPrior<Self>, Error> {
        let dim = mean.len();
        if dim == 0 {
            return Err(Error::EmptyParameter { param: "mean" });
        }
        for other in [scale, shape, rate] {
            if other.len() != dim {
                return Err(Error::DimensionMismatch {
                    expected: dim,
                    actual: other.len(),
                });
            }
        }
        validate_finite("mean", mean)?;
        validate_positive("scale", scale)?;
        validate_positive("shape", shape)?;
        validate_positive("rate", rate)?;

        let mut eta = Vec::with_capacity(4 * dim);
        eta.extend(
            (0..dim).map(|d| scale[d] * mean[d] * mean[d] + 2.0 * rate[d]),
        );
        eta.extend((0..dim).map(|d| scale[d] * mean[d]));
        eta.extend(scale.iter().copied());
        eta.extend((0..dim).map(|d| 2.0 * shape[d] - 1.0));
        ExpFamilyPrior::new(NormalGamma { dim }, DVector::from_vec(eta))
    }
}

pub(crate) fn validate_finite(
    param: &'static str,
    values: &DVector<f64>,
) -> Result<(), Error> {
    for &value in values.iter() {
        if !value.is_finite() {
            return Err(Error::ParamNotFinite { param, value });
        }
    }
    Ok(())
}

pub(crate) fn validate_positive(
    param: &'static str,
    values: &DVector<f64>,
) -> Result<(), Error> {
    validate_finite(param, values)?;
    for &value in values.iter() {
        if value <= 0.0 {
            return Err(Error::ParamTooLow { param, value });
        }
    }
    Ok(())
}

impl From<&NormalGamma> for String {
    fn from(ng: &NormalGamma) -> String {
        format!("Normal-Gamma(dim: {})", ng.dim)
    }
}

impl_display!(NormalGamma);

impl ExpFamily for NormalGamma {
    type Stats = NormalGammaStats;

    #[inline]
    fn nparams(&self) -> usize {
        4 * self.dim
    }

    fn split_sufficient_statistics(
        &self,
        s_stats: &DVector<f64>,
    ) -> Result<NormalGammaStats, Error> {
        self.check_len(s_stats)?;
        let d = self.dim;
        let s = s_stats.as_slice();
        Ok(NormalGammaStats {
            quadratic: DVector::from_column_slice(&s[..d]),
            linear: DVector::from_column_slice(&s[d..2 * d]),
            scale: DVector::from_column_slice(&s[2 * d..3 * d]),
            shape: DVector::from_column_slice(&s[3 * d..]),
        })
    }

    fn log_norm(&self, natural_hparams: &DVector<f64>) -> Result<f64, Error> {
        let stats = self.split_sufficient_statistics(natural_hparams)?;
        let mut lognorm = 0.0;
        for d in 0..self.dim {
            let (a, delta) = checked_shape_delta(&stats, d)?;
            lognorm += a.ln_gamma().0
                - 0.5 * stats.scale[d].ln()
                - a * delta.ln();
        }
        Ok(lognorm)
    }

    fn grad_log_norm(
        &self,
        natural_hparams: &DVector<f64>,
    ) -> Result<DVector<f64>, Error> {
        let stats = self.split_sufficient_statistics(natural_hparams)?;
        let dim = self.dim;
        let mut grad = DVector::zeros(4 * dim);
        for d in 0..dim {
            let (a, delta) = checked_shape_delta(&stats, d)?;
            let lin = stats.linear[d];
            let kappa = stats.scale[d];
            grad[d] = -a / (2.0 * delta);
            grad[dim + d] = a * lin / (delta * kappa);
            grad[2 * dim + d] = -0.5 / kappa
                - a * lin * lin / (2.0 * delta * kappa * kappa);
            grad[3 * dim + d] = 0.5 * (a.digamma() - delta.ln());
        }
        Ok(grad)
    }
}

/// Recover the posterior shape a = ½(η₄ + 1) and rate Δ = ½(η₁ - η₂²/η₃) of
/// dimension `d`, rejecting points where the log-normalizer is undefined.
fn checked_shape_delta(
    stats: &NormalGammaStats,
    d: usize,
) -> Result<(f64, f64), Error> {
    let kappa = stats.scale[d];
    if kappa <= 0.0 {
        return Err(Error::ParamTooLow {
            param: "scale",
            value: kappa,
        });
    }
    let a = 0.5 * (stats.shape[d] + 1.0);
    if a <= 0.0 {
        return Err(Error::ParamTooLow {
            param: "shape",
            value: a,
        });
    }
    let delta = 0.5
        * (stats.quadratic[d] - stats.linear[d] * stats.linear[d] / kappa);
    if delta <= 0.0 {
        return Err(Error::ParamTooLow {
            param: "rate",
            value: delta,
        });
    }
    Ok((a, delta))
}
