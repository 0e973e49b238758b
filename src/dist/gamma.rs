//! Gamma prior over a positive scalar (e.g. a precision parameter)
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::impl_display;
use crate::prior::ExpFamilyPrior;
use crate::traits::ExpFamily;
use nalgebra::DVector;
use special::Gamma as _;

/// [Gamma density](https://en.wikipedia.org/wiki/Gamma_distribution) G(a, b)
/// parameterized by shape `a` and rate `b`.
///
/// The natural parameters are `η = (a - 1, -b)` and the sufficient statistics
/// are `T(x) = (ln x, x)`, so the expected sufficient statistics are
/// `(ψ(a) - ln b, a/b)`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct Gamma;

/// Grouped statistics of the Gamma family, named after the sufficient
/// statistic each entry pairs with
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct GammaStats {
    /// Entry pairing with `ln x`
    pub ln_x: f64,
    /// Entry pairing with `x`
    pub x: f64,
}

impl Gamma {
    /// Create the Gamma family
    #[inline]
    pub fn new() -> Self {
        Gamma
    }

    /// Create a Gamma prior from its standard hyper-parameters.
    ///
    /// # Arguments
    /// - shape: Shape parameter of the Gamma, a > 0
    /// - rate: Rate parameter of the Gamma, b > 0
    ///
    /// # Example
    ///
    /// ```rust
    /// use expfam::dist::Gamma;
    ///
    /// let prior = Gamma::from_params(2.0, 1.0).unwrap();
    /// assert_eq!(prior.natural_hparams().as_slice(), &[1.0, -1.0]);
    ///
    /// // ⟨x⟩ = a / b
    /// assert_eq!(prior.expected_sufficient_statistics()[1], 2.0);
    /// ```
    pub fn from_params(
        shape: f64,
        rate: f64,
    ) -> Result<ExpFamilyPrior<Self>, Error> {
        if !shape.is_finite() {
            Err(Error::ParamNotFinite {
                param: "shape",
                value: shape,
            })
        } else if !rate.is_finite() {
            Err(Error::ParamNotFinite {
                param: "rate",
                value: rate,
            })
        } else if shape <= 0.0 {
            Err(Error::ParamTooLow {
                param: "shape",
                value: shape,
            })
        } else if rate <= 0.0 {
            Err(Error::ParamTooLow {
                param: "rate",
                value: rate,
            })
        } else {
            let natural_hparams =
                DVector::from_column_slice(&[shape - 1.0, -rate]);
            ExpFamilyPrior::new(Gamma, natural_hparams)
        }
    }
}

impl From<&Gamma> for String {
    fn from(_gam: &Gamma) -> String {
        "Gamma".to_string()
    }
}

impl_display!(Gamma);

impl ExpFamily for Gamma {
    type Stats = GammaStats;

    #[inline]
    fn nparams(&self) -> usize {
        2
    }

    fn split_sufficient_statistics(
        &self,
        s_stats: &DVector<f64>,
    ) -> Result<GammaStats, Error> {
        self.check_len(s_stats)?;
        Ok(GammaStats {
            ln_x: s_stats[0],
            x: s_stats[1],
        })
    }

    fn log_norm(&self, natural_hparams: &DVector<f64>) -> Result<f64, Error> {
        let stats = self.split_sufficient_statistics(natural_hparams)?;
        let (shape, rate) = checked_shape_rate(&stats)?;
        Ok(shape.ln_gamma().0 - shape * rate.ln())
    }

    fn grad_log_norm(
        &self,
        natural_hparams: &DVector<f64>,
    ) -> Result<DVector<f64>, Error> {
        let stats = self.split_sufficient_statistics(natural_hparams)?;
        let (shape, rate) = checked_shape_rate(&stats)?;
        Ok(DVector::from_column_slice(&[
            shape.digamma() - rate.ln(),
            shape / rate,
        ]))
    }
}

/// Recover (a, b) = (η₁ + 1, -η₂) and reject points where the
/// log-normalizer is undefined.
fn checked_shape_rate(stats: &GammaStats) -> Result<(f64, f64), Error> {
    let shape = stats.ln_x + 1.0;
    let rate = -stats.x;
    if shape <= 0.0 {
        Err(Error::ParamTooLow {
            param: "shape",
            value: shape,
        })
    } else if rate <= 0.0 {
        Err(Error::ParamTooLow {
            param: "rate",
            value: rate,
        })
    } else {
        Ok((shape, rate))
    }
}
