//! Dirichlet prior over probability simplexes
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::impl_display;
use crate::prior::ExpFamilyPrior;
use crate::traits::ExpFamily;
use nalgebra::DVector;
use special::Gamma as _;

/// [Dirichlet density](https://en.wikipedia.org/wiki/Dirichlet_distribution)
/// with concentration parameters α,
///
/// ```math
/// p(x | α) = Γ(Σᵢ αᵢ) / Πᵢ Γ(αᵢ) · Πᵢ xᵢ^(αᵢ - 1)
/// ```
///
/// The natural parameters are `η = α - 1` and the sufficient statistics are
/// the log-probabilities `T(x) = ln x`, so the expected sufficient statistics
/// are the familiar `⟨ln xᵢ⟩ = ψ(αᵢ) - ψ(Σⱼ αⱼ)`.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde1", serde(rename_all = "snake_case"))]
pub struct Dirichlet {
    dim: usize,
}

impl Dirichlet {
    /// Create a Dirichlet family over `dim`-dimensional simplexes
    pub fn new(dim: usize) -> Result<Self, Error> {
        if dim == 0 {
            Err(Error::ParamTooLow {
                param: "dim",
                value: 0.0,
            })
        } else {
            Ok(Dirichlet { dim })
        }
    }

    /// Creates a new Dirichlet without checking whether the dimension is valid
    #[inline]
    pub fn new_unchecked(dim: usize) -> Self {
        Dirichlet { dim }
    }

    /// Get the number of dimensions
    ///
    /// # Example
    ///
    /// ```rust
    /// # use expfam::dist::Dirichlet;
    /// let dir = Dirichlet::new(4).unwrap();
    /// assert_eq!(dir.dim(), 4);
    /// ```
    #[inline]
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Create a Dirichlet prior from its standard hyper-parameters.
    ///
    /// # Arguments
    /// - concentrations: Concentration for each dimension; all entries must
    ///   be finite and strictly positive.
    ///
    /// # Example
    ///
    /// ```rust
    /// use expfam::dist::Dirichlet;
    /// use nalgebra::DVector;
    ///
    /// let alphas = DVector::from_column_slice(&[2.0, 3.0, 5.0]);
    /// let prior = Dirichlet::from_params(&alphas).unwrap();
    /// assert_eq!(prior.natural_hparams().as_slice(), &[1.0, 2.0, 4.0]);
    /// ```
    pub fn from_params(
        concentrations: &DVector<f64>,
    ) -> Result<ExpFamilyPrior<Self>, Error> {
        if concentrations.is_empty() {
            return Err(Error::EmptyParameter {
                param: "concentrations",
            });
        }
        for &alpha in concentrations.iter() {
            if !alpha.is_finite() {
                return Err(Error::ParamNotFinite {
                    param: "concentrations",
                    value: alpha,
                });
            } else if alpha <= 0.0 {
                return Err(Error::ParamTooLow {
                    param: "concentrations",
                    value: alpha,
                });
            }
        }
        let family = Dirichlet {
            dim: concentrations.len(),
        };
        ExpFamilyPrior::new(family, concentrations.map(|alpha| alpha - 1.0))
    }
}

impl From<&Dirichlet> for String {
    fn from(dir: &Dirichlet) -> String {
        format!("Dirichlet(dim: {})", dir.dim)
    }
}

impl_display!(Dirichlet);

impl ExpFamily for Dirichlet {
    /// A single group: the expected log-probabilities
    type Stats = DVector<f64>;

    #[inline]
    fn nparams(&self) -> usize {
        self.dim
    }

    fn split_sufficient_statistics(
        &self,
        s_stats: &DVector<f64>,
    ) -> Result<DVector<f64>, Error> {
        self.check_len(s_stats)?;
        Ok(s_stats.clone())
    }

    fn log_norm(&self, natural_hparams: &DVector<f64>) -> Result<f64, Error> {
        let stats = self.split_sufficient_statistics(natural_hparams)?;
        let total: f64 = stats.iter().map(|&eta| eta + 1.0).sum();
        let lgammas: f64 =
            stats.iter().map(|&eta| (eta + 1.0).ln_gamma().0).sum();
        Ok(lgammas - total.ln_gamma().0)
    }

    fn grad_log_norm(
        &self,
        natural_hparams: &DVector<f64>,
    ) -> Result<DVector<f64>, Error> {
        let stats = self.split_sufficient_statistics(natural_hparams)?;
        let total: f64 = stats.iter().map(|&eta| eta + 1.0).sum();
        let dig_total = total.digamma();
        Ok(stats.map(|eta| (eta + 1.0).digamma() - dig_total))
    }
}
