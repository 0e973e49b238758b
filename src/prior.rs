//! Natural-parameter state shared by all families, and the KL divergence
#[cfg(feature = "serde1")]
use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::traits::ExpFamily;
use nalgebra::DVector;

/// A conjugate prior parameterized by its natural hyper-parameters.
///
/// The struct owns the natural-parameter vector of a density from family `F`
/// along with two values derived from it: the log-normalizer `A(η)` and the
/// expected sufficient statistics `⟨T(x)⟩ = ∇A(η)`. Both are recomputed
/// synchronously whenever the natural parameters are set — at construction
/// and in [`set_natural_hparams`](ExpFamilyPrior::set_natural_hparams) —
/// so they can never be observed out of sync with the current parameters.
///
/// # Example
///
/// ```rust
/// use expfam::dist::Gamma;
///
/// // Gamma prior with shape 2 and rate 1.
/// let prior = Gamma::from_params(2.0, 1.0).unwrap();
///
/// // Natural parameters are (shape - 1, -rate).
/// assert_eq!(prior.natural_hparams().as_slice(), &[1.0, -1.0]);
///
/// // ⟨x⟩ = shape / rate sits in the linear slot of the expected statistics.
/// assert_eq!(prior.expected_sufficient_statistics()[1], 2.0);
/// ```
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde1", derive(Serialize, Deserialize))]
pub struct ExpFamilyPrior<F: ExpFamily> {
    family: F,
    natural_hparams: DVector<f64>,
    expected_sufficient_statistics: DVector<f64>,
    log_norm: f64,
}

impl<F: ExpFamily> ExpFamilyPrior<F> {
    /// Create a prior of family `family` from a natural-parameter vector.
    ///
    /// Evaluates the family's log-normalizer and its gradient at `η`; a
    /// failure of either (non-positive-definite matrix block, wrong vector
    /// length) surfaces here rather than producing NaNs downstream.
    pub fn new(
        family: F,
        natural_hparams: DVector<f64>,
    ) -> Result<Self, Error> {
        family.check_len(&natural_hparams)?;
        let log_norm = family.log_norm(&natural_hparams)?;
        let expected_sufficient_statistics =
            family.grad_log_norm(&natural_hparams)?;
        Ok(ExpFamilyPrior {
            family,
            natural_hparams,
            expected_sufficient_statistics,
            log_norm,
        })
    }

    /// Get a reference to the family
    #[inline]
    pub fn family(&self) -> &F {
        &self.family
    }

    /// Get the current natural hyper-parameters
    #[inline]
    pub fn natural_hparams(&self) -> &DVector<f64> {
        &self.natural_hparams
    }

    /// Get the expected value of the sufficient statistics,
    /// `⟨T(x)⟩ = ∇A(η)`, at the current natural hyper-parameters
    #[inline]
    pub fn expected_sufficient_statistics(&self) -> &DVector<f64> {
        &self.expected_sufficient_statistics
    }

    /// Get the log-normalizer `A(η)` at the current natural hyper-parameters
    #[inline]
    pub fn log_norm(&self) -> f64 {
        self.log_norm
    }

    /// Replace the natural hyper-parameters.
    ///
    /// The log-normalizer and the expected sufficient statistics are
    /// recomputed before the new vector is committed; on error the prior is
    /// left unchanged.
    ///
    /// # Example
    ///
    /// ```rust
    /// use expfam::dist::Gamma;
    /// use nalgebra::DVector;
    ///
    /// let mut prior = Gamma::from_params(2.0, 1.0).unwrap();
    /// prior
    ///     .set_natural_hparams(DVector::from_column_slice(&[3.0, -2.0]))
    ///     .unwrap();
    /// // ⟨x⟩ = shape / rate = 4 / 2
    /// assert_eq!(prior.expected_sufficient_statistics()[1], 2.0);
    /// ```
    pub fn set_natural_hparams(
        &mut self,
        value: DVector<f64>,
    ) -> Result<(), Error> {
        self.family.check_len(&value)?;
        let log_norm = self.family.log_norm(&value)?;
        let expected = self.family.grad_log_norm(&value)?;
        self.natural_hparams = value;
        self.expected_sufficient_statistics = expected;
        self.log_norm = log_norm;
        Ok(())
    }

    /// Split a flat statistics vector into the family's semantic groups.
    pub fn split_sufficient_statistics(
        &self,
        s_stats: &DVector<f64>,
    ) -> Result<F::Stats, Error> {
        self.family.split_sufficient_statistics(s_stats)
    }
}

/// Kullback-Leibler divergence `D(p ‖ q)` between two densities of the same
/// family.
///
/// Uses the Bregman-divergence identity of the log-normalizer,
///
/// ```math
/// D(p ‖ q) = A(η_q) - A(η_p) - ⟨T(x)⟩_p ᵀ (η_q - η_p)
/// ```
///
/// so no numerical integration takes place: the whole computation is two
/// cached scalars and one inner product. Mixing families is rejected at
/// compile time by the shared type parameter; a length mismatch inside one
/// family fails with [`Error::DimensionMismatch`].
///
/// # Example
///
/// ```rust
/// use expfam::dist::Gamma;
/// use expfam::kl_divergence;
///
/// let p = Gamma::from_params(2.0, 1.0).unwrap();
/// let q = Gamma::from_params(2.5, 1.5).unwrap();
///
/// assert_eq!(kl_divergence(&p, &p).unwrap(), 0.0);
/// assert!(kl_divergence(&p, &q).unwrap() > 0.0);
/// ```
pub fn kl_divergence<F: ExpFamily>(
    p: &ExpFamilyPrior<F>,
    q: &ExpFamilyPrior<F>,
) -> Result<f64, Error> {
    if p.natural_hparams.len() != q.natural_hparams.len() {
        return Err(Error::DimensionMismatch {
            expected: p.natural_hparams.len(),
            actual: q.natural_hparams.len(),
        });
    }
    let diff = &q.natural_hparams - &p.natural_hparams;
    Ok(q.log_norm - p.log_norm
        - p.expected_sufficient_statistics.dot(&diff))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dist::Dirichlet;

    const TOL: f64 = 1E-10;

    fn dirichlet(alphas: &[f64]) -> ExpFamilyPrior<Dirichlet> {
        Dirichlet::from_params(&DVector::from_column_slice(alphas)).unwrap()
    }

    #[test]
    fn set_natural_hparams_recomputes_derived_values() {
        let mut prior = dirichlet(&[2.0, 3.0, 5.0]);
        let before = prior.expected_sufficient_statistics().clone();
        let before_ln = prior.log_norm();

        prior
            .set_natural_hparams(DVector::from_column_slice(&[
                0.5, 0.5, 0.5,
            ]))
            .unwrap();

        assert!(prior.expected_sufficient_statistics() != &before);
        assert!(prior.log_norm() != before_ln);

        // Derived values agree with a prior built directly at the new point.
        let fresh = dirichlet(&[1.5, 1.5, 1.5]);
        assert::close(prior.log_norm(), fresh.log_norm(), TOL);
        for i in 0..3 {
            assert::close(
                prior.expected_sufficient_statistics()[i],
                fresh.expected_sufficient_statistics()[i],
                TOL,
            );
        }
    }

    #[test]
    fn set_natural_hparams_rejects_wrong_length() {
        let mut prior = dirichlet(&[2.0, 3.0, 5.0]);
        let res = prior
            .set_natural_hparams(DVector::from_column_slice(&[1.0, 2.0]));
        match res {
            Err(Error::DimensionMismatch {
                expected: 3,
                actual: 2,
            }) => (),
            other => panic!("unexpected result: {:?}", other),
        }
        // State is untouched after a failed update.
        assert_eq!(prior.natural_hparams().len(), 3);
    }

    #[test]
    fn kl_self_divergence_is_zero() {
        let p = dirichlet(&[2.0, 3.0, 5.0]);
        assert_eq!(kl_divergence(&p, &p).unwrap(), 0.0);
    }

    #[test]
    fn kl_rejects_mismatched_lengths() {
        let p = dirichlet(&[2.0, 3.0, 5.0]);
        let q = dirichlet(&[2.0, 3.0]);
        assert!(kl_divergence(&p, &q).is_err());
    }
}
