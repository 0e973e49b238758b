//! The contract shared by every density family
use crate::error::Error;
use nalgebra::DVector;

/// A family of conjugate priors from the exponential family,
///
/// ```math
/// p(x | θ) = exp{ η(θ)ᵀ T(x) - A(η(θ)) }
/// ```
///
/// An implementor fixes three things: how a flat statistics vector decomposes
/// into the family's semantic groups, the closed-form log-normalizer `A(η)`,
/// and the gradient `∇A(η)`. Everything else — holding the natural parameters,
/// keeping the expected sufficient statistics in sync, KL divergence — is
/// generic over this trait (see [`ExpFamilyPrior`](crate::ExpFamilyPrior)).
pub trait ExpFamily {
    /// The family's semantic grouping of a flat statistics vector. For
    /// instance, the sufficient statistics of the Normal density are
    /// `T(x) = (x², x)ᵀ`, leading to a quadratic and a linear group.
    type Stats;

    /// Length of the natural-parameter vector.
    fn nparams(&self) -> usize;

    /// Split a flat statistics vector into the family's groups.
    ///
    /// Pure and deterministic: the exact inverse of the concatenation used
    /// when the natural parameters were assembled, so the same function
    /// describes both the natural parameters and the expected sufficient
    /// statistics.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::DimensionMismatch`] when the vector length does
    /// not match the family's layout. The vector is never truncated or
    /// padded.
    fn split_sufficient_statistics(
        &self,
        s_stats: &DVector<f64>,
    ) -> Result<Self::Stats, Error>;

    /// Log-normalizing function `A(η)`.
    fn log_norm(&self, natural_hparams: &DVector<f64>) -> Result<f64, Error>;

    /// Gradient of [`log_norm`](ExpFamily::log_norm) with respect to every
    /// element of `natural_hparams`, in the same layout as the input.
    ///
    /// By the exponential-family identity `⟨T(x)⟩ = ∇A(η)`, this is the
    /// expected value of the sufficient statistics.
    fn grad_log_norm(
        &self,
        natural_hparams: &DVector<f64>,
    ) -> Result<DVector<f64>, Error>;

    /// Check a vector against the family's layout.
    fn check_len(&self, s_stats: &DVector<f64>) -> Result<(), Error> {
        if s_stats.len() == self.nparams() {
            Ok(())
        } else {
            Err(Error::DimensionMismatch {
                expected: self.nparams(),
                actual: s_stats.len(),
            })
        }
    }
}
