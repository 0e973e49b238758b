//! Conjugate priors from the exponential family of distributions, intended as
//! building blocks for variational Bayesian inference.
//!
//! Every prior in this crate has the form
//!
//! ```math
//! p(x | θ) = exp{ η(θ)ᵀ T(x) - A(η(θ)) }
//! ```
//!
//! where `η(θ)` is the vector of natural hyper-parameters, `T(x)` the
//! sufficient statistics, and `A(η)` the log-normalizing function. Each family
//! supplies its closed-form `A(η)` together with its gradient, and the shared
//! [`ExpFamilyPrior`] state keeps the expected sufficient statistics
//! `⟨T(x)⟩ = ∇A(η)` in sync with the natural parameters: they are recomputed
//! every time the parameters are set, never lazily.
//!
//! The same ingredients give the Kullback-Leibler divergence between two
//! densities of one family for free through the Bregman identity — see
//! [`kl_divergence`].
//!
//! # Example
//!
//! ```rust
//! use expfam::prelude::*;
//! use nalgebra::DVector;
//!
//! // A Dirichlet prior over 3-dimensional categorical parameters.
//! let alphas = DVector::from_column_slice(&[2.0, 3.0, 5.0]);
//! let prior = Dirichlet::from_params(&alphas).unwrap();
//!
//! // Natural parameters are the concentrations minus one.
//! assert_eq!(prior.natural_hparams().as_slice(), &[1.0, 2.0, 4.0]);
//!
//! // A density diverges from itself by exactly zero.
//! assert_eq!(kl_divergence(&prior, &prior).unwrap(), 0.0);
//! ```

/// Implements `std::fmt::Display` for types with `From<&T> for String`
#[macro_export]
macro_rules! impl_display {
    ($kind: ty) => {
        impl ::std::fmt::Display for $kind {
            fn fmt(&self, f: &mut ::std::fmt::Formatter) -> ::std::fmt::Result {
                write!(f, "{}", String::from(self))
            }
        }
    };
}

pub mod consts;
pub mod dist;
pub mod error;
pub mod misc;
pub mod prelude;
pub mod prior;
pub mod traits;

pub use error::Error;
pub use prior::{kl_divergence, ExpFamilyPrior};
