//! Errors surfaced by prior construction and natural-parameter updates
use std::fmt;

/// Deterministic math errors. None of these are recoverable inside the crate;
/// they all surface immediately to the caller.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// A hyper-parameter container that must hold at least one entry is empty
    EmptyParameter { param: &'static str },
    /// A quantity that must be strictly positive was not
    ParamTooLow { param: &'static str, value: f64 },
    /// A hyper-parameter is infinite or NaN
    ParamNotFinite { param: &'static str, value: f64 },
    /// The degrees of freedom do not exceed `dim - 1`
    DofTooLow { dof: f64, dim: usize },
    /// A matrix expected to be square was not
    MatrixNotSquare { nrows: usize, ncols: usize },
    /// Cholesky factorization failed: the matrix is not positive-definite
    NotPositiveDefinite { nrows: usize },
    /// A vector length disagrees with the family's layout
    DimensionMismatch { expected: usize, actual: usize },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyParameter { param } => {
                write!(f, "{} must not be empty", param)
            }
            Self::ParamTooLow { param, value } => {
                write!(f, "{} ({}) must be greater than zero", param, value)
            }
            Self::ParamNotFinite { param, value } => {
                write!(f, "non-finite {}: {}", param, value)
            }
            Self::DofTooLow { dof, dim } => write!(
                f,
                "dof ({}) must be greater than dim - 1 ({})",
                dof,
                *dim as f64 - 1.0
            ),
            Self::MatrixNotSquare { nrows, ncols } => {
                write!(f, "matrix is not square: {} x {}", nrows, ncols)
            }
            Self::NotPositiveDefinite { nrows } => write!(
                f,
                "{} x {} matrix is not positive-definite",
                nrows, nrows
            ),
            Self::DimensionMismatch { expected, actual } => write!(
                f,
                "expected a vector of length {}, got {}",
                expected, actual
            ),
        }
    }
}

impl std::error::Error for Error {}
