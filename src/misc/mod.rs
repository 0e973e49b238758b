//! Special functions and linear-algebra helpers
mod func;
mod linalg;

pub use func::{lnmv_gamma, mv_digamma};
pub use linalg::{
    ln_det_cholesky, ln_det_pd, ln_det_pd_with_grad, pd_cholesky,
};
