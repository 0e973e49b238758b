use crate::consts::LN_PI;
use special::Gamma as _;

/// Natural logarithm of the multivariate gamma function, *ln Γ<sub>p</sub>(a)*.
///
/// # Arguments
///
/// * `p` - Positive integer degrees of freedom
/// * `a` - The number for which to compute the multivariate gamma
pub fn lnmv_gamma(p: usize, a: f64) -> f64 {
    let pf = p as f64;
    let a0 = pf * (pf - 1.0) / 4.0 * LN_PI;
    (1..=p).fold(a0, |acc, j| acc + (a + (1.0 - j as f64) / 2.0).ln_gamma().0)
}

/// Derivative of [`lnmv_gamma`] with respect to `a`: the sum of digammas
/// *Σ<sub>j=1..p</sub> ψ(a + (1 - j)/2)*.
///
/// # Arguments
///
/// * `p` - Positive integer degrees of freedom
/// * `a` - The point at which to evaluate the derivative
pub fn mv_digamma(p: usize, a: f64) -> f64 {
    (1..=p).fold(0.0, |acc, j| acc + (a + (1.0 - j as f64) / 2.0).digamma())
}
