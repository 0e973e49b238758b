//! Conjugate prior families
pub mod dirichlet;
pub mod gamma;
pub mod joint_normal_gamma;
pub mod joint_normal_wishart;
pub mod matrix_normal;
pub mod normal;
pub mod normal_gamma;
pub mod normal_wishart;

pub use self::dirichlet::Dirichlet;
pub use self::gamma::{Gamma, GammaStats};
pub use self::joint_normal_gamma::{
    JointNormalGamma, JointNormalGammaStats,
};
pub use self::joint_normal_wishart::{
    JointNormalWishart, JointNormalWishartStats,
};
pub use self::matrix_normal::{MatrixNormal, MatrixNormalStats};
pub use self::normal::{
    IsotropicNormalStats, NormalFullCovariance, NormalIsotropic, NormalStats,
};
pub use self::normal_gamma::{NormalGamma, NormalGammaStats};
pub use self::normal_wishart::{NormalWishart, NormalWishartStats};
