//! Re-imports for convenience
#[doc(no_inline)]
pub use crate::dist::*;
#[doc(no_inline)]
pub use crate::error::Error;
#[doc(no_inline)]
pub use crate::prior::{kl_divergence, ExpFamilyPrior};
#[doc(no_inline)]
pub use crate::traits::ExpFamily;
