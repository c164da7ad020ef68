//! Live quote models and the best-effort quote source trait.

mod quote_model;
mod quote_traits;

pub use quote_model::*;
pub use quote_traits::*;
