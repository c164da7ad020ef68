//! Daily valuation snapshot models and the read-only source trait.

mod snapshot_model;
mod snapshot_traits;

pub use snapshot_model::*;
pub use snapshot_traits::*;
