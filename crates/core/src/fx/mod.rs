//! Currency rates and conversion for the attribution engine.

pub mod currency_converter;
mod fx_errors;
mod fx_model;
mod fx_traits;

pub use currency_converter::*;
pub use fx_errors::*;
pub use fx_model::*;
pub use fx_traits::*;
