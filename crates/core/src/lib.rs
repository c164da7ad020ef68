//! Folioscope Core - portfolio return attribution engine.
//!
//! This crate answers "why did my portfolio move by X% this period": it
//! compounds daily returns into a time-weighted return, decomposes the
//! period move into per-asset contributions, reconciles the two figures,
//! and builds the waterfall and summary views consumed by the frontend.
//!
//! The engine is storage- and transport-agnostic: valuation snapshots,
//! the sell-event ledger, live quotes and currency rates are supplied by
//! collaborators behind traits defined here.

pub mod attribution;
pub mod cache;
pub mod constants;
pub mod errors;
pub mod fx;
pub mod ledger;
pub mod quotes;
pub mod snapshots;
pub mod utils;

// Re-export common types from the attribution and snapshot modules
pub use attribution::*;
pub use snapshots::*;

// Re-export error types
pub use errors::Error;
pub use errors::Result;
