//! Return attribution: TWR compounding, per-asset contribution
//! decomposition, reconciliation, intraday blending and the presentation
//! builders on top of them.

mod attribution_model;
mod attribution_service;
mod reconciler;

pub mod aggregator;
pub mod contribution;
pub mod intraday;
pub mod summary;
pub mod twr;
pub mod waterfall;

pub use attribution_model::*;
pub use attribution_service::{AttributionService, AttributionServiceTrait};
pub use reconciler::reconcile;
