//! Explicit read-through cache for attribution responses.
//!
//! Kept outside the computation core: the engine itself is pure over its
//! inputs, and callers compose this cache around it.

mod attribution_cache;
mod clock;

pub use attribution_cache::*;
pub use clock::*;
