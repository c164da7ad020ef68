use async_trait::async_trait;
use std::collections::HashMap;

use super::LiveQuote;
use crate::errors::Result;

/// Best-effort live quote retrieval.
///
/// Symbols with no obtainable quote are simply absent from the returned
/// map; a partial result is not an error. Callers decide whether a gap is
/// tolerable for their computation.
#[async_trait]
pub trait QuoteSourceTrait: Send + Sync {
    async fn get_live_quotes(&self, symbols: &[String]) -> Result<HashMap<String, LiveQuote>>;
}
