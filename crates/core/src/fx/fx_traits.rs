use async_trait::async_trait;
use rust_decimal::Decimal;

use super::FxError;

/// Read-only source of currency rates versus the portfolio base currency.
///
/// Rate discovery and persistence live upstream; the engine only consumes
/// already-resolved rates.
#[async_trait]
pub trait RateSourceTrait: Send + Sync {
    /// Returns how many units of the base currency one unit of
    /// `quote_currency` is worth.
    async fn get_rate_to_base(&self, quote_currency: &str) -> Result<Decimal, FxError>;

    /// The portfolio base currency all rates are quoted against.
    fn base_currency(&self) -> String;
}
