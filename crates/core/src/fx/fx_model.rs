use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A single currency's rate versus the portfolio base currency.
///
/// One unit of `currency` equals `rate_to_base` units of the base currency.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyRate {
    pub currency: String,
    pub rate_to_base: Decimal,
}

/// Normalizes a currency code for lookups: trimmed, uppercase.
pub fn normalize_currency_code(code: &str) -> String {
    code.trim().to_uppercase()
}
