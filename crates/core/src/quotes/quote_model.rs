use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// A live price for one symbol, in the instrument's quote currency.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct LiveQuote {
    pub symbol: String,
    pub price: Decimal,
    pub currency: String,
}
