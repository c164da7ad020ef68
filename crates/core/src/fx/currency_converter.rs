use rust_decimal::Decimal;
use std::collections::HashMap;

use super::fx_errors::FxError;
use super::fx_model::{normalize_currency_code, CurrencyRate};

/// A calculator for currency conversions built from a batch of
/// already-resolved rates versus the portfolio base currency.
///
/// Two non-base currencies are triangulated through the base:
/// `amount * rate_to_base(from) / rate_to_base(to)`.
pub struct CurrencyConverter {
    base_currency: String,
    rates_to_base: HashMap<String, Decimal>,
}

impl CurrencyConverter {
    /// Creates a new `CurrencyConverter` from a Vec of CurrencyRate.
    /// Zero or negative rates are rejected; they would silently corrupt
    /// every conversion routed through them.
    pub fn new(base_currency: &str, rates: Vec<CurrencyRate>) -> Result<Self, FxError> {
        let base = normalize_currency_code(base_currency);
        let mut rates_to_base = HashMap::with_capacity(rates.len() + 1);
        rates_to_base.insert(base.clone(), Decimal::ONE);

        for rate in rates {
            if rate.rate_to_base <= Decimal::ZERO {
                return Err(FxError::InvalidRate(format!(
                    "{} -> {}: {}",
                    rate.currency, base, rate.rate_to_base
                )));
            }
            rates_to_base.insert(normalize_currency_code(&rate.currency), rate.rate_to_base);
        }

        Ok(CurrencyConverter {
            base_currency: base,
            rates_to_base,
        })
    }

    pub fn base_currency(&self) -> &str {
        &self.base_currency
    }

    /// Returns the rate converting one unit of `from` into `to`.
    pub fn get_rate(&self, from: &str, to: &str) -> Result<Decimal, FxError> {
        let from = normalize_currency_code(from);
        let to = normalize_currency_code(to);
        if from == to {
            return Ok(Decimal::ONE);
        }

        let from_rate = self
            .rates_to_base
            .get(&from)
            .ok_or_else(|| FxError::RateNotFound(format!("{} -> {}", from, self.base_currency)))?;
        let to_rate = self
            .rates_to_base
            .get(&to)
            .ok_or_else(|| FxError::RateNotFound(format!("{} -> {}", to, self.base_currency)))?;

        Ok(from_rate / to_rate)
    }

    /// Converts an amount between any two known currencies.
    pub fn convert_amount(
        &self,
        amount: Decimal,
        from_currency: &str,
        to_currency: &str,
    ) -> Result<Decimal, FxError> {
        Ok(amount * self.get_rate(from_currency, to_currency)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rust_decimal_macros::dec;

    fn make_converter() -> CurrencyConverter {
        CurrencyConverter::new(
            "USD",
            vec![
                CurrencyRate {
                    currency: "EUR".to_string(),
                    rate_to_base: dec!(1.10),
                },
                CurrencyRate {
                    currency: "JPY".to_string(),
                    rate_to_base: dec!(0.0064),
                },
            ],
        )
        .unwrap()
    }

    #[test]
    fn test_same_currency_is_identity() {
        let converter = make_converter();
        assert_eq!(
            converter.convert_amount(dec!(42), "USD", "USD").unwrap(),
            dec!(42)
        );
    }

    #[test]
    fn test_quote_to_base() {
        let converter = make_converter();
        assert_eq!(
            converter.convert_amount(dec!(100), "EUR", "USD").unwrap(),
            dec!(110.00)
        );
    }

    #[test]
    fn test_base_to_quote() {
        let converter = make_converter();
        assert_eq!(
            converter.convert_amount(dec!(110), "USD", "EUR").unwrap(),
            dec!(100)
        );
    }

    #[test]
    fn test_triangulation_through_base() {
        let converter = make_converter();
        // 100 EUR = 110 USD = 110 / 0.0064 JPY
        let result = converter.convert_amount(dec!(100), "EUR", "JPY").unwrap();
        assert_eq!(result, dec!(110) / dec!(0.0064));
    }

    #[test]
    fn test_unknown_currency_is_an_error() {
        let converter = make_converter();
        assert!(converter.convert_amount(dec!(1), "GBP", "USD").is_err());
    }

    #[test]
    fn test_zero_rate_rejected() {
        let result = CurrencyConverter::new(
            "USD",
            vec![CurrencyRate {
                currency: "EUR".to_string(),
                rate_to_base: Decimal::ZERO,
            }],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_normalizes_codes() {
        let converter = make_converter();
        assert_eq!(
            converter.convert_amount(dec!(100), " eur ", "usd").unwrap(),
            dec!(110.00)
        );
    }
}
