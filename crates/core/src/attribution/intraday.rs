//! Intraday blending: layers the current session's live valuation change
//! on top of the last closed day's compounded return.

use log::warn;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

use crate::constants::DECIMAL_PRECISION;
use crate::fx::CurrencyConverter;
use crate::quotes::LiveQuote;
use crate::snapshots::AssetSnapshot;

const ONE_HUNDRED: Decimal = dec!(100);

/// One holding's intraday price effect, as a cross-check against the
/// portfolio-level change.
#[derive(Debug, Clone, PartialEq)]
pub struct IntradayAssetContribution {
    pub asset_key: String,
    pub contribution_pp: Decimal,
}

/// Outcome of an intraday blend attempt.
///
/// `success=false` means live data could not be confirmed for every held
/// symbol; `combined_return_pct` then carries the historical-only figure
/// rather than a misleading 0% same-day change.
#[derive(Debug, Clone, PartialEq)]
pub struct IntradayBlend {
    pub success: bool,
    pub combined_return_pct: Decimal,
    pub raw_change_pct: Decimal,
    pub adjusted_change_pct: Decimal,
    pub current_total: Decimal,
    pub missing_symbols: Vec<String>,
    pub per_asset: Vec<IntradayAssetContribution>,
}

impl IntradayBlend {
    fn historical_only(historical_return_pct: Decimal, missing_symbols: Vec<String>) -> Self {
        Self {
            success: false,
            combined_return_pct: historical_return_pct,
            raw_change_pct: Decimal::ZERO,
            adjusted_change_pct: Decimal::ZERO,
            current_total: Decimal::ZERO,
            missing_symbols,
            per_asset: Vec::new(),
        }
    }
}

/// Compounds a historical period return with a same-day factor:
/// `((1 + historical/100) × today_factor − 1) × 100`.
pub fn combine_historical_with_intraday(
    historical_return_pct: Decimal,
    today_factor: Decimal,
) -> Decimal {
    (((Decimal::ONE + historical_return_pct / ONE_HUNDRED) * today_factor - Decimal::ONE)
        * ONE_HUNDRED)
        .round_dp(DECIMAL_PRECISION)
}

/// Revalues the held positions at live quotes and blends the resulting
/// same-day change with the historical return.
///
/// The adjusted change would subtract same-day net cash flows; those are
/// not visible at this layer, so raw and adjusted coincide. A missing
/// quote for any held symbol aborts the blend.
pub fn blend_intraday(
    holdings: &[&AssetSnapshot],
    quotes: &HashMap<String, LiveQuote>,
    converter: &CurrencyConverter,
    previous_close_total: Decimal,
    historical_return_pct: Decimal,
    target_currency: &str,
) -> IntradayBlend {
    if previous_close_total.is_zero() || holdings.is_empty() {
        return IntradayBlend::historical_only(historical_return_pct, Vec::new());
    }

    let missing: Vec<String> = holdings
        .iter()
        .filter(|h| !quotes.contains_key(&h.ticker))
        .map(|h| h.ticker.clone())
        .collect();
    if !missing.is_empty() {
        warn!(
            "Intraday blend aborted: no live quote for {:?}; returning historical-only return",
            missing
        );
        return IntradayBlend::historical_only(historical_return_pct, missing);
    }

    let mut current_total = Decimal::ZERO;
    let mut per_asset = Vec::with_capacity(holdings.len());

    for holding in holdings {
        let quote = &quotes[&holding.ticker];
        let live_price_target =
            match converter.convert_amount(quote.price, &quote.currency, target_currency) {
                Ok(price) => price,
                Err(e) => {
                    warn!(
                        "Intraday blend aborted: cannot convert {} quote to {}: {}",
                        holding.ticker, target_currency, e
                    );
                    return IntradayBlend::historical_only(
                        historical_return_pct,
                        vec![holding.ticker.clone()],
                    );
                }
            };

        current_total += live_price_target * holding.units;

        // Previous-close price in target currency comes straight from the
        // snapshot view: total value over units.
        if holding.units > Decimal::ZERO {
            let prev_price = holding.total_value / holding.units;
            let contribution_pp = ((live_price_target - prev_price) * holding.units)
                / previous_close_total
                * ONE_HUNDRED;
            per_asset.push(IntradayAssetContribution {
                asset_key: holding.asset_key().to_string(),
                contribution_pp: contribution_pp.round_dp(DECIMAL_PRECISION),
            });
        }
    }

    let raw_change_pct = ((current_total - previous_close_total) / previous_close_total
        * ONE_HUNDRED)
        .round_dp(DECIMAL_PRECISION);
    // Same-day transactions are not visible here; adjusted equals raw.
    let adjusted_change_pct = raw_change_pct;
    let today_factor = Decimal::ONE + adjusted_change_pct / ONE_HUNDRED;

    IntradayBlend {
        success: true,
        combined_return_pct: combine_historical_with_intraday(
            historical_return_pct,
            today_factor,
        ),
        raw_change_pct,
        adjusted_change_pct,
        current_total,
        missing_symbols: Vec::new(),
        per_asset,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fx::CurrencyRate;
    use crate::snapshots::InstrumentType;

    fn holding(ticker: &str, currency: &str, units: Decimal, total_value: Decimal) -> AssetSnapshot {
        AssetSnapshot {
            ticker: ticker.to_string(),
            instrument_type: InstrumentType::Stock,
            currency: currency.to_string(),
            units,
            total_value,
            total_investment: total_value,
            total_roi: Decimal::ZERO,
            unrealized_pnl: Decimal::ZERO,
            total_cash_flow: Decimal::ZERO,
            name: None,
            sector: None,
        }
    }

    fn quote(symbol: &str, price: Decimal, currency: &str) -> (String, LiveQuote) {
        (
            symbol.to_string(),
            LiveQuote {
                symbol: symbol.to_string(),
                price,
                currency: currency.to_string(),
            },
        )
    }

    fn usd_converter() -> CurrencyConverter {
        CurrencyConverter::new(
            "USD",
            vec![CurrencyRate {
                currency: "EUR".to_string(),
                rate_to_base: dec!(1.10),
            }],
        )
        .unwrap()
    }

    #[test]
    fn test_combine_compounds_cross_term() {
        // (1.0827 * 1.005 - 1) * 100
        let combined = combine_historical_with_intraday(dec!(8.27), dec!(1.005));
        assert_eq!(combined, dec!(8.81135));
    }

    #[test]
    fn test_blend_single_holding_up_half_percent() {
        let h = holding("AAPL", "USD", dec!(100), dec!(10000));
        let holdings = vec![&h];
        let quotes: HashMap<_, _> = vec![quote("AAPL", dec!(100.50), "USD")].into_iter().collect();

        let blend = blend_intraday(
            &holdings,
            &quotes,
            &usd_converter(),
            dec!(10000),
            dec!(8.27),
            "USD",
        );

        assert!(blend.success);
        assert_eq!(blend.raw_change_pct, dec!(0.5));
        assert_eq!(blend.combined_return_pct, dec!(8.81135));
        assert_eq!(blend.current_total, dec!(10050.00));
    }

    #[test]
    fn test_missing_quote_aborts_with_historical_only() {
        let a = holding("AAPL", "USD", dec!(100), dec!(10000));
        let b = holding("MSFT", "USD", dec!(10), dec!(4000));
        let holdings = vec![&a, &b];
        let quotes: HashMap<_, _> = vec![quote("AAPL", dec!(101), "USD")].into_iter().collect();

        let blend = blend_intraday(
            &holdings,
            &quotes,
            &usd_converter(),
            dec!(14000),
            dec!(5),
            "USD",
        );

        assert!(!blend.success);
        assert_eq!(blend.combined_return_pct, dec!(5));
        assert_eq!(blend.missing_symbols, vec!["MSFT".to_string()]);
    }

    #[test]
    fn test_quote_currency_converted_to_target() {
        // 10 units previously worth 1100 USD; live quote 105 EUR -> 115.50 USD.
        let h = holding("SAP", "EUR", dec!(10), dec!(1100));
        let holdings = vec![&h];
        let quotes: HashMap<_, _> = vec![quote("SAP", dec!(105), "EUR")].into_iter().collect();

        let blend = blend_intraday(
            &holdings,
            &quotes,
            &usd_converter(),
            dec!(1100),
            Decimal::ZERO,
            "USD",
        );

        assert!(blend.success);
        assert_eq!(blend.current_total, dec!(1155.000));
        assert_eq!(blend.raw_change_pct, dec!(5));
    }

    #[test]
    fn test_per_asset_contributions_sum_to_raw_change() {
        let a = holding("AAPL", "USD", dec!(100), dec!(10000));
        let b = holding("MSFT", "USD", dec!(10), dec!(5000));
        let holdings = vec![&a, &b];
        let quotes: HashMap<_, _> = vec![
            quote("AAPL", dec!(101), "USD"),
            quote("MSFT", dec!(490), "USD"),
        ]
        .into_iter()
        .collect();

        let blend = blend_intraday(
            &holdings,
            &quotes,
            &usd_converter(),
            dec!(15000),
            Decimal::ZERO,
            "USD",
        );

        assert!(blend.success);
        let sum: Decimal = blend.per_asset.iter().map(|c| c.contribution_pp).sum();
        assert_eq!(sum, blend.raw_change_pct);
    }

    #[test]
    fn test_zero_previous_close_degrades() {
        let h = holding("AAPL", "USD", dec!(100), dec!(10000));
        let holdings = vec![&h];
        let quotes = HashMap::new();

        let blend = blend_intraday(
            &holdings,
            &quotes,
            &usd_converter(),
            Decimal::ZERO,
            dec!(3),
            "USD",
        );
        assert!(!blend.success);
        assert_eq!(blend.combined_return_pct, dec!(3));
    }
}
