//! Summary statistics over the reconciled attribution list.
//! Pure aggregation: inputs are never mutated.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

use crate::constants::DISPLAY_DECIMAL_PRECISION;

use super::{AssetAttribution, AttributionSummary, GroupBreakdown};

const ONE_HUNDRED: Decimal = dec!(100);

/// Builds top/bottom contributors, sector and instrument-type breakdowns,
/// contributor counts, alpha and concentration statistics.
pub fn build_summary(
    attributions: &[AssetAttribution],
    reference_return: Decimal,
    benchmark_return: Option<Decimal>,
) -> AttributionSummary {
    let top_contributor = attributions
        .iter()
        .max_by_key(|a| a.contribution_pp)
        .cloned();
    let bottom_contributor = attributions
        .iter()
        .min_by_key(|a| a.contribution_pp)
        .cloned();

    let sector_breakdown = group_breakdown(attributions, |a| {
        a.sector.clone().unwrap_or_else(|| "Unknown".to_string())
    });
    let type_breakdown = group_breakdown(attributions, |a| a.instrument_type.to_string());

    let positive_count = attributions
        .iter()
        .filter(|a| a.contribution_pp > Decimal::ZERO)
        .count();
    let negative_count = attributions
        .iter()
        .filter(|a| a.contribution_pp < Decimal::ZERO)
        .count();
    let neutral_count = attributions.len() - positive_count - negative_count;

    let alpha = benchmark_return.map(|benchmark| reference_return - benchmark);

    let mut sorted: Vec<&AssetAttribution> = attributions.iter().collect();
    sorted.sort_by(|a, b| b.contribution_pp.cmp(&a.contribution_pp));
    let top_five_pp: Decimal = sorted.iter().take(5).map(|a| a.contribution_pp).sum();

    let concentration_ratio = if reference_return.is_zero() {
        Decimal::ZERO
    } else {
        (top_five_pp / reference_return * ONE_HUNDRED).round_dp(DISPLAY_DECIMAL_PRECISION)
    };
    let diversification_score =
        (ONE_HUNDRED - concentration_ratio.abs()).round_dp(DISPLAY_DECIMAL_PRECISION);

    AttributionSummary {
        top_contributor,
        bottom_contributor,
        sector_breakdown,
        type_breakdown,
        positive_count,
        negative_count,
        neutral_count,
        alpha,
        concentration_ratio,
        diversification_score,
    }
}

fn group_breakdown<F>(attributions: &[AssetAttribution], group_of: F) -> Vec<GroupBreakdown>
where
    F: Fn(&AssetAttribution) -> String,
{
    let mut groups: HashMap<String, (Decimal, Decimal)> = HashMap::new();
    for attribution in attributions {
        let entry = groups.entry(group_of(attribution)).or_default();
        entry.0 += attribution.contribution_pp;
        entry.1 += attribution.value_end;
    }

    let mut breakdown: Vec<GroupBreakdown> = groups
        .into_iter()
        .map(|(name, (contribution_pp, value))| GroupBreakdown {
            name,
            contribution_pp,
            value,
        })
        .collect();
    breakdown.sort_by(|a, b| b.contribution_pp.cmp(&a.contribution_pp));
    breakdown
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::attribution::AssetStatus;
    use crate::snapshots::InstrumentType;

    fn entry(
        ticker: &str,
        instrument_type: InstrumentType,
        sector: Option<&str>,
        pp: Decimal,
        value_end: Decimal,
    ) -> AssetAttribution {
        AssetAttribution {
            asset_key: format!("{}:{}", ticker, instrument_type),
            ticker: ticker.to_string(),
            instrument_type,
            status: AssetStatus::Active,
            weight: Decimal::ZERO,
            return_pct: Decimal::ZERO,
            contribution_pp: pp,
            contribution_absolute: Decimal::ZERO,
            value_start: Decimal::ZERO,
            value_end,
            value_change: Decimal::ZERO,
            is_new_asset: false,
            has_unit_change: false,
            has_partial_sales: false,
            sector: sector.map(|s| s.to_string()),
        }
    }

    fn sample() -> Vec<AssetAttribution> {
        vec![
            entry("AAPL", InstrumentType::Stock, Some("Technology"), dec!(4), dec!(5000)),
            entry("MSFT", InstrumentType::Stock, Some("Technology"), dec!(3), dec!(4000)),
            entry("VTI", InstrumentType::Etf, None, dec!(2), dec!(6000)),
            entry("XOM", InstrumentType::Stock, Some("Energy"), dec!(-1), dec!(2000)),
            entry("FLAT", InstrumentType::Fund, None, dec!(0), dec!(1000)),
        ]
    }

    #[test]
    fn test_top_and_bottom_contributors() {
        let summary = build_summary(&sample(), dec!(8), None);
        assert_eq!(summary.top_contributor.unwrap().ticker, "AAPL");
        assert_eq!(summary.bottom_contributor.unwrap().ticker, "XOM");
    }

    #[test]
    fn test_counts() {
        let summary = build_summary(&sample(), dec!(8), None);
        assert_eq!(summary.positive_count, 3);
        assert_eq!(summary.negative_count, 1);
        assert_eq!(summary.neutral_count, 1);
    }

    #[test]
    fn test_sector_breakdown_buckets_unknown() {
        let summary = build_summary(&sample(), dec!(8), None);
        let tech = summary
            .sector_breakdown
            .iter()
            .find(|g| g.name == "Technology")
            .unwrap();
        assert_eq!(tech.contribution_pp, dec!(7));
        assert_eq!(tech.value, dec!(9000));

        let unknown = summary
            .sector_breakdown
            .iter()
            .find(|g| g.name == "Unknown")
            .unwrap();
        assert_eq!(unknown.contribution_pp, dec!(2));
        assert_eq!(unknown.value, dec!(7000));
    }

    #[test]
    fn test_type_breakdown_sums_by_instrument() {
        let summary = build_summary(&sample(), dec!(8), None);
        let stocks = summary
            .type_breakdown
            .iter()
            .find(|g| g.name == "STOCK")
            .unwrap();
        assert_eq!(stocks.contribution_pp, dec!(6));
    }

    #[test]
    fn test_alpha_only_with_benchmark() {
        let with = build_summary(&sample(), dec!(8), Some(dec!(5)));
        assert_eq!(with.alpha, Some(dec!(3)));

        let without = build_summary(&sample(), dec!(8), None);
        assert_eq!(without.alpha, None);
    }

    #[test]
    fn test_concentration_and_diversification() {
        // Top five sum to 8pp on a reference of 8 -> 100% concentration.
        let summary = build_summary(&sample(), dec!(8), None);
        assert_eq!(summary.concentration_ratio, dec!(100));
        assert_eq!(summary.diversification_score, dec!(0));
    }

    #[test]
    fn test_zero_reference_has_zero_concentration() {
        let summary = build_summary(&sample(), Decimal::ZERO, None);
        assert_eq!(summary.concentration_ratio, Decimal::ZERO);
        assert_eq!(summary.diversification_score, dec!(100));
    }

    #[test]
    fn test_inputs_not_mutated() {
        let input = sample();
        let before = input.clone();
        let _ = build_summary(&input, dec!(8), None);
        assert_eq!(input, before);
    }
}
