//! Property-based integration tests for the attribution engine.
//!
//! These tests verify that universal properties hold across all valid inputs,
//! using the `proptest` crate for random test case generation.

use proptest::prelude::*;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use folioscope_core::attribution::summary::build_summary;
use folioscope_core::attribution::twr::{chain_returns_pct, compound_daily_changes};
use folioscope_core::attribution::waterfall::{build_waterfall, WaterfallConfig};
use folioscope_core::attribution::{
    reconcile, AssetAttribution, AssetStatus, AttributionResult, WaterfallBarKind,
};
use folioscope_core::snapshots::InstrumentType;

// =============================================================================
// Generators
// =============================================================================

/// Generates one daily percentage change between -50% and +50%.
fn arb_change() -> impl Strategy<Value = Decimal> {
    (-50i64..=50).prop_map(Decimal::from)
}

/// Generates a short daily change series. Kept small so products stay well
/// inside `Decimal` precision and compounding order cannot round away.
fn arb_changes(max_len: usize) -> impl Strategy<Value = Vec<Decimal>> {
    proptest::collection::vec(arb_change(), 0..=max_len)
}

/// Generates a per-asset attribution entry with consistent pp and currency
/// figures over a 10,000 start value.
fn arb_attribution(index: usize) -> impl Strategy<Value = AssetAttribution> {
    (-2000i64..=2000).prop_map(move |centipp| {
        let contribution_pp = Decimal::from(centipp) / dec!(100);
        let contribution_absolute = contribution_pp * dec!(100);
        AssetAttribution {
            asset_key: format!("T{}:STOCK", index),
            ticker: format!("T{}", index),
            instrument_type: InstrumentType::Stock,
            status: AssetStatus::Active,
            weight: Decimal::ZERO,
            return_pct: contribution_pp,
            contribution_pp,
            contribution_absolute,
            value_start: dec!(1000),
            value_end: dec!(1000) + contribution_absolute,
            value_change: contribution_absolute,
            is_new_asset: false,
            has_unit_change: false,
            has_partial_sales: false,
            sector: None,
        }
    })
}

fn arb_attributions(max_count: usize) -> impl Strategy<Value = Vec<AssetAttribution>> {
    (0..=max_count).prop_flat_map(|count| {
        (0..count).map(arb_attribution).collect::<Vec<_>>()
    })
}

fn result_from(attributions: Vec<AssetAttribution>) -> AttributionResult {
    let sum: Decimal = attributions.iter().map(|a| a.contribution_pp).sum();
    AttributionResult {
        attributions,
        start_total_value: dec!(10000),
        sum_of_contributions: sum,
        ..Default::default()
    }
}

const TOLERANCE: Decimal = dec!(0.0001);

// =============================================================================
// Property Tests
// =============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    /// Compounding multiplies daily factors, so the order of days cannot
    /// change the period return.
    #[test]
    fn prop_compounding_is_order_invariant(changes in arb_changes(10)) {
        let mut reversed = changes.clone();
        reversed.reverse();

        prop_assert_eq!(
            compound_daily_changes(&changes).return_pct,
            compound_daily_changes(&reversed).return_pct
        );
    }

    /// Splitting a series in two and chaining the partial returns must
    /// agree with compounding the whole series at once.
    #[test]
    fn prop_chained_splits_match_joint_compounding(
        first in arb_changes(8),
        second in arb_changes(8),
    ) {
        prop_assume!(!first.is_empty() && !second.is_empty());

        let mut joint = first.clone();
        joint.extend_from_slice(&second);

        let chained = chain_returns_pct(
            compound_daily_changes(&first).return_pct,
            compound_daily_changes(&second).return_pct,
        );
        let whole = compound_daily_changes(&joint).return_pct;

        prop_assert!(
            (chained - whole).abs() <= TOLERANCE,
            "chained {} vs joint {}",
            chained,
            whole
        );
    }

    /// Compounding never produces a loss beyond -100% for daily changes
    /// above -100%.
    #[test]
    fn prop_compounded_return_bounded_below(changes in arb_changes(10)) {
        let result = compound_daily_changes(&changes);
        prop_assert!(result.return_pct > dec!(-100));
    }

    /// After reconciliation the percentage contributions sum to the
    /// reference return whenever there was anything to scale.
    #[test]
    fn prop_reconciled_contributions_sum_to_reference(
        attributions in arb_attributions(20),
        reference_centipp in -5000i64..=5000,
    ) {
        let reference = Decimal::from(reference_centipp) / dec!(100);
        let mut result = result_from(attributions);
        prop_assume!(!result.sum_of_contributions.is_zero());

        reconcile(&mut result, reference);

        prop_assert!(
            (result.sum_of_contributions - reference).abs() <= TOLERANCE,
            "sum {} vs reference {}",
            result.sum_of_contributions,
            reference
        );
    }

    /// Reconciliation rescales percentage points only; every currency
    /// amount survives untouched.
    #[test]
    fn prop_reconciliation_never_touches_currency_amounts(
        attributions in arb_attributions(20),
        reference_centipp in -5000i64..=5000,
    ) {
        let reference = Decimal::from(reference_centipp) / dec!(100);
        let before: Vec<(Decimal, Decimal)> = attributions
            .iter()
            .map(|a| (a.contribution_absolute, a.value_change))
            .collect();
        let mut result = result_from(attributions);

        reconcile(&mut result, reference);

        for (entry, (absolute, change)) in result.attributions.iter().zip(before) {
            prop_assert_eq!(entry.contribution_absolute, absolute);
            prop_assert_eq!(entry.value_change, change);
        }
    }

    /// The waterfall always starts and ends pinned to the actual portfolio
    /// totals, whatever got dropped or folded in between.
    #[test]
    fn prop_waterfall_endpoints_pinned(
        attributions in arb_attributions(20),
        start_value in 1000i64..100_000,
        end_value in 1000i64..100_000,
    ) {
        let start = Decimal::from(start_value);
        let end = Decimal::from(end_value);

        let bars = build_waterfall(&attributions, start, end, &WaterfallConfig::default());

        let first = bars.first().unwrap();
        prop_assert_eq!(first.kind, WaterfallBarKind::Start);
        prop_assert_eq!(first.running_total, start);

        let last = bars.last().unwrap();
        prop_assert_eq!(last.kind, WaterfallBarKind::End);
        prop_assert_eq!(last.running_total, end);
    }

    /// Each waterfall side renders at most its budget of individual bars
    /// plus one aggregate bar.
    #[test]
    fn prop_waterfall_respects_bar_budgets(attributions in arb_attributions(30)) {
        let config = WaterfallConfig::default();
        let bars = build_waterfall(&attributions, dec!(10000), dec!(11000), &config);

        let positives = bars
            .iter()
            .filter(|b| b.kind == WaterfallBarKind::Positive)
            .count();
        prop_assert!(positives <= config.max_positive_bars + 1);

        let negatives = bars
            .iter()
            .filter(|b| b.kind == WaterfallBarKind::Negative)
            .count();
        prop_assert!(negatives <= config.max_positive_bars + 1);
    }

    /// Positive, negative and neutral counts partition the attribution
    /// list.
    #[test]
    fn prop_summary_counts_partition_the_list(attributions in arb_attributions(30)) {
        let summary = build_summary(&attributions, dec!(5), None);

        prop_assert_eq!(
            summary.positive_count + summary.negative_count + summary.neutral_count,
            attributions.len()
        );
    }

    /// The top contributor never ranks below the bottom contributor.
    #[test]
    fn prop_summary_top_is_at_least_bottom(attributions in arb_attributions(30)) {
        let summary = build_summary(&attributions, dec!(5), None);

        if let (Some(top), Some(bottom)) = (summary.top_contributor, summary.bottom_contributor) {
            prop_assert!(top.contribution_pp >= bottom.contribution_pp);
        } else {
            prop_assert!(attributions.is_empty());
        }
    }
}
