//! Multi-account return aggregation.
//!
//! The authoritative method pools per-date values across accounts, derives
//! a value-weighted daily change for each date, and compounds the pooled
//! series once. Weighting each account's independently compounded TWR by
//! its latest value is only an approximation and is used solely when some
//! account is missing a date; the output labels which method produced it.

use log::warn;
use rust_decimal::Decimal;
use std::collections::{BTreeSet, HashMap};

use crate::constants::DECIMAL_PRECISION;

use super::twr::compound_daily_changes;
use super::{AggregatedReturn, AggregationMethod, DailySeriesPoint};

/// One account's full daily series for the period.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountDailySeries {
    pub account_id: String,
    pub points: Vec<DailySeriesPoint>,
}

impl AccountDailySeries {
    fn latest_value(&self) -> Decimal {
        self.points
            .last()
            .map(|p| p.total_value)
            .unwrap_or(Decimal::ZERO)
    }
}

/// Blends several accounts' daily series into one period return.
pub fn aggregate_account_series(series: &[AccountDailySeries]) -> AggregatedReturn {
    let non_empty: Vec<&AccountDailySeries> =
        series.iter().filter(|s| !s.points.is_empty()).collect();

    if non_empty.is_empty() {
        return AggregatedReturn {
            return_pct: Decimal::ZERO,
            has_data: false,
            method: AggregationMethod::SingleSeries,
        };
    }

    if non_empty.len() == 1 {
        let changes: Vec<Decimal> = non_empty[0]
            .points
            .iter()
            .map(|p| p.adjusted_change_pct)
            .collect();
        let compounded = compound_daily_changes(&changes);
        return AggregatedReturn {
            return_pct: compounded.return_pct,
            has_data: compounded.has_data,
            method: AggregationMethod::SingleSeries,
        };
    }

    match pooled_daily_changes(&non_empty) {
        Some(pooled) => {
            let compounded = compound_daily_changes(&pooled);
            AggregatedReturn {
                return_pct: compounded.return_pct,
                has_data: compounded.has_data,
                method: AggregationMethod::PooledDaily,
            }
        }
        None => weighted_twr_fallback(&non_empty),
    }
}

/// Builds the value-weighted pooled change series. Returns `None` when
/// any account lacks a data point for some date in the union, or when no
/// date carries any value to weight by.
fn pooled_daily_changes(series: &[&AccountDailySeries]) -> Option<Vec<Decimal>> {
    let all_dates: BTreeSet<_> = series
        .iter()
        .flat_map(|s| s.points.iter().map(|p| p.date))
        .collect();

    let by_date: Vec<HashMap<_, _>> = series
        .iter()
        .map(|s| s.points.iter().map(|p| (p.date, p)).collect())
        .collect();

    let mut pooled = Vec::with_capacity(all_dates.len());
    let mut any_value = false;
    for date in &all_dates {
        let mut value_sum = Decimal::ZERO;
        let mut weighted_change_sum = Decimal::ZERO;
        for account_points in &by_date {
            let point: &&DailySeriesPoint = account_points.get(date)?;
            value_sum += point.total_value;
            weighted_change_sum += point.total_value * point.adjusted_change_pct;
        }
        if value_sum.is_zero() {
            pooled.push(Decimal::ZERO);
        } else {
            any_value = true;
            pooled.push(weighted_change_sum / value_sum);
        }
    }
    if !any_value {
        return None;
    }
    Some(pooled)
}

/// Approximation: weight each account's compounded TWR by its latest
/// value. Falls back to an arithmetic mean when total weight is zero.
fn weighted_twr_fallback(series: &[&AccountDailySeries]) -> AggregatedReturn {
    warn!(
        "Per-date pooling unusable for {} accounts (missing dates or no \
         pooled value); falling back to value-weighted TWR approximation",
        series.len()
    );

    let twrs: Vec<(Decimal, Decimal)> = series
        .iter()
        .map(|s| {
            let changes: Vec<Decimal> =
                s.points.iter().map(|p| p.adjusted_change_pct).collect();
            (
                compound_daily_changes(&changes).return_pct,
                s.latest_value(),
            )
        })
        .collect();

    let total_weight: Decimal = twrs.iter().map(|(_, w)| *w).sum();

    if total_weight.is_zero() {
        let count = Decimal::from(twrs.len());
        let mean = twrs.iter().map(|(twr, _)| *twr).sum::<Decimal>() / count;
        return AggregatedReturn {
            return_pct: mean.round_dp(DECIMAL_PRECISION),
            has_data: true,
            method: AggregationMethod::ArithmeticMean,
        };
    }

    let weighted: Decimal = twrs
        .iter()
        .map(|(twr, weight)| twr * weight)
        .sum::<Decimal>()
        / total_weight;

    AggregatedReturn {
        return_pct: weighted.round_dp(DECIMAL_PRECISION),
        has_data: true,
        method: AggregationMethod::WeightedTwrApproximation,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use rust_decimal_macros::dec;

    fn day(d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, d).unwrap()
    }

    fn point(d: u32, value: Decimal, change: Decimal) -> DailySeriesPoint {
        DailySeriesPoint {
            date: day(d),
            total_value: value,
            adjusted_change_pct: change,
        }
    }

    fn account(id: &str, points: Vec<DailySeriesPoint>) -> AccountDailySeries {
        AccountDailySeries {
            account_id: id.to_string(),
            points,
        }
    }

    #[test]
    fn test_empty_input_has_no_data() {
        let result = aggregate_account_series(&[]);
        assert!(!result.has_data);
        assert_eq!(result.return_pct, Decimal::ZERO);
    }

    #[test]
    fn test_single_account_delegates_to_compounder() {
        let result = aggregate_account_series(&[account(
            "a1",
            vec![point(3, dec!(110), dec!(10)), point(4, dec!(104.5), dec!(-5))],
        )]);
        assert_eq!(result.method, AggregationMethod::SingleSeries);
        assert_eq!(result.return_pct, dec!(4.5));
    }

    #[test]
    fn test_pooled_blend_stays_within_account_bounds() {
        // Account values 100 and 300 with steady daily changes compounding
        // to roughly 10% and 20%; the blend must land between them.
        let small = account(
            "small",
            vec![
                point(3, dec!(100), dec!(4.8809)),
                point(4, dec!(104.88), dec!(4.8809)),
            ],
        );
        let large = account(
            "large",
            vec![
                point(3, dec!(300), dec!(9.5445)),
                point(4, dec!(328.63), dec!(9.5445)),
            ],
        );

        let result = aggregate_account_series(&[small, large]);
        assert_eq!(result.method, AggregationMethod::PooledDaily);
        assert!(result.return_pct > dec!(10));
        assert!(result.return_pct < dec!(20));
    }

    #[test]
    fn test_pooled_weighting_follows_values() {
        // One flat account, one rising account holding 3x the value: the
        // pooled change each day is 0.75 of the rising account's change.
        let flat = account("flat", vec![point(3, dec!(100), dec!(0))]);
        let rising = account("rising", vec![point(3, dec!(300), dec!(4))]);

        let result = aggregate_account_series(&[flat, rising]);
        assert_eq!(result.method, AggregationMethod::PooledDaily);
        assert_eq!(result.return_pct, dec!(3));
    }

    #[test]
    fn test_missing_date_triggers_labeled_fallback() {
        let complete = account(
            "a1",
            vec![point(3, dec!(100), dec!(10)), point(4, dec!(110), dec!(0))],
        );
        let sparse = account("a2", vec![point(3, dec!(300), dec!(20))]);

        let result = aggregate_account_series(&[complete, sparse]);
        assert_eq!(result.method, AggregationMethod::WeightedTwrApproximation);
        // (10 * 110 + 20 * 300) / 410
        assert_eq!(result.return_pct.round_dp(4), dec!(17.3171));
    }

    #[test]
    fn test_zero_total_weight_uses_arithmetic_mean() {
        let a = account("a1", vec![point(3, dec!(0), dec!(10))]);
        let b = account("a2", vec![point(4, dec!(0), dec!(20))]);

        let result = aggregate_account_series(&[a, b]);
        assert_eq!(result.method, AggregationMethod::ArithmeticMean);
        assert_eq!(result.return_pct, dec!(15));
    }

    #[test]
    fn test_all_zero_values_on_shared_dates_use_arithmetic_mean() {
        // Complete date coverage, but nothing to weight by: a 0% result
        // labeled as pooled would misstate both figure and method.
        let a = account("a1", vec![point(3, dec!(0), dec!(10))]);
        let b = account("a2", vec![point(3, dec!(0), dec!(20))]);

        let result = aggregate_account_series(&[a, b]);
        assert_eq!(result.method, AggregationMethod::ArithmeticMean);
        assert_eq!(result.return_pct, dec!(15));
    }
}
