//! Time-weighted return compounding over daily adjusted-change series.

use rust_decimal::Decimal;
use rust_decimal_macros::dec;

use crate::constants::DECIMAL_PRECISION;

use super::CompoundedReturn;

const ONE_HUNDRED: Decimal = dec!(100);

/// Compounds ordered daily percentage changes into one period return:
/// `(∏(1 + rᵢ/100) − 1) × 100`.
///
/// Days with zero change are skipped; their factor is exactly 1 so the
/// result is unchanged. Empty input yields `has_data = false` and a zero
/// return. Never fails.
pub fn compound_daily_changes(daily_changes_pct: &[Decimal]) -> CompoundedReturn {
    if daily_changes_pct.is_empty() {
        return CompoundedReturn::empty();
    }

    let mut cumulative_factor = Decimal::ONE;
    for change_pct in daily_changes_pct {
        if change_pct.is_zero() {
            continue;
        }
        cumulative_factor *= Decimal::ONE + change_pct / ONE_HUNDRED;
    }

    CompoundedReturn {
        return_pct: ((cumulative_factor - Decimal::ONE) * ONE_HUNDRED)
            .round_dp(DECIMAL_PRECISION),
        has_data: true,
    }
}

/// Compounds two already-expressed period returns (in percent) into one.
pub fn chain_returns_pct(first_pct: Decimal, second_pct: Decimal) -> Decimal {
    let chained = (Decimal::ONE + first_pct / ONE_HUNDRED)
        * (Decimal::ONE + second_pct / ONE_HUNDRED)
        - Decimal::ONE;
    (chained * ONE_HUNDRED).round_dp(DECIMAL_PRECISION)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_empty_input_has_no_data() {
        let result = compound_daily_changes(&[]);
        assert!(!result.has_data);
        assert_eq!(result.return_pct, Decimal::ZERO);
    }

    #[test]
    fn test_single_day_is_identity() {
        let result = compound_daily_changes(&[dec!(1.5)]);
        assert!(result.has_data);
        assert_eq!(result.return_pct, dec!(1.5));
    }

    #[test]
    fn test_compounds_multiplicatively() {
        // (1.10 * 0.95 - 1) * 100 = 4.5
        let result = compound_daily_changes(&[dec!(10), dec!(-5)]);
        assert_eq!(result.return_pct, dec!(4.5));
    }

    #[test]
    fn test_zero_days_are_no_ops() {
        let with_zeros = compound_daily_changes(&[dec!(2), dec!(0), dec!(0), dec!(3)]);
        let without = compound_daily_changes(&[dec!(2), dec!(3)]);
        assert_eq!(with_zeros.return_pct, without.return_pct);
    }

    #[test]
    fn test_chain_keeps_the_cross_term() {
        // (1.0827 * 1.005 - 1) * 100
        let combined = chain_returns_pct(dec!(8.27), dec!(0.5));
        assert_eq!(combined, dec!(8.81135));
    }

    proptest! {
        #[test]
        fn prop_zero_days_never_change_result(
            changes in proptest::collection::vec(-50i64..50, 0..20),
            zero_positions in proptest::collection::vec(0usize..20, 0..5),
        ) {
            let base: Vec<Decimal> = changes.iter().map(|c| Decimal::from(*c)).collect();
            let mut padded = base.clone();
            for pos in zero_positions {
                let idx = pos.min(padded.len());
                padded.insert(idx, Decimal::ZERO);
            }
            prop_assert_eq!(
                compound_daily_changes(&base).return_pct,
                compound_daily_changes(&padded).return_pct
            );
        }

        #[test]
        fn prop_single_positive_day_is_positive(change in 1i64..100) {
            let result = compound_daily_changes(&[Decimal::from(change)]);
            prop_assert!(result.return_pct > Decimal::ZERO);
        }
    }
}
