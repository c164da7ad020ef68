//! Reconciliation of summed contributions against the reference return.
//!
//! Per-asset contributions derive from since-purchase snapshot state
//! while the headline figure is a compounded daily return; the two
//! measure slightly different things. The reconciler rescales only the
//! percentage-point contributions so the breakdown sums to the headline
//! figure. Currency amounts are ground truth and are never rescaled.

use log::debug;
use rust_decimal::Decimal;

use crate::constants::{DECIMAL_PRECISION, RECONCILIATION_TOLERANCE_PP};

use super::AttributionResult;

/// Rescales `contribution_pp` values so they sum to `reference_return`.
///
/// Records the pre-rescale discrepancy either way; a mismatch is a
/// diagnostic, not a failure. `contribution_absolute` and `value_change`
/// are left untouched.
pub fn reconcile(result: &mut AttributionResult, reference_return: Decimal) {
    result.reference_return = reference_return;
    result.discrepancy =
        (reference_return - result.sum_of_contributions).round_dp(DECIMAL_PRECISION);

    if result.discrepancy.abs() <= RECONCILIATION_TOLERANCE_PP {
        result.normalized = false;
        return;
    }

    if result.sum_of_contributions.is_zero() {
        // Nothing to scale against; leave contributions as computed and
        // surface the discrepancy.
        result.normalized = false;
        return;
    }

    let scale = reference_return / result.sum_of_contributions;
    debug!(
        "Reconciling contributions: sum {} vs reference {} (scale {})",
        result.sum_of_contributions, reference_return, scale
    );

    for attribution in &mut result.attributions {
        attribution.contribution_pp =
            (attribution.contribution_pp * scale).round_dp(DECIMAL_PRECISION);
    }
    result.sum_of_contributions = result
        .attributions
        .iter()
        .map(|a| a.contribution_pp)
        .sum::<Decimal>()
        .round_dp(DECIMAL_PRECISION);
    result.normalized = true;
}
