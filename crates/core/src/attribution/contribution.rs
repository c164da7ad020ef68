//! Per-asset contribution decomposition.
//!
//! Decomposes the naive period return into one entry per holding,
//! isolating the price effect on units held at period start from value
//! attributable to capital injected during the period. New capital is not
//! return: a position doubled mid-period contributes only the price move
//! on the units it started with, plus realized gains.

use log::debug;
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::HashMap;

use crate::constants::{CLOSED_POSITION_MIN_PP, DECIMAL_PRECISION, UNIT_CHANGE_THRESHOLD};
use crate::ledger::SellSummary;
use crate::snapshots::{AssetSnapshot, CurrencyView};

use super::{AssetAttribution, AssetStatus, AttributionResult};

const ONE_HUNDRED: Decimal = dec!(100);

/// Inputs for one contribution pass, already resolved to a single
/// currency view at each endpoint.
pub struct ContributionInputs<'a> {
    /// View at period start; `None` when the portfolio began mid-period.
    pub start_view: Option<&'a CurrencyView>,
    /// View at period end (the latest snapshot).
    pub end_view: &'a CurrencyView,
    /// In-period sells grouped by asset key.
    pub sell_summaries: &'a HashMap<String, SellSummary>,
}

/// Computes raw (pre-reconciliation) per-asset contributions.
///
/// Every asset key in the end view is attributed; asset keys appearing
/// only in sell events become synthesized fully-closed entries. Holdings
/// present at start but absent from both are skipped.
pub fn calculate_contributions(inputs: ContributionInputs<'_>) -> AttributionResult {
    let start_total_value = inputs
        .start_view
        .map(|v| v.total_value)
        .unwrap_or(Decimal::ZERO);
    let end_total_value = inputs.end_view.total_value;

    let mut attributions: Vec<AssetAttribution> = Vec::with_capacity(
        inputs.end_view.assets.len() + inputs.sell_summaries.len(),
    );

    for (asset_key, end_asset) in &inputs.end_view.assets {
        let start_asset = inputs
            .start_view
            .and_then(|view| view.assets.get(asset_key));
        let sells = inputs.sell_summaries.get(asset_key);

        let attribution = attribute_held_asset(
            asset_key,
            start_asset,
            end_asset,
            sells,
            start_total_value,
            end_total_value,
        );

        match attribution {
            Some(entry) => attributions.push(entry),
            None => debug!("Suppressed immaterial closed position {}", asset_key),
        }
    }

    // Fully closed positions absent from the end snapshot exist only in
    // the sell ledger.
    for (asset_key, sells) in inputs.sell_summaries {
        if inputs.end_view.assets.contains_key(asset_key) {
            continue;
        }
        let start_asset = inputs
            .start_view
            .and_then(|view| view.assets.get(asset_key));

        if let Some(entry) =
            synthesize_closed_position(asset_key, start_asset, sells, start_total_value)
        {
            attributions.push(entry);
        } else {
            debug!("Suppressed immaterial closed position {}", asset_key);
        }
    }

    attributions.sort_by(|a, b| b.contribution_pp.cmp(&a.contribution_pp));

    let sum_of_contributions: Decimal =
        attributions.iter().map(|a| a.contribution_pp).sum();

    AttributionResult {
        attributions,
        total_portfolio_value: end_total_value,
        total_portfolio_investment: inputs.end_view.total_investment,
        reference_return: Decimal::ZERO,
        start_total_value,
        sum_of_contributions: sum_of_contributions.round_dp(DECIMAL_PRECISION),
        discrepancy: Decimal::ZERO,
        normalized: false,
    }
}

/// Attributes one asset present in the end snapshot.
///
/// Returns `None` only for end-listed positions that turn out to be fully
/// closed and fall below the emission floor.
fn attribute_held_asset(
    asset_key: &str,
    start_asset: Option<&AssetSnapshot>,
    end_asset: &AssetSnapshot,
    sells: Option<&SellSummary>,
    start_total_value: Decimal,
    end_total_value: Decimal,
) -> Option<AssetAttribution> {
    let units_start = start_asset.map(|a| a.units).unwrap_or(Decimal::ZERO);
    let value_start = start_asset.map(|a| a.total_value).unwrap_or(Decimal::ZERO);
    let units_end = end_asset.units;
    let value_end = end_asset.total_value;

    let realized_pnl = sells
        .map(|s| s.total_realized_pnl)
        .unwrap_or(Decimal::ZERO);
    let units_sold = sells.map(|s| s.total_units_sold).unwrap_or(Decimal::ZERO);

    let is_new = units_start.abs() < UNIT_CHANGE_THRESHOLD && value_start.is_zero();
    let is_closed_out = units_end.abs() < UNIT_CHANGE_THRESHOLD && value_end.is_zero();

    if !is_new && is_closed_out {
        // Listed in the end snapshot with nothing left: same treatment as
        // a position missing from it entirely.
        let contribution_pp = to_contribution_pp(realized_pnl, start_total_value);
        if contribution_pp.abs() < CLOSED_POSITION_MIN_PP {
            return None;
        }
        return Some(closed_attribution(
            asset_key,
            end_asset.ticker.clone(),
            end_asset,
            value_start,
            realized_pnl,
            contribution_pp,
            sells,
        ));
    }

    // Sub-threshold start units cannot anchor a start price; the
    // position's own P&L stands in, same as for a new position.
    let contribution_value = if is_new || units_start.abs() < UNIT_CHANGE_THRESHOLD {
        end_asset.unrealized_pnl + realized_pnl
    } else {
        let price_start = value_start / units_start;
        let price_end = if units_end.abs() < UNIT_CHANGE_THRESHOLD {
            Decimal::ZERO
        } else {
            value_end / units_end
        };
        (price_end - price_start) * units_start + realized_pnl
    };

    let has_unit_change = (units_end - units_start).abs() >= UNIT_CHANGE_THRESHOLD;
    let has_partial_sales = units_sold >= UNIT_CHANGE_THRESHOLD;

    let return_pct = display_return_pct(end_asset, sells, has_partial_sales);

    Some(AssetAttribution {
        asset_key: asset_key.to_string(),
        ticker: end_asset.ticker.clone(),
        instrument_type: end_asset.instrument_type,
        status: AssetStatus::Active,
        weight: weight_of(value_end, end_total_value),
        return_pct,
        contribution_pp: to_contribution_pp(contribution_value, start_total_value),
        contribution_absolute: contribution_value.round_dp(DECIMAL_PRECISION),
        value_start,
        value_end,
        value_change: value_end - value_start,
        is_new_asset: is_new,
        has_unit_change,
        has_partial_sales,
        sector: end_asset.sector.clone(),
    })
}

/// Builds the standalone entry for a position that only exists in the
/// sell ledger. Emitted only above the materiality floor.
fn synthesize_closed_position(
    asset_key: &str,
    start_asset: Option<&AssetSnapshot>,
    sells: &SellSummary,
    start_total_value: Decimal,
) -> Option<AssetAttribution> {
    let contribution_pp = to_contribution_pp(sells.total_realized_pnl, start_total_value);
    if contribution_pp.abs() < CLOSED_POSITION_MIN_PP {
        return None;
    }

    let value_start = start_asset.map(|a| a.total_value).unwrap_or(Decimal::ZERO);

    Some(AssetAttribution {
        asset_key: asset_key.to_string(),
        ticker: sells.ticker.clone(),
        instrument_type: sells.instrument_type,
        status: AssetStatus::Sold,
        weight: Decimal::ZERO,
        return_pct: closed_return_pct(sells),
        contribution_pp,
        contribution_absolute: sells.total_realized_pnl.round_dp(DECIMAL_PRECISION),
        value_start,
        value_end: Decimal::ZERO,
        value_change: -value_start,
        is_new_asset: false,
        has_unit_change: true,
        has_partial_sales: false,
        sector: start_asset.and_then(|a| a.sector.clone()),
    })
}

fn closed_attribution(
    asset_key: &str,
    ticker: String,
    end_asset: &AssetSnapshot,
    value_start: Decimal,
    realized_pnl: Decimal,
    contribution_pp: Decimal,
    sells: Option<&SellSummary>,
) -> AssetAttribution {
    AssetAttribution {
        asset_key: asset_key.to_string(),
        ticker,
        instrument_type: end_asset.instrument_type,
        status: AssetStatus::Sold,
        weight: Decimal::ZERO,
        return_pct: sells.map(closed_return_pct).unwrap_or(Decimal::ZERO),
        contribution_pp,
        contribution_absolute: realized_pnl.round_dp(DECIMAL_PRECISION),
        value_start,
        value_end: Decimal::ZERO,
        value_change: -value_start,
        is_new_asset: false,
        has_unit_change: true,
        has_partial_sales: false,
        sector: end_asset.sector.clone(),
    }
}

/// Display return for an active holding.
///
/// For partially sold positions, realized and unrealized P&L are blended
/// against the remaining investment plus the cost basis of the units
/// sold; raw since-inception ROI would overstate the period by ignoring
/// the realized leg.
fn display_return_pct(
    end_asset: &AssetSnapshot,
    sells: Option<&SellSummary>,
    has_partial_sales: bool,
) -> Decimal {
    if has_partial_sales {
        if let Some(sells) = sells {
            let denominator = end_asset.total_investment + sells.sold_cost_basis();
            if !denominator.is_zero() {
                let blended = (end_asset.unrealized_pnl + sells.total_realized_pnl)
                    / denominator
                    * ONE_HUNDRED;
                return blended.round_dp(DECIMAL_PRECISION);
            }
        }
    }
    end_asset.total_roi
}

fn closed_return_pct(sells: &SellSummary) -> Decimal {
    let cost_basis = sells.sold_cost_basis();
    if cost_basis.is_zero() {
        return Decimal::ZERO;
    }
    (sells.total_realized_pnl / cost_basis * ONE_HUNDRED).round_dp(DECIMAL_PRECISION)
}

fn to_contribution_pp(contribution_value: Decimal, start_total_value: Decimal) -> Decimal {
    if start_total_value.is_zero() {
        return Decimal::ZERO;
    }
    (contribution_value / start_total_value * ONE_HUNDRED).round_dp(DECIMAL_PRECISION)
}

fn weight_of(value_end: Decimal, end_total_value: Decimal) -> Decimal {
    if end_total_value.is_zero() {
        return Decimal::ZERO;
    }
    (value_end / end_total_value)
        .max(Decimal::ZERO)
        .min(Decimal::ONE)
        .round_dp(DECIMAL_PRECISION)
}
