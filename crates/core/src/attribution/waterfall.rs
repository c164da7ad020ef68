//! Waterfall presentation bars over the reconciled attribution list.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use std::cmp::Reverse;

use crate::constants::{
    DEFAULT_MAX_WATERFALL_BARS, DEFAULT_WATERFALL_MIN_PP, WATERFALL_NEGATIVE_BUDGET_RATIO,
};

use super::{AssetAttribution, WaterfallBar, WaterfallBarKind};

/// Presentation knobs for the waterfall.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaterfallConfig {
    /// Individually rendered bars on the positive side.
    pub max_positive_bars: usize,
    /// Contributions below this magnitude (percentage points) are dropped.
    pub min_contribution_pp: Decimal,
}

impl Default for WaterfallConfig {
    fn default() -> Self {
        Self {
            max_positive_bars: DEFAULT_MAX_WATERFALL_BARS,
            min_contribution_pp: DEFAULT_WATERFALL_MIN_PP,
        }
    }
}

/// Builds the ordered bar list: start bar, top positive contributors,
/// optional "+N more" positive aggregate, top negative contributors with
/// a smaller budget, optional negative aggregate, end bar.
///
/// Contributions below the threshold are dropped entirely; immaterial
/// moves are noise. Each floating bar carries the running total after it,
/// which is the invisible offset the chart renders it at. The start and
/// end bars pin the chart to the actual portfolio totals, so the last
/// running total always equals `end_total_value`.
pub fn build_waterfall(
    attributions: &[AssetAttribution],
    start_total_value: Decimal,
    end_total_value: Decimal,
    config: &WaterfallConfig,
) -> Vec<WaterfallBar> {
    let material: Vec<&AssetAttribution> = attributions
        .iter()
        .filter(|a| a.contribution_pp.abs() >= config.min_contribution_pp)
        .collect();

    let mut positives: Vec<&AssetAttribution> = material
        .iter()
        .copied()
        .filter(|a| a.contribution_pp > Decimal::ZERO)
        .collect();
    positives.sort_by_key(|a| Reverse(a.contribution_pp));

    let mut negatives: Vec<&AssetAttribution> = material
        .iter()
        .copied()
        .filter(|a| a.contribution_pp < Decimal::ZERO)
        .collect();
    negatives.sort_by_key(|a| a.contribution_pp);

    let negative_budget = negative_budget(config.max_positive_bars);

    let mut bars = Vec::with_capacity(positives.len().min(config.max_positive_bars) + negative_budget + 4);
    let mut running_total = start_total_value;

    bars.push(WaterfallBar {
        name: "Start".to_string(),
        value: start_total_value,
        contribution_pp: Decimal::ZERO,
        kind: WaterfallBarKind::Start,
        running_total: start_total_value,
        grouped_assets: Vec::new(),
    });

    push_side(
        &mut bars,
        &positives,
        config.max_positive_bars,
        WaterfallBarKind::Positive,
        &mut running_total,
    );
    push_side(
        &mut bars,
        &negatives,
        negative_budget,
        WaterfallBarKind::Negative,
        &mut running_total,
    );

    bars.push(WaterfallBar {
        name: "End".to_string(),
        value: end_total_value,
        contribution_pp: Decimal::ZERO,
        kind: WaterfallBarKind::End,
        running_total: end_total_value,
        grouped_assets: Vec::new(),
    });

    bars
}

fn negative_budget(max_positive_bars: usize) -> usize {
    let budget = (Decimal::from(max_positive_bars as u64) * WATERFALL_NEGATIVE_BUDGET_RATIO)
        .round()
        .to_usize()
        .unwrap_or(1);
    budget.max(1)
}

fn push_side(
    bars: &mut Vec<WaterfallBar>,
    entries: &[&AssetAttribution],
    budget: usize,
    kind: WaterfallBarKind,
    running_total: &mut Decimal,
) {
    let (individual, rest) = entries.split_at(entries.len().min(budget));

    for attribution in individual {
        *running_total += attribution.contribution_absolute;
        bars.push(WaterfallBar {
            name: attribution.ticker.clone(),
            value: attribution.contribution_absolute,
            contribution_pp: attribution.contribution_pp,
            kind,
            running_total: *running_total,
            grouped_assets: Vec::new(),
        });
    }

    if !rest.is_empty() {
        let value: Decimal = rest.iter().map(|a| a.contribution_absolute).sum();
        let contribution_pp: Decimal = rest.iter().map(|a| a.contribution_pp).sum();
        *running_total += value;
        bars.push(WaterfallBar {
            name: format!("+{} more", rest.len()),
            value,
            contribution_pp,
            kind,
            running_total: *running_total,
            grouped_assets: rest.iter().map(|a| a.asset_key.clone()).collect(),
        });
    }
}
