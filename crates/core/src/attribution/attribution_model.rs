//! Attribution domain models: request/response contract, per-asset
//! attribution entries, waterfall bars and summary statistics.

use chrono::{Datelike, Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::errors::ValidationError;
use crate::snapshots::InstrumentType;

/// Reporting window for an attribution request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Period {
    #[serde(rename = "1M")]
    OneMonth,
    #[serde(rename = "3M")]
    ThreeMonths,
    #[serde(rename = "6M")]
    SixMonths,
    #[serde(rename = "YTD")]
    YearToDate,
    #[serde(rename = "1Y")]
    OneYear,
    #[serde(rename = "2Y")]
    TwoYears,
    #[serde(rename = "ALL")]
    All,
}

impl Period {
    /// Start date of the window ending at `today`. `None` means unbounded
    /// (since inception).
    pub fn start_date(&self, today: NaiveDate) -> Option<NaiveDate> {
        let months_back = |months: u32| {
            today
                .checked_sub_months(Months::new(months))
                .unwrap_or(today)
        };
        match self {
            Period::OneMonth => Some(months_back(1)),
            Period::ThreeMonths => Some(months_back(3)),
            Period::SixMonths => Some(months_back(6)),
            Period::YearToDate => NaiveDate::from_ymd_opt(today.year(), 1, 1),
            Period::OneYear => Some(months_back(12)),
            Period::TwoYears => Some(months_back(24)),
            Period::All => None,
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let code = match self {
            Period::OneMonth => "1M",
            Period::ThreeMonths => "3M",
            Period::SixMonths => "6M",
            Period::YearToDate => "YTD",
            Period::OneYear => "1Y",
            Period::TwoYears => "2Y",
            Period::All => "ALL",
        };
        write!(f, "{}", code)
    }
}

impl FromStr for Period {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "1M" => Ok(Period::OneMonth),
            "3M" => Ok(Period::ThreeMonths),
            "6M" => Ok(Period::SixMonths),
            "YTD" => Ok(Period::YearToDate),
            "1Y" => Ok(Period::OneYear),
            "2Y" => Ok(Period::TwoYears),
            "ALL" => Ok(Period::All),
            other => Err(ValidationError::UnknownPeriod(other.to_string())),
        }
    }
}

/// Lifecycle status of an attributed position at period end.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AssetStatus {
    Active,
    Sold,
}

/// How a multi-account return was blended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum AggregationMethod {
    /// Single series compounded directly.
    SingleSeries,
    /// Per-date value-weighted pooling compounded once. Authoritative.
    PooledDaily,
    /// Value-weighted average of independent TWRs. Approximation used
    /// only when per-date pooling is impossible.
    WeightedTwrApproximation,
    /// Unweighted mean of account TWRs (zero total weight).
    ArithmeticMean,
}

/// Result of compounding a daily change series.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompoundedReturn {
    pub return_pct: Decimal,
    pub has_data: bool,
}

impl CompoundedReturn {
    pub fn empty() -> Self {
        Self {
            return_pct: Decimal::ZERO,
            has_data: false,
        }
    }
}

/// One account's daily point used by the multi-account aggregator.
#[derive(Debug, Clone, PartialEq)]
pub struct DailySeriesPoint {
    pub date: NaiveDate,
    pub total_value: Decimal,
    pub adjusted_change_pct: Decimal,
}

/// A blended multi-account return plus the method that produced it.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregatedReturn {
    pub return_pct: Decimal,
    pub has_data: bool,
    pub method: AggregationMethod,
}

/// One holding's share of the period move.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssetAttribution {
    /// `"TICKER:TYPE"` composite key.
    pub asset_key: String,
    pub ticker: String,
    pub instrument_type: InstrumentType,
    pub status: AssetStatus,
    /// Share of period-end portfolio value, 0..=1.
    pub weight: Decimal,
    /// Display return for the holding over the period, percent.
    pub return_pct: Decimal,
    /// Contribution to the portfolio return, percentage points.
    /// Rescaled by the reconciler; `contribution_absolute` never is.
    pub contribution_pp: Decimal,
    /// Contribution in currency. Ground truth, never rescaled.
    pub contribution_absolute: Decimal,
    pub value_start: Decimal,
    pub value_end: Decimal,
    pub value_change: Decimal,
    pub is_new_asset: bool,
    pub has_unit_change: bool,
    pub has_partial_sales: bool,
    #[serde(default)]
    pub sector: Option<String>,
}

/// The reconciled attribution breakdown for one request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AttributionResult {
    pub attributions: Vec<AssetAttribution>,
    pub total_portfolio_value: Decimal,
    pub total_portfolio_investment: Decimal,
    /// The headline period return the breakdown is reconciled against.
    pub reference_return: Decimal,
    pub start_total_value: Decimal,
    /// Sum of contribution percentage points before reconciliation.
    pub sum_of_contributions: Decimal,
    /// reference_return - sum_of_contributions at reconciliation time.
    pub discrepancy: Decimal,
    /// True when the reconciler rescaled the percentage contributions.
    pub normalized: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum WaterfallBarKind {
    Start,
    End,
    Positive,
    Negative,
}

/// One presentation bar of the attribution waterfall.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WaterfallBar {
    pub name: String,
    /// Bar magnitude in currency (portfolio totals for start/end bars).
    pub value: Decimal,
    pub contribution_pp: Decimal,
    pub kind: WaterfallBarKind,
    /// Cumulative portfolio value after this bar.
    pub running_total: Decimal,
    /// Asset keys folded into a "+N more" aggregate bar.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub grouped_assets: Vec<String>,
}

/// Contribution subtotal for one sector or instrument type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GroupBreakdown {
    pub name: String,
    pub contribution_pp: Decimal,
    pub value: Decimal,
}

/// Aggregate statistics over the reconciled attribution list.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AttributionSummary {
    pub top_contributor: Option<AssetAttribution>,
    pub bottom_contributor: Option<AssetAttribution>,
    pub sector_breakdown: Vec<GroupBreakdown>,
    pub type_breakdown: Vec<GroupBreakdown>,
    pub positive_count: usize,
    pub negative_count: usize,
    pub neutral_count: usize,
    /// reference return minus benchmark return, when a benchmark was given.
    pub alpha: Option<Decimal>,
    /// Contribution of the top five holdings over the reference return, percent.
    pub concentration_ratio: Decimal,
    pub diversification_score: Decimal,
}

/// Caller-tunable options for an attribution request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AttributionOptions {
    pub benchmark_return: Option<Decimal>,
    pub max_waterfall_bars: Option<usize>,
    pub min_waterfall_contribution_pp: Option<Decimal>,
    #[serde(default)]
    pub include_metadata: bool,
    /// Period return already compounded upstream; wins over the engine's
    /// own TWR so headline figures stay consistent across services.
    pub precomputed_period_return: Option<Decimal>,
}

/// Entry-point request: one (user, period, currency, account set).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AttributionRequest {
    pub user_id: String,
    pub period: Period,
    pub currency: String,
    /// Empty means the user's pre-aggregated overall series.
    #[serde(default)]
    pub account_ids: Vec<String>,
    #[serde(default)]
    pub options: AttributionOptions,
}

/// Diagnostics block attached when `include_metadata` is set.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AttributionMetadata {
    pub aggregation_method: Option<AggregationMethod>,
    pub reference_source: Option<String>,
    pub discrepancy: Decimal,
    pub normalized: bool,
    pub intraday_applied: bool,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub missing_quote_symbols: Vec<String>,
    pub duration_ms: u64,
}

/// Entry-point response. `success=false` carries a structured error and
/// empty collections; it is never a transport failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct AttributionResponse {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub asset_attributions: Vec<AssetAttribution>,
    pub waterfall_data: Vec<WaterfallBar>,
    pub summary: Option<AttributionSummary>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<AttributionMetadata>,
}
