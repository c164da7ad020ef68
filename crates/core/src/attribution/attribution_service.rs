//! Attribution orchestration: one entry point that resolves the period,
//! fetches snapshots and sell events, decomposes contributions, reconciles
//! them against the headline return and assembles the response.

use async_trait::async_trait;
use chrono::NaiveDate;
use futures::future::try_join_all;
use log::{debug, error, warn};
use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;

use crate::constants::{DECIMAL_PRECISION, PORTFOLIO_TOTAL_OWNER_ID, QUOTE_TIMEOUT_SECS};
use crate::errors::{CalculatorError, Error, Result, ValidationError};
use crate::fx::{CurrencyConverter, CurrencyRate, RateSourceTrait};
use crate::ledger::{summarize_sell_events, LedgerSourceTrait};
use crate::quotes::{LiveQuote, QuoteSourceTrait};
use crate::snapshots::{
    AssetSnapshot, CurrencyView, DailyValuationSnapshot, SnapshotSourceTrait,
};
use crate::utils::time_utils::valuation_date_today;

use super::aggregator::{aggregate_account_series, AccountDailySeries};
use super::contribution::{calculate_contributions, ContributionInputs};
use super::intraday::blend_intraday;
use super::reconciler::reconcile;
use super::summary::build_summary;
use super::waterfall::{build_waterfall, WaterfallConfig};
use super::{AttributionMetadata, AttributionRequest, AttributionResponse, DailySeriesPoint};

const ONE_HUNDRED: Decimal = dec!(100);

#[async_trait]
pub trait AttributionServiceTrait: Send + Sync {
    /// Computes the full attribution breakdown for one request.
    ///
    /// Always returns a response rather than an error: invalid input and
    /// internal failures come back as `success=false` with a message.
    async fn calculate_attribution(&self, request: &AttributionRequest) -> AttributionResponse;
}

/// Attribution engine over injected read-only sources.
pub struct AttributionService {
    snapshot_source: Arc<dyn SnapshotSourceTrait>,
    ledger_source: Arc<dyn LedgerSourceTrait>,
    quote_source: Arc<dyn QuoteSourceTrait>,
    rate_source: Arc<dyn RateSourceTrait>,
}

/// One owner's snapshot fetches for the period.
struct OwnerSnapshots {
    series: Vec<DailyValuationSnapshot>,
    start_snapshot: Option<DailyValuationSnapshot>,
    latest: Option<DailyValuationSnapshot>,
}

#[async_trait]
impl AttributionServiceTrait for AttributionService {
    async fn calculate_attribution(&self, request: &AttributionRequest) -> AttributionResponse {
        let started = Instant::now();

        if let Err(e) = validate_request(request) {
            return failure_response(&Error::Validation(e));
        }

        match self.run_pipeline(request).await {
            Ok(mut response) => {
                if let Some(metadata) = response.metadata.as_mut() {
                    metadata.duration_ms = started.elapsed().as_millis() as u64;
                }
                response
            }
            Err(e) => {
                error!(
                    "Attribution failed for user {} period {}: {}",
                    request.user_id, request.period, e
                );
                failure_response(&e)
            }
        }
    }
}

impl AttributionService {
    pub fn new(
        snapshot_source: Arc<dyn SnapshotSourceTrait>,
        ledger_source: Arc<dyn LedgerSourceTrait>,
        quote_source: Arc<dyn QuoteSourceTrait>,
        rate_source: Arc<dyn RateSourceTrait>,
    ) -> Self {
        Self {
            snapshot_source,
            ledger_source,
            quote_source,
            rate_source,
        }
    }

    async fn run_pipeline(&self, request: &AttributionRequest) -> Result<AttributionResponse> {
        let today = valuation_date_today();
        let period_start = request.period.start_date(today);

        let owner_ids: Vec<String> = if request.account_ids.is_empty() {
            vec![PORTFOLIO_TOTAL_OWNER_ID.to_string()]
        } else {
            request.account_ids.clone()
        };

        let snapshot_futures = owner_ids.iter().map(|owner_id| {
            self.fetch_owner_snapshots(owner_id.clone(), period_start, today)
        });
        let ledger_start = period_start.unwrap_or(NaiveDate::MIN);
        let (owners, sell_events) = tokio::join!(
            try_join_all(snapshot_futures),
            self.ledger_source.get_sell_events(
                &request.user_id,
                &request.account_ids,
                ledger_start,
                today,
            ),
        );
        let owners = owners?;
        let sell_events = sell_events?;

        let with_data: Vec<&OwnerSnapshots> =
            owners.iter().filter(|o| o.latest.is_some()).collect();
        if with_data.is_empty() {
            debug!(
                "No snapshots for user {} in period {}; returning empty breakdown",
                request.user_id, request.period
            );
            return Ok(empty_response(request));
        }

        let start_snapshots: Vec<&DailyValuationSnapshot> = with_data
            .iter()
            .filter_map(|o| o.start_snapshot.as_ref())
            .collect();
        let end_snapshots: Vec<&DailyValuationSnapshot> =
            with_data.iter().filter_map(|o| o.latest.as_ref()).collect();

        for snapshot in start_snapshots.iter().chain(end_snapshots.iter()) {
            snapshot.validate().map_err(Error::Validation)?;
        }

        let start_view = merge_views(&start_snapshots, &request.currency);
        let end_view = merge_views(&end_snapshots, &request.currency).ok_or_else(|| {
            Error::Calculation(CalculatorError::MissingCurrencyView {
                owner_id: end_snapshots
                    .first()
                    .map(|s| s.owner_id.clone())
                    .unwrap_or_default(),
                currency: request.currency.clone(),
            })
        })?;

        let effective_start = start_snapshots
            .iter()
            .map(|snapshot| snapshot.snapshot_date)
            .min()
            .unwrap_or(today);
        let sell_summaries = summarize_sell_events(
            &sell_events,
            &request.account_ids,
            effective_start,
            today,
        );

        let (mut reference_return, reference_source, aggregation_method) =
            resolve_reference_return(request, &with_data, &end_view);

        let mut result = calculate_contributions(ContributionInputs {
            start_view: start_view.as_ref(),
            end_view: &end_view,
            sell_summaries: &sell_summaries,
        });

        let (intraday_applied, missing_quote_symbols) = self
            .apply_intraday(&end_view, &request.currency, &mut reference_return)
            .await;

        reconcile(&mut result, reference_return);

        let waterfall_config = waterfall_config_from(&request.options);
        let waterfall_data = build_waterfall(
            &result.attributions,
            result.start_total_value,
            result.total_portfolio_value,
            &waterfall_config,
        );
        let summary = build_summary(
            &result.attributions,
            result.reference_return,
            request.options.benchmark_return,
        );

        let metadata = request.options.include_metadata.then(|| AttributionMetadata {
            aggregation_method,
            reference_source: Some(reference_source.to_string()),
            discrepancy: result.discrepancy,
            normalized: result.normalized,
            intraday_applied,
            missing_quote_symbols,
            duration_ms: 0,
        });

        Ok(AttributionResponse {
            success: true,
            error: None,
            asset_attributions: result.attributions,
            waterfall_data,
            summary: Some(summary),
            metadata,
        })
    }

    async fn fetch_owner_snapshots(
        &self,
        owner_id: String,
        period_start: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<OwnerSnapshots> {
        let anchor = period_start.unwrap_or(NaiveDate::MIN);
        let (series, start_snapshot, latest) = tokio::try_join!(
            self.snapshot_source
                .get_daily_series(&owner_id, period_start, Some(today)),
            self.snapshot_source.get_nearest_on_or_after(&owner_id, anchor),
            self.snapshot_source.get_latest(&owner_id),
        )?;
        Ok(OwnerSnapshots {
            series,
            start_snapshot,
            latest,
        })
    }

    /// Layers the current session's live move onto the reference return.
    /// Any failure (timeout, missing quotes, missing rates) leaves the
    /// historical figure in place.
    async fn apply_intraday(
        &self,
        end_view: &CurrencyView,
        target_currency: &str,
        reference_return: &mut Decimal,
    ) -> (bool, Vec<String>) {
        let holdings: Vec<&AssetSnapshot> = end_view
            .assets
            .values()
            .filter(|a| a.units > Decimal::ZERO)
            .collect();
        if holdings.is_empty() {
            return (false, Vec::new());
        }

        let symbols: Vec<String> = holdings.iter().map(|h| h.ticker.clone()).collect();
        let quotes = match timeout(
            Duration::from_secs(QUOTE_TIMEOUT_SECS),
            self.quote_source.get_live_quotes(&symbols),
        )
        .await
        {
            Ok(Ok(quotes)) => quotes,
            Ok(Err(e)) => {
                warn!("Live quote retrieval failed, staying historical-only: {}", e);
                return (false, symbols);
            }
            Err(_) => {
                warn!(
                    "Live quote retrieval timed out after {}s, staying historical-only",
                    QUOTE_TIMEOUT_SECS
                );
                return (false, symbols);
            }
        };

        let converter = match self.build_converter(&holdings, &quotes, target_currency).await {
            Ok(converter) => converter,
            Err(e) => {
                warn!("Rate lookup failed, staying historical-only: {}", e);
                return (false, Vec::new());
            }
        };

        let blend = blend_intraday(
            &holdings,
            &quotes,
            &converter,
            end_view.total_value,
            *reference_return,
            target_currency,
        );
        if blend.success {
            *reference_return = blend.combined_return_pct;
        }
        (blend.success, blend.missing_symbols)
    }

    async fn build_converter(
        &self,
        holdings: &[&AssetSnapshot],
        quotes: &HashMap<String, LiveQuote>,
        target_currency: &str,
    ) -> Result<CurrencyConverter> {
        let base = self.rate_source.base_currency();
        let mut currencies: HashSet<String> = holdings
            .iter()
            .map(|h| h.currency.clone())
            .chain(quotes.values().map(|q| q.currency.clone()))
            .collect();
        currencies.insert(target_currency.to_string());

        let mut rates = Vec::with_capacity(currencies.len());
        for currency in currencies {
            if currency.eq_ignore_ascii_case(&base) {
                continue;
            }
            let rate_to_base = self.rate_source.get_rate_to_base(&currency).await?;
            rates.push(CurrencyRate {
                currency,
                rate_to_base,
            });
        }
        Ok(CurrencyConverter::new(&base, rates)?)
    }
}

/// Resolves the headline return the breakdown reconciles against, in
/// priority order: caller-precomputed figure, compounded daily series,
/// since-inception ROI of the end view.
fn resolve_reference_return(
    request: &AttributionRequest,
    owners: &[&OwnerSnapshots],
    end_view: &CurrencyView,
) -> (Decimal, &'static str, Option<super::AggregationMethod>) {
    if let Some(precomputed) = request.options.precomputed_period_return {
        return (precomputed, "precomputed", None);
    }

    let account_series: Vec<AccountDailySeries> = owners
        .iter()
        .map(|owner| AccountDailySeries {
            account_id: owner
                .series
                .first()
                .map(|s| s.owner_id.clone())
                .unwrap_or_default(),
            points: owner
                .series
                .iter()
                .filter_map(|snapshot| {
                    snapshot
                        .resolve_currency_view(&request.currency)
                        .map(|view| DailySeriesPoint {
                            date: snapshot.snapshot_date,
                            total_value: view.total_value,
                            adjusted_change_pct: view.adjusted_daily_change_pct,
                        })
                })
                .collect(),
        })
        .collect();

    let aggregated = aggregate_account_series(&account_series);
    if aggregated.has_data {
        return (
            aggregated.return_pct,
            "compoundedDaily",
            Some(aggregated.method),
        );
    }

    if end_view.total_investment.is_zero() {
        return (Decimal::ZERO, "sinceInceptionRoi", None);
    }
    let roi = ((end_view.total_value - end_view.total_investment) / end_view.total_investment
        * ONE_HUNDRED)
        .round_dp(DECIMAL_PRECISION);
    (roi, "sinceInceptionRoi", None)
}

fn validate_request(request: &AttributionRequest) -> std::result::Result<(), ValidationError> {
    if request.user_id.trim().is_empty() {
        return Err(ValidationError::MissingField("userId".to_string()));
    }
    if request.currency.trim().is_empty() {
        return Err(ValidationError::MissingField("currency".to_string()));
    }
    if request.account_ids.iter().any(|id| id.trim().is_empty()) {
        return Err(ValidationError::InvalidInput(
            "accountIds must not contain blank entries".to_string(),
        ));
    }
    Ok(())
}

fn waterfall_config_from(options: &super::AttributionOptions) -> WaterfallConfig {
    let defaults = WaterfallConfig::default();
    WaterfallConfig {
        max_positive_bars: options.max_waterfall_bars.unwrap_or(defaults.max_positive_bars),
        min_contribution_pp: options
            .min_waterfall_contribution_pp
            .unwrap_or(defaults.min_contribution_pp),
    }
}

fn failure_response(error: &Error) -> AttributionResponse {
    AttributionResponse {
        success: false,
        error: Some(error.to_string()),
        ..Default::default()
    }
}

/// A user with no snapshots in the window has nothing to attribute; that
/// is an empty breakdown, not an error.
fn empty_response(request: &AttributionRequest) -> AttributionResponse {
    AttributionResponse {
        success: true,
        error: None,
        asset_attributions: Vec::new(),
        waterfall_data: Vec::new(),
        summary: Some(build_summary(&[], Decimal::ZERO, None)),
        metadata: request
            .options
            .include_metadata
            .then(AttributionMetadata::default),
    }
}

/// Collapses one endpoint's per-owner currency views into a single view.
///
/// Asset entries sharing a key across owners are summed; the since-purchase
/// ROI of a merged entry is recomputed from the merged figures.
pub(super) fn merge_views(
    snapshots: &[&DailyValuationSnapshot],
    currency: &str,
) -> Option<CurrencyView> {
    let views: Vec<&CurrencyView> = snapshots
        .iter()
        .filter_map(|s| s.resolve_currency_view(currency))
        .collect();
    if views.is_empty() {
        return None;
    }
    if views.len() == 1 {
        return Some(views[0].clone());
    }

    let mut merged = CurrencyView {
        currency: views[0].currency.clone(),
        total_value: Decimal::ZERO,
        total_investment: Decimal::ZERO,
        total_cash_flow: Decimal::ZERO,
        adjusted_daily_change_pct: Decimal::ZERO,
        assets: HashMap::new(),
    };

    for view in views {
        merged.total_value += view.total_value;
        merged.total_investment += view.total_investment;
        merged.total_cash_flow += view.total_cash_flow;

        for (key, asset) in &view.assets {
            match merged.assets.get_mut(key) {
                Some(existing) => {
                    existing.units += asset.units;
                    existing.total_value += asset.total_value;
                    existing.total_investment += asset.total_investment;
                    existing.unrealized_pnl += asset.unrealized_pnl;
                    existing.total_cash_flow += asset.total_cash_flow;
                    if existing.sector.is_none() {
                        existing.sector = asset.sector.clone();
                    }
                }
                None => {
                    merged.assets.insert(key.clone(), asset.clone());
                }
            }
        }
    }

    for asset in merged.assets.values_mut() {
        asset.total_roi = if asset.total_investment.is_zero() {
            Decimal::ZERO
        } else {
            ((asset.total_value - asset.total_investment) / asset.total_investment * ONE_HUNDRED)
                .round_dp(DECIMAL_PRECISION)
        };
    }

    Some(merged)
}
