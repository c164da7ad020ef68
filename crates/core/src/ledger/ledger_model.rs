use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::snapshots::{AssetKey, InstrumentType};

/// One realized sale from the external transaction ledger.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct SellEvent {
    pub date: NaiveDate,
    pub ticker: String,
    pub instrument_type: InstrumentType,
    pub account_id: String,
    pub units_sold: Decimal,
    pub price: Decimal,
    pub realized_pnl: Decimal,
}

impl SellEvent {
    pub fn asset_key(&self) -> AssetKey {
        AssetKey::new(self.ticker.clone(), self.instrument_type)
    }

    pub fn proceeds(&self) -> Decimal {
        self.units_sold * self.price
    }
}

/// Per-asset accumulation of all in-period sells.
#[derive(Debug, Clone, PartialEq)]
pub struct SellSummary {
    pub ticker: String,
    pub instrument_type: InstrumentType,
    pub total_realized_pnl: Decimal,
    pub total_units_sold: Decimal,
    pub total_proceeds: Decimal,
}

impl SellSummary {
    fn new(ticker: String, instrument_type: InstrumentType) -> Self {
        Self {
            ticker,
            instrument_type,
            total_realized_pnl: Decimal::ZERO,
            total_units_sold: Decimal::ZERO,
            total_proceeds: Decimal::ZERO,
        }
    }

    /// Cost basis of the units sold: proceeds minus realized gain.
    pub fn sold_cost_basis(&self) -> Decimal {
        self.total_proceeds - self.total_realized_pnl
    }
}

/// Groups sell events by asset key, re-filtering by date range and owning
/// accounts. The ledger source is best-effort about scoping, so the engine
/// always applies its own filter.
///
/// An empty `account_ids` slice means "all accounts of the user".
pub fn summarize_sell_events(
    events: &[SellEvent],
    account_ids: &[String],
    start_date: NaiveDate,
    end_date: NaiveDate,
) -> HashMap<String, SellSummary> {
    let mut summaries: HashMap<String, SellSummary> = HashMap::new();

    for event in events {
        if event.date < start_date || event.date > end_date {
            continue;
        }
        if !account_ids.is_empty() && !account_ids.contains(&event.account_id) {
            continue;
        }

        let summary = summaries
            .entry(event.asset_key().to_string())
            .or_insert_with(|| SellSummary::new(event.ticker.clone(), event.instrument_type));
        summary.total_realized_pnl += event.realized_pnl;
        summary.total_units_sold += event.units_sold;
        summary.total_proceeds += event.proceeds();
    }

    summaries
}
