//! Valuation snapshot domain models.
//!
//! Snapshots are produced by the upstream daily valuation job and are
//! immutable once written. The engine only reads them; every field is
//! declared and validated here at the boundary rather than inferred by
//! presence deeper in the calculation code.

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

use crate::errors::ValidationError;
use crate::fx::normalize_currency_code;

/// Instrument type half of an asset key. Groups all lots of one holding
/// together with its ticker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InstrumentType {
    #[default]
    Stock,
    Etf,
    Fund,
    Bond,
    Crypto,
    Cash,
    Other,
}

impl fmt::Display for InstrumentType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            InstrumentType::Stock => "STOCK",
            InstrumentType::Etf => "ETF",
            InstrumentType::Fund => "FUND",
            InstrumentType::Bond => "BOND",
            InstrumentType::Crypto => "CRYPTO",
            InstrumentType::Cash => "CASH",
            InstrumentType::Other => "OTHER",
        };
        write!(f, "{}", label)
    }
}

/// Composite identifier grouping all lots of one holding:
/// ticker + instrument type, rendered as `"AAPL:STOCK"`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetKey {
    pub ticker: String,
    pub instrument_type: InstrumentType,
}

impl AssetKey {
    pub fn new(ticker: impl Into<String>, instrument_type: InstrumentType) -> Self {
        Self {
            ticker: ticker.into(),
            instrument_type,
        }
    }
}

impl fmt::Display for AssetKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.ticker, self.instrument_type)
    }
}

/// Per-holding state within one currency view of a snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AssetSnapshot {
    pub ticker: String,
    pub instrument_type: InstrumentType,
    /// Quote currency of the instrument itself (may differ from the view currency).
    pub currency: String,
    pub units: Decimal,
    pub total_value: Decimal,
    pub total_investment: Decimal,
    /// Since-purchase return percentage.
    pub total_roi: Decimal,
    pub unrealized_pnl: Decimal,
    pub total_cash_flow: Decimal,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub sector: Option<String>,
}

impl AssetSnapshot {
    pub fn asset_key(&self) -> AssetKey {
        AssetKey::new(self.ticker.clone(), self.instrument_type)
    }
}

/// One currency's aggregate view within a daily snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyView {
    pub currency: String,
    pub total_value: Decimal,
    pub total_investment: Decimal,
    pub total_cash_flow: Decimal,
    /// Daily change with same-day flows removed, as a percentage.
    pub adjusted_daily_change_pct: Decimal,
    /// asset key string (see [`AssetKey`]) -> holding state
    #[serde(default)]
    pub assets: HashMap<String, AssetSnapshot>,
}

/// One immutable valuation record per (owner, trading date).
///
/// The owner is either a single account or the pre-aggregated portfolio
/// series (owner id `"TOTAL"` scoped to the user).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DailyValuationSnapshot {
    pub id: String,
    pub owner_id: String,
    pub snapshot_date: NaiveDate,
    pub base_currency: String,
    /// currency code -> aggregated view in that currency
    #[serde(default)]
    pub currency_views: HashMap<String, CurrencyView>,
    pub calculated_at: DateTime<Utc>,
}

impl Default for DailyValuationSnapshot {
    fn default() -> Self {
        DailyValuationSnapshot {
            id: String::new(),
            owner_id: String::new(),
            snapshot_date: NaiveDate::from_ymd_opt(1970, 1, 1).unwrap(),
            base_currency: String::new(),
            currency_views: HashMap::new(),
            calculated_at: Utc::now(),
        }
    }
}

impl DailyValuationSnapshot {
    /// Resolves the view for the requested currency.
    ///
    /// Fallback rule (the only one): exact currency match first, otherwise
    /// the snapshot's base-currency view. Callers must not re-implement
    /// their own defaulting on top of this.
    pub fn resolve_currency_view(&self, currency: &str) -> Option<&CurrencyView> {
        let wanted = normalize_currency_code(currency);
        self.currency_views
            .get(&wanted)
            .or_else(|| self.currency_views.get(&normalize_currency_code(&self.base_currency)))
    }

    /// Boundary validation for snapshots entering the engine.
    ///
    /// Rejects structurally broken records (negative totals, negative
    /// units, asset entries filed under the wrong key) so the calculators
    /// never have to defend against them.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.owner_id.is_empty() {
            return Err(ValidationError::MissingField("ownerId".to_string()));
        }
        for (currency, view) in &self.currency_views {
            if view.total_value < Decimal::ZERO {
                return Err(ValidationError::InvalidInput(format!(
                    "snapshot {}: negative total value in {} view",
                    self.id, currency
                )));
            }
            for (key, asset) in &view.assets {
                if asset.units < Decimal::ZERO {
                    return Err(ValidationError::InvalidInput(format!(
                        "snapshot {}: negative units for {}",
                        self.id, key
                    )));
                }
                if asset.units.is_zero() && !asset.total_value.is_zero() {
                    return Err(ValidationError::InvalidInput(format!(
                        "snapshot {}: zero units with nonzero value for {}",
                        self.id, key
                    )));
                }
                if key != &asset.asset_key().to_string() {
                    return Err(ValidationError::InvalidInput(format!(
                        "snapshot {}: asset filed under '{}' but keyed '{}'",
                        self.id,
                        key,
                        asset.asset_key()
                    )));
                }
            }
        }
        Ok(())
    }
}
