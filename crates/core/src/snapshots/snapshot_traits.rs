use async_trait::async_trait;
use chrono::NaiveDate;

use super::DailyValuationSnapshot;
use crate::errors::Result;

/// Read-only source of daily valuation snapshots.
///
/// The upstream valuation job owns snapshot production and persistence;
/// the engine only needs these three lookup patterns.
#[async_trait]
pub trait SnapshotSourceTrait: Send + Sync {
    /// Returns the earliest snapshot dated on or after `date`, if any.
    /// Used to anchor the period start on the first trading day inside it.
    async fn get_nearest_on_or_after(
        &self,
        owner_id: &str,
        date: NaiveDate,
    ) -> Result<Option<DailyValuationSnapshot>>;

    /// Returns the most recent snapshot for the owner, if any.
    async fn get_latest(&self, owner_id: &str) -> Result<Option<DailyValuationSnapshot>>;

    /// Returns the owner's snapshots within the inclusive date range,
    /// ordered by date ascending. `None` bounds are open.
    async fn get_daily_series(
        &self,
        owner_id: &str,
        start_date: Option<NaiveDate>,
        end_date: Option<NaiveDate>,
    ) -> Result<Vec<DailyValuationSnapshot>>;
}
