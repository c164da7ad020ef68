use async_trait::async_trait;
use chrono::NaiveDate;

use super::SellEvent;
use crate::errors::Result;

/// Read-only view over the external transaction ledger, reduced to the
/// sell events the attribution engine consumes.
#[async_trait]
pub trait LedgerSourceTrait: Send + Sync {
    /// Returns sell events for the given accounts within the inclusive
    /// date range. An empty `account_ids` slice means all of the user's
    /// accounts. The engine applies its own date/account filter on top.
    async fn get_sell_events(
        &self,
        user_id: &str,
        account_ids: &[String],
        start_date: NaiveDate,
        end_date: NaiveDate,
    ) -> Result<Vec<SellEvent>>;
}
