use crate::{
    db_types::{BrandId, FinancialLogEntry, LedgerEntryKind, NewLedgerEntry, OrderId},
    traits::{LedgerQueryFilter, StorageError},
};

/// Persistence for the financial log.
///
/// The ledger holds at most one sale entry per (order, brand) and at most one reversal per (order, brand). Sale entries
/// are written as full overwrites keyed on that pair, never as increments, so concurrent or repeated writers cannot
/// drift.
#[allow(async_fn_in_trait)]
pub trait LedgerManagement {
    /// Upserts the sale entries for an order and refreshes the order's cached `brand_payout` and `net_admin_profit`,
    /// in a single atomic transaction.
    ///
    /// Entries for a (order, brand) pair that already has a reversal are not modified. The order's cached summary is
    /// only refreshed while the order has no reversals at all.
    ///
    /// Returns the entries as stored.
    async fn save_sale_entries(
        &self,
        order_id: &OrderId,
        entries: &[NewLedgerEntry],
    ) -> Result<Vec<FinancialLogEntry>, StorageError>;

    async fn fetch_ledger_entry(
        &self,
        order_id: &OrderId,
        brand_id: &BrandId,
        kind: LedgerEntryKind,
    ) -> Result<Option<FinancialLogEntry>, StorageError>;

    /// Fetches ledger entries matching the filter, ordered by period and then by id.
    async fn fetch_ledger_entries(&self, filter: LedgerQueryFilter) -> Result<Vec<FinancialLogEntry>, StorageError>;
}
