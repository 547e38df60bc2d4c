use chrono::{DateTime, Utc};

use crate::{
    db_types::{BrandPayout, PayoutFigures},
    traits::{PayoutQueryFilter, StorageError},
};

#[allow(async_fn_in_trait)]
pub trait PayoutManagement {
    /// Upserts a summary per entry of `figures`, keyed on (brand, from, to), in a single transaction.
    ///
    /// New summaries start as `Pending`. Existing summaries have their four numeric fields overwritten; their
    /// `payout_status` and `paid_at` are never touched.
    async fn upsert_payouts(&self, figures: &[PayoutFigures]) -> Result<Vec<BrandPayout>, StorageError>;

    async fn fetch_payout(&self, id: i64) -> Result<Option<BrandPayout>, StorageError>;

    async fn fetch_payouts(&self, filter: PayoutQueryFilter) -> Result<Vec<BrandPayout>, StorageError>;

    /// Moves a `Pending` payout to `Paid`. Returns [`StorageError::Conflict`] if it was already paid.
    async fn mark_payout_paid(&self, id: i64, paid_at: DateTime<Utc>) -> Result<BrandPayout, StorageError>;
}
