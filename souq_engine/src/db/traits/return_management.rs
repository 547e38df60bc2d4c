use chrono::{DateTime, Utc};

use crate::{
    db_types::{BrandReturnStatus, Money, NewReturnRequest, ReturnItem, ReturnRequest, ReturnStatus},
    traits::{RefundCommit, RefundOutcome, ReturnQueryFilter, StorageError},
};

#[allow(async_fn_in_trait)]
pub trait ReturnManagement {
    /// Stores a new return request with `brand_status` and `status` both `Pending`.
    async fn insert_return_request(
        &self,
        request: &NewReturnRequest,
        items: &[ReturnItem],
        total_refund_amount: Money,
    ) -> Result<ReturnRequest, StorageError>;

    async fn fetch_return_request(&self, id: i64) -> Result<Option<ReturnRequest>, StorageError>;

    async fn fetch_return_requests(&self, filter: ReturnQueryFilter) -> Result<Vec<ReturnRequest>, StorageError>;

    /// Records the brand's decision. Only applies while `brand_status` is still `Pending`; otherwise
    /// [`StorageError::Conflict`] is returned.
    async fn update_brand_status(
        &self,
        id: i64,
        status: BrandReturnStatus,
        reason: Option<String>,
    ) -> Result<ReturnRequest, StorageError>;

    /// Records an admin decision that does not involve money moving. Fails with [`StorageError::Conflict`] if the
    /// request has already been refunded.
    async fn record_admin_decision(
        &self,
        id: i64,
        status: ReturnStatus,
        note: Option<String>,
        reviewed_at: DateTime<Utc>,
    ) -> Result<ReturnRequest, StorageError>;

    /// Marks a refund for the request as in flight, so that only one caller at a time talks to the gateway about it.
    ///
    /// Returns `false` if the request is already refunded or is claimed by someone else. Claims taken before
    /// `stale_before` are considered abandoned and may be taken over.
    async fn claim_refund(&self, id: i64, stale_before: DateTime<Utc>) -> Result<bool, StorageError>;

    /// Gives up a claim after the gateway refused or could not be reached.
    async fn release_refund_claim(&self, id: i64) -> Result<(), StorageError>;

    /// Writes the ledger reversal, updates the order and marks the request refunded, all in one transaction.
    ///
    /// * The stored sale entry for the pair (or `refund.sale_entry` if none is stored yet) is negated and appended as a
    ///   reversal.
    /// * The order's cached `brand_payout` and `net_admin_profit` become `max(0, previous − reversed)` and its status
    ///   becomes `Refunded`.
    /// * The request becomes `Refunded` with the note, review time and refund reference, and its claim is cleared.
    ///
    /// If the request is already refunded, or a reversal already exists, nothing is written and
    /// [`StorageError::Conflict`] is returned.
    async fn commit_refund(&self, refund: RefundCommit) -> Result<RefundOutcome, StorageError>;
}
