use std::fmt::Debug;

use chrono::{DateTime, NaiveDate, Utc};
use log::*;
use sqlx::SqlitePool;

use super::{brands, db_url, ledger, new_pool, orders, payouts, returns};
use crate::{
    db_types::{
        Brand,
        BrandId,
        BrandPayout,
        BrandReturnStatus,
        FinancialLogEntry,
        LedgerEntryKind,
        Money,
        NewBrand,
        NewLedgerEntry,
        NewOrder,
        NewReturnRequest,
        Order,
        OrderId,
        OrderStatusType,
        PayoutFigures,
        ReturnItem,
        ReturnRequest,
        ReturnStatus,
    },
    traits::{
        BrandManagement,
        LedgerManagement,
        LedgerQueryFilter,
        MarketplaceDatabase,
        OrderManagement,
        OrderQueryFilter,
        PayoutManagement,
        PayoutQueryFilter,
        RefundCommit,
        RefundOutcome,
        ReturnManagement,
        ReturnQueryFilter,
        StorageError,
    },
};

const DEFAULT_MAX_CONNECTIONS: u32 = 25;

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl SqliteDatabase {
    /// Creates a new database API object using `SOUQ_DATABASE_URL`
    pub async fn new() -> Result<Self, StorageError> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), DEFAULT_MAX_CONNECTIONS).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, StorageError> {
        trace!("🗃️ Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Brings the schema up to date.
    pub async fn migrate(&self) -> Result<(), StorageError> {
        sqlx::migrate!("./src/db/sqlite/migrations").run(&self.pool).await?;
        info!("🗃️ Database migrations are up to date");
        Ok(())
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

impl MarketplaceDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }
}

impl OrderManagement for SqliteDatabase {
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StorageError> {
        let mut tx = self.pool.begin().await?;
        if orders::fetch_order(&order.id, &mut tx).await?.is_some() {
            return Err(StorageError::Conflict(format!("Order {} already exists", order.id)));
        }
        let order = orders::insert_order(order, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order(order_id, &mut conn).await
    }

    async fn fetch_order_by_gateway_id(&self, gateway_order_id: &str) -> Result<Option<Order>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_gateway_id(gateway_order_id, &mut conn).await
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        orders::search_orders(query, &mut conn).await
    }

    async fn mark_order_paid(&self, order_id: &OrderId, transaction_id: Option<&str>) -> Result<Order, StorageError> {
        let mut tx = self.pool.begin().await?;
        orders::mark_order_paid(order_id, transaction_id, &mut tx).await?;
        let order = fetch_existing_order(order_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {order_id} marked as paid");
        Ok(order)
    }

    async fn attach_gateway_order(&self, order_id: &OrderId, gateway_order_id: &str) -> Result<Order, StorageError> {
        let mut tx = self.pool.begin().await?;
        orders::attach_gateway_order(order_id, gateway_order_id, &mut tx).await?;
        let order = fetch_existing_order(order_id, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }

    async fn update_order_status(&self, order_id: &OrderId, status: OrderStatusType) -> Result<Order, StorageError> {
        let mut tx = self.pool.begin().await?;
        orders::update_order_status(order_id, status, &mut tx).await?;
        let order = fetch_existing_order(order_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {order_id} is now {status}");
        Ok(order)
    }

    async fn set_delivery_date(&self, order_id: &OrderId, date: NaiveDate) -> Result<Order, StorageError> {
        let mut tx = self.pool.begin().await?;
        orders::set_delivery_date(order_id, date, &mut tx).await?;
        let order = fetch_existing_order(order_id, &mut tx).await?;
        tx.commit().await?;
        Ok(order)
    }
}

async fn fetch_existing_order(
    order_id: &OrderId,
    conn: &mut sqlx::SqliteConnection,
) -> Result<Order, StorageError> {
    orders::fetch_order(order_id, conn).await?.ok_or_else(|| StorageError::NotFound(format!("Order {order_id}")))
}

impl BrandManagement for SqliteDatabase {
    async fn upsert_brand(&self, brand: NewBrand) -> Result<Brand, StorageError> {
        let mut conn = self.pool.acquire().await?;
        brands::upsert_brand(brand, &mut conn).await
    }

    async fn fetch_brand(&self, brand_id: &BrandId) -> Result<Option<Brand>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        brands::fetch_brand(brand_id, &mut conn).await
    }

    async fn fetch_brands(&self, brand_ids: &[BrandId]) -> Result<Vec<Brand>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        brands::fetch_brands(brand_ids, &mut conn).await
    }
}

impl LedgerManagement for SqliteDatabase {
    async fn save_sale_entries(
        &self,
        order_id: &OrderId,
        entries: &[NewLedgerEntry],
    ) -> Result<Vec<FinancialLogEntry>, StorageError> {
        let mut tx = self.pool.begin().await?;
        let mut saved = Vec::with_capacity(entries.len());
        for entry in entries {
            if &entry.order_id != order_id {
                return Err(StorageError::InvalidData(format!(
                    "Ledger entry for order {} cannot be saved against order {order_id}",
                    entry.order_id
                )));
            }
            if let Some(e) = ledger::upsert_sale_entry(entry, &mut tx).await? {
                saved.push(e);
            }
        }
        orders::refresh_cached_totals(order_id, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ {} sale entries saved for order {order_id}", saved.len());
        Ok(saved)
    }

    async fn fetch_ledger_entry(
        &self,
        order_id: &OrderId,
        brand_id: &BrandId,
        kind: LedgerEntryKind,
    ) -> Result<Option<FinancialLogEntry>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        ledger::fetch_entry(order_id, brand_id, kind, &mut conn).await
    }

    async fn fetch_ledger_entries(&self, filter: LedgerQueryFilter) -> Result<Vec<FinancialLogEntry>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        ledger::fetch_entries(filter, &mut conn).await
    }
}

impl PayoutManagement for SqliteDatabase {
    async fn upsert_payouts(&self, figures: &[PayoutFigures]) -> Result<Vec<BrandPayout>, StorageError> {
        let mut tx = self.pool.begin().await?;
        let mut result = Vec::with_capacity(figures.len());
        for f in figures {
            result.push(payouts::upsert_payout(f, &mut tx).await?);
        }
        tx.commit().await?;
        Ok(result)
    }

    async fn fetch_payout(&self, id: i64) -> Result<Option<BrandPayout>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        payouts::fetch_payout(id, &mut conn).await
    }

    async fn fetch_payouts(&self, filter: PayoutQueryFilter) -> Result<Vec<BrandPayout>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        payouts::fetch_payouts(filter, &mut conn).await
    }

    async fn mark_payout_paid(&self, id: i64, paid_at: DateTime<Utc>) -> Result<BrandPayout, StorageError> {
        let mut tx = self.pool.begin().await?;
        let payout = payouts::mark_payout_paid(id, paid_at, &mut tx).await?;
        tx.commit().await?;
        Ok(payout)
    }
}

impl ReturnManagement for SqliteDatabase {
    async fn insert_return_request(
        &self,
        request: &NewReturnRequest,
        items: &[ReturnItem],
        total_refund_amount: Money,
    ) -> Result<ReturnRequest, StorageError> {
        let mut conn = self.pool.acquire().await?;
        returns::insert_return_request(request, items, total_refund_amount, &mut conn).await
    }

    async fn fetch_return_request(&self, id: i64) -> Result<Option<ReturnRequest>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        returns::fetch_return_request(id, &mut conn).await
    }

    async fn fetch_return_requests(&self, filter: ReturnQueryFilter) -> Result<Vec<ReturnRequest>, StorageError> {
        let mut conn = self.pool.acquire().await?;
        returns::fetch_return_requests(filter, &mut conn).await
    }

    async fn update_brand_status(
        &self,
        id: i64,
        status: BrandReturnStatus,
        reason: Option<String>,
    ) -> Result<ReturnRequest, StorageError> {
        let mut tx = self.pool.begin().await?;
        let request = returns::update_brand_status(id, status, reason, &mut tx).await?;
        tx.commit().await?;
        Ok(request)
    }

    async fn record_admin_decision(
        &self,
        id: i64,
        status: ReturnStatus,
        note: Option<String>,
        reviewed_at: DateTime<Utc>,
    ) -> Result<ReturnRequest, StorageError> {
        let mut tx = self.pool.begin().await?;
        let request = returns::update_admin_status(id, status, note, reviewed_at, &mut tx).await?;
        tx.commit().await?;
        Ok(request)
    }

    async fn claim_refund(&self, id: i64, stale_before: DateTime<Utc>) -> Result<bool, StorageError> {
        let mut conn = self.pool.acquire().await?;
        returns::claim_refund(id, Utc::now(), stale_before, &mut conn).await
    }

    async fn release_refund_claim(&self, id: i64) -> Result<(), StorageError> {
        let mut conn = self.pool.acquire().await?;
        returns::release_refund_claim(id, &mut conn).await
    }

    /// Takes a refund the gateway has accepted and, in a single atomic transaction,
    /// * marks the request as refunded. If another caller got there first, nothing further is done.
    /// * writes the sale entry if the order never had one stored, then appends its reversal.
    /// * deducts the reversed figures from the order's cached summary and marks the order `Refunded`.
    async fn commit_refund(&self, refund: RefundCommit) -> Result<RefundOutcome, StorageError> {
        let mut tx = self.pool.begin().await?;
        let request = returns::mark_refunded(
            refund.return_id,
            refund.admin_note.clone(),
            refund.reviewed_at,
            &refund.refund_reference,
            &mut tx,
        )
        .await?;
        let order_id = &refund.sale_entry.order_id;
        let brand_id = &refund.sale_entry.brand_id;
        if &request.order_id != order_id || &request.brand_id != brand_id {
            return Err(StorageError::InvalidData(format!(
                "Refund for return #{} does not match its order {} and brand {}",
                request.id, request.order_id, request.brand_id
            )));
        }
        let sale = match ledger::fetch_entry(order_id, brand_id, LedgerEntryKind::Sale, &mut tx).await? {
            Some(stored) => NewLedgerEntry::from(stored),
            None => {
                debug!("📒️ Order {order_id} has no stored sale entry for {brand_id}. Writing it before reversing.");
                ledger::upsert_sale_entry(&refund.sale_entry, &mut tx).await?;
                refund.sale_entry.clone()
            },
        };
        let reversal = ledger::insert_reversal(&sale.reversed(), &mut tx).await?;
        orders::apply_refund(order_id, sale.brand_payout, sale.net_admin_profit, &mut tx).await?;
        let order = fetch_existing_order(order_id, &mut tx).await?;
        tx.commit().await?;
        info!(
            "↩️ Return #{} refunded. Order {order_id} now shows payout {} and profit {}",
            request.id, order.brand_payout, order.net_admin_profit
        );
        Ok(RefundOutcome { request, reversal, order })
    }
}
