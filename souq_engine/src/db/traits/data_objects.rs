use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::db_types::{
    BrandId,
    BrandReturnStatus,
    FinancialLogEntry,
    LedgerEntryKind,
    NewLedgerEntry,
    Order,
    OrderId,
    OrderStatusType,
    PayoutStatus,
    ReturnRequest,
    ReturnStatus,
};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OrderQueryFilter {
    pub customer_id: Option<String>,
    pub paid: Option<bool>,
    /// Inclusive lower bound on `created_at`
    pub since: Option<DateTime<Utc>>,
    /// Exclusive upper bound on `created_at`
    pub until: Option<DateTime<Utc>>,
    #[serde(default)]
    pub statuses: Vec<OrderStatusType>,
}

impl OrderQueryFilter {
    pub fn with_customer_id(mut self, customer_id: String) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn paid_only(mut self) -> Self {
        self.paid = Some(true);
        self
    }

    pub fn since(mut self, since: DateTime<Utc>) -> Self {
        self.since = Some(since);
        self
    }

    pub fn until(mut self, until: DateTime<Utc>) -> Self {
        self.until = Some(until);
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.statuses.push(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.customer_id.is_none() &&
            self.paid.is_none() &&
            self.since.is_none() &&
            self.until.is_none() &&
            self.statuses.is_empty()
    }
}

/// Filters for the financial log report
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LedgerQueryFilter {
    pub year: Option<i64>,
    pub month: Option<i64>,
    pub brand_id: Option<BrandId>,
    pub order_id: Option<OrderId>,
    pub kind: Option<LedgerEntryKind>,
}

impl LedgerQueryFilter {
    pub fn with_year(mut self, year: i64) -> Self {
        self.year = Some(year);
        self
    }

    pub fn with_month(mut self, month: i64) -> Self {
        self.month = Some(month);
        self
    }

    pub fn with_brand_id(mut self, brand_id: BrandId) -> Self {
        self.brand_id = Some(brand_id);
        self
    }

    pub fn with_order_id(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn with_kind(mut self, kind: LedgerEntryKind) -> Self {
        self.kind = Some(kind);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.year.is_none() &&
            self.month.is_none() &&
            self.brand_id.is_none() &&
            self.order_id.is_none() &&
            self.kind.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PayoutQueryFilter {
    pub brand_id: Option<BrandId>,
    pub status: Option<PayoutStatus>,
}

impl PayoutQueryFilter {
    pub fn with_brand_id(mut self, brand_id: BrandId) -> Self {
        self.brand_id = Some(brand_id);
        self
    }

    pub fn with_status(mut self, status: PayoutStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.brand_id.is_none() && self.status.is_none()
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ReturnQueryFilter {
    pub order_id: Option<OrderId>,
    pub customer_id: Option<String>,
    pub brand_id: Option<BrandId>,
    pub brand_status: Option<BrandReturnStatus>,
    pub status: Option<ReturnStatus>,
}

impl ReturnQueryFilter {
    pub fn with_order_id(mut self, order_id: OrderId) -> Self {
        self.order_id = Some(order_id);
        self
    }

    pub fn with_customer_id(mut self, customer_id: String) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn with_brand_id(mut self, brand_id: BrandId) -> Self {
        self.brand_id = Some(brand_id);
        self
    }

    pub fn with_status(mut self, status: ReturnStatus) -> Self {
        self.status = Some(status);
        self
    }

    pub fn is_empty(&self) -> bool {
        self.order_id.is_none() &&
            self.customer_id.is_none() &&
            self.brand_id.is_none() &&
            self.brand_status.is_none() &&
            self.status.is_none()
    }
}

/// Everything that must be written once the gateway has accepted a refund.
#[derive(Debug, Clone)]
pub struct RefundCommit {
    pub return_id: i64,
    /// The sale entry as computed from the order. It is only written if the order has no stored sale entry for the
    /// brand yet; an existing stored entry is always the one that gets reversed.
    pub sale_entry: NewLedgerEntry,
    pub admin_note: Option<String>,
    pub reviewed_at: DateTime<Utc>,
    pub refund_reference: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefundOutcome {
    pub request: ReturnRequest,
    pub reversal: FinancialLogEntry,
    pub order: Order,
}
