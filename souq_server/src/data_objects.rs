use std::fmt::Display;

use chrono::{DateTime, NaiveDate, Utc};
use paymob_tools::BillingData;
use serde::{Deserialize, Serialize};
use souq_engine::{
    db_types::{AdminDecision, BrandDecision, BrandId, NewOrder, Order, OrderStatusType},
    RecalculationReport,
};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JsonResponse {
    pub success: bool,
    pub message: String,
}

impl JsonResponse {
    pub fn success<S: Display>(message: S) -> Self {
        Self { success: true, message: message.to_string() }
    }

    pub fn failure<S: Display>(message: S) -> Self {
        Self { success: false, message: message.to_string() }
    }
}

/// An order as submitted by the checkout. Unpaid card orders may carry the customer's billing details, which Paymob
/// needs to issue a payment key.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestOrderRequest {
    #[serde(flatten)]
    pub order: NewOrder,
    #[serde(default)]
    pub billing: Option<BillingData>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IngestOrderResponse {
    pub order: Order,
    /// Present when a card payment was started for the order
    pub checkout: Option<CheckoutDetails>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckoutDetails {
    pub gateway_order_id: String,
    pub payment_token: String,
    /// The hosted payment page, if a checkout iframe is configured
    pub checkout_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OrderStatusUpdate {
    pub status: OrderStatusType,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryDateUpdate {
    pub delivery_date: NaiveDate,
}

/// The brand's report on the goods. `brand_id` identifies the brand making the decision.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BrandStatusUpdate {
    pub brand_id: BrandId,
    #[serde(flatten)]
    pub decision: BrandDecision,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AdminStatusUpdate {
    pub status: AdminDecision,
    #[serde(default)]
    pub note: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecalculateParams {
    #[serde(default)]
    pub since: Option<DateTime<Utc>>,
    #[serde(default)]
    pub until: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecalculationSummary {
    pub orders_processed: usize,
    pub entries_written: usize,
    pub skipped_lines: usize,
    pub frozen_entries: usize,
    pub failures: Vec<String>,
}

impl From<RecalculationReport> for RecalculationSummary {
    fn from(report: RecalculationReport) -> Self {
        Self {
            orders_processed: report.orders_processed,
            entries_written: report.entries_written,
            skipped_lines: report.skipped_lines.len(),
            frozen_entries: report.frozen_entries,
            failures: report.failures.into_iter().map(|f| format!("{}: {}", f.order_id, f.error)).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayoutPeriod {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn brand_decisions() {
        let update: BrandStatusUpdate =
            serde_json::from_str(r#"{"brand_id": "nile", "status": "Not Received", "reason": "Box was empty"}"#)
                .unwrap();
        assert_eq!(update.brand_id, BrandId::from("nile"));
        assert_eq!(update.decision, BrandDecision::NotReceived { reason: Some("Box was empty".into()) });
        let update: BrandStatusUpdate = serde_json::from_str(r#"{"brand_id": "nile", "status": "Received"}"#).unwrap();
        assert_eq!(update.decision, BrandDecision::Received);
    }

    #[test]
    fn ingest_request() {
        let json = r#"{
            "id": "1001",
            "customer_id": "cust-1",
            "cart_items": [
                {"product_id": "p1", "brand_id": "nile", "quantity": 2, "unit_price": 250, "total_price": 500}
            ],
            "total": 550,
            "shipping_fee": 50,
            "billing": {"first_name": "Mona", "last_name": "Zaki", "email": "mona@example.com", "phone_number": "+20100"}
        }"#;
        let req: IngestOrderRequest = serde_json::from_str(json).unwrap();
        assert_eq!(req.order.cart_items.len(), 1);
        assert!(!req.order.paid);
        let billing = req.billing.unwrap();
        assert_eq!(billing.first_name, "Mona");
        assert_eq!(billing.city, "NA");
    }
}
