//! Data types shared by the storage backends and the public API.
use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use log::error;
use serde::{Deserialize, Serialize};
pub use souq_common::{Money, Rate};
use sqlx::{FromRow, Type};
use thiserror::Error;

/// Commission charged when a brand has no explicit rate
pub const DEFAULT_COMMISSION_RATE: Rate = Rate::from_bps(1500);
/// VAT charged when a brand has no explicit rate
pub const DEFAULT_TAX_RATE: Rate = Rate::from_bps(1400);

#[derive(Debug, Clone, Error)]
#[error("Type conversion error: {0}")]
pub struct ConversionError(pub String);

//--------------------------------------     Identifiers     ---------------------------------------------------------
macro_rules! string_id {
    ($name:ident) => {
        #[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Type, Serialize, Deserialize)]
        #[sqlx(transparent)]
        #[serde(transparent)]
        pub struct $name(pub String);

        impl $name {
            pub fn new<S: Into<String>>(id: S) -> Self {
                Self(id.into())
            }

            pub fn as_str(&self) -> &str {
                self.0.as_str()
            }
        }

        impl FromStr for $name {
            type Err = ();

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                Ok(Self(s.to_string()))
            }
        }

        impl From<String> for $name {
            fn from(value: String) -> Self {
                Self(value)
            }
        }

        impl From<&str> for $name {
            fn from(value: &str) -> Self {
                Self(value.to_string())
            }
        }

        impl Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }
    };
}

string_id!(OrderId);
string_id!(BrandId);

//--------------------------------------   OrderStatusType   ---------------------------------------------------------
/// The order lifecycle tag. `Refunded` is terminal and can only be reached through the refund workflow.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum OrderStatusType {
    #[default]
    Pending,
    Processing,
    Shipped,
    Delivered,
    Cancelled,
    Refunded,
}

impl OrderStatusType {
    /// Whether an administrator may move an order from `self` to `next`. Refunds use their own workflow.
    pub fn can_transition_to(&self, next: OrderStatusType) -> bool {
        use OrderStatusType::*;
        matches!(
            (self, next),
            (Pending, Processing) |
                (Processing, Shipped) |
                (Shipped, Delivered) |
                (Pending, Cancelled) |
                (Processing, Cancelled)
        )
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "Pending"),
            OrderStatusType::Processing => write!(f, "Processing"),
            OrderStatusType::Shipped => write!(f, "Shipped"),
            OrderStatusType::Delivered => write!(f, "Delivered"),
            OrderStatusType::Cancelled => write!(f, "Cancelled"),
            OrderStatusType::Refunded => write!(f, "Refunded"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" => Ok(Self::Pending),
            "Processing" => Ok(Self::Processing),
            "Shipped" => Ok(Self::Shipped),
            "Delivered" => Ok(Self::Delivered),
            "Cancelled" => Ok(Self::Cancelled),
            "Refunded" => Ok(Self::Refunded),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

impl From<String> for OrderStatusType {
    fn from(value: String) -> Self {
        value.parse().unwrap_or_else(|_| {
            error!("Invalid order status: {value}. But this conversion cannot fail. Defaulting to Pending");
            OrderStatusType::Pending
        })
    }
}

//--------------------------------------    PaymentMethod    ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PaymentMethod {
    #[default]
    Card,
    #[sqlx(rename = "Cash On Delivery")]
    #[serde(rename = "Cash On Delivery")]
    CashOnDelivery,
}

impl Display for PaymentMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PaymentMethod::Card => write!(f, "Card"),
            PaymentMethod::CashOnDelivery => write!(f, "Cash On Delivery"),
        }
    }
}

//--------------------------------------       Orders        ---------------------------------------------------------
#[derive(Debug, Clone, Default, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct PaymentDetails {
    #[sqlx(rename = "payment_method")]
    pub method: PaymentMethod,
    /// The gateway's id for the remote order that was charged
    pub gateway_order_id: Option<String>,
    /// The gateway's id for the charge itself, when known
    pub transaction_id: Option<String>,
    pub paid: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct CartItem {
    pub product_id: String,
    pub brand_id: BrandId,
    pub quantity: i64,
    pub unit_price: Money,
    pub total_price: Money,
    /// Commission agreed when the order was placed. Falls back to `total_price × brand.commission_rate`.
    #[serde(default)]
    pub commission_amount: Option<Money>,
    /// Tax computed when the order was placed. Falls back to `total_price × brand.tax_rate`.
    #[serde(default)]
    pub tax_amount: Option<Money>,
}

impl CartItem {
    pub fn new(product_id: &str, brand_id: &BrandId, quantity: i64, unit_price: Money) -> Self {
        Self {
            product_id: product_id.to_string(),
            brand_id: brand_id.clone(),
            quantity,
            unit_price,
            total_price: unit_price * quantity,
            commission_amount: None,
            tax_amount: None,
        }
    }

    pub fn with_commission(mut self, commission: Money) -> Self {
        self.commission_amount = Some(commission);
        self
    }

    pub fn with_tax(mut self, tax: Money) -> Self {
        self.tax_amount = Some(tax);
        self
    }

    /// `total_price == unit_price × quantity`. A product that overflows is never consistent.
    pub fn is_consistent(&self) -> bool {
        self.unit_price.checked_mul(self.quantity) == Some(self.total_price)
    }

    fn has_negative_amount(&self) -> bool {
        self.unit_price.is_negative() ||
            self.total_price.is_negative() ||
            self.commission_amount.is_some_and(|m| m.is_negative()) ||
            self.tax_amount.is_some_and(|m| m.is_negative())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewOrder {
    pub id: OrderId,
    pub customer_id: String,
    pub cart_items: Vec<CartItem>,
    pub total: Money,
    #[serde(default)]
    pub shipping_fee: Money,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    /// True when payment was captured before the order reached the marketplace
    #[serde(default)]
    pub paid: bool,
    #[serde(default)]
    pub gateway_order_id: Option<String>,
    #[serde(default)]
    pub transaction_id: Option<String>,
    /// Defaults to the time of ingestion
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl NewOrder {
    pub fn new(id: OrderId, customer_id: String, cart_items: Vec<CartItem>, shipping_fee: Money) -> Self {
        let total = cart_items.iter().map(|i| i.total_price).sum();
        Self {
            id,
            customer_id,
            cart_items,
            total,
            shipping_fee,
            payment_method: PaymentMethod::Card,
            paid: false,
            gateway_order_id: None,
            transaction_id: None,
            created_at: None,
        }
    }

    pub fn with_total(mut self, total: Money) -> Self {
        self.total = total;
        self
    }

    pub fn with_created_at(mut self, created_at: DateTime<Utc>) -> Self {
        self.created_at = Some(created_at);
        self
    }

    pub fn paid_with(mut self, gateway_order_id: &str) -> Self {
        self.paid = true;
        self.gateway_order_id = Some(gateway_order_id.to_string());
        self
    }

    /// Checks the structural rules an order must satisfy before it is accepted.
    pub fn validate(&self) -> Result<(), String> {
        if self.id.as_str().trim().is_empty() {
            return Err("Order id is required".into());
        }
        if self.customer_id.trim().is_empty() {
            return Err("Customer id is required".into());
        }
        if self.cart_items.is_empty() {
            return Err("An order must contain at least one item".into());
        }
        if let Some(item) = self.cart_items.iter().find(|i| i.quantity <= 0) {
            return Err(format!("Item {} has a non-positive quantity", item.product_id));
        }
        if let Some(item) = self.cart_items.iter().find(|i| i.has_negative_amount()) {
            return Err(format!("Item {} has a negative amount", item.product_id));
        }
        if let Some(item) = self.cart_items.iter().find(|i| !i.is_consistent()) {
            return Err(match item.unit_price.checked_mul(item.quantity) {
                Some(expected) => format!(
                    "Item {} has total {} but {} × {} = {expected}",
                    item.product_id, item.total_price, item.quantity, item.unit_price
                ),
                None => format!(
                    "Item {}: {} × {} is out of range",
                    item.product_id, item.quantity, item.unit_price
                ),
            });
        }
        if self.total.is_negative() || self.shipping_fee.is_negative() {
            return Err("Order total and shipping fee cannot be negative".into());
        }
        // Commission and tax are at most the line total when they come from a rate, so every ledger figure derived
        // from the order is bounded by this sum.
        let out_of_range = || format!("The amounts on order {} are out of range", self.id);
        let start = self.total.checked_add(self.shipping_fee).ok_or_else(out_of_range)?;
        self.cart_items
            .iter()
            .flat_map(|i| {
                [i.total_price, i.commission_amount.unwrap_or(i.total_price), i.tax_amount.unwrap_or(i.total_price)]
            })
            .try_fold(start, Money::checked_add)
            .ok_or_else(out_of_range)?;
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    pub customer_id: String,
    #[sqlx(skip)]
    pub cart_items: Vec<CartItem>,
    pub total: Money,
    pub shipping_fee: Money,
    #[sqlx(flatten)]
    pub payment_details: PaymentDetails,
    pub order_status: OrderStatusType,
    /// Sum of the brand payouts in the order's ledger entries, less anything reversed by refunds
    pub brand_payout: Money,
    /// Sum of the platform profit in the order's ledger entries, less anything reversed by refunds
    pub net_admin_profit: Money,
    pub delivery_date: Option<NaiveDate>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Order {
    pub fn is_paid(&self) -> bool {
        self.payment_details.paid
    }

    pub fn items_for_brand<'a>(&'a self, brand_id: &'a BrandId) -> impl Iterator<Item = &'a CartItem> + 'a {
        self.cart_items.iter().filter(move |i| &i.brand_id == brand_id)
    }

    /// Distinct brands on the order, in order of first appearance
    pub fn brand_ids(&self) -> Vec<BrandId> {
        let mut ids: Vec<BrandId> = Vec::new();
        for item in &self.cart_items {
            if !ids.contains(&item.brand_id) {
                ids.push(item.brand_id.clone());
            }
        }
        ids
    }

    pub fn month(&self) -> i64 {
        i64::from(self.created_at.month())
    }

    pub fn year(&self) -> i64 {
        i64::from(self.created_at.year())
    }
}

//--------------------------------------       Brands        ---------------------------------------------------------
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct Brand {
    pub id: BrandId,
    pub name: String,
    pub commission_rate: Rate,
    pub tax_rate: Rate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewBrand {
    pub id: BrandId,
    pub name: String,
    #[serde(default)]
    pub commission_rate: Option<Rate>,
    #[serde(default)]
    pub tax_rate: Option<Rate>,
}

impl NewBrand {
    pub fn new(id: &str, name: &str) -> Self {
        Self { id: BrandId::from(id), name: name.to_string(), commission_rate: None, tax_rate: None }
    }

    pub fn with_rates(mut self, commission_rate: Rate, tax_rate: Rate) -> Self {
        self.commission_rate = Some(commission_rate);
        self.tax_rate = Some(tax_rate);
        self
    }
}

//--------------------------------------    Ledger entries   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum LedgerEntryKind {
    /// The financial split of a paid order for one brand
    Sale,
    /// The negation of a sale entry, written when the brand's items are refunded
    Reversal,
}

impl Display for LedgerEntryKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerEntryKind::Sale => write!(f, "Sale"),
            LedgerEntryKind::Reversal => write!(f, "Reversal"),
        }
    }
}

impl FromStr for LedgerEntryKind {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Sale" => Ok(Self::Sale),
            "Reversal" => Ok(Self::Reversal),
            s => Err(ConversionError(format!("Invalid ledger entry kind: {s}"))),
        }
    }
}

/// A ledger row that has not been written yet.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewLedgerEntry {
    pub order_id: OrderId,
    pub brand_id: BrandId,
    pub kind: LedgerEntryKind,
    pub total: Money,
    pub shipping_fee: Money,
    pub vat: Money,
    pub commission: Money,
    pub gateway_fee: Money,
    pub brand_payout: Money,
    pub net_admin_profit: Money,
    pub captured_amount: Money,
    pub converted_amount: Money,
    pub month: i64,
    pub year: i64,
    pub created_at: DateTime<Utc>,
}

impl NewLedgerEntry {
    /// The reversal of this entry: every monetary field negated, period attribution unchanged.
    pub fn reversed(&self) -> Self {
        Self {
            order_id: self.order_id.clone(),
            brand_id: self.brand_id.clone(),
            kind: LedgerEntryKind::Reversal,
            total: -self.total,
            shipping_fee: -self.shipping_fee,
            vat: -self.vat,
            commission: -self.commission,
            gateway_fee: -self.gateway_fee,
            brand_payout: -self.brand_payout,
            net_admin_profit: -self.net_admin_profit,
            captured_amount: -self.captured_amount,
            converted_amount: -self.converted_amount,
            month: self.month,
            year: self.year,
            created_at: self.created_at,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct FinancialLogEntry {
    pub id: i64,
    pub order_id: OrderId,
    pub brand_id: BrandId,
    pub kind: LedgerEntryKind,
    pub total: Money,
    pub shipping_fee: Money,
    pub vat: Money,
    pub commission: Money,
    pub gateway_fee: Money,
    pub brand_payout: Money,
    pub net_admin_profit: Money,
    pub captured_amount: Money,
    pub converted_amount: Money,
    pub month: i64,
    pub year: i64,
    pub created_at: DateTime<Utc>,
}

impl FinancialLogEntry {
    pub fn is_reversal(&self) -> bool {
        self.kind == LedgerEntryKind::Reversal
    }
}

impl From<FinancialLogEntry> for NewLedgerEntry {
    fn from(e: FinancialLogEntry) -> Self {
        Self {
            order_id: e.order_id,
            brand_id: e.brand_id,
            kind: e.kind,
            total: e.total,
            shipping_fee: e.shipping_fee,
            vat: e.vat,
            commission: e.commission,
            gateway_fee: e.gateway_fee,
            brand_payout: e.brand_payout,
            net_admin_profit: e.net_admin_profit,
            captured_amount: e.captured_amount,
            converted_amount: e.converted_amount,
            month: e.month,
            year: e.year,
            created_at: e.created_at,
        }
    }
}

//--------------------------------------      Payouts        ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum PayoutStatus {
    #[default]
    Pending,
    Paid,
}

impl Display for PayoutStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayoutStatus::Pending => write!(f, "Pending"),
            PayoutStatus::Paid => write!(f, "Paid"),
        }
    }
}

/// The numeric part of a payout summary, as produced by the aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutFigures {
    pub brand_id: BrandId,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub total_sales: Money,
    pub total_commission: Money,
    pub total_tax: Money,
    pub brand_receivable: Money,
}

impl PayoutFigures {
    pub fn new(brand_id: BrandId, from_date: NaiveDate, to_date: NaiveDate) -> Self {
        Self {
            brand_id,
            from_date,
            to_date,
            total_sales: Money::ZERO,
            total_commission: Money::ZERO,
            total_tax: Money::ZERO,
            brand_receivable: Money::ZERO,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, Deserialize)]
pub struct BrandPayout {
    pub id: i64,
    pub brand_id: BrandId,
    pub from_date: NaiveDate,
    pub to_date: NaiveDate,
    pub total_sales: Money,
    pub total_commission: Money,
    pub total_tax: Money,
    pub brand_receivable: Money,
    pub payout_status: PayoutStatus,
    pub paid_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------   Return requests   ---------------------------------------------------------
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum BrandReturnStatus {
    #[default]
    Pending,
    Received,
    #[sqlx(rename = "Not Received")]
    #[serde(rename = "Not Received")]
    NotReceived,
}

impl Display for BrandReturnStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BrandReturnStatus::Pending => write!(f, "Pending"),
            BrandReturnStatus::Received => write!(f, "Received"),
            BrandReturnStatus::NotReceived => write!(f, "Not Received"),
        }
    }
}

/// The admin-facing outcome of a return
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Type, Serialize, Deserialize)]
pub enum ReturnStatus {
    #[default]
    Pending,
    Refunded,
    #[sqlx(rename = "Not Refunded")]
    #[serde(rename = "Not Refunded")]
    NotRefunded,
}

impl Display for ReturnStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ReturnStatus::Pending => write!(f, "Pending"),
            ReturnStatus::Refunded => write!(f, "Refunded"),
            ReturnStatus::NotRefunded => write!(f, "Not Refunded"),
        }
    }
}

/// What the brand reports after the customer ships the goods back
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "status")]
pub enum BrandDecision {
    Received,
    #[serde(rename = "Not Received")]
    NotReceived {
        #[serde(default)]
        reason: Option<String>,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AdminDecision {
    Approved,
    Rejected,
    Refunded,
}

impl Display for AdminDecision {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdminDecision::Approved => write!(f, "Approved"),
            AdminDecision::Rejected => write!(f, "Rejected"),
            AdminDecision::Refunded => write!(f, "Refunded"),
        }
    }
}

/// A snapshot of a returned line, taken when the return is filed
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnItem {
    pub product_id: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub total_price: Money,
    pub tax: Money,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewReturnRequest {
    pub order_id: OrderId,
    pub customer_id: String,
    pub brand_id: BrandId,
    pub reason: String,
}

impl NewReturnRequest {
    pub fn new(order_id: &OrderId, customer_id: &str, brand_id: &BrandId, reason: &str) -> Self {
        Self {
            order_id: order_id.clone(),
            customer_id: customer_id.to_string(),
            brand_id: brand_id.clone(),
            reason: reason.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnRequest {
    pub id: i64,
    pub order_id: OrderId,
    pub customer_id: String,
    pub brand_id: BrandId,
    pub items: Vec<ReturnItem>,
    pub total_refund_amount: Money,
    pub reason: String,
    pub brand_status: BrandReturnStatus,
    pub brand_reason: Option<String>,
    pub status: ReturnStatus,
    pub admin_note: Option<String>,
    pub reviewed_at: Option<DateTime<Utc>>,
    /// The gateway's id for the refund transaction
    pub refund_reference: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn cart_item_consistency() {
        let brand = BrandId::from("b1");
        let item = CartItem::new("p1", &brand, 3, Money::from_cents(250));
        assert_eq!(item.total_price, Money::from_cents(750));
        assert!(item.is_consistent());
        let bad = CartItem { total_price: Money::from_cents(700), ..item };
        assert!(!bad.is_consistent());
    }

    #[test]
    fn new_order_validation() {
        let brand = BrandId::from("b1");
        let order = NewOrder::new(
            OrderId::from("o1"),
            "c1".into(),
            vec![CartItem::new("p1", &brand, 2, Money::from_major(5))],
            Money::from_major(1),
        );
        assert!(order.validate().is_ok());
        assert_eq!(order.total, Money::from_major(10));

        let mut bad = order.clone();
        bad.cart_items[0].total_price = Money::from_major(11);
        assert!(bad.validate().unwrap_err().contains("p1"));

        let mut empty = order.clone();
        empty.cart_items.clear();
        assert!(empty.validate().is_err());

        let mut anon = order;
        anon.customer_id = " ".into();
        assert!(anon.validate().is_err());
    }

    #[test]
    fn oversized_amounts_are_rejected() {
        let json = r#"{
            "id": "o2",
            "customer_id": "c1",
            "cart_items": [{
                "product_id": "p1",
                "brand_id": "b1",
                "quantity": 1000,
                "unit_price": 50000000000000000,
                "total_price": 1
            }],
            "total": 1
        }"#;
        let order: NewOrder = serde_json::from_str(json).unwrap();
        let err = order.validate().unwrap_err();
        assert!(err.contains("out of range"), "{err}");

        // Each line fits, but their sum does not
        let brand = BrandId::from("b1");
        let half = Money::from_cents(i64::MAX / 2 + 1);
        let mut order =
            NewOrder::new(OrderId::from("o3"), "c1".into(), vec![CartItem::new("p1", &brand, 1, half)], Money::ZERO);
        order.cart_items.push(CartItem::new("p2", &brand, 1, half));
        assert!(order.validate().unwrap_err().contains("out of range"));

        let order = NewOrder::new(
            OrderId::from("o4"),
            "c1".into(),
            vec![CartItem::new("p1", &brand, 1, Money::from_major(10))],
            Money::from_cents(i64::MAX),
        );
        assert!(order.validate().unwrap_err().contains("out of range"));

        let mut negative = NewOrder::new(
            OrderId::from("o5"),
            "c1".into(),
            vec![CartItem::new("p1", &brand, 1, Money::from_major(10))],
            Money::ZERO,
        );
        negative.cart_items[0].commission_amount = Some(Money::from_major(-1));
        assert!(negative.validate().unwrap_err().contains("negative"));
    }

    #[test]
    fn status_transitions() {
        use OrderStatusType::*;
        assert!(Pending.can_transition_to(Processing));
        assert!(Shipped.can_transition_to(Delivered));
        assert!(!Delivered.can_transition_to(Pending));
        assert!(!Pending.can_transition_to(Refunded));
        assert!(!Refunded.can_transition_to(Cancelled));
    }

    #[test]
    fn brand_decisions_from_json() {
        let d: BrandDecision = serde_json::from_str(r#"{"status":"Received"}"#).unwrap();
        assert_eq!(d, BrandDecision::Received);
        let d: BrandDecision = serde_json::from_str(r#"{"status":"Not Received","reason":"box empty"}"#).unwrap();
        assert_eq!(d, BrandDecision::NotReceived { reason: Some("box empty".into()) });
        let d: BrandDecision = serde_json::from_str(r#"{"status":"Not Received"}"#).unwrap();
        assert_eq!(d, BrandDecision::NotReceived { reason: None });
    }

    #[test]
    fn reversal_negates_everything() {
        let entry = NewLedgerEntry {
            order_id: "o1".into(),
            brand_id: "b1".into(),
            kind: LedgerEntryKind::Sale,
            total: Money::from_major(1000),
            shipping_fee: Money::from_major(50),
            vat: Money::from_major(140),
            commission: Money::from_major(150),
            gateway_fee: Money::from_major(30),
            brand_payout: Money::from_major(660),
            net_admin_profit: Money::from_major(120),
            captured_amount: Money::from_major(1000),
            converted_amount: Money::from_major(1000),
            month: 3,
            year: 2024,
            created_at: Utc::now(),
        };
        let rev = entry.reversed();
        assert_eq!(rev.kind, LedgerEntryKind::Reversal);
        assert_eq!(rev.total + entry.total, Money::ZERO);
        assert_eq!(rev.brand_payout, -Money::from_major(660));
        assert_eq!(rev.created_at, entry.created_at);
        assert_eq!(rev.month, 3);
    }
}
