use chrono::NaiveDate;

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderStatusType},
    traits::{OrderQueryFilter, StorageError},
};

/// Storage of orders and their lifecycle.
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    /// Stores a new order together with its cart lines, in a single atomic transaction.
    ///
    /// Returns [`StorageError::Conflict`] if an order with the same id already exists.
    async fn insert_order(&self, order: NewOrder) -> Result<Order, StorageError>;

    /// Fetches the order with the given id, including its cart lines.
    async fn fetch_order(&self, order_id: &OrderId) -> Result<Option<Order>, StorageError>;

    /// Fetches the order that was registered with the gateway under `gateway_order_id`.
    async fn fetch_order_by_gateway_id(&self, gateway_order_id: &str) -> Result<Option<Order>, StorageError>;

    /// Fetches orders matching the filter, oldest first.
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, StorageError>;

    /// Records that the order has been paid. Idempotent.
    async fn mark_order_paid(&self, order_id: &OrderId, transaction_id: Option<&str>) -> Result<Order, StorageError>;

    /// Links the order to the remote order created for it on the payment gateway.
    async fn attach_gateway_order(&self, order_id: &OrderId, gateway_order_id: &str) -> Result<Order, StorageError>;

    async fn update_order_status(&self, order_id: &OrderId, status: OrderStatusType) -> Result<Order, StorageError>;

    async fn set_delivery_date(&self, order_id: &OrderId, date: NaiveDate) -> Result<Order, StorageError>;
}
