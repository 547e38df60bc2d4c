use std::fmt::Debug;

use chrono::NaiveDate;
use log::*;

use crate::{
    db_types::{NewOrder, Order, OrderId, OrderStatusType},
    events::{EventProducers, OrderPaidEvent},
    souq_api::{errors::OrderFlowError, ledger_api::LedgerApi, ledger_objects::LedgerRun},
    traits::{BrandManagement, LedgerManagement, OrderManagement, StorageError},
};

/// `OrderFlowApi` is the entry point for orders coming from the checkout, and for the payment confirmations that
/// follow them. Every order that becomes paid gets its sale entries written to the ledger straight away.
pub struct OrderFlowApi<B> {
    db: B,
    ledger: LedgerApi<B>,
    producers: EventProducers,
}

impl<B> Debug for OrderFlowApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B: Clone> OrderFlowApi<B> {
    pub fn new(db: B, producers: EventProducers) -> Self {
        let ledger = LedgerApi::new(db.clone());
        Self { db, ledger, producers }
    }
}

impl<B> OrderFlowApi<B>
where B: OrderManagement + BrandManagement + LedgerManagement
{
    /// Stores a brand-new order.
    ///
    /// Orders that arrive already paid (e.g. captured by the checkout before they reach us) have their ledger entries
    /// generated immediately. If the order already exists, an error is returned.
    pub async fn process_new_order(&self, order: NewOrder) -> Result<Order, OrderFlowError> {
        order.validate().map_err(OrderFlowError::ValidationError)?;
        let order_id = order.id.clone();
        let order = self.db.insert_order(order).await.map_err(|e| match e {
            StorageError::Conflict(_) => OrderFlowError::OrderAlreadyExists(order_id.clone()),
            e => OrderFlowError::from(e),
        })?;
        debug!("📦️ Order {} received for customer {} with {} lines", order.id, order.customer_id, order.cart_items.len());
        if order.is_paid() {
            return self.on_paid(order).await;
        }
        Ok(order)
    }

    /// Handles the gateway's confirmation that the remote order `gateway_order_id` has been paid.
    ///
    /// Confirming the same payment twice is harmless: the ledger is regenerated with identical values and no second
    /// `OrderPaid` event is published.
    pub async fn confirm_payment(
        &self,
        gateway_order_id: &str,
        transaction_id: Option<&str>,
    ) -> Result<Order, OrderFlowError> {
        let order = self
            .db
            .fetch_order_by_gateway_id(gateway_order_id)
            .await?
            .ok_or_else(|| OrderFlowError::NotFound(format!("Order for gateway order {gateway_order_id}")))?;
        let already_paid = order.is_paid();
        let order = self.db.mark_order_paid(&order.id, transaction_id).await?;
        if already_paid {
            info!("📦️ Order {} was already paid. Refreshing its ledger entries.", order.id);
            self.ledger.generate_entries(&order).await?;
            return self.fetch_order(&order.id).await;
        }
        info!("📦️ Order {} has been paid (gateway order {gateway_order_id})", order.id);
        self.on_paid(order).await
    }

    async fn on_paid(&self, order: Order) -> Result<Order, OrderFlowError> {
        let run = self.ledger.generate_entries(&order).await?;
        let LedgerRun { entries, .. } = run;
        let order = self.fetch_order(&order.id).await?;
        self.producers.publish_order_paid(OrderPaidEvent::new(order.clone(), entries)).await;
        Ok(order)
    }

    /// Links the order with the remote order created on the payment gateway during checkout.
    pub async fn attach_gateway_order(&self, order_id: &OrderId, gateway_order_id: &str) -> Result<Order, OrderFlowError> {
        if gateway_order_id.trim().is_empty() {
            return Err(OrderFlowError::ValidationError("The gateway order id cannot be empty".into()));
        }
        let order = self.db.attach_gateway_order(order_id, gateway_order_id).await?;
        debug!("📦️ Order {order_id} is gateway order {gateway_order_id}");
        Ok(order)
    }

    /// Moves an order along its fulfilment lifecycle.
    ///
    /// | From \ To  | Processing | Shipped | Delivered | Cancelled |
    /// |------------|------------|---------|-----------|-----------|
    /// | Pending    | ok         | Err     | Err       | ok        |
    /// | Processing | Err        | ok      | Err       | ok        |
    /// | Shipped    | Err        | Err     | ok        | Err       |
    ///
    /// `Delivered`, `Cancelled` and `Refunded` are final here. `Refunded` is only ever set by the refund workflow.
    pub async fn update_order_status(
        &self,
        order_id: &OrderId,
        status: OrderStatusType,
    ) -> Result<Order, OrderFlowError> {
        let order = self.fetch_order(order_id).await?;
        if !order.order_status.can_transition_to(status) {
            return Err(OrderFlowError::InvalidTransition(format!(
                "Order {order_id} cannot move from {} to {status}",
                order.order_status
            )));
        }
        let order = self.db.update_order_status(order_id, status).await?;
        info!("📦️ Order {order_id} is now {status}");
        Ok(order)
    }

    pub async fn set_delivery_date(&self, order_id: &OrderId, date: NaiveDate) -> Result<Order, OrderFlowError> {
        let order = self.db.set_delivery_date(order_id, date).await?;
        debug!("📦️ Order {order_id} will be delivered on {date}");
        Ok(order)
    }

    pub async fn fetch_order(&self, order_id: &OrderId) -> Result<Order, OrderFlowError> {
        self.db.fetch_order(order_id).await?.ok_or_else(|| OrderFlowError::NotFound(format!("Order {order_id}")))
    }
}
