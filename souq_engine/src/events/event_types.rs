use serde::{Deserialize, Serialize};

use crate::db_types::{FinancialLogEntry, Order, ReturnRequest};

/// Emitted once an order has been paid and its sale entries have been written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderPaidEvent {
    pub order: Order,
    pub entries: Vec<FinancialLogEntry>,
}

impl OrderPaidEvent {
    pub fn new(order: Order, entries: Vec<FinancialLogEntry>) -> Self {
        Self { order, entries }
    }
}

/// Emitted after the gateway accepted a refund and the reversal has been committed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReturnRefundedEvent {
    pub request: ReturnRequest,
    pub reversal: FinancialLogEntry,
}

impl ReturnRefundedEvent {
    pub fn new(request: ReturnRequest, reversal: FinancialLogEntry) -> Self {
        Self { request, reversal }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventType {
    OrderPaid(OrderPaidEvent),
    ReturnRefunded(ReturnRefundedEvent),
}
