//! # Storage and gateway contracts
//!
//! This module defines the behaviour that backends need to expose in order to be driven by the Souq engine APIs.
//!
//! * [`OrderManagement`] stores orders and their lifecycle. Orders are owned by the checkout flow; the engine reads
//!   them and updates their status and cached financial summary.
//! * [`BrandManagement`] stores brands and their commission and tax rates.
//! * [`LedgerManagement`] persists financial log entries. Sale entries are upserted by (order, brand); reversals are
//!   appended.
//! * [`PayoutManagement`] persists period payout summaries without ever resetting their payout status.
//! * [`ReturnManagement`] stores return requests and commits refunds atomically.
//! * [`MarketplaceDatabase`] bundles all of the above for a single backend.
//!
//! [`PaymentProvider`] is the engine's narrow view of the external payment gateway.
mod brand_management;
mod data_objects;
mod errors;
mod ledger_management;
mod marketplace_database;
mod order_management;
mod payment_provider;
mod payout_management;
mod return_management;

pub use brand_management::BrandManagement;
pub use data_objects::{
    LedgerQueryFilter,
    OrderQueryFilter,
    PayoutQueryFilter,
    RefundCommit,
    RefundOutcome,
    ReturnQueryFilter,
};
pub use errors::StorageError;
pub use ledger_management::LedgerManagement;
pub use marketplace_database::MarketplaceDatabase;
pub use order_management::OrderManagement;
pub use payment_provider::{GatewayError, GatewayRefund, PaymentProvider};
pub use payout_management::PayoutManagement;
pub use return_management::ReturnManagement;
