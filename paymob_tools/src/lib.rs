//! Client for the Paymob Accept payment gateway.
//!
//! [`PaymobApi`] wraps the REST endpoints the marketplace needs: authentication, remote order and payment key creation
//! for checkout, transaction look-up and refunds. [`signature`] verifies the HMAC attached to transaction-processed
//! callbacks.
mod api;
mod config;
mod error;

pub mod data_objects;
pub mod signature;

pub use api::PaymobApi;
pub use config::PaymobConfig;
pub use data_objects::{BillingData, OrderItem, RefundConfirmation, TransactionCallback};
pub use error::PaymobApiError;
