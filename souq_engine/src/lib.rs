//! Souq Engine
//!
//! The Souq engine keeps the books for a multi-brand marketplace. Every paid order is split per brand into a sale
//! entry in the financial log, period payouts to brands are aggregated from paid orders, and customer returns are
//! refunded through the payment gateway and reversed in the log.
//!
//! The library is divided into two main sections:
//! 1. Storage ([`traits`]). The storage contracts are defined as traits so that the APIs are backend-agnostic. SQLite
//!    is the supported backend ([`SqliteDatabase`]). The data types used by the storage layer live in [`db_types`].
//! 2. The engine public API ([`mod@souq_api`]). This is what callers use: [`OrderFlowApi`], [`BrandApi`],
//!    [`LedgerApi`], [`PayoutApi`] and [`ReturnsApi`].
//!
//! The financial split itself is a set of pure functions in [`finance`], shared by the ledger, the payout aggregator
//! and the refund workflow.
//!
//! The engine also publishes events (an order was paid, a return was refunded) that callers can hook into. See
//! [`events`].
mod db;

pub mod db_types;
pub mod events;
pub mod finance;
pub mod souq_api;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use db::sqlite::SqliteDatabase;
pub use db::traits;
pub use souq_api::{
    brand_api::BrandApi,
    errors::{BrandApiError, LedgerApiError, OrderFlowError, PayoutApiError, ReturnsApiError},
    ledger_api::LedgerApi,
    ledger_objects::{LedgerRun, LedgerTotals, RecalculationFailure, RecalculationReport},
    order_flow_api::OrderFlowApi,
    payout_api::PayoutApi,
    returns_api::ReturnsApi,
};
