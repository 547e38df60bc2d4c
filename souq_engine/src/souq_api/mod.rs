//! # Souq engine public API
//!
//! The `souq_api` module exposes the programmatic API of the engine. Each API is a thin struct over a storage backend
//! that implements the traits it needs, so that clients can pick the pieces they want.
//!
//! * [`order_flow_api`] ingests orders and payment confirmations. Paid orders get their ledger entries immediately.
//! * [`brand_api`] registers brands and their commission and tax rates.
//! * [`ledger_api`] generates and regenerates the financial log, and reports on it.
//! * [`payout_api`] aggregates what each brand is owed over a period and tracks payment of those summaries.
//! * [`returns_api`] runs the return and refund workflow. It is the only API that talks to the payment gateway.
//!
//! # API usage
//!
//! ```rust,ignore
//! use souq_engine::{LedgerApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/souq.db", 25).await?;
//! let api = LedgerApi::new(db);
//! let run = api.generate_entries_for_order(&order_id).await?;
//! ```
pub mod brand_api;
pub mod errors;
pub mod ledger_api;
pub mod ledger_objects;
pub mod order_flow_api;
pub mod payout_api;
pub mod returns_api;
