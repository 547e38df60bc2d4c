//! # Souq ledger server
//! This crate hosts the HTTP server for the Souq ledger. It is responsible for:
//! * Ingesting orders from the checkout and starting card payments with Paymob.
//! * Receiving Paymob's transaction callbacks, verifying their signatures and confirming payment, which writes the
//!   order's ledger entries.
//! * Exposing the brand, return, finance and payout APIs of the engine.
//! * Periodically re-running the ledger generator over paid orders.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/...`: The marketplace API. See [routes](routes/index.html).
//! * `/paymob/callback`: The transaction-processed webhook for Paymob.

pub mod cli;
pub mod config;
pub mod data_objects;
pub mod errors;
pub mod integrations;
pub mod middleware;
pub mod recalc_worker;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
