//! SQLite backend.
//!
//! [`SqliteDatabase`] implements every storage trait in [`crate::traits`]. The submodules hold the queries, each taking
//! a `&mut SqliteConnection` so that they can be composed inside a transaction by passing `&mut *tx`.
mod db;
mod errors;

pub mod brands;
pub mod ledger;
pub mod orders;
pub mod payouts;
pub mod returns;

use std::{env, str::FromStr};

pub use db::SqliteDatabase;
use log::info;
use sqlx::{
    sqlite::{SqliteConnectOptions, SqlitePoolOptions},
    SqlitePool,
};

use crate::traits::StorageError;

const SQLITE_DB_URL: &str = "sqlite://data/souq_ledger.db";

pub fn db_url() -> String {
    let result = env::var("SOUQ_DATABASE_URL").unwrap_or_else(|_| {
        info!("🗃️ SOUQ_DATABASE_URL is not set. Using the default.");
        SQLITE_DB_URL.to_string()
    });
    info!("🗃️ Using database URL: {result}");
    result
}

pub async fn new_pool(url: &str, max_connections: u32) -> Result<SqlitePool, StorageError> {
    let options = SqliteConnectOptions::from_str(url)?.create_if_missing(true).foreign_keys(true);
    let pool = SqlitePoolOptions::new().max_connections(max_connections).connect_with(options).await?;
    Ok(pool)
}
