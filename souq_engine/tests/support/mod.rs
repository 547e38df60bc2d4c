#![allow(dead_code)]
use chrono::{DateTime, TimeZone, Utc};
use log::*;
use souq_engine::{
    db_types::{BrandId, CartItem, Money, NewBrand, NewOrder, OrderId, Rate},
    traits::{BrandManagement, MarketplaceDatabase},
    SqliteDatabase,
};
use sqlx::{migrate::MigrateDatabase, Sqlite};

pub fn random_db_url() -> String {
    format!("sqlite://{}/souq_engine_test_{}.db", std::env::temp_dir().display(), rand::random::<u64>())
}

/// A fresh, migrated database in the temp directory
pub async fn new_db() -> SqliteDatabase {
    dotenvy::from_filename(".env.test").ok();
    let _ = env_logger::try_init();
    let url = random_db_url();
    let db = SqliteDatabase::new_with_url(&url, 5).await.expect("Error creating database");
    db.migrate().await.expect("Error running migrations");
    debug!("🚀️ Test database ready at {url}");
    db
}

pub async fn tear_down(db: SqliteDatabase) {
    let url = db.url().to_string();
    db.close().await;
    if let Err(e) = Sqlite::drop_database(&url).await {
        warn!("🚀️ Could not remove test database {url}: {e}");
    }
}

pub fn march(day: u32, hour: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, day, hour, 0, 0).unwrap()
}

pub fn egp(major: i64) -> Money {
    Money::from_major(major)
}

pub async fn seed_brand(db: &SqliteDatabase, id: &str) -> BrandId {
    db.upsert_brand(NewBrand::new(id, &id.to_uppercase())).await.expect("Error creating brand").id
}

pub async fn seed_brand_with_rates(db: &SqliteDatabase, id: &str, commission: Rate, tax: Rate) -> BrandId {
    let brand = NewBrand::new(id, &id.to_uppercase()).with_rates(commission, tax);
    db.upsert_brand(brand).await.expect("Error creating brand").id
}

/// A single-brand order for `qty × unit` plus shipping, created on the given date
pub fn order_for(id: &str, customer: &str, brand: &BrandId, qty: i64, unit: Money, shipping: Money) -> NewOrder {
    NewOrder::new(
        OrderId::from(id),
        customer.to_string(),
        vec![CartItem::new(&format!("{id}-p1"), brand, qty, unit)],
        shipping,
    )
    .with_created_at(march(15, 10))
}

/// The canonical 1000 + 50 shipping order, paid through gateway order `gw-{id}`
pub fn paid_order(id: &str, customer: &str, brand: &BrandId) -> NewOrder {
    order_for(id, customer, brand, 1, egp(1000), egp(50)).paid_with(&format!("gw-{id}"))
}
