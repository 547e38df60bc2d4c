use chrono::Utc;
use log::debug;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{Brand, BrandId, NewBrand, DEFAULT_COMMISSION_RATE, DEFAULT_TAX_RATE},
    traits::StorageError,
};

pub async fn upsert_brand(brand: NewBrand, conn: &mut SqliteConnection) -> Result<Brand, StorageError> {
    let now = Utc::now();
    let commission_rate = brand.commission_rate.unwrap_or(DEFAULT_COMMISSION_RATE);
    let tax_rate = brand.tax_rate.unwrap_or(DEFAULT_TAX_RATE);
    let brand = sqlx::query_as::<_, Brand>(
        r#"
            INSERT INTO brands (id, name, commission_rate, tax_rate, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $5)
            ON CONFLICT (id) DO UPDATE SET
                name = excluded.name,
                commission_rate = excluded.commission_rate,
                tax_rate = excluded.tax_rate,
                updated_at = excluded.updated_at
            RETURNING id, name, commission_rate, tax_rate, created_at, updated_at
        "#,
    )
    .bind(&brand.id)
    .bind(&brand.name)
    .bind(commission_rate)
    .bind(tax_rate)
    .bind(now)
    .fetch_one(conn)
    .await?;
    debug!("🗃️ Brand {} saved. Commission {}, tax {}", brand.id, brand.commission_rate, brand.tax_rate);
    Ok(brand)
}

pub async fn fetch_brand(brand_id: &BrandId, conn: &mut SqliteConnection) -> Result<Option<Brand>, StorageError> {
    let brand = sqlx::query_as::<_, Brand>(
        "SELECT id, name, commission_rate, tax_rate, created_at, updated_at FROM brands WHERE id = $1",
    )
    .bind(brand_id)
    .fetch_optional(conn)
    .await?;
    Ok(brand)
}

pub async fn fetch_brands(brand_ids: &[BrandId], conn: &mut SqliteConnection) -> Result<Vec<Brand>, StorageError> {
    if brand_ids.is_empty() {
        return Ok(Vec::new());
    }
    let mut builder =
        QueryBuilder::new("SELECT id, name, commission_rate, tax_rate, created_at, updated_at FROM brands WHERE id IN (");
    let mut ids = builder.separated(", ");
    for id in brand_ids {
        ids.push_bind(id.clone());
    }
    builder.push(") ORDER BY id");
    let brands = builder.build_query_as::<Brand>().fetch_all(conn).await?;
    Ok(brands)
}
