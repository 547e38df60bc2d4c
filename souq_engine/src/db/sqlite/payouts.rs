use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{BrandPayout, PayoutFigures, PayoutStatus},
    traits::{PayoutQueryFilter, StorageError},
};

const PAYOUT_COLUMNS: &str = "id, brand_id, from_date, to_date, total_sales, total_commission, total_tax, \
                              brand_receivable, payout_status, paid_at, created_at, updated_at";

/// Writes the figures for a (brand, from, to) summary. The payout status of an existing summary is preserved.
pub async fn upsert_payout(figures: &PayoutFigures, conn: &mut SqliteConnection) -> Result<BrandPayout, StorageError> {
    let sql = format!(
        r#"
            INSERT INTO brand_payouts (
                brand_id,
                from_date,
                to_date,
                total_sales,
                total_commission,
                total_tax,
                brand_receivable,
                payout_status,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            ON CONFLICT (brand_id, from_date, to_date) DO UPDATE SET
                total_sales = excluded.total_sales,
                total_commission = excluded.total_commission,
                total_tax = excluded.total_tax,
                brand_receivable = excluded.brand_receivable,
                updated_at = excluded.updated_at
            RETURNING {PAYOUT_COLUMNS}
        "#
    );
    let payout = sqlx::query_as::<_, BrandPayout>(&sql)
        .bind(&figures.brand_id)
        .bind(figures.from_date)
        .bind(figures.to_date)
        .bind(figures.total_sales)
        .bind(figures.total_commission)
        .bind(figures.total_tax)
        .bind(figures.brand_receivable)
        .bind(PayoutStatus::Pending)
        .bind(Utc::now())
        .fetch_one(conn)
        .await?;
    trace!(
        "💸️ Payout #{} for {} ({} to {}) is {}",
        payout.id,
        payout.brand_id,
        payout.from_date,
        payout.to_date,
        payout.payout_status
    );
    Ok(payout)
}

pub async fn fetch_payout(id: i64, conn: &mut SqliteConnection) -> Result<Option<BrandPayout>, StorageError> {
    let sql = format!("SELECT {PAYOUT_COLUMNS} FROM brand_payouts WHERE id = $1");
    let payout = sqlx::query_as::<_, BrandPayout>(&sql).bind(id).fetch_optional(conn).await?;
    Ok(payout)
}

pub async fn fetch_payouts(
    filter: PayoutQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<BrandPayout>, StorageError> {
    let mut builder = QueryBuilder::new(format!("SELECT {PAYOUT_COLUMNS} FROM brand_payouts "));
    if !filter.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(brand_id) = filter.brand_id {
        where_clause.push("brand_id = ");
        where_clause.push_bind_unseparated(brand_id);
    }
    if let Some(status) = filter.status {
        where_clause.push("payout_status = ");
        where_clause.push_bind_unseparated(status);
    }
    builder.push(" ORDER BY from_date ASC, brand_id ASC");
    trace!("🗃️ Executing query: {}", builder.sql());
    let payouts = builder.build_query_as::<BrandPayout>().fetch_all(conn).await?;
    Ok(payouts)
}

pub async fn mark_payout_paid(
    id: i64,
    paid_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<BrandPayout, StorageError> {
    let result = sqlx::query(
        "UPDATE brand_payouts SET payout_status = $2, paid_at = $3, updated_at = $3 WHERE id = $1 AND payout_status = $4",
    )
    .bind(id)
    .bind(PayoutStatus::Paid)
    .bind(paid_at)
    .bind(PayoutStatus::Pending)
    .execute(&mut *conn)
    .await?;
    let payout = fetch_payout(id, conn).await?.ok_or_else(|| StorageError::NotFound(format!("Payout #{id}")))?;
    if result.rows_affected() == 0 {
        return Err(StorageError::Conflict(format!("Payout #{id} has already been paid")));
    }
    debug!("💸️ Payout #{id} to {} marked as paid", payout.brand_id);
    Ok(payout)
}
