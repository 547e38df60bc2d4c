use log::{debug, trace};
use sqlx::{query::QueryAs, sqlite::SqliteArguments, QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{BrandId, FinancialLogEntry, LedgerEntryKind, NewLedgerEntry, OrderId},
    traits::{LedgerQueryFilter, StorageError},
};

const LEDGER_COLUMNS: &str = "id, order_id, brand_id, kind, total, shipping_fee, vat, commission, gateway_fee, \
                              brand_payout, net_admin_profit, captured_amount, converted_amount, month, year, created_at";

/// Overwrites the sale entry for the entry's (order, brand) pair, or creates it.
///
/// Returns `None` if the pair has already been reversed, in which case nothing is written.
pub async fn upsert_sale_entry(
    entry: &NewLedgerEntry,
    conn: &mut SqliteConnection,
) -> Result<Option<FinancialLogEntry>, StorageError> {
    if reversal_exists(&entry.order_id, &entry.brand_id, conn).await? {
        debug!("📒️ Sale entry for {}/{} has been reversed. Leaving it alone.", entry.order_id, entry.brand_id);
        return Ok(None);
    }
    let sql = format!(
        r#"
            INSERT INTO financial_logs (
                order_id,
                brand_id,
                kind,
                total,
                shipping_fee,
                vat,
                commission,
                gateway_fee,
                brand_payout,
                net_admin_profit,
                captured_amount,
                converted_amount,
                month,
                year,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            ON CONFLICT (order_id, brand_id, kind) DO UPDATE SET
                total = excluded.total,
                shipping_fee = excluded.shipping_fee,
                vat = excluded.vat,
                commission = excluded.commission,
                gateway_fee = excluded.gateway_fee,
                brand_payout = excluded.brand_payout,
                net_admin_profit = excluded.net_admin_profit,
                captured_amount = excluded.captured_amount,
                converted_amount = excluded.converted_amount,
                month = excluded.month,
                year = excluded.year,
                created_at = excluded.created_at
            RETURNING {LEDGER_COLUMNS}
        "#
    );
    let saved = bind_entry(sqlx::query_as::<_, FinancialLogEntry>(&sql), entry, LedgerEntryKind::Sale)
        .fetch_one(conn)
        .await?;
    trace!("📒️ Sale entry #{} written for {}/{}", saved.id, saved.order_id, saved.brand_id);
    Ok(Some(saved))
}

/// Appends a reversal. Fails with [`StorageError::Conflict`] if the pair already has one.
pub async fn insert_reversal(
    entry: &NewLedgerEntry,
    conn: &mut SqliteConnection,
) -> Result<FinancialLogEntry, StorageError> {
    let sql = format!(
        r#"
            INSERT INTO financial_logs (
                order_id,
                brand_id,
                kind,
                total,
                shipping_fee,
                vat,
                commission,
                gateway_fee,
                brand_payout,
                net_admin_profit,
                captured_amount,
                converted_amount,
                month,
                year,
                created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)
            RETURNING {LEDGER_COLUMNS}
        "#
    );
    let saved = bind_entry(sqlx::query_as::<_, FinancialLogEntry>(&sql), entry, LedgerEntryKind::Reversal)
        .fetch_one(conn)
        .await
        .map_err(|e| match StorageError::from(e) {
            StorageError::Conflict(_) => StorageError::Conflict(format!(
                "Order {} has already been reversed for brand {}",
                entry.order_id, entry.brand_id
            )),
            e => e,
        })?;
    debug!("📒️ Reversal #{} written for {}/{}", saved.id, saved.order_id, saved.brand_id);
    Ok(saved)
}

type LedgerQuery<'q> = QueryAs<'q, Sqlite, FinancialLogEntry, SqliteArguments<'q>>;

fn bind_entry<'q>(query: LedgerQuery<'q>, entry: &'q NewLedgerEntry, kind: LedgerEntryKind) -> LedgerQuery<'q> {
    query
        .bind(&entry.order_id)
        .bind(&entry.brand_id)
        .bind(kind)
        .bind(entry.total)
        .bind(entry.shipping_fee)
        .bind(entry.vat)
        .bind(entry.commission)
        .bind(entry.gateway_fee)
        .bind(entry.brand_payout)
        .bind(entry.net_admin_profit)
        .bind(entry.captured_amount)
        .bind(entry.converted_amount)
        .bind(entry.month)
        .bind(entry.year)
        .bind(entry.created_at)
}

pub async fn reversal_exists(
    order_id: &OrderId,
    brand_id: &BrandId,
    conn: &mut SqliteConnection,
) -> Result<bool, StorageError> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM financial_logs WHERE order_id = $1 AND brand_id = $2 AND kind = 'Reversal'",
    )
    .bind(order_id)
    .bind(brand_id)
    .fetch_one(conn)
    .await?;
    Ok(count > 0)
}

pub async fn fetch_entry(
    order_id: &OrderId,
    brand_id: &BrandId,
    kind: LedgerEntryKind,
    conn: &mut SqliteConnection,
) -> Result<Option<FinancialLogEntry>, StorageError> {
    let sql = format!("SELECT {LEDGER_COLUMNS} FROM financial_logs WHERE order_id = $1 AND brand_id = $2 AND kind = $3");
    let entry = sqlx::query_as::<_, FinancialLogEntry>(&sql)
        .bind(order_id)
        .bind(brand_id)
        .bind(kind)
        .fetch_optional(conn)
        .await?;
    Ok(entry)
}

pub async fn fetch_entries(
    filter: LedgerQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<FinancialLogEntry>, StorageError> {
    let mut builder = QueryBuilder::new(format!("SELECT {LEDGER_COLUMNS} FROM financial_logs "));
    if !filter.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(year) = filter.year {
        where_clause.push("year = ");
        where_clause.push_bind_unseparated(year);
    }
    if let Some(month) = filter.month {
        where_clause.push("month = ");
        where_clause.push_bind_unseparated(month);
    }
    if let Some(brand_id) = filter.brand_id {
        where_clause.push("brand_id = ");
        where_clause.push_bind_unseparated(brand_id);
    }
    if let Some(order_id) = filter.order_id {
        where_clause.push("order_id = ");
        where_clause.push_bind_unseparated(order_id);
    }
    if let Some(kind) = filter.kind {
        where_clause.push("kind = ");
        where_clause.push_bind_unseparated(kind);
    }
    builder.push(" ORDER BY year ASC, month ASC, id ASC");
    trace!("🗃️ Executing query: {}", builder.sql());
    let entries = builder.build_query_as::<FinancialLogEntry>().fetch_all(conn).await?;
    Ok(entries)
}
