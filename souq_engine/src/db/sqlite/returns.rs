use chrono::{DateTime, Utc};
use log::{debug, trace};
use sqlx::{types::Json, FromRow, QueryBuilder, SqliteConnection};

use crate::{
    db_types::{
        BrandId,
        BrandReturnStatus,
        Money,
        NewReturnRequest,
        OrderId,
        ReturnItem,
        ReturnRequest,
        ReturnStatus,
    },
    traits::{ReturnQueryFilter, StorageError},
};

const RETURN_COLUMNS: &str = "id, order_id, customer_id, brand_id, items, total_refund_amount, reason, brand_status, \
                              brand_reason, status, admin_note, reviewed_at, refund_reference, created_at, updated_at";

#[derive(Debug, FromRow)]
struct ReturnRequestRow {
    id: i64,
    order_id: OrderId,
    customer_id: String,
    brand_id: BrandId,
    items: Json<Vec<ReturnItem>>,
    total_refund_amount: Money,
    reason: String,
    brand_status: BrandReturnStatus,
    brand_reason: Option<String>,
    status: ReturnStatus,
    admin_note: Option<String>,
    reviewed_at: Option<DateTime<Utc>>,
    refund_reference: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ReturnRequestRow> for ReturnRequest {
    fn from(row: ReturnRequestRow) -> Self {
        Self {
            id: row.id,
            order_id: row.order_id,
            customer_id: row.customer_id,
            brand_id: row.brand_id,
            items: row.items.0,
            total_refund_amount: row.total_refund_amount,
            reason: row.reason,
            brand_status: row.brand_status,
            brand_reason: row.brand_reason,
            status: row.status,
            admin_note: row.admin_note,
            reviewed_at: row.reviewed_at,
            refund_reference: row.refund_reference,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub async fn insert_return_request(
    request: &NewReturnRequest,
    items: &[ReturnItem],
    total_refund_amount: Money,
    conn: &mut SqliteConnection,
) -> Result<ReturnRequest, StorageError> {
    let sql = format!(
        r#"
            INSERT INTO return_requests (
                order_id,
                customer_id,
                brand_id,
                items,
                total_refund_amount,
                reason,
                brand_status,
                status,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)
            RETURNING {RETURN_COLUMNS}
        "#
    );
    let row = sqlx::query_as::<_, ReturnRequestRow>(&sql)
        .bind(&request.order_id)
        .bind(&request.customer_id)
        .bind(&request.brand_id)
        .bind(Json(items.to_vec()))
        .bind(total_refund_amount)
        .bind(&request.reason)
        .bind(BrandReturnStatus::Pending)
        .bind(ReturnStatus::Pending)
        .bind(Utc::now())
        .fetch_one(conn)
        .await?;
    debug!("↩️ Return request #{} filed for order {} (brand {})", row.id, row.order_id, row.brand_id);
    Ok(row.into())
}

pub async fn fetch_return_request(id: i64, conn: &mut SqliteConnection) -> Result<Option<ReturnRequest>, StorageError> {
    let sql = format!("SELECT {RETURN_COLUMNS} FROM return_requests WHERE id = $1");
    let row = sqlx::query_as::<_, ReturnRequestRow>(&sql).bind(id).fetch_optional(conn).await?;
    Ok(row.map(ReturnRequest::from))
}

pub async fn fetch_return_requests(
    filter: ReturnQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<ReturnRequest>, StorageError> {
    let mut builder = QueryBuilder::new(format!("SELECT {RETURN_COLUMNS} FROM return_requests "));
    if !filter.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(order_id) = filter.order_id {
        where_clause.push("order_id = ");
        where_clause.push_bind_unseparated(order_id);
    }
    if let Some(customer_id) = filter.customer_id {
        where_clause.push("customer_id = ");
        where_clause.push_bind_unseparated(customer_id);
    }
    if let Some(brand_id) = filter.brand_id {
        where_clause.push("brand_id = ");
        where_clause.push_bind_unseparated(brand_id);
    }
    if let Some(brand_status) = filter.brand_status {
        where_clause.push("brand_status = ");
        where_clause.push_bind_unseparated(brand_status);
    }
    if let Some(status) = filter.status {
        where_clause.push("status = ");
        where_clause.push_bind_unseparated(status);
    }
    builder.push(" ORDER BY created_at DESC, id DESC");
    trace!("🗃️ Executing query: {}", builder.sql());
    let rows = builder.build_query_as::<ReturnRequestRow>().fetch_all(conn).await?;
    Ok(rows.into_iter().map(ReturnRequest::from).collect())
}

async fn fetch_existing(id: i64, conn: &mut SqliteConnection) -> Result<ReturnRequest, StorageError> {
    fetch_return_request(id, conn).await?.ok_or_else(|| StorageError::NotFound(format!("Return request #{id}")))
}

/// Records the brand's verdict on a request whose `brand_status` is still `Pending`.
pub async fn update_brand_status(
    id: i64,
    status: BrandReturnStatus,
    reason: Option<String>,
    conn: &mut SqliteConnection,
) -> Result<ReturnRequest, StorageError> {
    let result = sqlx::query(
        r#"
            UPDATE return_requests SET brand_status = $2, brand_reason = $3, updated_at = $4
            WHERE id = $1 AND brand_status = $5
        "#,
    )
    .bind(id)
    .bind(status)
    .bind(reason)
    .bind(Utc::now())
    .bind(BrandReturnStatus::Pending)
    .execute(&mut *conn)
    .await?;
    let request = fetch_existing(id, conn).await?;
    if result.rows_affected() == 0 {
        return Err(StorageError::Conflict(format!(
            "Return request #{id} has already been marked {} by the brand",
            request.brand_status
        )));
    }
    Ok(request)
}

/// Sets the admin status, note and review time of a request that has not been refunded.
pub async fn update_admin_status(
    id: i64,
    status: ReturnStatus,
    note: Option<String>,
    reviewed_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<ReturnRequest, StorageError> {
    let result = sqlx::query(
        r#"
            UPDATE return_requests SET status = $2, admin_note = $3, reviewed_at = $4, updated_at = $5
            WHERE id = $1 AND status <> $6
        "#,
    )
    .bind(id)
    .bind(status)
    .bind(note)
    .bind(reviewed_at)
    .bind(Utc::now())
    .bind(ReturnStatus::Refunded)
    .execute(&mut *conn)
    .await?;
    let request = fetch_existing(id, conn).await?;
    if result.rows_affected() == 0 {
        return Err(StorageError::Conflict(format!("Return request #{id} has already been refunded")));
    }
    Ok(request)
}

/// Marks the request refunded. Only one caller can win this update; the others get [`StorageError::Conflict`].
pub async fn mark_refunded(
    id: i64,
    note: Option<String>,
    reviewed_at: DateTime<Utc>,
    refund_reference: &str,
    conn: &mut SqliteConnection,
) -> Result<ReturnRequest, StorageError> {
    let result = sqlx::query(
        r#"
            UPDATE return_requests SET
                status = $2,
                admin_note = COALESCE($3, admin_note),
                reviewed_at = $4,
                refund_reference = $5,
                refund_claimed_at = NULL,
                updated_at = $6
            WHERE id = $1 AND status <> $2
        "#,
    )
    .bind(id)
    .bind(ReturnStatus::Refunded)
    .bind(note)
    .bind(reviewed_at)
    .bind(refund_reference)
    .bind(Utc::now())
    .execute(&mut *conn)
    .await?;
    if result.rows_affected() == 0 {
        fetch_existing(id, conn).await?;
        return Err(StorageError::Conflict(format!("Return request #{id} has already been refunded")));
    }
    fetch_existing(id, conn).await
}

/// Claims the request for a refund in flight. Fails to claim (returns false) if the request is already refunded, or if
/// another claim newer than `stale_before` is held.
pub async fn claim_refund(
    id: i64,
    claimed_at: DateTime<Utc>,
    stale_before: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<bool, StorageError> {
    let result = sqlx::query(
        r#"
            UPDATE return_requests SET refund_claimed_at = $2
            WHERE id = $1 AND status <> $3 AND (refund_claimed_at IS NULL OR refund_claimed_at < $4)
        "#,
    )
    .bind(id)
    .bind(claimed_at)
    .bind(ReturnStatus::Refunded)
    .bind(stale_before)
    .execute(&mut *conn)
    .await?;
    if result.rows_affected() == 0 {
        fetch_existing(id, conn).await?;
        return Ok(false);
    }
    trace!("↩️ Refund claim taken on return request #{id}");
    Ok(true)
}

pub async fn release_refund_claim(id: i64, conn: &mut SqliteConnection) -> Result<(), StorageError> {
    sqlx::query("UPDATE return_requests SET refund_claimed_at = NULL WHERE id = $1").bind(id).execute(conn).await?;
    trace!("↩️ Refund claim on return request #{id} released");
    Ok(())
}
