use chrono::{NaiveDate, Utc};
use log::{debug, trace};
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{CartItem, Money, NewOrder, Order, OrderId, OrderStatusType},
    traits::{OrderQueryFilter, StorageError},
};

const ORDER_COLUMNS: &str = "id, customer_id, total, shipping_fee, payment_method, gateway_order_id, transaction_id, \
                             paid, order_status, brand_payout, net_admin_profit, delivery_date, created_at, updated_at";

/// Inserts a new order and its cart lines using the given connection. This is not atomic. Embed this call inside a
/// transaction and pass `&mut *tx` as the connection argument.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, StorageError> {
    let now = Utc::now();
    let created_at = order.created_at.unwrap_or(now);
    sqlx::query(
        r#"
            INSERT INTO orders (
                id,
                customer_id,
                total,
                shipping_fee,
                payment_method,
                gateway_order_id,
                transaction_id,
                paid,
                order_status,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
        "#,
    )
    .bind(&order.id)
    .bind(&order.customer_id)
    .bind(order.total)
    .bind(order.shipping_fee)
    .bind(order.payment_method)
    .bind(&order.gateway_order_id)
    .bind(&order.transaction_id)
    .bind(order.paid)
    .bind(OrderStatusType::Pending)
    .bind(created_at)
    .bind(now)
    .execute(&mut *conn)
    .await?;
    for (line_no, item) in order.cart_items.iter().enumerate() {
        insert_item(&order.id, line_no, item, conn).await?;
    }
    debug!("🗃️ Order {} saved with {} lines", order.id, order.cart_items.len());
    fetch_order(&order.id, conn)
        .await?
        .ok_or_else(|| StorageError::NotFound(format!("Order {} vanished after insert", order.id)))
}

async fn insert_item(
    order_id: &OrderId,
    line_no: usize,
    item: &CartItem,
    conn: &mut SqliteConnection,
) -> Result<(), StorageError> {
    #[allow(clippy::cast_possible_wrap)]
    let line_no = line_no as i64;
    sqlx::query(
        r#"
            INSERT INTO order_items (
                order_id,
                line_no,
                product_id,
                brand_id,
                quantity,
                unit_price,
                total_price,
                commission_amount,
                tax_amount
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
        "#,
    )
    .bind(order_id)
    .bind(line_no)
    .bind(&item.product_id)
    .bind(&item.brand_id)
    .bind(item.quantity)
    .bind(item.unit_price)
    .bind(item.total_price)
    .bind(item.commission_amount)
    .bind(item.tax_amount)
    .execute(conn)
    .await?;
    Ok(())
}

async fn fetch_items(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Vec<CartItem>, StorageError> {
    let items = sqlx::query_as::<_, CartItem>(
        r#"
            SELECT product_id, brand_id, quantity, unit_price, total_price, commission_amount, tax_amount
            FROM order_items
            WHERE order_id = $1
            ORDER BY line_no ASC
        "#,
    )
    .bind(order_id)
    .fetch_all(conn)
    .await?;
    Ok(items)
}

pub async fn fetch_order(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<Option<Order>, StorageError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE id = $1");
    let order = sqlx::query_as::<_, Order>(&sql).bind(order_id).fetch_optional(&mut *conn).await?;
    match order {
        Some(mut order) => {
            order.cart_items = fetch_items(&order.id, conn).await?;
            Ok(Some(order))
        },
        None => Ok(None),
    }
}

pub async fn fetch_order_by_gateway_id(
    gateway_order_id: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, StorageError> {
    let sql = format!("SELECT {ORDER_COLUMNS} FROM orders WHERE gateway_order_id = $1 LIMIT 1");
    let order = sqlx::query_as::<_, Order>(&sql).bind(gateway_order_id).fetch_optional(&mut *conn).await?;
    match order {
        Some(mut order) => {
            order.cart_items = fetch_items(&order.id, conn).await?;
            Ok(Some(order))
        },
        None => Ok(None),
    }
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`
///
/// Resulting orders are ordered by `created_at` in ascending order
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, StorageError> {
    let mut builder = QueryBuilder::new(format!("SELECT {ORDER_COLUMNS} FROM orders "));
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(customer_id) = query.customer_id {
        where_clause.push("customer_id = ");
        where_clause.push_bind_unseparated(customer_id);
    }
    if let Some(paid) = query.paid {
        where_clause.push("paid = ");
        where_clause.push_bind_unseparated(paid);
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("created_at < ");
        where_clause.push_bind_unseparated(until);
    }
    if !query.statuses.is_empty() {
        let statuses = query.statuses.iter().map(|s| format!("'{s}'")).collect::<Vec<String>>().join(",");
        where_clause.push(format!("order_status IN ({statuses})"));
    }
    builder.push(" ORDER BY created_at ASC, id ASC");
    trace!("🗃️ Executing query: {}", builder.sql());
    let mut orders = builder.build_query_as::<Order>().fetch_all(&mut *conn).await?;
    for order in &mut orders {
        order.cart_items = fetch_items(&order.id, conn).await?;
    }
    trace!("🗃️ Result of search_orders: {}", orders.len());
    Ok(orders)
}

fn ensure_updated(rows: u64, order_id: &OrderId) -> Result<(), StorageError> {
    if rows == 0 {
        Err(StorageError::NotFound(format!("Order {order_id}")))
    } else {
        Ok(())
    }
}

pub async fn mark_order_paid(
    order_id: &OrderId,
    transaction_id: Option<&str>,
    conn: &mut SqliteConnection,
) -> Result<(), StorageError> {
    let result = sqlx::query(
        "UPDATE orders SET paid = TRUE, transaction_id = COALESCE($2, transaction_id), updated_at = $3 WHERE id = $1",
    )
    .bind(order_id)
    .bind(transaction_id)
    .bind(Utc::now())
    .execute(conn)
    .await?;
    ensure_updated(result.rows_affected(), order_id)
}

pub async fn attach_gateway_order(
    order_id: &OrderId,
    gateway_order_id: &str,
    conn: &mut SqliteConnection,
) -> Result<(), StorageError> {
    let result = sqlx::query("UPDATE orders SET gateway_order_id = $2, updated_at = $3 WHERE id = $1")
        .bind(order_id)
        .bind(gateway_order_id)
        .bind(Utc::now())
        .execute(conn)
        .await?;
    ensure_updated(result.rows_affected(), order_id)
}

pub async fn update_order_status(
    order_id: &OrderId,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<(), StorageError> {
    let result = sqlx::query("UPDATE orders SET order_status = $2, updated_at = $3 WHERE id = $1")
        .bind(order_id)
        .bind(status)
        .bind(Utc::now())
        .execute(conn)
        .await?;
    ensure_updated(result.rows_affected(), order_id)
}

pub async fn set_delivery_date(
    order_id: &OrderId,
    date: NaiveDate,
    conn: &mut SqliteConnection,
) -> Result<(), StorageError> {
    let result = sqlx::query("UPDATE orders SET delivery_date = $2, updated_at = $3 WHERE id = $1")
        .bind(order_id)
        .bind(date)
        .bind(Utc::now())
        .execute(conn)
        .await?;
    ensure_updated(result.rows_affected(), order_id)
}

/// Sets the cached summary to the totals of the order's sale entries, unless the order has been (partially) refunded.
pub async fn refresh_cached_totals(order_id: &OrderId, conn: &mut SqliteConnection) -> Result<(), StorageError> {
    sqlx::query(
        r#"
            UPDATE orders SET
                brand_payout = (
                    SELECT COALESCE(SUM(brand_payout), 0) FROM financial_logs WHERE order_id = $1 AND kind = 'Sale'
                ),
                net_admin_profit = (
                    SELECT COALESCE(SUM(net_admin_profit), 0) FROM financial_logs WHERE order_id = $1 AND kind = 'Sale'
                ),
                updated_at = $2
            WHERE id = $1
              AND NOT EXISTS (SELECT 1 FROM financial_logs WHERE order_id = $1 AND kind = 'Reversal')
        "#,
    )
    .bind(order_id)
    .bind(Utc::now())
    .execute(conn)
    .await?;
    Ok(())
}

/// Deducts the reversed figures from the cached summary, flooring at zero, and marks the order refunded.
pub async fn apply_refund(
    order_id: &OrderId,
    reversed_payout: Money,
    reversed_profit: Money,
    conn: &mut SqliteConnection,
) -> Result<(), StorageError> {
    let result = sqlx::query(
        r#"
            UPDATE orders SET
                brand_payout = MAX(0, brand_payout - $2),
                net_admin_profit = MAX(0, net_admin_profit - $3),
                order_status = $4,
                updated_at = $5
            WHERE id = $1
        "#,
    )
    .bind(order_id)
    .bind(reversed_payout)
    .bind(reversed_profit)
    .bind(OrderStatusType::Refunded)
    .bind(Utc::now())
    .execute(conn)
    .await?;
    ensure_updated(result.rows_affected(), order_id)
}
