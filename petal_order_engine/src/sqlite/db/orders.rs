use log::trace;
use sqlx::{QueryBuilder, SqliteConnection};

use crate::{
    db_types::{Money, NewOrder, NewOrderItem, Order, OrderItem, OrderNumber, OrderStatusType},
    order_objects::OrderQueryFilter,
    traits::{CheckoutError, OrderApiError},
};

/// Inserts a new order into the database using the given connection. This is not atomic. You can embed this call
/// inside a transaction if you need to ensure atomicity, and pass `&mut *tx` as the connection argument.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, CheckoutError> {
    let number = order.order_number.clone();
    let inserted = sqlx::query_as(
        r#"
            INSERT INTO orders (
                order_number,
                customer_id,
                email,
                phone,
                notes,
                total,
                delivery_address_id,
                billing_address_id
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *;
        "#,
    )
    .bind(order.order_number)
    .bind(order.customer_id)
    .bind(order.email)
    .bind(order.phone)
    .bind(order.notes)
    .bind(order.total)
    .bind(order.delivery_address_id)
    .bind(order.billing_address_id)
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => CheckoutError::OrderNumberClash(number),
        _ => CheckoutError::from(e),
    })?;
    Ok(inserted)
}

pub async fn insert_order_items(
    order_id: i64,
    items: Vec<NewOrderItem>,
    conn: &mut SqliteConnection,
) -> Result<Vec<OrderItem>, CheckoutError> {
    let mut inserted = Vec::with_capacity(items.len());
    for item in items {
        let row = sqlx::query_as(
            r#"
                INSERT INTO order_items (order_id, product_id, product_variant_id, product_name, quantity, price)
                VALUES ($1, $2, $3, $4, $5, $6)
                RETURNING *;
            "#,
        )
        .bind(order_id)
        .bind(item.product_id)
        .bind(item.product_variant_id)
        .bind(item.product_name)
        .bind(item.quantity)
        .bind(item.price)
        .fetch_one(&mut *conn)
        .await?;
        inserted.push(row);
    }
    Ok(inserted)
}

pub async fn fetch_order_by_number(
    number: &OrderNumber,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, OrderApiError> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE order_number = $1")
        .bind(number.as_str())
        .fetch_optional(conn)
        .await?;
    Ok(order)
}

pub async fn fetch_order_items(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, OrderApiError> {
    let items = sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id")
        .bind(order_id)
        .fetch_all(conn)
        .await?;
    Ok(items)
}

pub async fn orders_for_customer(
    customer_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, OrderApiError> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE customer_id = $1 ORDER BY created_at DESC, id DESC")
        .bind(customer_id)
        .fetch_all(conn)
        .await?;
    Ok(orders)
}

/// Fetches orders according to criteria specified in the `OrderQueryFilter`
///
/// Resulting orders are ordered by `created_at` in ascending order
pub async fn search_orders(query: OrderQueryFilter, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::new(
        r#"
    SELECT * FROM orders
    "#,
    );
    if !query.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(cid) = query.customer_id {
        where_clause.push("customer_id = ");
        where_clause.push_bind_unseparated(cid);
    }
    if query.status.as_ref().map(|s| !s.is_empty()).unwrap_or(false) {
        let mut statuses = vec![];
        query.status.as_ref().unwrap().iter().for_each(|s| {
            statuses.push(format!("'{s}'"));
        });
        let status_clause = statuses.join(",");
        where_clause.push(format!("status IN ({status_clause})"));
    }
    if let Some(since) = query.since {
        where_clause.push("created_at >= ");
        where_clause.push_bind_unseparated(since);
    }
    if let Some(until) = query.until {
        where_clause.push("created_at <= ");
        where_clause.push_bind_unseparated(until);
    }
    builder.push(" ORDER BY created_at ASC");

    trace!("🗃️ Executing query: {}", builder.sql());
    let query = builder.build_query_as::<Order>();
    let orders = query.fetch_all(conn).await?;
    trace!("🗃️ Result of search_orders: {:?}", orders.len());
    Ok(orders)
}

pub async fn update_order_status(
    id: i64,
    status: OrderStatusType,
    conn: &mut SqliteConnection,
) -> Result<Order, CheckoutError> {
    let result: Option<Order> =
        sqlx::query_as("UPDATE orders SET status = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
            .bind(status)
            .bind(id)
            .fetch_optional(conn)
            .await?;
    result.ok_or_else(|| CheckoutError::DatabaseError(format!("Order id {id} vanished mid-transaction")))
}

pub async fn set_item_price(
    order_id: i64,
    item_id: i64,
    price: Money,
    conn: &mut SqliteConnection,
) -> Result<Option<OrderItem>, CheckoutError> {
    let item = sqlx::query_as("UPDATE order_items SET price = $1 WHERE id = $2 AND order_id = $3 RETURNING *")
        .bind(price)
        .bind(item_id)
        .bind(order_id)
        .fetch_optional(conn)
        .await?;
    Ok(item)
}

/// Recomputes the order total as the sum over lines with a resolved price. Lines still waiting on a market price
/// contribute nothing.
pub async fn recompute_total(order_id: i64, conn: &mut SqliteConnection) -> Result<Order, CheckoutError> {
    let order: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders
            SET total = (
                    SELECT COALESCE(SUM(price * quantity), 0)
                    FROM order_items
                    WHERE order_id = $1 AND price IS NOT NULL
                ),
                updated_at = CURRENT_TIMESTAMP
            WHERE id = $1
            RETURNING *;
        "#,
    )
    .bind(order_id)
    .fetch_optional(conn)
    .await?;
    order.ok_or_else(|| CheckoutError::DatabaseError(format!("Order id {order_id} vanished mid-transaction")))
}
