//! The order-number counter.
//!
//! A single-row table holds the last sequence value handed out. Minting a number is one `UPDATE .. RETURNING`
//! statement, so SQLite's write lock serialises concurrent checkouts and no two callers can ever see the same value.

use log::info;
use sqlx::SqliteConnection;

use crate::{db_types::ORDER_NUMBER_PREFIX, traits::SequenceError};

pub async fn next_value(conn: &mut SqliteConnection) -> Result<i64, SequenceError> {
    let value: i64 =
        sqlx::query_scalar("UPDATE order_number_sequence SET value = value + 1 WHERE name = 'order_number' RETURNING value")
            .fetch_one(conn)
            .await?;
    Ok(value)
}

pub async fn current_value(conn: &mut SqliteConnection) -> Result<i64, SequenceError> {
    let value: i64 = sqlx::query_scalar("SELECT value FROM order_number_sequence WHERE name = 'order_number'")
        .fetch_one(conn)
        .await?;
    Ok(value)
}

/// Raises the counter to at least `floor`, never lowering it.
pub async fn raise_floor(floor: i64, conn: &mut SqliteConnection) -> Result<i64, SequenceError> {
    let value: i64 = sqlx::query_scalar(
        "UPDATE order_number_sequence SET value = MAX(value, $1) WHERE name = 'order_number' RETURNING value",
    )
    .bind(floor)
    .fetch_one(conn)
    .await?;
    Ok(value)
}

/// Aligns the counter with the order numbers already stored, so that rows imported from a legacy system can never
/// collide with freshly minted numbers. Meant to run once at startup.
pub async fn reconcile(conn: &mut SqliteConnection) -> Result<i64, SequenceError> {
    let floor: i64 = sqlx::query_scalar(
        r#"
            SELECT COALESCE(MAX(CAST(substr(order_number, length($1) + 1) AS INTEGER)), 0)
            FROM orders
            WHERE order_number LIKE $1 || '%';
        "#,
    )
    .bind(ORDER_NUMBER_PREFIX)
    .fetch_one(&mut *conn)
    .await?;
    let value = raise_floor(floor, conn).await?;
    info!("🗃️ Order number sequence reconciled; the counter sits at {value}");
    Ok(value)
}
