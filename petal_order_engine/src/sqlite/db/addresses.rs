use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Address, NewAddress},
    traits::AddressApiError,
};

pub async fn insert_address(
    customer_id: Option<i64>,
    address: NewAddress,
    is_default: bool,
    conn: &mut SqliteConnection,
) -> Result<Address, AddressApiError> {
    let inserted = sqlx::query_as(
        r#"
            INSERT INTO addresses (
                customer_id,
                is_default,
                first_name,
                last_name,
                company,
                street1,
                street2,
                city,
                state,
                zip,
                country
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11)
            RETURNING *;
        "#,
    )
    .bind(customer_id)
    .bind(is_default)
    .bind(address.first_name)
    .bind(address.last_name)
    .bind(address.company)
    .bind(address.street1)
    .bind(address.street2)
    .bind(address.city)
    .bind(address.state)
    .bind(address.zip)
    .bind(address.country)
    .fetch_one(conn)
    .await?;
    Ok(inserted)
}

pub async fn fetch_address(address_id: i64, conn: &mut SqliteConnection) -> Result<Option<Address>, AddressApiError> {
    let address =
        sqlx::query_as("SELECT * FROM addresses WHERE id = $1").bind(address_id).fetch_optional(conn).await?;
    Ok(address)
}

/// Fetches an address only if it currently sits in the given customer's address book.
pub async fn fetch_customer_address(
    address_id: i64,
    customer_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<Address>, AddressApiError> {
    let address = sqlx::query_as("SELECT * FROM addresses WHERE id = $1 AND customer_id = $2")
        .bind(address_id)
        .bind(customer_id)
        .fetch_optional(conn)
        .await?;
    Ok(address)
}

pub async fn addresses_for_customer(
    customer_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Vec<Address>, AddressApiError> {
    let addresses =
        sqlx::query_as("SELECT * FROM addresses WHERE customer_id = $1 ORDER BY is_default DESC, updated_at DESC")
            .bind(customer_id)
            .fetch_all(conn)
            .await?;
    Ok(addresses)
}

pub async fn count_addresses(customer_id: i64, conn: &mut SqliteConnection) -> Result<i64, AddressApiError> {
    let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM addresses WHERE customer_id = $1")
        .bind(customer_id)
        .fetch_one(conn)
        .await?;
    Ok(count)
}

/// The number of orders whose delivery or billing address is the given row. Any reference at all pins the row in
/// place for the lifetime of the order history.
pub async fn order_reference_count(address_id: i64, conn: &mut SqliteConnection) -> Result<i64, AddressApiError> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE delivery_address_id = $1 OR billing_address_id = $1")
            .bind(address_id)
            .fetch_one(conn)
            .await?;
    Ok(count)
}

pub async fn clear_default(customer_id: i64, conn: &mut SqliteConnection) -> Result<(), AddressApiError> {
    sqlx::query("UPDATE addresses SET is_default = 0, updated_at = CURRENT_TIMESTAMP WHERE customer_id = $1 AND is_default = 1")
        .bind(customer_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Flags the row as its customer's default. The caller must have cleared the previous default first; the two steps
/// belong in one transaction.
pub async fn mark_default(address_id: i64, conn: &mut SqliteConnection) -> Result<Option<Address>, AddressApiError> {
    let address =
        sqlx::query_as("UPDATE addresses SET is_default = 1, updated_at = CURRENT_TIMESTAMP WHERE id = $1 RETURNING *")
            .bind(address_id)
            .fetch_optional(conn)
            .await?;
    Ok(address)
}

/// Detaches the row from its customer without deleting it, so that orders referencing it keep rendering. The
/// default flag is cleared as well; a detached address can't be anyone's default.
pub async fn unlink_address(address_id: i64, conn: &mut SqliteConnection) -> Result<(), AddressApiError> {
    sqlx::query(
        "UPDATE addresses SET customer_id = NULL, is_default = 0, updated_at = CURRENT_TIMESTAMP WHERE id = $1",
    )
    .bind(address_id)
    .execute(conn)
    .await?;
    debug!("🗃️ Address #{address_id} unlinked from its customer");
    Ok(())
}

pub async fn delete_address_row(address_id: i64, conn: &mut SqliteConnection) -> Result<(), AddressApiError> {
    sqlx::query("DELETE FROM addresses WHERE id = $1").bind(address_id).execute(conn).await?;
    Ok(())
}
