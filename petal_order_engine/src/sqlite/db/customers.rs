use log::debug;
use sqlx::SqliteConnection;

use crate::{
    db_types::{Customer, NewCustomer, PriceMultiplier, Role},
    traits::CustomerApiError,
};

pub async fn fetch_customer(id: i64, conn: &mut SqliteConnection) -> Result<Option<Customer>, CustomerApiError> {
    let customer = sqlx::query_as("SELECT * FROM customers WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(customer)
}

pub async fn fetch_customer_by_email(
    email: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Customer>, CustomerApiError> {
    let customer =
        sqlx::query_as("SELECT * FROM customers WHERE email = $1").bind(email).fetch_optional(conn).await?;
    Ok(customer)
}

/// Inserts a new customer record. New customers start unapproved, with the `Customer` role and the identity
/// multiplier; admins adjust those facts afterwards.
pub async fn insert_customer(
    customer: NewCustomer,
    conn: &mut SqliteConnection,
) -> Result<Customer, CustomerApiError> {
    let inserted = sqlx::query_as(
        r#"
            INSERT INTO customers (email, first_name, last_name, company)
            VALUES ($1, $2, $3, $4)
            RETURNING *;
        "#,
    )
    .bind(customer.email.clone())
    .bind(customer.first_name)
    .bind(customer.last_name)
    .bind(customer.company)
    .fetch_one(conn)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(err) if err.is_unique_violation() => {
            CustomerApiError::CustomerAlreadyExists(customer.email)
        },
        _ => CustomerApiError::from(e),
    })?;
    Ok(inserted)
}

pub async fn set_approved(
    id: i64,
    approved: bool,
    conn: &mut SqliteConnection,
) -> Result<Customer, CustomerApiError> {
    let customer: Option<Customer> = sqlx::query_as(
        "UPDATE customers SET approved = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(approved)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    debug!("🗃️ Customer #{id} approval set to {approved}");
    customer.ok_or(CustomerApiError::CustomerNotFound(id))
}

pub async fn set_price_multiplier(
    id: i64,
    multiplier: PriceMultiplier,
    conn: &mut SqliteConnection,
) -> Result<Customer, CustomerApiError> {
    let customer: Option<Customer> = sqlx::query_as(
        "UPDATE customers SET price_multiplier = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *",
    )
    .bind(multiplier)
    .bind(id)
    .fetch_optional(conn)
    .await?;
    customer.ok_or(CustomerApiError::CustomerNotFound(id))
}

pub async fn set_role(id: i64, role: Role, conn: &mut SqliteConnection) -> Result<Customer, CustomerApiError> {
    let customer: Option<Customer> =
        sqlx::query_as("UPDATE customers SET role = $1, updated_at = CURRENT_TIMESTAMP WHERE id = $2 RETURNING *")
            .bind(role)
            .bind(id)
            .fetch_optional(conn)
            .await?;
    customer.ok_or(CustomerApiError::CustomerNotFound(id))
}
