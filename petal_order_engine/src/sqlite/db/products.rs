use sqlx::SqliteConnection;

use crate::{
    db_types::{Product, ProductVariant},
    traits::CartApiError,
};

pub async fn fetch_product(id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, CartApiError> {
    let product = sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(id).fetch_optional(conn).await?;
    Ok(product)
}

pub async fn fetch_variant(
    variant_id: i64,
    product_id: i64,
    conn: &mut SqliteConnection,
) -> Result<Option<ProductVariant>, CartApiError> {
    let variant = sqlx::query_as("SELECT * FROM product_variants WHERE id = $1 AND product_id = $2")
        .bind(variant_id)
        .bind(product_id)
        .fetch_optional(conn)
        .await?;
    Ok(variant)
}

// The catalog is written by an external service; these inserts exist so tests can stock a store.

#[cfg(any(feature = "test_utils", test))]
pub async fn insert_product(
    name: &str,
    sku: Option<&str>,
    price: Option<crate::db_types::Money>,
    conn: &mut SqliteConnection,
) -> Result<Product, sqlx::Error> {
    let product = sqlx::query_as("INSERT INTO products (name, sku, price) VALUES ($1, $2, $3) RETURNING *")
        .bind(name)
        .bind(sku)
        .bind(price)
        .fetch_one(conn)
        .await?;
    Ok(product)
}

#[cfg(any(feature = "test_utils", test))]
pub async fn insert_variant(
    product_id: i64,
    name: &str,
    price: Option<crate::db_types::Money>,
    conn: &mut SqliteConnection,
) -> Result<ProductVariant, sqlx::Error> {
    let variant =
        sqlx::query_as("INSERT INTO product_variants (product_id, name, price) VALUES ($1, $2, $3) RETURNING *")
            .bind(product_id)
            .bind(name)
            .bind(price)
            .fetch_one(conn)
            .await?;
    Ok(variant)
}
