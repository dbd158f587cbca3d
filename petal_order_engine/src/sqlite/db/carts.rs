use log::debug;
use sqlx::SqliteConnection;

use crate::{
    cart_objects::CartLine,
    db_types::{Cart, CartItem, CartOrigin, NewCartItem},
    sqlite::db::products,
    traits::CartApiError,
};

pub async fn fetch_cart(cart_id: i64, conn: &mut SqliteConnection) -> Result<Option<Cart>, CartApiError> {
    let cart = sqlx::query_as("SELECT * FROM carts WHERE id = $1").bind(cart_id).fetch_optional(conn).await?;
    Ok(cart)
}

/// The customer's single self-serve cart, created on first use. A partial unique index keeps concurrent first
/// requests from creating two carts; the loser of that race just fetches the winner's row.
pub async fn active_cart(customer_id: i64, conn: &mut SqliteConnection) -> Result<Cart, CartApiError> {
    if let Some(cart) = fetch_active_cart(customer_id, &mut *conn).await? {
        return Ok(cart);
    }
    let inserted: Option<Cart> = sqlx::query_as(
        "INSERT INTO carts (customer_id, origin) VALUES ($1, 'SelfServe') ON CONFLICT DO NOTHING RETURNING *",
    )
    .bind(customer_id)
    .fetch_optional(&mut *conn)
    .await?;
    match inserted {
        Some(cart) => {
            debug!("🗃️ Created active cart #{} for customer #{customer_id}", cart.id);
            Ok(cart)
        },
        None => fetch_active_cart(customer_id, conn)
            .await?
            .ok_or_else(|| CartApiError::DatabaseError(format!("No active cart for customer {customer_id}"))),
    }
}

async fn fetch_active_cart(customer_id: i64, conn: &mut SqliteConnection) -> Result<Option<Cart>, CartApiError> {
    let cart = sqlx::query_as("SELECT * FROM carts WHERE customer_id = $1 AND origin = 'SelfServe'")
        .bind(customer_id)
        .fetch_optional(conn)
        .await?;
    Ok(cart)
}

pub async fn create_draft_cart(customer_id: i64, conn: &mut SqliteConnection) -> Result<Cart, CartApiError> {
    let cart = sqlx::query_as("INSERT INTO carts (customer_id, origin) VALUES ($1, 'AdminDraft') RETURNING *")
        .bind(customer_id)
        .fetch_one(conn)
        .await?;
    Ok(cart)
}

/// The cart's lines joined with the live catalog. `list_price` is the variant price when the variant carries one,
/// falling back to the product price; it is raw and unscaled.
pub async fn cart_lines(cart_id: i64, conn: &mut SqliteConnection) -> Result<Vec<CartLine>, CartApiError> {
    let lines = sqlx::query_as(
        r#"
            SELECT
                ci.id AS item_id,
                ci.product_id AS product_id,
                ci.product_variant_id AS product_variant_id,
                p.name AS product_name,
                v.name AS variant_name,
                ci.quantity AS quantity,
                COALESCE(v.price, p.price) AS list_price
            FROM cart_items ci
            JOIN products p ON p.id = ci.product_id
            LEFT JOIN product_variants v ON v.id = ci.product_variant_id
            WHERE ci.cart_id = $1
            ORDER BY ci.id;
        "#,
    )
    .bind(cart_id)
    .fetch_all(conn)
    .await?;
    Ok(lines)
}

/// Adds a line to the cart, merging quantities when a line for the same product and variant already exists. The
/// product must exist, and the variant (when given) must belong to it.
pub async fn upsert_cart_item(
    cart_id: i64,
    item: NewCartItem,
    conn: &mut SqliteConnection,
) -> Result<CartItem, CartApiError> {
    if products::fetch_product(item.product_id, &mut *conn).await?.is_none() {
        return Err(CartApiError::ProductNotFound(item.product_id));
    }
    if let Some(variant_id) = item.product_variant_id {
        if products::fetch_variant(variant_id, item.product_id, &mut *conn).await?.is_none() {
            return Err(CartApiError::VariantNotFound { product_id: item.product_id, variant_id });
        }
    }
    // `IS` instead of `=` so a NULL variant id matches the existing variant-less line.
    let existing: Option<CartItem> = sqlx::query_as(
        "SELECT * FROM cart_items WHERE cart_id = $1 AND product_id = $2 AND product_variant_id IS $3",
    )
    .bind(cart_id)
    .bind(item.product_id)
    .bind(item.product_variant_id)
    .fetch_optional(&mut *conn)
    .await?;
    let line = match existing {
        Some(line) => {
            sqlx::query_as("UPDATE cart_items SET quantity = quantity + $1 WHERE id = $2 RETURNING *")
                .bind(item.quantity)
                .bind(line.id)
                .fetch_one(&mut *conn)
                .await?
        },
        None => {
            sqlx::query_as(
                "INSERT INTO cart_items (cart_id, product_id, product_variant_id, quantity) VALUES ($1, $2, $3, $4) \
                 RETURNING *",
            )
            .bind(cart_id)
            .bind(item.product_id)
            .bind(item.product_variant_id)
            .bind(item.quantity)
            .fetch_one(&mut *conn)
            .await?
        },
    };
    touch_cart(cart_id, conn).await?;
    Ok(line)
}

pub async fn remove_cart_item(cart_id: i64, item_id: i64, conn: &mut SqliteConnection) -> Result<(), CartApiError> {
    let result = sqlx::query("DELETE FROM cart_items WHERE id = $1 AND cart_id = $2")
        .bind(item_id)
        .bind(cart_id)
        .execute(&mut *conn)
        .await?;
    if result.rows_affected() == 0 {
        return Err(CartApiError::ItemNotFound(item_id));
    }
    touch_cart(cart_id, conn).await?;
    Ok(())
}

/// Empties the cart after its contents became an order. A self-serve cart stays behind as an empty scratch pad;
/// a draft cart has served its purpose and the row goes too.
pub async fn clear_cart(cart: &Cart, conn: &mut SqliteConnection) -> Result<(), CartApiError> {
    sqlx::query("DELETE FROM cart_items WHERE cart_id = $1").bind(cart.id).execute(&mut *conn).await?;
    match cart.origin {
        CartOrigin::SelfServe => touch_cart(cart.id, conn).await?,
        CartOrigin::AdminDraft => {
            sqlx::query("DELETE FROM carts WHERE id = $1").bind(cart.id).execute(conn).await?;
        },
    }
    Ok(())
}

async fn touch_cart(cart_id: i64, conn: &mut SqliteConnection) -> Result<(), CartApiError> {
    sqlx::query("UPDATE carts SET updated_at = CURRENT_TIMESTAMP WHERE id = $1").bind(cart_id).execute(conn).await?;
    Ok(())
}
