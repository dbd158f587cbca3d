use thiserror::Error;

use crate::{
    cart_objects::CartContents,
    db_types::{Cart, CartItem, NewCartItem},
    helpers::NegativePriceError,
};

#[derive(Debug, Clone, Error)]
pub enum CartApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The requested cart id {0} does not exist")]
    CartNotFound(i64),
    #[error("The requested cart item id {0} does not exist in this cart")]
    ItemNotFound(i64),
    #[error("The requested product id {0} does not exist")]
    ProductNotFound(i64),
    #[error("Product {product_id} has no variant with id {variant_id}")]
    VariantNotFound { product_id: i64, variant_id: i64 },
    #[error("Quantity must be at least 1, got {0}")]
    InvalidQuantity(i64),
    #[error("The requested customer id {0} does not exist")]
    CustomerNotFound(i64),
    #[error("{0}")]
    NegativePrice(#[from] NegativePriceError),
}

impl From<sqlx::Error> for CartApiError {
    fn from(e: sqlx::Error) -> Self {
        CartApiError::DatabaseError(e.to_string())
    }
}

/// Storage contract for carts.
///
/// Every customer has at most one active self-serve cart, created lazily on first use. Admins can additionally open
/// any number of draft carts on a customer's behalf; drafts go through the same checkout path and are consumed by
/// it.
#[allow(async_fn_in_trait)]
pub trait CartManagement {
    /// Returns the customer's active cart, creating an empty one if they have none.
    async fn active_cart(&self, customer_id: i64) -> Result<Cart, CartApiError>;

    /// Opens a new admin draft cart for the given customer.
    async fn create_draft_cart(&self, customer_id: i64) -> Result<Cart, CartApiError>;

    async fn fetch_cart(&self, cart_id: i64) -> Result<Option<Cart>, CartApiError>;

    /// The cart together with its lines and their current catalog list prices. Prices here are raw: the caller
    /// applies the customer's multiplier.
    async fn cart_contents(&self, cart_id: i64) -> Result<CartContents, CartApiError>;

    /// Adds an item to the cart. If the cart already holds a line for the same product and variant, the quantities
    /// are merged into that line. The product must exist; the variant, when given, must belong to the product.
    async fn upsert_cart_item(&self, cart_id: i64, item: NewCartItem) -> Result<CartItem, CartApiError>;

    async fn remove_cart_item(&self, cart_id: i64, item_id: i64) -> Result<(), CartApiError>;
}
