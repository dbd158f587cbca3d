use thiserror::Error;

use crate::{
    db_types::{Order, OrderItem, OrderNumber},
    order_objects::{CompleteOrder, OrderQueryFilter},
};

#[derive(Debug, Clone, Error)]
pub enum OrderApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderNumber),
    #[error("User error constructing query: {0}")]
    QueryError(String),
}

impl From<sqlx::Error> for OrderApiError {
    fn from(e: sqlx::Error) -> Self {
        OrderApiError::DatabaseError(e.to_string())
    }
}

/// Read-side queries over orders. Mutations go through [`CheckoutDatabase`](crate::traits::CheckoutDatabase).
#[allow(async_fn_in_trait)]
pub trait OrderManagement {
    async fn fetch_order(&self, number: &OrderNumber) -> Result<Option<Order>, OrderApiError>;

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, OrderApiError>;

    /// The order with its items and the addresses it was placed against. Returns `None` if the order number is
    /// unknown.
    async fn fetch_complete_order(&self, number: &OrderNumber) -> Result<Option<CompleteOrder>, OrderApiError>;

    /// All orders for a customer, newest first.
    async fn orders_for_customer(&self, customer_id: i64) -> Result<Vec<Order>, OrderApiError>;

    /// Fetches orders according to the criteria in the [`OrderQueryFilter`].
    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderApiError>;
}
