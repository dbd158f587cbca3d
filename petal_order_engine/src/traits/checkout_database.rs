use thiserror::Error;

use crate::{
    db_types::{Customer, Money, OrderNumber, OrderStatusType},
    helpers::NegativePriceError,
    order_objects::{CompleteOrder, StatusChange},
    traits::{
        data_objects::ResolvedCheckout,
        AddressApiError,
        AddressManagement,
        CartApiError,
        CartManagement,
        CustomerApiError,
        CustomerManagement,
        OrderApiError,
        OrderManagement,
        SequenceError,
    },
};

/// This trait defines the highest level of behaviour for backends supporting the order engine.
///
/// This behaviour includes:
/// * Converting a cart into an order in one atomic step.
/// * The admin-side order mutations: status transitions along the order lifecycle, and finalising market prices.
///
/// Everything here is transactional. A checkout that fails half-way leaves the cart untouched; a finalised price and
/// the recomputed order total land together or not at all.
#[allow(async_fn_in_trait)]
pub trait CheckoutDatabase:
    Clone + OrderManagement + CartManagement + AddressManagement + CustomerManagement {
    /// The URL of the database
    fn url(&self) -> &str;

    /// Converts the cart into an order, in a single atomic transaction:
    ///
    /// * The cart's lines are read and priced with the customer's multiplier. Market-priced items (no catalog
    ///   price, or a zero catalog price) get a `NULL` price awaiting an admin.
    /// * The order total is computed over the resolved line prices.
    /// * The order and its items are inserted with `Pending` status.
    /// * The cart is emptied. An admin draft cart is dropped entirely once converted.
    ///
    /// An empty cart aborts with [`CheckoutError::EmptyCart`]. Because the emptying happens in the same transaction
    /// as the insert, a duplicate submission of the same cart settles as exactly one order plus an `EmptyCart`
    /// rejection, never two orders.
    async fn checkout_cart(
        &self,
        customer: &Customer,
        cart_id: i64,
        checkout: ResolvedCheckout,
    ) -> Result<CompleteOrder, CheckoutError>;

    /// Sets the final per-unit price of an order item, typically to resolve a market-priced line, and recomputes
    /// the order total in the same transaction. Returns the updated order.
    async fn finalize_item_price(
        &self,
        number: &OrderNumber,
        item_id: i64,
        price: Money,
    ) -> Result<CompleteOrder, CheckoutError>;

    /// Moves an order along its lifecycle. The transition must be one of the edges allowed by
    /// [`OrderStatusType::can_transition_to`]; anything else, including re-asserting the current status, fails with
    /// [`CheckoutError::InvalidTransition`].
    async fn update_order_status(
        &self,
        number: &OrderNumber,
        new_status: OrderStatusType,
    ) -> Result<StatusChange, CheckoutError>;

    /// Closes the database connection.
    async fn close(&mut self) -> Result<(), CheckoutError> {
        Ok(())
    }
}

#[derive(Debug, Clone, Error)]
pub enum CheckoutError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The cart is empty; there is nothing to check out")]
    EmptyCart,
    #[error("The requested cart id {0} does not exist")]
    CartNotFound(i64),
    #[error("The requested customer id {0} does not exist")]
    CustomerNotFound(i64),
    #[error("Customer {0} has not been approved for purchasing")]
    CustomerNotApproved(i64),
    #[error("The requested order {0} does not exist")]
    OrderNotFound(OrderNumber),
    #[error("Order {order} has no item with id {item_id}")]
    ItemNotFound { order: OrderNumber, item_id: i64 },
    #[error("An order numbered {0} already exists")]
    OrderNumberClash(OrderNumber),
    #[error("Cannot move an order from {from} to {to}")]
    InvalidTransition { from: OrderStatusType, to: OrderStatusType },
    #[error("Prices cannot be negative: got {0}")]
    NegativePrice(Money),
    #[error("{0}")]
    ValidationError(String),
    #[error("{0}")]
    AddressError(#[from] AddressApiError),
    #[error("{0}")]
    CartError(#[from] CartApiError),
    #[error("{0}")]
    CustomerError(#[from] CustomerApiError),
    #[error("{0}")]
    OrderError(#[from] OrderApiError),
    #[error("{0}")]
    SequenceError(#[from] SequenceError),
}

impl From<sqlx::Error> for CheckoutError {
    fn from(e: sqlx::Error) -> Self {
        CheckoutError::DatabaseError(e.to_string())
    }
}

impl From<NegativePriceError> for CheckoutError {
    fn from(e: NegativePriceError) -> Self {
        CheckoutError::NegativePrice(e.0)
    }
}
