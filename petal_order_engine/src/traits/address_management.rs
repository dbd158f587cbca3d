use thiserror::Error;

use crate::{
    db_types::{Address, NewAddress},
    traits::AddressDeleteOutcome,
};

#[derive(Debug, Clone, Error)]
pub enum AddressApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    /// Deliberately covers both "no such address" and "someone else's address", so that probing for other
    /// customers' address ids reveals nothing.
    #[error("The address does not exist or does not belong to this customer")]
    InvalidAddress,
    #[error("Address validation failed: missing {}", .0.join(", "))]
    MissingFields(Vec<&'static str>),
}

impl From<sqlx::Error> for AddressApiError {
    fn from(e: sqlx::Error) -> Self {
        AddressApiError::DatabaseError(e.to_string())
    }
}

/// Storage contract for the address book.
///
/// Addresses are never edited in place and never hard-deleted while an order references them: removing an address
/// that appears on a past order unlinks it from the customer instead, so order history keeps rendering correctly.
#[allow(async_fn_in_trait)]
pub trait AddressManagement {
    /// Stores a new address for the given customer. When `is_default` is set, the customer's previous default is
    /// cleared in the same transaction; a customer's first address becomes the default regardless.
    async fn insert_address(
        &self,
        customer_id: i64,
        address: NewAddress,
        is_default: bool,
    ) -> Result<Address, AddressApiError>;

    /// Stores an address that belongs to no customer's address book, such as a one-off billing address captured
    /// during checkout.
    async fn insert_unowned_address(&self, address: NewAddress) -> Result<Address, AddressApiError>;

    async fn fetch_address(&self, address_id: i64) -> Result<Option<Address>, AddressApiError>;

    /// The customer's address book, default address first.
    async fn addresses_for_customer(&self, customer_id: i64) -> Result<Vec<Address>, AddressApiError>;

    /// Removes an address from the customer's address book. The row is only physically deleted when no order
    /// references it; otherwise it is kept and unlinked. When the deleted address was the default and exactly one
    /// address remains in the book, that survivor is promoted to default.
    async fn delete_address(&self, address_id: i64, customer_id: i64) -> Result<AddressDeleteOutcome, AddressApiError>;

    /// Marks the given address as the customer's default, clearing the flag on every other address they own.
    async fn set_default_address(&self, address_id: i64, customer_id: i64) -> Result<Address, AddressApiError>;
}
