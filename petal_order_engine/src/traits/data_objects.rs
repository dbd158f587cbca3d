use serde::{Deserialize, Serialize};

use crate::db_types::OrderNumber;

/// A checkout instruction with every reference already resolved: addresses exist and belong to the right customer,
/// and an order number has been drawn. Built by the order flow API; consumed atomically by
/// [`CheckoutDatabase::checkout_cart`](crate::traits::CheckoutDatabase::checkout_cart).
#[derive(Debug, Clone)]
pub struct ResolvedCheckout {
    pub order_number: OrderNumber,
    pub email: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub delivery_address_id: i64,
    pub billing_address_id: Option<i64>,
}

/// What physically happened when a customer removed an address from their address book.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum AddressDeleteOutcome {
    /// One or more orders reference the address, so the row was kept and merely unlinked from the customer.
    Unlinked,
    /// Nothing references the address and the row was removed. If the deleted address was the customer's default,
    /// `promoted_default` carries the id of the address promoted in its place.
    Deleted { promoted_default: Option<i64> },
}
