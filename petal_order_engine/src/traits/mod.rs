//! # Database backend contracts.
//!
//! This module defines the interface contracts that storage *backends* implement in order to drive the order engine.
//!
//! ## Carts and orders
//! A cart is a scratch pad of items a customer intends to buy. Checkout converts a cart into an order in a single
//! atomic step: prices are locked in, an order number is minted and the cart is emptied. From then on the order only
//! changes through the small set of admin operations (status transitions and market-price finalisation).
//!
//! ## Traits
//! * [`CheckoutDatabase`] defines the highest level of behaviour: cart-to-order conversion and the order mutations
//!   that follow it.
//! * [`CartManagement`] manages cart contents, for customers and for admin-assembled draft carts.
//! * [`AddressManagement`] owns the address book, including the unlink-rather-than-delete rule for addresses that
//!   past orders still reference.
//! * [`CustomerManagement`] stores customer facts: approval, role and the per-customer price multiplier.
//! * [`OrderManagement`] provides read-side queries over orders.
//! * [`SequenceSource`] mints order numbers. It is a separate trait so checkout does not care where numbers come
//!   from.
mod address_management;
mod cart_management;
mod checkout_database;
mod customer_management;
mod order_management;
mod sequence_source;

mod data_objects;

pub use address_management::{AddressApiError, AddressManagement};
pub use cart_management::{CartApiError, CartManagement};
pub use checkout_database::{CheckoutDatabase, CheckoutError};
pub use customer_management::{CustomerApiError, CustomerManagement};
pub use data_objects::{AddressDeleteOutcome, ResolvedCheckout};
pub use order_management::{OrderApiError, OrderManagement};
pub use sequence_source::{SequenceError, SequenceSource};
