//! Petal Order Engine
//!
//! The Petal Order Engine is the pricing, checkout and order lifecycle core of the Petal Bloom wholesale flower
//! store. This library contains the business logic only; it is server-agnostic.
//!
//! The library is divided into two main sections:
//! 1. Database management and control ([`mod@sqlite`]). Sqlite is the supported backend. You should never need to
//!    access the database directly. Instead, use the public API provided by the engine. The exception is the data
//!    types used in the database. These are defined in the `db_types` module and are public.
//! 2. The order engine public API ([`mod@poe_api`]). This provides the public-facing functionality of the engine:
//!    carts, checkout, the order lifecycle, addresses and customer facts. Specific backends need to implement the
//!    traits in [`mod@traits`] in order to act as a backend for the Petal Order Server.
//!
//! The engine also provides a set of events that can be subscribed to. These events are emitted when certain actions
//! occur within the engine. For example, when a checkout converts a cart, an `OrderCreated` event is emitted. A
//! simple actor framework is used so that you can easily hook into these events and perform custom actions.

pub mod db_types;
pub mod events;
pub mod helpers;
mod poe_api;
pub mod traits;

#[cfg(feature = "sqlite")]
mod sqlite;

#[cfg(any(feature = "test_utils", test))]
pub mod test_utils;

#[cfg(feature = "sqlite")]
pub use sqlite::SqliteDatabase;
pub use poe_api::{
    address_api::AddressApi,
    cart_api::CartApi,
    cart_objects,
    customer_api::CustomerApi,
    order_flow_api::OrderFlowApi,
    order_objects,
    orders_api::OrderApi,
};
