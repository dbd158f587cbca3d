//! # Order engine public API
//!
//! The `poe_api` module exposes the programmatic API for the order engine.
//! The API is modular, so that clients can pick and choose the functionality they need, and different parts could
//! even run against different backends.
//!
//! * [`order_flow_api`] is the primary API: it converts carts into orders and drives the order lifecycle.
//! * [`cart_api`] manages cart contents, including admin draft carts, and prices carts for display.
//! * [`address_api`] manages the address book and resolves the addresses used at checkout.
//! * [`customer_api`] manages customer facts: approval, role and price multiplier.
//! * [`orders_api`] provides read-side order queries and the tax breakdown.
//!
//! The other submodules hold the support objects these APIs exchange.
//!
//! # API usage
//!
//! The pattern for all the APIs is the same. An instance is created by supplying a database backend that implements
//! the backend traits the API requires.
//!
//! ```rust,ignore
//! use petal_order_engine::{CartApi, SqliteDatabase};
//! let db = SqliteDatabase::new_with_url("sqlite://data/petal.db", 25).await?;
//! // SqliteDatabase implements CartManagement
//! let api = CartApi::new(db);
//! let cart = api.active_cart_for(&customer).await?;
//! ```

pub mod address_api;
pub mod cart_api;
pub mod cart_objects;
pub mod customer_api;
pub mod order_flow_api;
pub mod order_objects;
pub mod orders_api;
