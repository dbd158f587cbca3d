//! # Petal Bloom order server
//! This module hosts the REST server for the Petal Bloom wholesale ordering platform. It is responsible for:
//! Verifying the identity headers injected by the storefront gateway.
//! Exposing the cart, checkout, order and address operations of the order engine to customers.
//! Exposing the order management, pricing and customer administration operations to admins.
//!
//! ## Configuration
//! The server is configured via environment variables. See [config](config/index.html) for more information.
//!
//! ## Routes
//! The server exposes the following routes:
//! * `/health`: A health check route that returns a 200 OK response.
//! * `/api/cart`, `/api/cart/items`: The calling customer's active cart.
//! * `/api/checkout`: Converts the active cart into an order.
//! * `/api/orders`, `/api/orders/{number}`, `/api/orders/{number}/tax`: Order history and tax breakdowns.
//! * `/api/orders/search`: Admin order search across all customers.
//! * `/api/orders/{number}/status`, `/api/orders/{number}/items/{item_id}/price`: Admin order lifecycle management.
//! * `/api/addresses`, `/api/addresses/{id}`, `/api/addresses/{id}/default`: The customer's address book.
//! * `/api/customers/{id}/approval`, `/api/customers/{id}/multiplier`: Admin customer administration.
//! * `/api/carts/draft`, `/api/carts/{id}/items`, `/api/carts/{id}/checkout`: Admin phone-order entry.

pub mod auth;
pub mod cli;
pub mod config;
pub mod errors;

pub mod data_objects;
pub mod middleware;
pub mod routes;
pub mod server;

#[cfg(test)]
mod endpoint_tests;
