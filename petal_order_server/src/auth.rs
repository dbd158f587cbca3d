//! Request identity.
//!
//! The server sits behind the storefront gateway, which authenticates shoppers and forwards the customer id in the
//! `pbw-customer-id` header. When a shared gateway key is configured, the gateway must also present it in
//! `pbw-gateway-key`, so a request that reaches the server directly cannot impersonate anyone by typing a header.
//!
//! The [`IdentityMiddleware`](crate::middleware::IdentityMiddlewareFactory) resolves the id to a full
//! [`Customer`] record and stores it on the request. Handlers receive it via the [`AuthenticatedCustomer`]
//! extractor.

use std::ops::Deref;

use actix_web::{dev::Payload, http::header::HeaderMap, FromRequest, HttpMessage, HttpRequest};
use futures::future::{err, ok, Ready};
use log::*;
use pbw_common::Secret;
use petal_order_engine::db_types::{Customer, Role};

use crate::errors::ServerError;

pub const CUSTOMER_ID_HEADER: &str = "pbw-customer-id";
pub const GATEWAY_KEY_HEADER: &str = "pbw-gateway-key";

/// Checks the gateway key, when one is configured, and reads the customer id from the request headers. This is the
/// only place the identity headers are interpreted.
pub fn verified_customer_id(headers: &HeaderMap, gateway_secret: Option<&Secret<String>>) -> Result<i64, ServerError> {
    if let Some(secret) = gateway_secret {
        let presented = headers
            .get(GATEWAY_KEY_HEADER)
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| ServerError::Unauthenticated("No gateway key was provided".to_string()))?;
        if presented != secret.reveal().as_str() {
            debug!("🔐️ A request presented an incorrect gateway key");
            return Err(ServerError::Unauthenticated("Invalid gateway key".to_string()));
        }
    }
    let id = headers
        .get(CUSTOMER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ServerError::Unauthenticated("No customer id was provided".to_string()))?;
    id.parse::<i64>().map_err(|e| ServerError::Unauthenticated(format!("'{id}' is not a valid customer id. {e}")))
}

/// The customer making the request, as resolved by the identity middleware.
#[derive(Debug, Clone)]
pub struct AuthenticatedCustomer(pub Customer);

impl AuthenticatedCustomer {
    pub fn is_admin(&self) -> bool {
        self.0.role == Role::Admin
    }

    pub fn into_inner(self) -> Customer {
        self.0
    }
}

impl Deref for AuthenticatedCustomer {
    type Target = Customer;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl FromRequest for AuthenticatedCustomer {
    type Error = ServerError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        match req.extensions().get::<Customer>().cloned() {
            Some(customer) => ok(AuthenticatedCustomer(customer)),
            None => {
                warn!("🔐️ No customer on the request. Is the identity middleware mounted on this scope?");
                err(ServerError::Unauthenticated("No customer is associated with this request".to_string()))
            },
        }
    }
}
