//! Role checks for admin routes.
//!
//! This middleware can be placed on any route or service, via the `requires` clause of the
//! [`route!`](crate::route) macro. It assumes the identity middleware has already run: it reads the customer off
//! the request extensions and compares roles. If the customer lacks a required role, a 403 Forbidden response is
//! returned.

use std::{pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    Error,
    HttpMessage,
};
use futures::{
    future::{ok, Ready},
    Future,
};
use log::*;
use petal_order_engine::db_types::{Customer, Role};

use crate::errors::ServerError;

pub struct AclMiddlewareFactory {
    required_roles: Vec<Role>,
}

impl AclMiddlewareFactory {
    pub fn new(required_roles: &[Role]) -> Self {
        AclMiddlewareFactory { required_roles: required_roles.to_vec() }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AclMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = AclMiddlewareService<S>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AclMiddlewareService { required_roles: self.required_roles.clone(), service: Rc::new(service) })
    }
}

pub struct AclMiddlewareService<S> {
    required_roles: Vec<Role>,
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for AclMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let required_roles = self.required_roles.clone();
        Box::pin(async move {
            let customer = req.extensions().get::<Customer>().cloned().ok_or_else(|| {
                warn!("🔐️ No customer found in request extensions. Is the identity middleware mounted?");
                ServerError::InitializeError("No customer found in request extensions".to_string())
            })?;
            if required_roles.iter().all(|role| customer.role == *role) {
                service.call(req).await
            } else {
                debug!("🔐️ Customer #{} may not call this endpoint", customer.id);
                Err(ServerError::InsufficientPermissions(format!(
                    "Customer #{} may not call this endpoint",
                    customer.id
                ))
                .into())
            }
        })
    }
}
