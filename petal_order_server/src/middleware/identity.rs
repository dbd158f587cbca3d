//! Identity middleware.
//!
//! Mounted on the `/api` scope. Every request entering the scope must carry the headers the storefront gateway
//! adds. This middleware verifies them, loads the customer record from the backend, and stores it in the request
//! extensions for the [`AuthenticatedCustomer`](crate::auth::AuthenticatedCustomer) extractor and the ACL
//! middleware downstream. A request that fails any step is rejected before it reaches a handler.

use std::{marker::PhantomData, pin::Pin, rc::Rc};

use actix_web::{
    dev::{forward_ready, Service, ServiceRequest, ServiceResponse, Transform},
    web,
    Error,
    HttpMessage,
};
use futures::{
    future::{ok, Ready},
    Future,
};
use log::*;
use pbw_common::Secret;
use petal_order_engine::{traits::CustomerManagement, CustomerApi};

use crate::{auth::verified_customer_id, errors::ServerError};

pub struct IdentityMiddlewareFactory<DB> {
    gateway_secret: Option<Secret<String>>,
    _db: PhantomData<fn() -> DB>,
}

impl<DB> IdentityMiddlewareFactory<DB> {
    pub fn new(gateway_secret: Option<Secret<String>>) -> Self {
        Self { gateway_secret, _db: PhantomData }
    }
}

impl<S, B, DB> Transform<S, ServiceRequest> for IdentityMiddlewareFactory<DB>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    DB: CustomerManagement + 'static,
{
    type Error = Error;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;
    type InitError = ();
    type Response = ServiceResponse<B>;
    type Transform = IdentityMiddlewareService<S, DB>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(IdentityMiddlewareService {
            gateway_secret: self.gateway_secret.clone(),
            service: Rc::new(service),
            _db: PhantomData,
        })
    }
}

pub struct IdentityMiddlewareService<S, DB> {
    gateway_secret: Option<Secret<String>>,
    service: Rc<S>,
    _db: PhantomData<fn() -> DB>,
}

impl<S, B, DB> Service<ServiceRequest> for IdentityMiddlewareService<S, DB>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
    DB: CustomerManagement + 'static,
{
    type Error = Error;
    type Future = Pin<Box<dyn Future<Output = Result<Self::Response, Self::Error>>>>;
    type Response = ServiceResponse<B>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);
        let gateway_secret = self.gateway_secret.clone();
        Box::pin(async move {
            let customer_id = verified_customer_id(req.headers(), gateway_secret.as_ref())?;
            let api = req.app_data::<web::Data<CustomerApi<DB>>>().cloned().ok_or_else(|| {
                warn!("🔐️ No customer API is registered on the app. This is a server bug.");
                ServerError::InitializeError("The customer API is not available".to_string())
            })?;
            let customer = api.customer_by_id(customer_id).await.map_err(ServerError::from)?.ok_or_else(|| {
                debug!("🔐️ A request presented unknown customer id {customer_id}");
                ServerError::Unauthenticated(format!("Unknown customer id {customer_id}"))
            })?;
            trace!("🔐️ Request verified for customer #{customer_id} ({})", customer.role);
            req.extensions_mut().insert(customer);
            service.call(req).await
        })
    }
}
