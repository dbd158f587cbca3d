use actix_web::{http::StatusCode, web, web::ServiceConfig};
use petal_order_engine::{traits::CustomerApiError, CustomerApi};
use serde_json::{json, Value};

use super::{
    helpers::{admin_customer, approved_customer, identity_backend, post_request, unapproved_customer},
    mocks::MockBackend,
};
use crate::routes::{SetCustomerApprovalRoute, SetCustomerMultiplierRoute};

// The identity middleware and these handlers share the one registered `CustomerApi`, exactly as on the real
// server, so the mock carries the identity expectation alongside the lever under test.

#[actix_web::test]
async fn approving_a_customer() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut backend = MockBackend::new();
        backend.expect_fetch_customer().returning(|_| Ok(Some(admin_customer())));
        backend
            .expect_set_approved()
            .withf(|customer_id, approved| *customer_id == 3 && *approved)
            .returning(|_, approved| {
                let mut customer = unapproved_customer();
                customer.approved = approved;
                Ok(customer)
            });
        cfg.service(SetCustomerApprovalRoute::<MockBackend>::new())
            .app_data(web::Data::new(CustomerApi::new(backend)));
    };
    let body = json!({"approved": true});
    let (status, body) = post_request("2", "/customers/3/approval", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let customer: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(customer["id"], 3);
    assert_eq!(customer["approved"], true);
    assert_eq!(customer["role"], "customer");
}

#[actix_web::test]
async fn approval_is_an_admin_lever() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        cfg.service(SetCustomerApprovalRoute::<MockBackend>::new())
            .app_data(web::Data::new(CustomerApi::new(identity_backend(approved_customer()))));
    };
    let body = json!({"approved": true});
    let err = post_request("1", "/customers/3/approval", body, configure).await.expect_err("Expected error");
    assert_eq!(err, "Insufficient permissions. Customer #1 may not call this endpoint");
}

#[actix_web::test]
async fn setting_a_customer_multiplier() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut backend = MockBackend::new();
        backend.expect_fetch_customer().returning(|_| Ok(Some(admin_customer())));
        backend
            .expect_set_price_multiplier()
            .withf(|customer_id, multiplier| *customer_id == 1 && multiplier.basis_points() == 15_000)
            .returning(|_, multiplier| {
                let mut customer = approved_customer();
                customer.price_multiplier = multiplier;
                Ok(customer)
            });
        cfg.service(SetCustomerMultiplierRoute::<MockBackend>::new())
            .app_data(web::Data::new(CustomerApi::new(backend)));
    };
    let body = json!({"multiplier": 1.5});
    let (status, body) = post_request("2", "/customers/1/multiplier", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let customer: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(customer["priceMultiplier"], "1.5");
}

/// Out-of-range multipliers fail at deserialisation, before any handler runs.
#[actix_web::test]
async fn multipliers_outside_the_range_never_reach_the_engine() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        cfg.service(SetCustomerMultiplierRoute::<MockBackend>::new())
            .app_data(web::Data::new(CustomerApi::new(identity_backend(admin_customer()))));
    };
    let body = json!({"multiplier": 50});
    let (status, body) = post_request("2", "/customers/1/multiplier", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let envelope: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(envelope["code"], "VALIDATION_ERROR");
}

#[actix_web::test]
async fn unknown_customers_are_not_found() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut backend = MockBackend::new();
        backend.expect_fetch_customer().returning(|_| Ok(Some(admin_customer())));
        backend.expect_set_approved().returning(|customer_id, _| Err(CustomerApiError::CustomerNotFound(customer_id)));
        cfg.service(SetCustomerApprovalRoute::<MockBackend>::new())
            .app_data(web::Data::new(CustomerApi::new(backend)));
    };
    let body = json!({"approved": true});
    let (status, body) = post_request("2", "/customers/99/approval", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    let envelope: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(envelope["code"], "NOT_FOUND");
    assert_eq!(envelope["error"], "The data was not found. The requested customer id 99 does not exist");
}
