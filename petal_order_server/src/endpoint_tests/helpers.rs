use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web, web::ServiceConfig, App};
use chrono::{DateTime, TimeZone, Utc};
use log::debug;
use petal_order_engine::db_types::{
    Address,
    Customer,
    Money,
    Order,
    OrderItem,
    OrderNumber,
    OrderStatusType,
    PriceMultiplier,
    Role,
};
use petal_order_engine::order_objects::CompleteOrder;
use serde_json::Value;

use super::mocks::MockBackend;
use crate::{
    auth::CUSTOMER_ID_HEADER,
    errors::{json_error_handler, path_error_handler, query_error_handler},
    middleware::IdentityMiddlewareFactory,
};

pub fn test_timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 5, 17, 8, 30, 0).unwrap()
}

// Fixtures. Customer #1 is an approved shop, #2 is a back-office admin, #3 has signed up but has not been approved
// yet.
pub fn approved_customer() -> Customer {
    Customer {
        id: 1,
        email: "amy@bloom.example".to_string(),
        first_name: "Amy".to_string(),
        last_name: "Santiago".to_string(),
        company: Some("Brooklyn Bouquets".to_string()),
        role: Role::Customer,
        approved: true,
        price_multiplier: PriceMultiplier::default(),
        created_at: test_timestamp(),
        updated_at: test_timestamp(),
    }
}

pub fn admin_customer() -> Customer {
    Customer {
        id: 2,
        email: "ops@petalbloom.example".to_string(),
        first_name: "Rosa".to_string(),
        last_name: "Diaz".to_string(),
        company: None,
        role: Role::Admin,
        approved: true,
        price_multiplier: PriceMultiplier::default(),
        created_at: test_timestamp(),
        updated_at: test_timestamp(),
    }
}

pub fn unapproved_customer() -> Customer {
    Customer {
        id: 3,
        email: "jake@ninenineflowers.example".to_string(),
        first_name: "Jake".to_string(),
        last_name: "Peralta".to_string(),
        company: Some("Nine-Nine Flowers".to_string()),
        role: Role::Customer,
        approved: false,
        price_multiplier: PriceMultiplier::default(),
        created_at: test_timestamp(),
        updated_at: test_timestamp(),
    }
}

/// A backend for the identity middleware that resolves every customer id to the given customer.
pub fn identity_backend(customer: Customer) -> MockBackend {
    let mut backend = MockBackend::new();
    backend.expect_fetch_customer().returning(move |_| Ok(Some(customer.clone())));
    backend
}

pub fn sample_address() -> Address {
    Address {
        id: 10,
        customer_id: Some(1),
        is_default: true,
        first_name: "Amy".to_string(),
        last_name: "Santiago".to_string(),
        company: None,
        street1: "48 Meadow Lane".to_string(),
        street2: None,
        city: "Sacramento".to_string(),
        state: "CA".to_string(),
        zip: "94203".to_string(),
        country: "US".to_string(),
        created_at: test_timestamp(),
        updated_at: test_timestamp(),
    }
}

pub fn sample_order() -> Order {
    Order {
        id: 801,
        order_number: OrderNumber::from_sequence(1042),
        customer_id: 1,
        email: "amy@bloom.example".to_string(),
        phone: None,
        notes: None,
        status: OrderStatusType::Pending,
        total: Money::from_cents(9600),
        delivery_address_id: 10,
        billing_address_id: None,
        created_at: test_timestamp(),
        updated_at: test_timestamp(),
    }
}

/// Order PB-01042 in full: one priced line and one market line still awaiting its price.
pub fn sample_complete_order() -> CompleteOrder {
    let order = sample_order();
    let items = vec![
        OrderItem {
            id: 9001,
            order_id: order.id,
            product_id: 11,
            product_variant_id: None,
            product_name: "Garden Rose Bunch".to_string(),
            quantity: 2,
            price: Some(Money::from_cents(4800)),
            created_at: test_timestamp(),
        },
        OrderItem {
            id: 9002,
            order_id: order.id,
            product_id: 23,
            product_variant_id: Some(4),
            product_name: "Market Peonies".to_string(),
            quantity: 3,
            price: None,
            created_at: test_timestamp(),
        },
    ];
    CompleteOrder { order, items, delivery_address: sample_address(), billing_address: None }
}

pub async fn get_request<F>(customer_id: &str, path: &str, configure: F) -> Result<(StatusCode, String), String>
where F: FnOnce(&mut ServiceConfig) {
    send_request(TestRequest::get().uri(path), customer_id, configure).await
}

pub async fn post_request<F>(
    customer_id: &str,
    path: &str,
    body: Value,
    configure: F,
) -> Result<(StatusCode, String), String>
where
    F: FnOnce(&mut ServiceConfig),
{
    send_request(TestRequest::post().uri(path).set_json(body), customer_id, configure).await
}

pub async fn delete_request<F>(customer_id: &str, path: &str, configure: F) -> Result<(StatusCode, String), String>
where F: FnOnce(&mut ServiceConfig) {
    send_request(TestRequest::delete().uri(path), customer_id, configure).await
}

// Runs the request against an app with the identity middleware mounted and no gateway key configured, the way the
// real `/api` scope is assembled. A middleware rejection surfaces as `Err` with the error's display string; anything
// that reached a handler comes back as `Ok` with the response status and body.
async fn send_request<F>(
    mut req: TestRequest,
    customer_id: &str,
    configure: F,
) -> Result<(StatusCode, String), String>
where
    F: FnOnce(&mut ServiceConfig),
{
    if !customer_id.is_empty() {
        req = req.insert_header((CUSTOMER_ID_HEADER, customer_id));
    }
    let req = req.to_request();
    let app = App::new()
        .wrap(IdentityMiddlewareFactory::<MockBackend>::new(None))
        .app_data(web::JsonConfig::default().error_handler(json_error_handler))
        .app_data(web::PathConfig::default().error_handler(path_error_handler))
        .app_data(web::QueryConfig::default().error_handler(query_error_handler))
        .configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request");
    let (_, res) = test::try_call_service(&service, req).await.map_err(|e| e.to_string())?.into_parts();
    let status = res.status();
    let body = String::from_utf8_lossy(&res.into_body().try_into_bytes().unwrap()).into_owned();
    Ok((status, body))
}
