use actix_web::{http::StatusCode, web, web::ServiceConfig};
use chrono::{TimeZone, Utc};
use petal_order_engine::{
    db_types::{Money, Order, OrderNumber, OrderStatusType},
    events::EventProducers,
    order_objects::StatusChange,
    traits::CheckoutError,
    CustomerApi,
    OrderApi,
    OrderFlowApi,
};
use serde_json::{json, Value};

use super::{
    helpers::{
        admin_customer,
        approved_customer,
        get_request,
        identity_backend,
        post_request,
        sample_complete_order,
        sample_order,
        unapproved_customer,
    },
    mocks::MockBackend,
};
use crate::routes::{
    MyOrdersRoute,
    OrderByNumberRoute,
    OrderTaxRoute,
    OrdersSearchRoute,
    UpdateItemPriceRoute,
    UpdateOrderStatusRoute,
};

#[actix_web::test]
async fn fetch_my_orders_no_headers() {
    let _ = env_logger::try_init().ok();
    let err = get_request("", "/orders", configure).await.expect_err("Expected error");
    assert_eq!(err, "Authentication failed. No customer id was provided");
}

#[actix_web::test]
async fn fetch_my_orders() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("1", "/orders", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ORDERS_JSON);
}

#[actix_web::test]
async fn fetch_an_order_i_own() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("1", "/orders/PB-01042", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let order: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(order["orderNumber"], "PB-01042");
    assert_eq!(order["total"], "96.00");
    assert_eq!(order["items"].as_array().unwrap().len(), 2);
    assert_eq!(order["shippingAddress"]["id"], 10);
    // No billing address was captured, so the field is absent entirely.
    assert!(order.get("billingAddress").is_none());
}

/// Order numbers are sequential, so a who-owns-what probe must be indistinguishable from a miss.
#[actix_web::test]
async fn a_strangers_order_reads_as_not_found() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut backend = MockBackend::new();
        backend.expect_fetch_complete_order().returning(|_| Ok(Some(sample_complete_order())));
        cfg.service(OrderByNumberRoute::<MockBackend>::new())
            .app_data(web::Data::new(OrderApi::new(backend)))
            .app_data(web::Data::new(CustomerApi::new(identity_backend(unapproved_customer()))));
    };
    let (status, body) = get_request("3", "/orders/PB-01042", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    let envelope: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(envelope["code"], "NOT_FOUND");
    assert_eq!(envelope["error"], "The data was not found. Order PB-01042 does not exist");
}

#[actix_web::test]
async fn admins_can_read_any_order() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut backend = MockBackend::new();
        backend.expect_fetch_complete_order().returning(|_| Ok(Some(sample_complete_order())));
        cfg.service(OrderByNumberRoute::<MockBackend>::new())
            .app_data(web::Data::new(OrderApi::new(backend)))
            .app_data(web::Data::new(CustomerApi::new(identity_backend(admin_customer()))));
    };
    let (status, body) = get_request("2", "/orders/PB-01042", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let order: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(order["customerId"], 1);
}

#[actix_web::test]
async fn unknown_orders_are_not_found() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut backend = MockBackend::new();
        backend.expect_fetch_complete_order().returning(|_| Ok(None));
        cfg.service(OrderByNumberRoute::<MockBackend>::new())
            .app_data(web::Data::new(OrderApi::new(backend)))
            .app_data(web::Data::new(CustomerApi::new(identity_backend(approved_customer()))));
    };
    let (status, body) = get_request("1", "/orders/PB-99999", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
    let envelope: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(envelope["code"], "NOT_FOUND");
}

#[actix_web::test]
async fn search_orders_with_filters() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut backend = MockBackend::new();
        backend
            .expect_search_orders()
            .withf(|query| query.customer_id == Some(1) && query.since.is_some())
            .returning(|_| Ok(vec![sample_order()]));
        cfg.service(OrdersSearchRoute::<MockBackend>::new())
            .app_data(web::Data::new(OrderApi::new(backend)))
            .app_data(web::Data::new(CustomerApi::new(identity_backend(admin_customer()))));
    };
    let (status, body) = get_request("2", "/orders/search?customer_id=1&since=2024-05-01T00:00:00Z", configure)
        .await
        .expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let orders: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(orders.as_array().unwrap().len(), 1);
    assert_eq!(orders[0]["orderNumber"], "PB-01042");
}

#[actix_web::test]
async fn search_is_an_admin_tool() {
    let _ = env_logger::try_init().ok();
    let err = get_request("1", "/orders/search?customer_id=3", configure).await.expect_err("Expected error");
    assert_eq!(err, "Insufficient permissions. Customer #1 may not call this endpoint");
}

#[actix_web::test]
async fn tax_follows_the_order() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("1", "/orders/PB-01042/tax", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    // 7.25% of the 96.00 resolved subtotal
    assert_eq!(body, r#"{"tax":"6.96","isCalifornia":true,"taxLabel":"CA 7.25%"}"#);
}

#[actix_web::test]
async fn tax_is_invisible_for_strangers() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut backend = MockBackend::new();
        backend.expect_fetch_complete_order().returning(|_| Ok(Some(sample_complete_order())));
        cfg.service(OrderTaxRoute::<MockBackend>::new())
            .app_data(web::Data::new(OrderApi::new(backend)))
            .app_data(web::Data::new(CustomerApi::new(identity_backend(unapproved_customer()))));
    };
    let (status, _) = get_request("3", "/orders/PB-01042/tax", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn status_moves_along_the_lifecycle() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend
        .expect_update_order_status()
        .withf(|number, status| number.as_str() == "PB-01042" && *status == OrderStatusType::Confirmed)
        .returning(|_, status| {
            let mut order = sample_order();
            order.status = status;
            Ok(StatusChange::new(OrderStatusType::Pending, order))
        });
    let flow_api = OrderFlowApi::new(backend, MockBackend::new(), EventProducers::default());
    let configure = move |cfg: &mut ServiceConfig| {
        cfg.service(UpdateOrderStatusRoute::<MockBackend, MockBackend>::new())
            .app_data(web::Data::new(flow_api))
            .app_data(web::Data::new(CustomerApi::new(identity_backend(admin_customer()))));
    };
    let body = json!({"status": "CONFIRMED"});
    let (status, body) = post_request("2", "/orders/PB-01042/status", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let change: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(change["oldStatus"], "PENDING");
    assert_eq!(change["order"]["status"], "CONFIRMED");
}

#[actix_web::test]
async fn status_updates_are_an_admin_tool() {
    let _ = env_logger::try_init().ok();
    let flow_api =
        OrderFlowApi::<MockBackend, MockBackend>::new(MockBackend::new(), MockBackend::new(), EventProducers::default());
    let configure = move |cfg: &mut ServiceConfig| {
        cfg.service(UpdateOrderStatusRoute::<MockBackend, MockBackend>::new())
            .app_data(web::Data::new(flow_api))
            .app_data(web::Data::new(CustomerApi::new(identity_backend(approved_customer()))));
    };
    let body = json!({"status": "CONFIRMED"});
    let err = post_request("1", "/orders/PB-01042/status", body, configure).await.expect_err("Expected error");
    assert_eq!(err, "Insufficient permissions. Customer #1 may not call this endpoint");
}

#[actix_web::test]
async fn illegal_transitions_conflict() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend.expect_update_order_status().returning(|_, _| {
        Err(CheckoutError::InvalidTransition { from: OrderStatusType::Delivered, to: OrderStatusType::Pending })
    });
    let flow_api = OrderFlowApi::new(backend, MockBackend::new(), EventProducers::default());
    let configure = move |cfg: &mut ServiceConfig| {
        cfg.service(UpdateOrderStatusRoute::<MockBackend, MockBackend>::new())
            .app_data(web::Data::new(flow_api))
            .app_data(web::Data::new(CustomerApi::new(identity_backend(admin_customer()))));
    };
    let body = json!({"status": "PENDING"});
    let (status, body) = post_request("2", "/orders/PB-01042/status", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::CONFLICT);
    let envelope: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(envelope["code"], "CONFLICT");
    assert_eq!(envelope["error"], "Conflict with the current state. Cannot move an order from Delivered to Pending");
}

#[actix_web::test]
async fn finalizing_a_market_price_recomputes_the_total() {
    let _ = env_logger::try_init().ok();
    let mut backend = MockBackend::new();
    backend
        .expect_finalize_item_price()
        .withf(|number, item_id, price| {
            number.as_str() == "PB-01042" && *item_id == 9002 && *price == Money::from_cents(2150)
        })
        .returning(|_, _, price| {
            let mut order = sample_complete_order();
            order.items[1].price = Some(price);
            order.order.total = Money::from_cents(9600) + price * 3;
            Ok(order)
        });
    let flow_api = OrderFlowApi::new(backend, MockBackend::new(), EventProducers::default());
    let configure = move |cfg: &mut ServiceConfig| {
        cfg.service(UpdateItemPriceRoute::<MockBackend, MockBackend>::new())
            .app_data(web::Data::new(flow_api))
            .app_data(web::Data::new(CustomerApi::new(identity_backend(admin_customer()))));
    };
    let body = json!({"price": "21.50"});
    let (status, body) =
        post_request("2", "/orders/PB-01042/items/9002/price", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let result: Value = serde_json::from_str(&body).unwrap();
    // 96.00 in resolved lines plus 3 peony stems at the finalised 21.50
    assert_eq!(result["orderTotal"], "160.50");
    assert_eq!(result["items"][1]["price"], "21.50");
}

#[actix_web::test]
async fn negative_prices_are_rejected() {
    let _ = env_logger::try_init().ok();
    let flow_api =
        OrderFlowApi::<MockBackend, MockBackend>::new(MockBackend::new(), MockBackend::new(), EventProducers::default());
    let configure = move |cfg: &mut ServiceConfig| {
        cfg.service(UpdateItemPriceRoute::<MockBackend, MockBackend>::new())
            .app_data(web::Data::new(flow_api))
            .app_data(web::Data::new(CustomerApi::new(identity_backend(admin_customer()))));
    };
    let body = json!({"price": "-0.01"});
    let (status, body) =
        post_request("2", "/orders/PB-01042/items/9002/price", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let envelope: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(envelope["code"], "VALIDATION_ERROR");
}

fn configure(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_orders_for_customer().returning(|_| Ok(orders_response()));
    backend.expect_fetch_complete_order().returning(|_| Ok(Some(sample_complete_order())));
    // Search registers first, exactly as the real server does, so that /orders/search never parses as an order
    // number.
    cfg.service(OrdersSearchRoute::<MockBackend>::new())
        .service(MyOrdersRoute::<MockBackend>::new())
        .service(OrderByNumberRoute::<MockBackend>::new())
        .service(OrderTaxRoute::<MockBackend>::new())
        .app_data(web::Data::new(OrderApi::new(backend)))
        .app_data(web::Data::new(CustomerApi::new(identity_backend(approved_customer()))));
}

// Mock response to `orders_for_customer`, newest first.
fn orders_response() -> Vec<Order> {
    let delivered = Order {
        id: 760,
        order_number: OrderNumber::from_sequence(987),
        customer_id: 1,
        email: "amy@bloom.example".to_string(),
        phone: None,
        notes: None,
        status: OrderStatusType::Delivered,
        total: Money::from_cents(4125),
        delivery_address_id: 10,
        billing_address_id: None,
        created_at: Utc.with_ymd_and_hms(2024, 4, 2, 10, 0, 0).unwrap(),
        updated_at: Utc.with_ymd_and_hms(2024, 4, 5, 16, 45, 0).unwrap(),
    };
    vec![sample_order(), delivered]
}

const ORDERS_JSON: &str = r#"[{"id":801,"orderNumber":"PB-01042","customerId":1,"email":"amy@bloom.example","phone":null,"notes":null,"status":"PENDING","total":"96.00","deliveryAddressId":10,"billingAddressId":null,"createdAt":"2024-05-17T08:30:00Z","updatedAt":"2024-05-17T08:30:00Z"},{"id":760,"orderNumber":"PB-00987","customerId":1,"email":"amy@bloom.example","phone":null,"notes":null,"status":"DELIVERED","total":"41.25","deliveryAddressId":10,"billingAddressId":null,"createdAt":"2024-04-02T10:00:00Z","updatedAt":"2024-04-05T16:45:00Z"}]"#;
