use actix_web::{http::StatusCode, web, web::ServiceConfig};
use petal_order_engine::{
    cart_objects::{CartContents, CartLine},
    db_types::{Cart, CartItem, CartOrigin, Money, OrderNumber, PriceMultiplier},
    events::EventProducers,
    CartApi,
    CustomerApi,
    OrderFlowApi,
};
use serde_json::{json, Value};

use super::{
    helpers::{
        admin_customer,
        approved_customer,
        delete_request,
        get_request,
        identity_backend,
        post_request,
        sample_address,
        sample_complete_order,
        test_timestamp,
        unapproved_customer,
    },
    mocks::MockBackend,
};
use crate::routes::{AddCartItemRoute, CheckoutRoute, CreateDraftCartRoute, MyCartRoute, RemoveCartItemRoute};

#[actix_web::test]
async fn fetch_my_cart_no_headers() {
    let _ = env_logger::try_init().ok();
    let err = get_request("", "/cart", configure).await.expect_err("Expected error");
    assert_eq!(err, "Authentication failed. No customer id was provided");
}

#[actix_web::test]
async fn fetch_my_cart_unknown_customer() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut identity = MockBackend::new();
        identity.expect_fetch_customer().returning(|_| Ok(None));
        cfg.service(MyCartRoute::<MockBackend>::new())
            .app_data(web::Data::new(CartApi::new(MockBackend::new())))
            .app_data(web::Data::new(CustomerApi::new(identity)));
    };
    let err = get_request("99", "/cart", configure).await.expect_err("Expected error");
    assert_eq!(err, "Authentication failed. Unknown customer id 99");
}

#[actix_web::test]
async fn fetch_my_cart() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("1", "/cart", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, CART_JSON);
}

#[actix_web::test]
async fn cart_prices_follow_the_customer_multiplier() {
    let _ = env_logger::try_init().ok();
    let mut customer = approved_customer();
    customer.price_multiplier = PriceMultiplier::new(15_000).unwrap();
    let configure = move |cfg: &mut ServiceConfig| {
        let mut backend = MockBackend::new();
        backend.expect_active_cart().returning(|_| Ok(cart_for(1)));
        backend.expect_cart_contents().returning(|_| Ok(standard_contents()));
        cfg.service(MyCartRoute::<MockBackend>::new())
            .app_data(web::Data::new(CartApi::new(backend)))
            .app_data(web::Data::new(CustomerApi::new(identity_backend(customer))));
    };
    let (status, body) = get_request("1", "/cart", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let cart: Value = serde_json::from_str(&body).unwrap();
    // 48.00 list * 1.5, twice; the market line still has no price
    assert_eq!(cart["lines"][0]["unitPrice"], "72.00");
    assert_eq!(cart["lines"][0]["lineTotal"], "144.00");
    assert_eq!(cart["lines"][1]["unitPrice"], Value::Null);
    assert_eq!(cart["subtotal"], "144.00");
}

#[actix_web::test]
async fn add_cart_item_returns_the_updated_cart() {
    let _ = env_logger::try_init().ok();
    let body = json!({"productId": 11, "quantity": 2});
    let (status, body) = post_request("1", "/cart/items", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, CART_JSON);
}

#[actix_web::test]
async fn add_cart_item_rejects_zero_quantity() {
    let _ = env_logger::try_init().ok();
    let body = json!({"productId": 11, "quantity": 0});
    let (status, body) = post_request("1", "/cart/items", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let envelope: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(envelope["code"], "VALIDATION_ERROR");
}

#[actix_web::test]
async fn remove_cart_item_returns_the_updated_cart() {
    let _ = env_logger::try_init().ok();
    let (status, body) = delete_request("1", "/cart/items/501", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, CART_JSON);
}

#[actix_web::test]
async fn checkout_converts_the_active_cart() {
    let _ = env_logger::try_init().ok();
    let mut flow_db = MockBackend::new();
    flow_db.expect_fetch_customer().returning(|_| Ok(Some(approved_customer())));
    flow_db.expect_active_cart().returning(|_| Ok(cart_for(1)));
    flow_db.expect_clone().returning(|| {
        let mut addresses = MockBackend::new();
        addresses.expect_fetch_address().returning(|_| Ok(Some(sample_address())));
        addresses
    });
    flow_db
        .expect_checkout_cart()
        .withf(|_, cart_id, checkout| {
            *cart_id == 31 && checkout.delivery_address_id == 10 && checkout.billing_address_id.is_none()
        })
        .returning(|_, _, _| Ok(sample_complete_order()));
    let mut sequence = MockBackend::new();
    sequence.expect_next_order_number().returning(|| Ok(OrderNumber::from_sequence(1042)));
    let flow_api = OrderFlowApi::new(flow_db, sequence, EventProducers::default());
    let configure = move |cfg: &mut ServiceConfig| {
        cfg.service(CheckoutRoute::<MockBackend, MockBackend>::new())
            .app_data(web::Data::new(flow_api))
            .app_data(web::Data::new(CustomerApi::new(identity_backend(approved_customer()))));
    };
    let body = json!({"deliveryAddressId": 10, "email": "amy@bloom.example"});
    let (status, body) = post_request("1", "/checkout", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let order: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(order["orderNumber"], "PB-01042");
    assert_eq!(order["status"], "PENDING");
    assert_eq!(order["total"], "96.00");
    assert_eq!(order["shippingAddress"]["id"], 10);
}

#[actix_web::test]
async fn checkout_requires_approval() {
    let _ = env_logger::try_init().ok();
    let mut flow_db = MockBackend::new();
    flow_db.expect_fetch_customer().returning(|_| Ok(Some(unapproved_customer())));
    flow_db.expect_active_cart().returning(|_| Ok(cart_for(3)));
    let flow_api = OrderFlowApi::new(flow_db, MockBackend::new(), EventProducers::default());
    let configure = move |cfg: &mut ServiceConfig| {
        cfg.service(CheckoutRoute::<MockBackend, MockBackend>::new())
            .app_data(web::Data::new(flow_api))
            .app_data(web::Data::new(CustomerApi::new(identity_backend(unapproved_customer()))));
    };
    let body = json!({"deliveryAddressId": 10, "email": "jake@ninenineflowers.example"});
    let (status, body) = post_request("3", "/checkout", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
    let envelope: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(envelope["code"], "FORBIDDEN");
    assert_eq!(envelope["error"], "Insufficient permissions. Customer 3 has not been approved for purchasing");
}

#[actix_web::test]
async fn checkout_rejects_ambiguous_addresses() {
    let _ = env_logger::try_init().ok();
    let flow_api =
        OrderFlowApi::<MockBackend, MockBackend>::new(MockBackend::new(), MockBackend::new(), EventProducers::default());
    let configure = move |cfg: &mut ServiceConfig| {
        cfg.service(CheckoutRoute::<MockBackend, MockBackend>::new())
            .app_data(web::Data::new(flow_api))
            .app_data(web::Data::new(CustomerApi::new(identity_backend(approved_customer()))));
    };
    let body = json!({
        "deliveryAddressId": 10,
        "deliveryAddress": {
            "firstName": "Amy", "lastName": "Santiago", "street1": "48 Meadow Lane",
            "city": "Sacramento", "state": "CA", "zip": "94203"
        },
        "email": "amy@bloom.example"
    });
    let (status, body) = post_request("1", "/checkout", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let envelope: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(envelope["code"], "VALIDATION_ERROR");
}

#[actix_web::test]
async fn an_admin_opens_a_draft_cart() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut backend = MockBackend::new();
        backend.expect_fetch_customer().returning(|_| Ok(Some(approved_customer())));
        backend.expect_create_draft_cart().withf(|customer_id| *customer_id == 1).returning(|customer_id| {
            Ok(Cart {
                id: 77,
                customer_id,
                origin: CartOrigin::AdminDraft,
                created_at: test_timestamp(),
                updated_at: test_timestamp(),
            })
        });
        cfg.service(CreateDraftCartRoute::<MockBackend>::new())
            .app_data(web::Data::new(CartApi::new(backend)))
            .app_data(web::Data::new(CustomerApi::new(identity_backend(admin_customer()))));
    };
    let body = json!({"customerId": 1});
    let (status, body) = post_request("2", "/carts/draft", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let cart: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(cart["id"], 77);
    assert_eq!(cart["customerId"], 1);
    assert_eq!(cart["origin"], "adminDraft");
}

#[actix_web::test]
async fn draft_carts_are_an_admin_tool() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        cfg.service(CreateDraftCartRoute::<MockBackend>::new())
            .app_data(web::Data::new(CartApi::new(MockBackend::new())))
            .app_data(web::Data::new(CustomerApi::new(identity_backend(approved_customer()))));
    };
    let body = json!({"customerId": 3});
    let err = post_request("1", "/carts/draft", body, configure).await.expect_err("Expected error");
    assert_eq!(err, "Insufficient permissions. Customer #1 may not call this endpoint");
}

fn cart_for(customer_id: i64) -> Cart {
    Cart {
        id: 31,
        customer_id,
        origin: CartOrigin::SelfServe,
        created_at: test_timestamp(),
        updated_at: test_timestamp(),
    }
}

// The standard two-line cart: a priced rose bunch and a market-priced peony line.
fn standard_contents() -> CartContents {
    CartContents {
        cart: cart_for(1),
        lines: vec![
            CartLine {
                item_id: 501,
                product_id: 11,
                product_variant_id: None,
                product_name: "Garden Rose Bunch".to_string(),
                variant_name: None,
                quantity: 2,
                list_price: Some(Money::from_cents(4800)),
            },
            CartLine {
                item_id: 502,
                product_id: 23,
                product_variant_id: Some(4),
                product_name: "Market Peonies".to_string(),
                variant_name: Some("10 stems".to_string()),
                quantity: 3,
                list_price: None,
            },
        ],
    }
}

fn configure(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_active_cart().returning(|_| Ok(cart_for(1)));
    backend.expect_cart_contents().returning(|_| Ok(standard_contents()));
    backend.expect_upsert_cart_item().returning(|cart_id, item| {
        Ok(CartItem {
            id: 501,
            cart_id,
            product_id: item.product_id,
            product_variant_id: item.product_variant_id,
            quantity: item.quantity,
            created_at: test_timestamp(),
        })
    });
    backend.expect_remove_cart_item().returning(|_, _| Ok(()));
    cfg.service(MyCartRoute::<MockBackend>::new())
        .service(AddCartItemRoute::<MockBackend>::new())
        .service(RemoveCartItemRoute::<MockBackend>::new())
        .app_data(web::Data::new(CartApi::new(backend)))
        .app_data(web::Data::new(CustomerApi::new(identity_backend(approved_customer()))));
}

const CART_JSON: &str = r#"{"cart":{"id":31,"customerId":1,"origin":"selfServe","createdAt":"2024-05-17T08:30:00Z","updatedAt":"2024-05-17T08:30:00Z"},"lines":[{"itemId":501,"productId":11,"productVariantId":null,"productName":"Garden Rose Bunch","variantName":null,"quantity":2,"unitPrice":"48.00","lineTotal":"96.00"},{"itemId":502,"productId":23,"productVariantId":4,"productName":"Market Peonies","variantName":"10 stems","quantity":3,"unitPrice":null,"lineTotal":null}],"subtotal":"96.00","hasMarketItems":true}"#;
