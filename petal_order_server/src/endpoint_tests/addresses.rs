use actix_web::{http::StatusCode, web, web::ServiceConfig};
use petal_order_engine::{
    db_types::Address,
    traits::{AddressApiError, AddressDeleteOutcome},
    AddressApi,
    CustomerApi,
};
use serde_json::{json, Value};

use super::{
    helpers::{
        approved_customer,
        delete_request,
        get_request,
        identity_backend,
        post_request,
        sample_address,
        test_timestamp,
    },
    mocks::MockBackend,
};
use crate::routes::{AddAddressRoute, DeleteAddressRoute, MyAddressesRoute, SetDefaultAddressRoute};

#[actix_web::test]
async fn fetch_my_addresses_no_headers() {
    let _ = env_logger::try_init().ok();
    let err = get_request("", "/addresses", configure).await.expect_err("Expected error");
    assert_eq!(err, "Authentication failed. No customer id was provided");
}

#[actix_web::test]
async fn fetch_my_addresses() {
    let _ = env_logger::try_init().ok();
    let (status, body) = get_request("1", "/addresses", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, ADDRESSES_JSON);
}

#[actix_web::test]
async fn saving_an_address() {
    let _ = env_logger::try_init().ok();
    let body = json!({
        "firstName": "Amy", "lastName": "Santiago", "company": "Brooklyn Bouquets",
        "street1": "7 Florist Row", "street2": "Unit B", "city": "Petaluma", "state": "CA", "zip": "94952"
    });
    let (status, body) = post_request("1", "/addresses", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let address: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(address["id"], 11);
    // The country was omitted and defaulted.
    assert_eq!(address["country"], "US");
}

#[actix_web::test]
async fn a_blank_street_is_rejected() {
    let _ = env_logger::try_init().ok();
    let body = json!({
        "firstName": "Amy", "lastName": "Santiago",
        "street1": "  ", "city": "Petaluma", "state": "CA", "zip": "94952"
    });
    let (status, body) = post_request("1", "/addresses", body, configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let envelope: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(envelope["code"], "VALIDATION_ERROR");
}

#[actix_web::test]
async fn deleting_an_address_in_use_unlinks_it() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut backend = MockBackend::new();
        backend
            .expect_delete_address()
            .withf(|address_id, customer_id| *address_id == 10 && *customer_id == 1)
            .returning(|_, _| Ok(AddressDeleteOutcome::Unlinked));
        cfg.service(DeleteAddressRoute::<MockBackend>::new())
            .app_data(web::Data::new(AddressApi::new(backend)))
            .app_data(web::Data::new(CustomerApi::new(identity_backend(approved_customer()))));
    };
    let (status, body) = delete_request("1", "/addresses/10", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#""unlinked""#);
}

#[actix_web::test]
async fn deleting_the_default_promotes_the_survivor() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut backend = MockBackend::new();
        backend
            .expect_delete_address()
            .returning(|_, _| Ok(AddressDeleteOutcome::Deleted { promoted_default: Some(11) }));
        cfg.service(DeleteAddressRoute::<MockBackend>::new())
            .app_data(web::Data::new(AddressApi::new(backend)))
            .app_data(web::Data::new(CustomerApi::new(identity_backend(approved_customer()))));
    };
    let (status, body) = delete_request("1", "/addresses/10", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"deleted":{"promotedDefault":11}}"#);
}

/// A missing address and someone else's address answer identically, so address ids cannot be probed.
#[actix_web::test]
async fn a_strangers_address_cannot_be_deleted() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut backend = MockBackend::new();
        backend.expect_delete_address().returning(|_, _| Err(AddressApiError::InvalidAddress));
        cfg.service(DeleteAddressRoute::<MockBackend>::new())
            .app_data(web::Data::new(AddressApi::new(backend)))
            .app_data(web::Data::new(CustomerApi::new(identity_backend(approved_customer()))));
    };
    let (status, body) = delete_request("1", "/addresses/999", configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::FORBIDDEN);
    let envelope: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(envelope["code"], "FORBIDDEN");
    assert_eq!(
        envelope["error"],
        "Insufficient permissions. The address does not exist or does not belong to this customer"
    );
}

#[actix_web::test]
async fn choosing_a_new_default() {
    let _ = env_logger::try_init().ok();
    let configure = |cfg: &mut ServiceConfig| {
        let mut backend = MockBackend::new();
        backend
            .expect_set_default_address()
            .withf(|address_id, customer_id| *address_id == 11 && *customer_id == 1)
            .returning(|_, _| {
                let mut address = office_address();
                address.is_default = true;
                Ok(address)
            });
        cfg.service(SetDefaultAddressRoute::<MockBackend>::new())
            .app_data(web::Data::new(AddressApi::new(backend)))
            .app_data(web::Data::new(CustomerApi::new(identity_backend(approved_customer()))));
    };
    let (status, body) = post_request("1", "/addresses/11/default", json!({}), configure).await.expect("Request failed");
    assert_eq!(status, StatusCode::OK);
    let address: Value = serde_json::from_str(&body).unwrap();
    assert_eq!(address["id"], 11);
    assert_eq!(address["isDefault"], true);
}

fn office_address() -> Address {
    Address {
        id: 11,
        customer_id: Some(1),
        is_default: false,
        first_name: "Amy".to_string(),
        last_name: "Santiago".to_string(),
        company: Some("Brooklyn Bouquets".to_string()),
        street1: "7 Florist Row".to_string(),
        street2: Some("Unit B".to_string()),
        city: "Petaluma".to_string(),
        state: "CA".to_string(),
        zip: "94952".to_string(),
        country: "US".to_string(),
        created_at: test_timestamp(),
        updated_at: test_timestamp(),
    }
}

fn configure(cfg: &mut ServiceConfig) {
    let mut backend = MockBackend::new();
    backend.expect_addresses_for_customer().returning(|_| Ok(vec![sample_address(), office_address()]));
    backend
        .expect_insert_address()
        .withf(|customer_id, address, is_default| *customer_id == 1 && address.city == "Petaluma" && !is_default)
        .returning(|_, _, _| Ok(office_address()));
    cfg.service(MyAddressesRoute::<MockBackend>::new())
        .service(AddAddressRoute::<MockBackend>::new())
        .app_data(web::Data::new(AddressApi::new(backend)))
        .app_data(web::Data::new(CustomerApi::new(identity_backend(approved_customer()))));
}

// The address book: the default home address first, then the office.
const ADDRESSES_JSON: &str = r#"[{"id":10,"customerId":1,"isDefault":true,"firstName":"Amy","lastName":"Santiago","company":null,"street1":"48 Meadow Lane","street2":null,"city":"Sacramento","state":"CA","zip":"94203","country":"US","createdAt":"2024-05-17T08:30:00Z","updatedAt":"2024-05-17T08:30:00Z"},{"id":11,"customerId":1,"isDefault":false,"firstName":"Amy","lastName":"Santiago","company":"Brooklyn Bouquets","street1":"7 Florist Row","street2":"Unit B","city":"Petaluma","state":"CA","zip":"94952","country":"US","createdAt":"2024-05-17T08:30:00Z","updatedAt":"2024-05-17T08:30:00Z"}]"#;
