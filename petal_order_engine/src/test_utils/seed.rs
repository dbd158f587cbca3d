//! Fixtures for stocking a throwaway store.
//!
//! The catalog is maintained by an external service in production, so the public traits expose no product writes.
//! Tests still need shelves with something on them; these helpers reach into the sqlite layer directly.

use pbw_common::{Money, PriceMultiplier};

use crate::{
    db_types::{Customer, NewAddress, NewCustomer, Product, ProductVariant},
    sqlite::db::products,
    CustomerApi,
    SqliteDatabase,
};

/// Inserts a catalog product. `price: None` stocks a market-priced product.
pub async fn stock_product(db: &SqliteDatabase, name: &str, price: Option<Money>) -> Product {
    let mut conn = db.pool().acquire().await.expect("Error acquiring connection");
    let sku = name.to_lowercase().replace(' ', "-");
    products::insert_product(name, Some(sku.as_str()), price, &mut conn).await.expect("Error stocking product")
}

pub async fn stock_variant(db: &SqliteDatabase, product_id: i64, name: &str, price: Option<Money>) -> ProductVariant {
    let mut conn = db.pool().acquire().await.expect("Error acquiring connection");
    products::insert_variant(product_id, name, price, &mut conn).await.expect("Error stocking variant")
}

/// Registers a customer, approves them for purchasing and pins their price multiplier.
pub async fn approved_customer(db: &SqliteDatabase, email: &str, multiplier: PriceMultiplier) -> Customer {
    let api = CustomerApi::new(db.clone());
    let customer = api.register(NewCustomer::new(email, "Fern", "Bloomfield")).await.expect("Error registering customer");
    let customer = api.set_approved(customer.id, true).await.expect("Error approving customer");
    if multiplier == PriceMultiplier::IDENTITY {
        customer
    } else {
        api.set_price_multiplier(customer.id, multiplier).await.expect("Error setting price multiplier")
    }
}

/// A well-formed Californian delivery address.
pub fn home_address(first_name: &str) -> NewAddress {
    NewAddress {
        first_name: first_name.to_string(),
        last_name: "Bloomfield".to_string(),
        company: None,
        street1: "12 Petal Lane".to_string(),
        street2: None,
        city: "San Rafael".to_string(),
        state: "CA".to_string(),
        zip: "94901".to_string(),
        country: "US".to_string(),
    }
}
