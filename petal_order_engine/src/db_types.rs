use std::{fmt::Display, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, Type};
use thiserror::Error;

pub use pbw_common::{Money, PriceMultiplier};

use crate::helpers::sequence_from_number;

#[derive(Debug, Clone, Error)]
#[error("{0}")]
pub struct ConversionError(pub String);

//--------------------------------------        Role          ---------------------------------------------------------

/// The access level attached to a customer record. The session gateway authenticates callers; the role stored here
/// decides what they may do once inside.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Admin,
}

impl Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::Customer => write!(f, "Customer"),
            Role::Admin => write!(f, "Admin"),
        }
    }
}

impl FromStr for Role {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "customer" => Ok(Self::Customer),
            "admin" => Ok(Self::Admin),
            s => Err(ConversionError(format!("Invalid role: {s}"))),
        }
    }
}

//--------------------------------------     OrderNumber      ---------------------------------------------------------

pub const ORDER_NUMBER_PREFIX: &str = "PB-";

/// A customer-facing order number such as `PB-00042`.
///
/// Numbers are minted from a monotonically increasing sequence and zero-padded to five digits. Once the sequence
/// passes 99,999 the number simply grows longer. The inner string is private so that every `OrderNumber` in the
/// system is known to carry the `PB-` prefix followed by digits.
#[derive(Debug, Clone, PartialEq, Eq, Type, Serialize)]
#[sqlx(transparent)]
pub struct OrderNumber(String);

impl<'de> Deserialize<'de> for OrderNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where D: serde::Deserializer<'de> {
        let s = String::deserialize(deserializer)?;
        OrderNumber::from_str(&s).map_err(serde::de::Error::custom)
    }
}

impl OrderNumber {
    pub fn from_sequence(sequence: i64) -> Self {
        Self(format!("{ORDER_NUMBER_PREFIX}{sequence:05}"))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The numeric part of the order number. `PB-00042` yields 42.
    pub fn sequence(&self) -> Option<i64> {
        sequence_from_number(&self.0)
    }
}

impl FromStr for OrderNumber {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match sequence_from_number(s) {
            Some(_) => Ok(Self(s.to_string())),
            None => Err(ConversionError(format!("Invalid order number: {s}"))),
        }
    }
}

impl Display for OrderNumber {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

//--------------------------------------   OrderStatusType    ---------------------------------------------------------

/// The lifecycle state of an order.
///
/// The status always moves along a fixed set of transitions:
///
/// | From           | To             |
/// |----------------|----------------|
/// | Pending        | Confirmed      |
/// | Pending        | Cancelled      |
/// | Confirmed      | OutForDelivery |
/// | Confirmed      | Cancelled      |
/// | OutForDelivery | Delivered      |
///
/// `Delivered` and `Cancelled` are terminal. Everything not in the table, including a transition from a status to
/// itself, is rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum OrderStatusType {
    /// The order has been placed, but no-one has looked at it yet.
    Pending,
    /// The order has been accepted by the shop and is being prepared.
    Confirmed,
    /// The order has left the warehouse and is on a truck.
    OutForDelivery,
    /// The order has been delivered. Terminal.
    Delivered,
    /// The order has been cancelled by the customer or an admin. Terminal.
    Cancelled,
}

impl OrderStatusType {
    pub fn is_terminal(&self) -> bool {
        matches!(self, OrderStatusType::Delivered | OrderStatusType::Cancelled)
    }

    pub fn can_transition_to(&self, next: OrderStatusType) -> bool {
        use OrderStatusType::*;
        matches!(
            (self, next),
            (Pending, Confirmed) |
                (Pending, Cancelled) |
                (Confirmed, OutForDelivery) |
                (Confirmed, Cancelled) |
                (OutForDelivery, Delivered)
        )
    }
}

impl Display for OrderStatusType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OrderStatusType::Pending => write!(f, "Pending"),
            OrderStatusType::Confirmed => write!(f, "Confirmed"),
            OrderStatusType::OutForDelivery => write!(f, "OutForDelivery"),
            OrderStatusType::Delivered => write!(f, "Delivered"),
            OrderStatusType::Cancelled => write!(f, "Cancelled"),
        }
    }
}

impl FromStr for OrderStatusType {
    type Err = ConversionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Pending" | "PENDING" => Ok(Self::Pending),
            "Confirmed" | "CONFIRMED" => Ok(Self::Confirmed),
            "OutForDelivery" | "OUT_FOR_DELIVERY" => Ok(Self::OutForDelivery),
            "Delivered" | "DELIVERED" => Ok(Self::Delivered),
            "Cancelled" | "CANCELLED" => Ok(Self::Cancelled),
            s => Err(ConversionError(format!("Invalid order status: {s}"))),
        }
    }
}

//--------------------------------------      Customer        ---------------------------------------------------------

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: i64,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub company: Option<String>,
    pub role: Role,
    /// Unapproved customers can browse and fill a cart, but cannot check out.
    pub approved: bool,
    pub price_multiplier: PriceMultiplier,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomer {
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub company: Option<String>,
}

impl NewCustomer {
    pub fn new<S: Into<String>>(email: S, first_name: S, last_name: S) -> Self {
        Self { email: email.into(), first_name: first_name.into(), last_name: last_name.into(), company: None }
    }
}

//--------------------------------------       Address        ---------------------------------------------------------

/// A delivery or billing address.
///
/// `customer_id` is nullable on purpose. When a customer removes an address that past orders still point at, the row
/// is kept and only unlinked from the customer, so the order history keeps rendering the address it was delivered to.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub id: i64,
    pub customer_id: Option<i64>,
    pub is_default: bool,
    pub first_name: String,
    pub last_name: String,
    pub company: Option<String>,
    pub street1: String,
    pub street2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: String,
    pub country: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewAddress {
    pub first_name: String,
    pub last_name: String,
    #[serde(default)]
    pub company: Option<String>,
    pub street1: String,
    #[serde(default)]
    pub street2: Option<String>,
    pub city: String,
    pub state: String,
    pub zip: String,
    #[serde(default = "default_country")]
    pub country: String,
}

fn default_country() -> String {
    "US".to_string()
}

impl NewAddress {
    /// Returns the names of required fields that are missing or blank. An empty result means the address is
    /// well-formed.
    pub fn missing_fields(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        let required = [
            ("firstName", &self.first_name),
            ("lastName", &self.last_name),
            ("street1", &self.street1),
            ("city", &self.city),
            ("state", &self.state),
            ("zip", &self.zip),
            ("country", &self.country),
        ];
        for (name, value) in required {
            if value.trim().is_empty() {
                missing.push(name);
            }
        }
        missing
    }
}

//--------------------------------------       Product        ---------------------------------------------------------

/// A catalog product. The catalog itself is maintained elsewhere; the engine only reads prices from it.
///
/// A `NULL` price means "market price": the product sells at a rate that is only known at fulfilment time, and an
/// admin fills the price in after checkout.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Product {
    pub id: i64,
    pub name: String,
    pub sku: Option<String>,
    pub price: Option<Money>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A purchasable variation of a product (stem length, bunch size and so on). A variant with a `NULL` price inherits
/// the parent product's price.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductVariant {
    pub id: i64,
    pub product_id: i64,
    pub name: String,
    pub price: Option<Money>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

//--------------------------------------        Cart          ---------------------------------------------------------

/// Distinguishes the customer's own active cart from one an admin is assembling on a customer's behalf.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Type, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum CartOrigin {
    SelfServe,
    AdminDraft,
}

impl Display for CartOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CartOrigin::SelfServe => write!(f, "SelfServe"),
            CartOrigin::AdminDraft => write!(f, "AdminDraft"),
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: i64,
    pub customer_id: i64,
    pub origin: CartOrigin,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItem {
    pub id: i64,
    pub cart_id: i64,
    pub product_id: i64,
    pub product_variant_id: Option<i64>,
    pub quantity: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCartItem {
    pub product_id: i64,
    #[serde(default)]
    pub product_variant_id: Option<i64>,
    pub quantity: i64,
}

impl NewCartItem {
    pub fn new(product_id: i64, quantity: i64) -> Self {
        Self { product_id, product_variant_id: None, quantity }
    }

    pub fn for_variant(product_id: i64, variant_id: i64, quantity: i64) -> Self {
        Self { product_id, product_variant_id: Some(variant_id), quantity }
    }
}

//--------------------------------------        Order         ---------------------------------------------------------

#[derive(Debug, Clone, PartialEq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: i64,
    pub order_number: OrderNumber,
    pub customer_id: i64,
    pub email: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub status: OrderStatusType,
    /// The sum over items with a resolved price. Market-priced items contribute nothing until an admin finalises
    /// them, at which point the total is recomputed.
    pub total: Money,
    pub delivery_address_id: i64,
    pub billing_address_id: Option<i64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// An order line, priced at checkout time. `price` is the per-unit price after the customer's multiplier was
/// applied; `None` marks a market-priced line awaiting an admin.
#[derive(Debug, Clone, PartialEq, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub id: i64,
    pub order_id: i64,
    pub product_id: i64,
    pub product_variant_id: Option<i64>,
    pub product_name: String,
    pub quantity: i64,
    pub price: Option<Money>,
    pub created_at: DateTime<Utc>,
}

impl OrderItem {
    pub fn is_market_priced(&self) -> bool {
        self.price.is_none()
    }

    pub fn line_total(&self) -> Option<Money> {
        self.price.map(|p| p * self.quantity)
    }
}

#[derive(Debug, Clone)]
pub struct NewOrder {
    pub order_number: OrderNumber,
    pub customer_id: i64,
    pub email: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
    pub total: Money,
    pub delivery_address_id: i64,
    pub billing_address_id: Option<i64>,
}

#[derive(Debug, Clone)]
pub struct NewOrderItem {
    pub product_id: i64,
    pub product_variant_id: Option<i64>,
    pub product_name: String,
    pub quantity: i64,
    pub price: Option<Money>,
}
