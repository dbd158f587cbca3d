use std::fmt::Display;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    db_types::{Address, Money, NewAddress, Order, OrderItem, OrderStatusType},
    traits::OrderApiError,
};

/// An order in full: the order row, its lines, and the addresses it was placed against.
///
/// Serialises to the wire shape order responses use: the order fields at the top level, with the delivery address
/// under the customer-facing name `shippingAddress`.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CompleteOrder {
    #[serde(flatten)]
    pub order: Order,
    pub items: Vec<OrderItem>,
    #[serde(rename = "shippingAddress")]
    pub delivery_address: Address,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_address: Option<Address>,
}

impl CompleteOrder {
    /// True if any line is still waiting for an admin to set its market price.
    pub fn has_market_items(&self) -> bool {
        self.items.iter().any(|i| i.is_market_priced())
    }

    /// The sum over lines with a resolved price. Always equal to `order.total`; computed here for assertions and
    /// display.
    pub fn resolved_subtotal(&self) -> Money {
        self.items.iter().filter_map(|i| i.line_total()).sum()
    }
}

/// The record of a lifecycle transition, as returned by the status-update flow.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusChange {
    pub old_status: OrderStatusType,
    pub order: Order,
}

impl StatusChange {
    pub fn new(old_status: OrderStatusType, order: Order) -> Self {
        Self { old_status, order }
    }

    pub fn is_cancellation(&self) -> bool {
        self.order.status == OrderStatusType::Cancelled
    }
}

/// How the customer wants the order delivered: either an address already in their address book, or a fresh one
/// captured inline, optionally saved for next time.
#[derive(Debug, Clone)]
pub enum AddressSelection {
    Existing(i64),
    New { address: NewAddress, save: bool },
}

/// Everything the checkout flow needs beyond the cart itself.
#[derive(Debug, Clone)]
pub struct CheckoutRequest {
    pub delivery: AddressSelection,
    /// Captured as a one-off when given; otherwise billing follows the delivery address.
    pub billing_address: Option<NewAddress>,
    pub email: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

impl CheckoutRequest {
    pub fn to_saved_address<S: Into<String>>(address_id: i64, email: S) -> Self {
        Self {
            delivery: AddressSelection::Existing(address_id),
            billing_address: None,
            email: email.into(),
            phone: None,
            notes: None,
        }
    }

    pub fn to_new_address<S: Into<String>>(address: NewAddress, save: bool, email: S) -> Self {
        Self {
            delivery: AddressSelection::New { address, save },
            billing_address: None,
            email: email.into(),
            phone: None,
            notes: None,
        }
    }

    pub fn with_billing_address(mut self, address: NewAddress) -> Self {
        self.billing_address = Some(address);
        self
    }

    pub fn with_phone<S: Into<String>>(mut self, phone: S) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_notes<S: Into<String>>(mut self, notes: S) -> Self {
        self.notes = Some(notes.into());
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OrderQueryFilter {
    pub customer_id: Option<i64>,
    pub status: Option<Vec<OrderStatusType>>,
    pub since: Option<DateTime<Utc>>,
    pub until: Option<DateTime<Utc>>,
}

impl OrderQueryFilter {
    pub fn with_customer_id(mut self, customer_id: i64) -> Self {
        self.customer_id = Some(customer_id);
        self
    }

    pub fn with_status(mut self, status: OrderStatusType) -> Self {
        self.status.get_or_insert_with(Vec::new).push(status);
        self
    }

    pub fn since<T>(mut self, since: T) -> Result<Self, OrderApiError>
    where
        T: TryInto<DateTime<Utc>>,
        T::Error: Display,
    {
        let dt = since.try_into().map_err(|e| OrderApiError::QueryError(e.to_string()))?;
        self.since = Some(dt);
        Ok(self)
    }

    pub fn until<T>(mut self, until: T) -> Result<Self, OrderApiError>
    where
        T: TryInto<DateTime<Utc>>,
        T::Error: Display,
    {
        let dt = until.try_into().map_err(|e| OrderApiError::QueryError(e.to_string()))?;
        self.until = Some(dt);
        Ok(self)
    }

    pub fn is_empty(&self) -> bool {
        self.customer_id.is_none() && self.status.is_none() && self.since.is_none() && self.until.is_none()
    }
}

impl Display for OrderQueryFilter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.is_empty() {
            write!(f, "No filters.")?;
            return Ok(());
        }
        if let Some(customer_id) = &self.customer_id {
            write!(f, "customer_id: {customer_id}. ")?;
        }
        if let Some(statuses) = &self.status {
            let statuses = statuses.iter().map(|s| s.to_string()).collect::<Vec<String>>().join(",");
            write!(f, "statuses: [{statuses}]. ")?;
        }
        if let Some(since) = &self.since {
            write!(f, "since {since}. ")?;
        }
        if let Some(until) = &self.until {
            write!(f, "until {until}. ")?;
        }
        Ok(())
    }
}
