//! Request and response shapes that exist only at the HTTP boundary. Everything here converts to or from the
//! engine's own types; no business rules live in this module.

use pbw_common::{Money, PriceMultiplier};
use petal_order_engine::{
    db_types::{NewAddress, OrderStatusType},
    order_objects::{AddressSelection, CheckoutRequest, CompleteOrder},
};
use serde::{Deserialize, Serialize};

use crate::errors::ServerError;

/// The checkout request body. Exactly one of `deliveryAddressId` and `deliveryAddress` must be given.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutParams {
    pub delivery_address_id: Option<i64>,
    pub delivery_address: Option<NewAddress>,
    #[serde(default)]
    pub save_delivery_address: bool,
    pub billing_address: Option<NewAddress>,
    pub email: String,
    pub phone: Option<String>,
    pub notes: Option<String>,
}

impl TryFrom<CheckoutParams> for CheckoutRequest {
    type Error = ServerError;

    fn try_from(params: CheckoutParams) -> Result<Self, Self::Error> {
        let delivery = match (params.delivery_address_id, params.delivery_address) {
            (Some(_), Some(_)) => {
                return Err(ServerError::ValidationError(
                    "Give either deliveryAddressId or deliveryAddress, not both".to_string(),
                ))
            },
            (Some(id), None) => AddressSelection::Existing(id),
            (None, Some(address)) => AddressSelection::New { address, save: params.save_delivery_address },
            (None, None) => {
                return Err(ServerError::ValidationError(
                    "One of deliveryAddressId or deliveryAddress is required".to_string(),
                ))
            },
        };
        Ok(CheckoutRequest {
            delivery,
            billing_address: params.billing_address,
            email: params.email,
            phone: params.phone,
            notes: params.notes,
        })
    }
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct StatusUpdateParams {
    pub status: OrderStatusType,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct PriceUpdateParams {
    pub price: Money,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ApprovalParams {
    pub approved: bool,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct MultiplierParams {
    pub multiplier: PriceMultiplier,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftCartParams {
    pub customer_id: i64,
}

/// The price edit response. The recomputed total is lifted to `orderTotal` where the admin UI reads it; the rest
/// is the usual complete-order shape.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PriceUpdateResult {
    pub order_total: Money,
    #[serde(flatten)]
    pub order: CompleteOrder,
}

impl From<CompleteOrder> for PriceUpdateResult {
    fn from(order: CompleteOrder) -> Self {
        Self { order_total: order.order.total, order }
    }
}
