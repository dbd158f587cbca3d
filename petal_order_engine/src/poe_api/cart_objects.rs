use pbw_common::PriceMultiplier;
use serde::Serialize;
use sqlx::FromRow;

use crate::{
    db_types::{Cart, Money},
    helpers::{adjust_price, NegativePriceError},
};

/// A cart line joined with the catalog: the current list price for the product (or its variant, when the variant
/// carries its own price). `list_price` is raw; nothing has been scaled yet.
#[derive(Debug, Clone, FromRow, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub item_id: i64,
    pub product_id: i64,
    pub product_variant_id: Option<i64>,
    pub product_name: String,
    pub variant_name: Option<String>,
    pub quantity: i64,
    pub list_price: Option<Money>,
}

/// A cart with its lines, as read from storage.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartContents {
    pub cart: Cart,
    pub lines: Vec<CartLine>,
}

impl CartContents {
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

/// [`CartLine`] after the customer's price multiplier has been applied. Market-priced items carry no unit price;
/// they are quoted at fulfilment time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedLine {
    pub item_id: i64,
    pub product_id: i64,
    pub product_variant_id: Option<i64>,
    pub product_name: String,
    pub variant_name: Option<String>,
    pub quantity: i64,
    pub unit_price: Option<Money>,
    pub line_total: Option<Money>,
}

/// The customer's view of a cart: every line priced for them, with a subtotal over the lines that have a price.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PricedCart {
    pub cart: Cart,
    pub lines: Vec<PricedLine>,
    pub subtotal: Money,
    pub has_market_items: bool,
}

impl PricedCart {
    pub fn new(contents: CartContents, multiplier: PriceMultiplier) -> Result<Self, NegativePriceError> {
        let CartContents { cart, lines } = contents;
        let lines = lines
            .into_iter()
            .map(|line| {
                let unit_price = adjust_price(line.list_price, multiplier)?;
                let line_total = unit_price.map(|p| p * line.quantity);
                Ok(PricedLine {
                    item_id: line.item_id,
                    product_id: line.product_id,
                    product_variant_id: line.product_variant_id,
                    product_name: line.product_name,
                    variant_name: line.variant_name,
                    quantity: line.quantity,
                    unit_price,
                    line_total,
                })
            })
            .collect::<Result<Vec<PricedLine>, NegativePriceError>>()?;
        let subtotal = lines.iter().filter_map(|l| l.line_total).sum();
        let has_market_items = lines.iter().any(|l| l.unit_price.is_none());
        Ok(Self { cart, lines, subtotal, has_market_items })
    }
}
