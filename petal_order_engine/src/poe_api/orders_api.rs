//! Read-side order queries.

use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Order, OrderNumber},
    helpers::{compute_order_tax, TaxSummary},
    order_objects::{CompleteOrder, OrderQueryFilter},
    traits::{OrderApiError, OrderManagement},
};

pub struct OrderApi<B> {
    db: B,
}

impl<B: Debug> Debug for OrderApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderApi ({:?})", self.db)
    }
}

impl<B> OrderApi<B>
where B: OrderManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn order_by_number(&self, number: &OrderNumber) -> Result<Option<Order>, OrderApiError> {
        self.db.fetch_order(number).await
    }

    pub async fn complete_order(&self, number: &OrderNumber) -> Result<Option<CompleteOrder>, OrderApiError> {
        self.db.fetch_complete_order(number).await
    }

    /// All orders for a customer, newest first.
    pub async fn orders_for_customer(&self, customer_id: i64) -> Result<Vec<Order>, OrderApiError> {
        self.db.orders_for_customer(customer_id).await
    }

    pub async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderApiError> {
        trace!("📦️ Searching orders with filter [{query}]");
        self.db.search_orders(query).await
    }

    /// The sales-tax breakdown for an order. Tax is charged on the resolved subtotal, so it grows as admins
    /// finalise market-priced lines.
    pub async fn tax_for_order(&self, number: &OrderNumber) -> Result<Option<TaxSummary>, OrderApiError> {
        let Some(order) = self.db.fetch_complete_order(number).await? else {
            return Ok(None);
        };
        let summary = compute_order_tax(order.order.total, &order.delivery_address.state);
        Ok(Some(summary))
    }
}
