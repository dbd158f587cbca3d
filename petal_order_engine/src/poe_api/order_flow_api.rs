use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{CartOrigin, Customer, Money, OrderNumber, OrderStatusType},
    events::{EventProducers, OrderCreatedEvent, OrderStatusChangedEvent},
    order_objects::{CheckoutRequest, CompleteOrder, StatusChange},
    poe_api::address_api::AddressApi,
    traits::{CheckoutDatabase, CheckoutError, ResolvedCheckout, SequenceSource},
};

/// `OrderFlowApi` is the primary API of the engine: it turns carts into orders and drives orders along their
/// lifecycle.
///
/// The backend `B` does the storage work; the sequence source `S` mints order numbers. They are separate parameters
/// so the numbering scheme can be swapped without touching the checkout flow, even though the default deployment
/// uses the same database for both.
pub struct OrderFlowApi<B, S> {
    db: B,
    sequence: S,
    producers: EventProducers,
}

impl<B, S> Debug for OrderFlowApi<B, S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "OrderFlowApi")
    }
}

impl<B, S> OrderFlowApi<B, S> {
    pub fn new(db: B, sequence: S, producers: EventProducers) -> Self {
        Self { db, sequence, producers }
    }
}

impl<B, S> OrderFlowApi<B, S>
where
    B: CheckoutDatabase,
    S: SequenceSource,
{
    /// Checks out the customer's active cart.
    ///
    /// The flow validates the customer (they must exist and be approved), resolves the delivery and optional
    /// billing addresses, draws a fresh order number, and then hands over to the backend to convert the cart
    /// atomically. The `OrderCreated` event fires after the conversion has committed.
    ///
    /// A number drawn for a checkout that subsequently fails is abandoned, leaving a gap in the sequence. Gaps are
    /// harmless; a duplicate order number never occurs.
    pub async fn checkout(&self, customer_id: i64, request: CheckoutRequest) -> Result<CompleteOrder, CheckoutError> {
        let customer = self
            .db
            .fetch_customer(customer_id)
            .await?
            .ok_or(CheckoutError::CustomerNotFound(customer_id))?;
        let cart = self.db.active_cart(customer_id).await?;
        self.run_checkout(&customer, cart.id, request).await
    }

    /// Checks out an admin draft cart through the same pipeline as a self-serve checkout. The order belongs to the
    /// customer the draft was opened for.
    pub async fn checkout_draft_cart(
        &self,
        cart_id: i64,
        request: CheckoutRequest,
    ) -> Result<CompleteOrder, CheckoutError> {
        let cart = self.db.fetch_cart(cart_id).await?.ok_or(CheckoutError::CartNotFound(cart_id))?;
        if cart.origin != CartOrigin::AdminDraft {
            return Err(CheckoutError::ValidationError(format!("Cart {cart_id} is not an admin draft")));
        }
        let customer = self
            .db
            .fetch_customer(cart.customer_id)
            .await?
            .ok_or(CheckoutError::CustomerNotFound(cart.customer_id))?;
        self.run_checkout(&customer, cart.id, request).await
    }

    async fn run_checkout(
        &self,
        customer: &Customer,
        cart_id: i64,
        request: CheckoutRequest,
    ) -> Result<CompleteOrder, CheckoutError> {
        if !customer.approved {
            return Err(CheckoutError::CustomerNotApproved(customer.id));
        }
        let email = request.email.trim();
        if email.is_empty() {
            return Err(CheckoutError::ValidationError("A contact email is required".to_string()));
        }
        let addresses = AddressApi::new(self.db.clone());
        let delivery = addresses.resolve_delivery_address(customer, &request.delivery).await?;
        let billing = addresses.resolve_billing_address(request.billing_address.as_ref()).await?;
        let number = self.sequence.next_order_number().await?;
        trace!("🔄️🛒️ Drew order number {number} for cart #{cart_id}");
        let checkout = ResolvedCheckout {
            order_number: number,
            email: email.to_string(),
            phone: request.phone,
            notes: request.notes,
            delivery_address_id: delivery.id,
            billing_address_id: billing.map(|b| b.id),
        };
        let order = self.db.checkout_cart(customer, cart_id, checkout).await?;
        debug!(
            "🔄️🛒️ Cart #{cart_id} checked out as order {} for customer #{}, total {}",
            order.order.order_number, customer.id, order.order.total
        );
        self.call_order_created_hook(&order).await;
        Ok(order)
    }

    /// Moves an order along its lifecycle. Only the transitions in the
    /// [`OrderStatusType`](crate::db_types::OrderStatusType) table are allowed; terminal orders cannot move at all.
    /// The `OrderStatusChanged` event fires after the change has committed.
    pub async fn update_status(
        &self,
        number: &OrderNumber,
        new_status: OrderStatusType,
    ) -> Result<StatusChange, CheckoutError> {
        let change = self.db.update_order_status(number, new_status).await?;
        debug!("🔄️📦️ Order {number} moved from {} to {new_status}", change.old_status);
        self.call_status_changed_hook(&change).await;
        Ok(change)
    }

    /// Sets the final per-unit price of an order item and recomputes the order total. This is how a market-priced
    /// line gets its price once the day's rate is known; it also serves as the general price correction lever.
    pub async fn finalize_item_price(
        &self,
        number: &OrderNumber,
        item_id: i64,
        price: Money,
    ) -> Result<CompleteOrder, CheckoutError> {
        if price.is_negative() {
            return Err(CheckoutError::NegativePrice(price));
        }
        let order = self.db.finalize_item_price(number, item_id, price).await?;
        debug!(
            "🔄️💰️ Order {number}: item #{item_id} finalised at {price}; order total is now {}",
            order.order.total
        );
        Ok(order)
    }

    async fn call_order_created_hook(&self, order: &CompleteOrder) {
        for emitter in &self.producers.order_created_producer {
            trace!("🔄️🛒️ Notifying order created hook subscribers");
            let event = OrderCreatedEvent::new(order.order.clone());
            emitter.publish_event(event).await;
        }
    }

    async fn call_status_changed_hook(&self, change: &StatusChange) {
        for emitter in &self.producers.order_status_producer {
            trace!("🔄️📦️ Notifying status changed hook subscribers");
            let event = OrderStatusChangedEvent::new(change.old_status, change.order.clone());
            emitter.publish_event(event).await;
        }
    }
}
