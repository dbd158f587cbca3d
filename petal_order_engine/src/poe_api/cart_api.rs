//! Cart management for customers and admins.

use std::fmt::Debug;

use log::*;

use crate::{
    cart_objects::PricedCart,
    db_types::{Cart, CartOrigin, Customer, NewCartItem},
    traits::{CartApiError, CartManagement, CustomerManagement},
};

pub struct CartApi<B> {
    db: B,
}

impl<B: Debug> Debug for CartApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CartApi ({:?})", self.db)
    }
}

impl<B> CartApi<B>
where B: CartManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// The customer's active cart, priced for them. An empty cart is created on first use.
    pub async fn active_cart_for(&self, customer: &Customer) -> Result<PricedCart, CartApiError> {
        let cart = self.db.active_cart(customer.id).await?;
        self.priced_cart(cart, customer).await
    }

    /// Adds an item to the customer's active cart and returns the updated priced cart. Lines for the same product
    /// and variant merge their quantities.
    pub async fn add_item(&self, customer: &Customer, item: NewCartItem) -> Result<PricedCart, CartApiError> {
        if item.quantity < 1 {
            return Err(CartApiError::InvalidQuantity(item.quantity));
        }
        let cart = self.db.active_cart(customer.id).await?;
        let line = self.db.upsert_cart_item(cart.id, item).await?;
        debug!("🛒️ Cart #{}: product #{} now at quantity {}", cart.id, line.product_id, line.quantity);
        self.priced_cart(cart, customer).await
    }

    /// Removes a line from the customer's active cart. The item must be in *their* cart; ids from other carts are
    /// reported as not found.
    pub async fn remove_item(&self, customer: &Customer, item_id: i64) -> Result<PricedCart, CartApiError> {
        let cart = self.db.active_cart(customer.id).await?;
        self.db.remove_cart_item(cart.id, item_id).await?;
        debug!("🛒️ Cart #{}: removed item #{item_id}", cart.id);
        self.priced_cart(cart, customer).await
    }

    async fn priced_cart(&self, cart: Cart, customer: &Customer) -> Result<PricedCart, CartApiError> {
        let contents = self.db.cart_contents(cart.id).await?;
        Ok(PricedCart::new(contents, customer.price_multiplier)?)
    }
}

impl<B> CartApi<B>
where B: CartManagement + CustomerManagement
{
    /// Opens a draft cart on the customer's behalf. Drafts live alongside the customer's own cart and are consumed
    /// when checked out.
    pub async fn create_draft_cart(&self, customer_id: i64) -> Result<Cart, CartApiError> {
        if self.db.fetch_customer(customer_id).await.map_err(|e| CartApiError::DatabaseError(e.to_string()))?.is_none()
        {
            return Err(CartApiError::CustomerNotFound(customer_id));
        }
        let cart = self.db.create_draft_cart(customer_id).await?;
        debug!("🛒️ Opened draft cart #{} for customer #{customer_id}", cart.id);
        Ok(cart)
    }

    /// Adds an item to a draft cart and returns the draft priced with the owning customer's multiplier.
    pub async fn add_item_to_draft(&self, cart_id: i64, item: NewCartItem) -> Result<PricedCart, CartApiError> {
        if item.quantity < 1 {
            return Err(CartApiError::InvalidQuantity(item.quantity));
        }
        let cart = self.db.fetch_cart(cart_id).await?.ok_or(CartApiError::CartNotFound(cart_id))?;
        if cart.origin != CartOrigin::AdminDraft {
            return Err(CartApiError::CartNotFound(cart_id));
        }
        let customer = self
            .db
            .fetch_customer(cart.customer_id)
            .await
            .map_err(|e| CartApiError::DatabaseError(e.to_string()))?
            .ok_or(CartApiError::CustomerNotFound(cart.customer_id))?;
        self.db.upsert_cart_item(cart.id, item).await?;
        let contents = self.db.cart_contents(cart.id).await?;
        Ok(PricedCart::new(contents, customer.price_multiplier)?)
    }
}
