//! `SqliteDatabase` is a concrete implementation of an order engine backend.
//!
//! Unsurprisingly, it uses SQLite as the backend and implements all the traits defined in the [`traits`] module.
use std::fmt::Debug;

use log::*;
use sqlx::SqlitePool;

use super::db::{addresses, carts, customers, db_url, new_pool, orders, sequence};
use crate::{
    cart_objects::CartContents,
    db_types::{
        Address,
        Cart,
        CartItem,
        Customer,
        Money,
        NewAddress,
        NewCartItem,
        NewCustomer,
        NewOrder,
        NewOrderItem,
        Order,
        OrderItem,
        OrderNumber,
        OrderStatusType,
        PriceMultiplier,
        Role,
    },
    helpers::adjust_price,
    order_objects::{CompleteOrder, OrderQueryFilter, StatusChange},
    traits::{
        AddressApiError,
        AddressDeleteOutcome,
        AddressManagement,
        CartApiError,
        CartManagement,
        CheckoutDatabase,
        CheckoutError,
        CustomerApiError,
        CustomerManagement,
        OrderApiError,
        OrderManagement,
        ResolvedCheckout,
        SequenceError,
        SequenceSource,
    },
};

#[derive(Clone)]
pub struct SqliteDatabase {
    url: String,
    pool: SqlitePool,
}

impl Debug for SqliteDatabase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "SqliteDatabase ({:?})", self.pool)
    }
}

impl CheckoutDatabase for SqliteDatabase {
    fn url(&self) -> &str {
        self.url.as_str()
    }

    /// Converts the cart into an order in a single atomic transaction.
    ///
    /// The cart lines are priced with the customer's multiplier, the order and its item snapshots are inserted with
    /// `Pending` status, and the cart is emptied — all in one transaction, so a duplicate submission of the same
    /// cart settles as exactly one order plus an `EmptyCart` rejection.
    async fn checkout_cart(
        &self,
        customer: &Customer,
        cart_id: i64,
        checkout: ResolvedCheckout,
    ) -> Result<CompleteOrder, CheckoutError> {
        let mut tx = self.pool.begin().await?;
        let cart = carts::fetch_cart(cart_id, &mut tx).await?.ok_or(CheckoutError::CartNotFound(cart_id))?;
        let lines = carts::cart_lines(cart_id, &mut tx).await?;
        if lines.is_empty() {
            return Err(CheckoutError::EmptyCart);
        }
        let mut items = Vec::with_capacity(lines.len());
        for line in lines {
            let price = adjust_price(line.list_price, customer.price_multiplier)?;
            // The snapshot must stay legible after the catalog changes, so the variant is folded into the name.
            let product_name = match &line.variant_name {
                Some(variant) => format!("{} ({variant})", line.product_name),
                None => line.product_name,
            };
            items.push(NewOrderItem {
                product_id: line.product_id,
                product_variant_id: line.product_variant_id,
                product_name,
                quantity: line.quantity,
                price,
            });
        }
        let total = items.iter().filter_map(|i| i.price.map(|p| p * i.quantity)).sum();
        let new_order = NewOrder {
            order_number: checkout.order_number,
            customer_id: customer.id,
            email: checkout.email,
            phone: checkout.phone,
            notes: checkout.notes,
            total,
            delivery_address_id: checkout.delivery_address_id,
            billing_address_id: checkout.billing_address_id,
        };
        let order = orders::insert_order(new_order, &mut tx).await?;
        let items = orders::insert_order_items(order.id, items, &mut tx).await?;
        carts::clear_cart(&cart, &mut tx).await?;
        let delivery_address = addresses::fetch_address(order.delivery_address_id, &mut tx)
            .await?
            .ok_or(CheckoutError::AddressError(AddressApiError::InvalidAddress))?;
        let billing_address = match order.billing_address_id {
            Some(id) => addresses::fetch_address(id, &mut tx).await?,
            None => None,
        };
        tx.commit().await?;
        debug!(
            "🗃️ Cart #{cart_id} became order [{}] ({} lines, total {})",
            order.order_number,
            items.len(),
            order.total
        );
        Ok(CompleteOrder { order, items, delivery_address, billing_address })
    }

    /// Sets an item's final per-unit price and recomputes the order total in the same transaction.
    async fn finalize_item_price(
        &self,
        number: &OrderNumber,
        item_id: i64,
        price: Money,
    ) -> Result<CompleteOrder, CheckoutError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_number(number, &mut tx)
            .await?
            .ok_or_else(|| CheckoutError::OrderNotFound(number.clone()))?;
        orders::set_item_price(order.id, item_id, price, &mut tx)
            .await?
            .ok_or_else(|| CheckoutError::ItemNotFound { order: number.clone(), item_id })?;
        let order = orders::recompute_total(order.id, &mut tx).await?;
        let items = orders::fetch_order_items(order.id, &mut tx).await?;
        let delivery_address = addresses::fetch_address(order.delivery_address_id, &mut tx)
            .await?
            .ok_or(CheckoutError::AddressError(AddressApiError::InvalidAddress))?;
        let billing_address = match order.billing_address_id {
            Some(id) => addresses::fetch_address(id, &mut tx).await?,
            None => None,
        };
        tx.commit().await?;
        debug!("🗃️ Order {number}: item #{item_id} priced at {price}, total recomputed to {}", order.total);
        Ok(CompleteOrder { order, items, delivery_address, billing_address })
    }

    /// Moves an order along its lifecycle, enforcing the transition table before anything is written.
    async fn update_order_status(
        &self,
        number: &OrderNumber,
        new_status: OrderStatusType,
    ) -> Result<StatusChange, CheckoutError> {
        let mut tx = self.pool.begin().await?;
        let order = orders::fetch_order_by_number(number, &mut tx)
            .await?
            .ok_or_else(|| CheckoutError::OrderNotFound(number.clone()))?;
        let old_status = order.status;
        if !old_status.can_transition_to(new_status) {
            info!("🗃️ Order {number} cannot move from {old_status} to {new_status}");
            return Err(CheckoutError::InvalidTransition { from: old_status, to: new_status });
        }
        let order = orders::update_order_status(order.id, new_status, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Order {number} moved from {old_status} to {new_status}");
        Ok(StatusChange::new(old_status, order))
    }

    async fn close(&mut self) -> Result<(), CheckoutError> {
        self.pool.close().await;
        Ok(())
    }
}

impl OrderManagement for SqliteDatabase {
    async fn fetch_order(&self, number: &OrderNumber) -> Result<Option<Order>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_by_number(number, &mut conn).await
    }

    async fn fetch_order_items(&self, order_id: i64) -> Result<Vec<OrderItem>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        orders::fetch_order_items(order_id, &mut conn).await
    }

    async fn fetch_complete_order(&self, number: &OrderNumber) -> Result<Option<CompleteOrder>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let Some(order) = orders::fetch_order_by_number(number, &mut conn).await? else {
            return Ok(None);
        };
        let items = orders::fetch_order_items(order.id, &mut conn).await?;
        let delivery_address = addresses::fetch_address(order.delivery_address_id, &mut conn)
            .await
            .map_err(|e| OrderApiError::DatabaseError(e.to_string()))?
            .ok_or_else(|| {
                OrderApiError::DatabaseError(format!("Order {number} references a missing delivery address"))
            })?;
        let billing_address = match order.billing_address_id {
            Some(id) => addresses::fetch_address(id, &mut conn)
                .await
                .map_err(|e| OrderApiError::DatabaseError(e.to_string()))?,
            None => None,
        };
        Ok(Some(CompleteOrder { order, items, delivery_address, billing_address }))
    }

    async fn orders_for_customer(&self, customer_id: i64) -> Result<Vec<Order>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        orders::orders_for_customer(customer_id, &mut conn).await
    }

    async fn search_orders(&self, query: OrderQueryFilter) -> Result<Vec<Order>, OrderApiError> {
        let mut conn = self.pool.acquire().await?;
        let orders = orders::search_orders(query, &mut conn).await?;
        Ok(orders)
    }
}

impl CartManagement for SqliteDatabase {
    async fn active_cart(&self, customer_id: i64) -> Result<Cart, CartApiError> {
        let mut conn = self.pool.acquire().await?;
        carts::active_cart(customer_id, &mut conn).await
    }

    async fn create_draft_cart(&self, customer_id: i64) -> Result<Cart, CartApiError> {
        let mut conn = self.pool.acquire().await?;
        carts::create_draft_cart(customer_id, &mut conn).await
    }

    async fn fetch_cart(&self, cart_id: i64) -> Result<Option<Cart>, CartApiError> {
        let mut conn = self.pool.acquire().await?;
        carts::fetch_cart(cart_id, &mut conn).await
    }

    async fn cart_contents(&self, cart_id: i64) -> Result<CartContents, CartApiError> {
        let mut conn = self.pool.acquire().await?;
        let cart = carts::fetch_cart(cart_id, &mut conn).await?.ok_or(CartApiError::CartNotFound(cart_id))?;
        let lines = carts::cart_lines(cart_id, &mut conn).await?;
        Ok(CartContents { cart, lines })
    }

    /// The read-merge-write runs inside a transaction so two simultaneous adds of the same product settle as one
    /// merged line.
    async fn upsert_cart_item(&self, cart_id: i64, item: NewCartItem) -> Result<CartItem, CartApiError> {
        let mut tx = self.pool.begin().await?;
        if carts::fetch_cart(cart_id, &mut tx).await?.is_none() {
            return Err(CartApiError::CartNotFound(cart_id));
        }
        let line = carts::upsert_cart_item(cart_id, item, &mut tx).await?;
        tx.commit().await?;
        Ok(line)
    }

    async fn remove_cart_item(&self, cart_id: i64, item_id: i64) -> Result<(), CartApiError> {
        let mut conn = self.pool.acquire().await?;
        carts::remove_cart_item(cart_id, item_id, &mut conn).await
    }
}

impl AddressManagement for SqliteDatabase {
    async fn insert_address(
        &self,
        customer_id: i64,
        address: NewAddress,
        is_default: bool,
    ) -> Result<Address, AddressApiError> {
        let mut tx = self.pool.begin().await?;
        // The first address in an empty book is the default whether or not the caller asked.
        let make_default = is_default || addresses::count_addresses(customer_id, &mut tx).await? == 0;
        if make_default {
            addresses::clear_default(customer_id, &mut tx).await?;
        }
        let address = addresses::insert_address(Some(customer_id), address, make_default, &mut tx).await?;
        tx.commit().await?;
        debug!("🗃️ Stored address #{} for customer #{customer_id} (default: {make_default})", address.id);
        Ok(address)
    }

    async fn insert_unowned_address(&self, address: NewAddress) -> Result<Address, AddressApiError> {
        let mut conn = self.pool.acquire().await?;
        let address = addresses::insert_address(None, address, false, &mut conn).await?;
        debug!("🗃️ Stored one-off address #{}", address.id);
        Ok(address)
    }

    async fn fetch_address(&self, address_id: i64) -> Result<Option<Address>, AddressApiError> {
        let mut conn = self.pool.acquire().await?;
        addresses::fetch_address(address_id, &mut conn).await
    }

    async fn addresses_for_customer(&self, customer_id: i64) -> Result<Vec<Address>, AddressApiError> {
        let mut conn = self.pool.acquire().await?;
        addresses::addresses_for_customer(customer_id, &mut conn).await
    }

    async fn delete_address(
        &self,
        address_id: i64,
        customer_id: i64,
    ) -> Result<AddressDeleteOutcome, AddressApiError> {
        let mut tx = self.pool.begin().await?;
        let address = addresses::fetch_customer_address(address_id, customer_id, &mut tx)
            .await?
            .ok_or(AddressApiError::InvalidAddress)?;
        let references = addresses::order_reference_count(address_id, &mut tx).await?;
        let outcome = if references > 0 {
            addresses::unlink_address(address_id, &mut tx).await?;
            AddressDeleteOutcome::Unlinked
        } else {
            addresses::delete_address_row(address_id, &mut tx).await?;
            let mut promoted_default = None;
            if address.is_default {
                let remaining = addresses::addresses_for_customer(customer_id, &mut tx).await?;
                if let [survivor] = remaining.as_slice() {
                    addresses::mark_default(survivor.id, &mut tx).await?;
                    promoted_default = Some(survivor.id);
                }
            }
            AddressDeleteOutcome::Deleted { promoted_default }
        };
        tx.commit().await?;
        debug!("🗃️ Address #{address_id} removed from customer #{customer_id}'s book: {outcome:?}");
        Ok(outcome)
    }

    async fn set_default_address(&self, address_id: i64, customer_id: i64) -> Result<Address, AddressApiError> {
        let mut tx = self.pool.begin().await?;
        if addresses::fetch_customer_address(address_id, customer_id, &mut tx).await?.is_none() {
            return Err(AddressApiError::InvalidAddress);
        }
        // Clear-then-set in one transaction, so readers never observe zero or two defaults.
        addresses::clear_default(customer_id, &mut tx).await?;
        let address = addresses::mark_default(address_id, &mut tx).await?.ok_or(AddressApiError::InvalidAddress)?;
        tx.commit().await?;
        Ok(address)
    }
}

impl CustomerManagement for SqliteDatabase {
    async fn fetch_customer(&self, customer_id: i64) -> Result<Option<Customer>, CustomerApiError> {
        let mut conn = self.pool.acquire().await?;
        customers::fetch_customer(customer_id, &mut conn).await
    }

    async fn fetch_customer_by_email(&self, email: &str) -> Result<Option<Customer>, CustomerApiError> {
        let mut conn = self.pool.acquire().await?;
        customers::fetch_customer_by_email(email, &mut conn).await
    }

    async fn insert_customer(&self, customer: NewCustomer) -> Result<Customer, CustomerApiError> {
        let mut conn = self.pool.acquire().await?;
        customers::insert_customer(customer, &mut conn).await
    }

    async fn set_approved(&self, customer_id: i64, approved: bool) -> Result<Customer, CustomerApiError> {
        let mut conn = self.pool.acquire().await?;
        customers::set_approved(customer_id, approved, &mut conn).await
    }

    async fn set_price_multiplier(
        &self,
        customer_id: i64,
        multiplier: PriceMultiplier,
    ) -> Result<Customer, CustomerApiError> {
        let mut conn = self.pool.acquire().await?;
        customers::set_price_multiplier(customer_id, multiplier, &mut conn).await
    }

    async fn set_role(&self, customer_id: i64, role: Role) -> Result<Customer, CustomerApiError> {
        let mut conn = self.pool.acquire().await?;
        customers::set_role(customer_id, role, &mut conn).await
    }
}

impl SequenceSource for SqliteDatabase {
    async fn next_order_number(&self) -> Result<OrderNumber, SequenceError> {
        let mut conn = self.pool.acquire().await?;
        let value = sequence::next_value(&mut conn).await?;
        Ok(OrderNumber::from_sequence(value))
    }
}

impl SqliteDatabase {
    /// Creates a new database API object
    pub async fn new(max_connections: u32) -> Result<Self, sqlx::Error> {
        let url = db_url();
        SqliteDatabase::new_with_url(url.as_str(), max_connections).await
    }

    pub async fn new_with_url(url: &str, max_connections: u32) -> Result<Self, sqlx::Error> {
        trace!("Creating new database connection pool with url {url}");
        let pool = new_pool(url, max_connections).await?;
        let url = url.to_string();
        Ok(Self { url, pool })
    }

    /// Returns a reference to the database connection pool.
    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Raises the order-number counter to at least the highest number already stored. Run this once at startup so
    /// legacy or imported orders can never clash with freshly minted numbers.
    pub async fn reconcile_order_sequence(&self) -> Result<i64, SequenceError> {
        let mut conn = self.pool.acquire().await?;
        sequence::reconcile(&mut conn).await
    }
}
