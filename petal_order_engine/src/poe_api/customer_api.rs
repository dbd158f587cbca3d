//! Customer records and the admin levers on them.

use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Customer, NewCustomer, PriceMultiplier, Role},
    traits::{CustomerApiError, CustomerManagement},
};

pub struct CustomerApi<B> {
    db: B,
}

impl<B: Debug> Debug for CustomerApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CustomerApi ({:?})", self.db)
    }
}

impl<B> CustomerApi<B>
where B: CustomerManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    pub async fn customer_by_id(&self, customer_id: i64) -> Result<Option<Customer>, CustomerApiError> {
        self.db.fetch_customer(customer_id).await
    }

    pub async fn customer_by_email(&self, email: &str) -> Result<Option<Customer>, CustomerApiError> {
        self.db.fetch_customer_by_email(email).await
    }

    /// Registers a new customer. They start unapproved, with the `Customer` role and an identity multiplier, and
    /// must be approved by an admin before they can check out.
    pub async fn register(&self, customer: NewCustomer) -> Result<Customer, CustomerApiError> {
        let customer = self.db.insert_customer(customer).await?;
        info!("🧑️ New customer #{} registered ({})", customer.id, customer.email);
        Ok(customer)
    }

    pub async fn set_approved(&self, customer_id: i64, approved: bool) -> Result<Customer, CustomerApiError> {
        let customer = self.db.set_approved(customer_id, approved).await?;
        info!("🧑️ Customer #{customer_id} approval set to {approved}");
        Ok(customer)
    }

    /// Replaces the customer's price multiplier. Applies to future pricing only; existing orders keep their prices.
    pub async fn set_price_multiplier(
        &self,
        customer_id: i64,
        multiplier: PriceMultiplier,
    ) -> Result<Customer, CustomerApiError> {
        let customer = self.db.set_price_multiplier(customer_id, multiplier).await?;
        info!("🧑️ Customer #{customer_id} price multiplier set to {multiplier}");
        Ok(customer)
    }

    pub async fn set_role(&self, customer_id: i64, role: Role) -> Result<Customer, CustomerApiError> {
        let customer = self.db.set_role(customer_id, role).await?;
        info!("🧑️ Customer #{customer_id} role set to {role}");
        Ok(customer)
    }
}
