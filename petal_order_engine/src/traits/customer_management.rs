use pbw_common::MultiplierRangeError;
use thiserror::Error;

use crate::db_types::{Customer, NewCustomer, PriceMultiplier, Role};

#[derive(Debug, Clone, Error)]
pub enum CustomerApiError {
    #[error("Database error: {0}")]
    DatabaseError(String),
    #[error("The requested customer id {0} does not exist")]
    CustomerNotFound(i64),
    #[error("A customer with email {0} already exists")]
    CustomerAlreadyExists(String),
    #[error("{0}")]
    MultiplierOutOfRange(#[from] MultiplierRangeError),
}

impl From<sqlx::Error> for CustomerApiError {
    fn from(e: sqlx::Error) -> Self {
        CustomerApiError::DatabaseError(e.to_string())
    }
}

/// Storage contract for customer records.
///
/// Customers are created at signup and then mutated exclusively through the admin operations here: approval,
/// role changes, and the per-customer price multiplier. The session gateway authenticates callers, but the facts it
/// needs (role, approval, multiplier) always come from this store.
#[allow(async_fn_in_trait)]
pub trait CustomerManagement {
    async fn fetch_customer(&self, customer_id: i64) -> Result<Option<Customer>, CustomerApiError>;

    async fn fetch_customer_by_email(&self, email: &str) -> Result<Option<Customer>, CustomerApiError>;

    /// Creates a new customer record. New customers start unapproved, with the `Customer` role and an identity
    /// price multiplier.
    async fn insert_customer(&self, customer: NewCustomer) -> Result<Customer, CustomerApiError>;

    /// Sets the approval flag. Unapproved customers can browse and fill carts but cannot check out.
    async fn set_approved(&self, customer_id: i64, approved: bool) -> Result<Customer, CustomerApiError>;

    /// Replaces the customer's price multiplier. The new value applies to future cart views and checkouts; existing
    /// orders keep the prices they were created with.
    async fn set_price_multiplier(
        &self,
        customer_id: i64,
        multiplier: PriceMultiplier,
    ) -> Result<Customer, CustomerApiError>;

    async fn set_role(&self, customer_id: i64, role: Role) -> Result<Customer, CustomerApiError>;
}
