//! Address book management and checkout address resolution.

use std::fmt::Debug;

use log::*;

use crate::{
    db_types::{Address, Customer, NewAddress},
    order_objects::AddressSelection,
    traits::{AddressApiError, AddressDeleteOutcome, AddressManagement},
};

pub struct AddressApi<B> {
    db: B,
}

impl<B: Debug> Debug for AddressApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "AddressApi ({:?})", self.db)
    }
}

impl<B> AddressApi<B>
where B: AddressManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// The customer's address book, default first.
    pub async fn addresses_for(&self, customer_id: i64) -> Result<Vec<Address>, AddressApiError> {
        self.db.addresses_for_customer(customer_id).await
    }

    pub async fn address_by_id(&self, address_id: i64) -> Result<Option<Address>, AddressApiError> {
        self.db.fetch_address(address_id).await
    }

    /// Adds an address to the customer's book. The first address a customer saves becomes their default
    /// automatically.
    pub async fn create_address(
        &self,
        customer_id: i64,
        address: NewAddress,
        make_default: bool,
    ) -> Result<Address, AddressApiError> {
        validate(&address)?;
        let address = self.db.insert_address(customer_id, address, make_default).await?;
        debug!("🏠️ Customer #{customer_id} saved address #{}", address.id);
        Ok(address)
    }

    /// Removes an address from the customer's book. Addresses that past orders reference are unlinked rather than
    /// deleted, so order history stays intact.
    pub async fn delete_address(
        &self,
        customer_id: i64,
        address_id: i64,
    ) -> Result<AddressDeleteOutcome, AddressApiError> {
        let outcome = self.db.delete_address(address_id, customer_id).await?;
        match &outcome {
            AddressDeleteOutcome::Unlinked => {
                debug!("🏠️ Address #{address_id} is referenced by orders; unlinked from customer #{customer_id}")
            },
            AddressDeleteOutcome::Deleted { promoted_default } => {
                debug!("🏠️ Address #{address_id} deleted for customer #{customer_id}");
                if let Some(promoted) = promoted_default {
                    debug!("🏠️ Address #{promoted} is the new default for customer #{customer_id}");
                }
            },
        }
        Ok(outcome)
    }

    pub async fn set_default(&self, customer_id: i64, address_id: i64) -> Result<Address, AddressApiError> {
        self.db.set_default_address(address_id, customer_id).await
    }

    /// Resolves the delivery selection made at checkout to a stored address.
    ///
    /// An existing address must belong to the customer placing the order; an unknown id and someone else's id are
    /// indistinguishable from the caller's point of view. A new address is stored first, either into the customer's
    /// book (`save`) or as an unowned one-off.
    pub async fn resolve_delivery_address(
        &self,
        customer: &Customer,
        selection: &AddressSelection,
    ) -> Result<Address, AddressApiError> {
        match selection {
            AddressSelection::Existing(address_id) => {
                let address =
                    self.db.fetch_address(*address_id).await?.ok_or(AddressApiError::InvalidAddress)?;
                if address.customer_id != Some(customer.id) {
                    warn!(
                        "🏠️ Customer #{} tried to deliver to address #{address_id}, which is not theirs",
                        customer.id
                    );
                    return Err(AddressApiError::InvalidAddress);
                }
                Ok(address)
            },
            AddressSelection::New { address, save } => {
                validate(address)?;
                if *save {
                    self.db.insert_address(customer.id, address.clone(), false).await
                } else {
                    self.db.insert_unowned_address(address.clone()).await
                }
            },
        }
    }

    /// Stores the optional one-off billing address captured at checkout. Billing addresses never enter the address
    /// book.
    pub async fn resolve_billing_address(
        &self,
        billing: Option<&NewAddress>,
    ) -> Result<Option<Address>, AddressApiError> {
        match billing {
            Some(address) => {
                validate(address)?;
                let stored = self.db.insert_unowned_address(address.clone()).await?;
                Ok(Some(stored))
            },
            None => Ok(None),
        }
    }
}

fn validate(address: &NewAddress) -> Result<(), AddressApiError> {
    let missing = address.missing_fields();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(AddressApiError::MissingFields(missing))
    }
}
