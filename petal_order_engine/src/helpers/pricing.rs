//! Price adjustment rules.
//!
//! Wholesale customers each carry a price multiplier that scales every catalog price quoted to them. The rules are
//! small but they are the money-critical core of the store, so they live here in one place rather than being spread
//! through the query layer.

use pbw_common::{Money, PriceMultiplier};
use thiserror::Error;

/// A negative list price is always corrupt data, never a discount. It must be surfaced, not scaled.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("Prices cannot be negative. Got {0}")]
pub struct NegativePriceError(pub Money);

/// Normalises the catalog's market-price convention. A missing price and a zero price both mean "market price":
/// the item sells at a rate only known at fulfilment time.
pub fn effective_list_price(list_price: Option<Money>) -> Option<Money> {
    list_price.filter(|p| *p != Money::ZERO)
}

/// The per-unit price a customer actually pays for an item: the catalog price scaled by the customer's multiplier,
/// rounded half-up to the nearest cent.
///
/// Market-priced items have no list price to scale, so they stay `None` and are finalised by an admin after
/// checkout. Multiplier bounds are enforced when the [`PriceMultiplier`] is constructed, so the only rejection left
/// to make here is a negative list price.
pub fn adjust_price(
    list_price: Option<Money>,
    multiplier: PriceMultiplier,
) -> Result<Option<Money>, NegativePriceError> {
    if let Some(price) = list_price {
        if price.is_negative() {
            return Err(NegativePriceError(price));
        }
    }
    Ok(effective_list_price(list_price).map(|p| p.scaled_by_basis_points(multiplier.basis_points())))
}
