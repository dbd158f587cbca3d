//! Sales tax for orders.
//!
//! The business is launched in a single jurisdiction: orders are taxed at the flat California statewide rate no
//! matter where they ship. This is a deliberate business rule, not an oversight. The delivery state is inspected
//! only to log out-of-state shipments. District taxes are not modelled.

use log::debug;
use pbw_common::Money;
use serde::Serialize;

/// 7.25%, the California statewide rate, in basis points of unity.
pub const CA_SALES_TAX_BASIS_POINTS: i64 = 725;
pub const CA_TAX_LABEL: &str = "CA 7.25%";

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TaxSummary {
    pub tax: Money,
    pub is_california: bool,
    pub tax_label: String,
}

pub fn is_california(state: &str) -> bool {
    let state = state.trim();
    state.eq_ignore_ascii_case("CA") || state.eq_ignore_ascii_case("California")
}

/// Tax due on an order subtotal. Always the California rate, whatever the delivery state says.
///
/// The subtotal only includes resolved line prices, so a market-priced line starts contributing tax once an admin
/// finalises it and the order total is recomputed.
pub fn compute_order_tax(subtotal: Money, delivery_state: &str) -> TaxSummary {
    if !is_california(delivery_state) {
        debug!("💸️ Out-of-state delivery ({delivery_state}) still taxed at the flat {CA_TAX_LABEL} rate");
    }
    TaxSummary {
        tax: subtotal.scaled_by_basis_points(CA_SALES_TAX_BASIS_POINTS),
        is_california: true,
        tax_label: CA_TAX_LABEL.to_string(),
    }
}
