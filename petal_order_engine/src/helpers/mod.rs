mod order_number;
mod pricing;
mod tax;

pub use order_number::sequence_from_number;
pub use pricing::{adjust_price, effective_list_price, NegativePriceError};
pub use tax::{compute_order_tax, is_california, TaxSummary, CA_SALES_TAX_BASIS_POINTS, CA_TAX_LABEL};
