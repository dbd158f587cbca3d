use thiserror::Error;

use crate::db_types::OrderNumber;

#[derive(Debug, Clone, Error)]
pub enum SequenceError {
    #[error("Database error: {0}")]
    DatabaseError(String),
}

impl From<sqlx::Error> for SequenceError {
    fn from(e: sqlx::Error) -> Self {
        SequenceError::DatabaseError(e.to_string())
    }
}

/// Mints order numbers.
///
/// Checkout draws a number from this trait rather than deriving one itself, so the numbering scheme can be swapped
/// (or pointed at a coordinating service) without touching the checkout flow. Implementations must never hand the
/// same number to two callers, no matter how many checkouts run concurrently. Numbers drawn for checkouts that
/// subsequently fail are simply skipped; gaps in the sequence are fine, duplicates are not.
#[allow(async_fn_in_trait)]
pub trait SequenceSource {
    async fn next_order_number(&self) -> Result<OrderNumber, SequenceError>;
}
