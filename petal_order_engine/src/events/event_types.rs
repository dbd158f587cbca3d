use serde::{Deserialize, Serialize};

use crate::db_types::{Order, OrderStatusType};

/// Fired once per successful checkout, after the transaction has committed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderCreatedEvent {
    pub order: Order,
}

impl OrderCreatedEvent {
    pub fn new(order: Order) -> Self {
        Self { order }
    }
}

/// Fired whenever an order moves along its lifecycle, including cancellations.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderStatusChangedEvent {
    pub old_status: OrderStatusType,
    pub order: Order,
}

impl OrderStatusChangedEvent {
    pub fn new(old_status: OrderStatusType, order: Order) -> Self {
        Self { old_status, order }
    }

    pub fn is_cancellation(&self) -> bool {
        self.order.status == OrderStatusType::Cancelled
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum EventType {
    OrderCreated(OrderCreatedEvent),
    OrderStatusChanged(OrderStatusChangedEvent),
}
