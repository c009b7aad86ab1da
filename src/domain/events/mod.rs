//! Domain events
use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::OrderStatus;

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "aggregate", rename_all = "camelCase")]
pub enum DomainEvent {
    User(UserEvent),
    Order(OrderEvent),
}

impl DomainEvent {
    /// Bus subject suffix, e.g. `order.paid`.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::User(UserEvent::Registered { .. }) => "user.registered",
            Self::Order(OrderEvent::Placed { .. }) => "order.placed",
            Self::Order(OrderEvent::Paid { .. }) => "order.paid",
            Self::Order(OrderEvent::PaymentFailed { .. }) => "order.payment_failed",
            Self::Order(OrderEvent::Cancelled { .. }) => "order.cancelled",
            Self::Order(OrderEvent::StatusChanged { .. }) => "order.status_changed",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum UserEvent {
    Registered { user_id: Uuid },
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum OrderEvent {
    Placed { order_id: Uuid, order_number: String, user_id: Uuid },
    Paid { order_id: Uuid },
    PaymentFailed { order_id: Uuid },
    Cancelled { order_id: Uuid },
    StatusChanged { order_id: Uuid, status: OrderStatus },
}
