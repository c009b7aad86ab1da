//! Side effects of domain events: bus publication and customer messages.

use std::sync::Arc;

use uuid::Uuid;

use crate::domain::aggregates::OrderStatus;
use crate::domain::events::{DomainEvent, OrderEvent, UserEvent};
use crate::domain::value_objects::Phone;
use crate::notify::{templates, Messenger};
use crate::store::{OrderRepository, UserRepository};

/// Handles events drained from aggregates after they were persisted.
///
/// Failures here are logged and swallowed; the write that raised the event
/// has already succeeded.
pub struct Dispatcher {
    users: Arc<dyn UserRepository>,
    orders: Arc<dyn OrderRepository>,
    messenger: Arc<dyn Messenger>,
    nats: Option<async_nats::Client>,
}

impl Dispatcher {
    pub fn new(
        users: Arc<dyn UserRepository>,
        orders: Arc<dyn OrderRepository>,
        messenger: Arc<dyn Messenger>,
        nats: Option<async_nats::Client>,
    ) -> Self {
        Self { users, orders, messenger, nats }
    }

    pub async fn dispatch(&self, events: Vec<DomainEvent>) {
        for event in events {
            self.publish(&event).await;
            self.notify(&event).await;
        }
    }

    async fn publish(&self, event: &DomainEvent) {
        let Some(nats) = &self.nats else { return };
        let subject = format!("scentfix.{}", event.kind());
        let payload = match serde_json::to_vec(event) {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!(error = %e, %subject, "Failed to encode event");
                return;
            }
        };
        if let Err(e) = nats.publish(subject.clone(), payload.into()).await {
            tracing::warn!(error = %e, %subject, "Failed to publish event");
        }
    }

    async fn notify(&self, event: &DomainEvent) {
        match event {
            DomainEvent::User(UserEvent::Registered { user_id }) => self.welcome(*user_id).await,
            DomainEvent::Order(OrderEvent::Paid { order_id }) => self.order_message(*order_id, None).await,
            DomainEvent::Order(OrderEvent::StatusChanged { order_id, status }) if status.notifies_customer() => {
                self.order_message(*order_id, Some(*status)).await;
            }
            _ => {}
        }
    }

    async fn welcome(&self, user_id: Uuid) {
        match self.users.find_by_id(user_id).await {
            Ok(Some(user)) => self.send(user.phone(), &templates::welcome(&user), "welcome").await,
            Ok(None) => tracing::warn!(%user_id, "Registered user vanished before welcome message"),
            Err(e) => tracing::warn!(error = %e, %user_id, "Failed to load user for welcome message"),
        }
    }

    /// Order confirmation when `status` is `None`, status update otherwise.
    async fn order_message(&self, order_id: Uuid, status: Option<OrderStatus>) {
        let order = match self.orders.find(order_id).await {
            Ok(Some(order)) => order,
            Ok(None) => {
                tracing::warn!(%order_id, "Order not found for notification");
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, %order_id, "Failed to load order for notification");
                return;
            }
        };
        let customer = match self.users.find_by_id(order.user_id()).await {
            Ok(Some(user)) => user,
            Ok(None) => {
                tracing::warn!(%order_id, "Order owner not found for notification");
                return;
            }
            Err(e) => {
                tracing::warn!(error = %e, %order_id, "Failed to load order owner");
                return;
            }
        };
        match status {
            None => {
                let text = templates::order_confirmation(&customer, &order);
                self.send(customer.phone(), &text, "order confirmation").await;
            }
            Some(status) => {
                let text = templates::status_update(&customer, &order, status);
                self.send(customer.phone(), &text, "status update").await;
            }
        }
    }

    async fn send(&self, to: &Phone, text: &str, kind: &'static str) {
        match self.messenger.send(to, text).await {
            Ok(()) => tracing::info!(kind, "WhatsApp message sent"),
            Err(e) => tracing::warn!(error = %e, kind, "WhatsApp message failed"),
        }
    }
}
