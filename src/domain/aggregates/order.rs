//! Order Aggregate

use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;

use crate::domain::events::{DomainEvent, OrderEvent};
use crate::domain::payment::{GatewayReport, Resolution};
use crate::domain::value_objects::{Money, MoneyError, IDR};

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub(crate) id: Uuid,
    pub(crate) order_number: String,
    pub(crate) user_id: Uuid,
    pub(crate) items: Vec<OrderItem>,
    pub(crate) total_amount: Money,
    pub(crate) status: OrderStatus,
    pub(crate) payment_status: PaymentStatus,
    pub(crate) payment_token: Option<String>,
    pub(crate) payment_url: Option<String>,
    pub(crate) transaction_status: Option<String>,
    pub(crate) fraud_status: Option<String>,
    pub(crate) shipping_address: String,
    pub(crate) created_at: DateTime<Utc>,
    pub(crate) updated_at: DateTime<Utc>,
    #[serde(skip)]
    pub(crate) events: Vec<DomainEvent>,
}

/// Snapshot of a product at the time the order was placed.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub product_id: Uuid,
    pub name: String,
    pub price: Money,
    pub quantity: u32,
    pub image: Option<String>,
}

impl OrderItem {
    pub fn line_total(&self) -> Money { self.price.multiply(self.quantity) }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OrderStatus {
    #[default]
    #[serde(rename = "pending")]
    Pending,
    #[serde(rename = "being processed")]
    BeingProcessed,
    #[serde(rename = "shipped")]
    Shipped,
    #[serde(rename = "delivered")]
    Delivered,
    #[serde(rename = "cancelled")]
    Cancelled,
}

impl OrderStatus {
    pub const ALL: [OrderStatus; 5] = [Self::Pending, Self::BeingProcessed, Self::Shipped, Self::Delivered, Self::Cancelled];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::BeingProcessed => "being processed",
            Self::Shipped => "shipped",
            Self::Delivered => "delivered",
            Self::Cancelled => "cancelled",
        }
    }

    /// Statuses the customer hears about when an admin moves the order.
    pub fn notifies_customer(&self) -> bool {
        matches!(self, Self::BeingProcessed | Self::Shipped | Self::Delivered)
    }
}

impl FromStr for OrderStatus {
    type Err = OrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|st| st.as_str() == s).ok_or(OrderError::InvalidStatus)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PaymentStatus {
    #[default]
    Pending,
    Paid,
    Failed,
    Cancelled,
}

impl PaymentStatus {
    pub const ALL: [PaymentStatus; 4] = [Self::Pending, Self::Paid, Self::Failed, Self::Cancelled];

    pub fn as_str(&self) -> &'static str {
        match self { Self::Pending => "pending", Self::Paid => "paid", Self::Failed => "failed", Self::Cancelled => "cancelled" }
    }
}

impl FromStr for PaymentStatus {
    type Err = OrderError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL.into_iter().find(|st| st.as_str() == s).ok_or(OrderError::InvalidStatus)
    }
}

/// Result of feeding a gateway report to an order.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PaymentOutcome {
    /// The order just became paid; settlement side effects are due.
    Settled,
    Failed,
    Unchanged,
}

impl Order {
    pub fn place(user_id: Uuid, items: Vec<OrderItem>, shipping_address: impl Into<String>) -> Result<Self, OrderError> {
        if items.is_empty() { return Err(OrderError::NoItems); }
        let lines: Vec<Money> = items.iter().map(OrderItem::line_total).collect();
        let total_amount = Money::sum(IDR, &lines)?;
        let now = Utc::now();
        let id = Uuid::now_v7();
        let order_number = format!("SF-{}{:03}", now.timestamp_millis(), rand::thread_rng().gen_range(0..1000));
        let mut order = Self {
            id, order_number: order_number.clone(), user_id, items, total_amount,
            status: OrderStatus::Pending, payment_status: PaymentStatus::Pending,
            payment_token: None, payment_url: None, transaction_status: None, fraud_status: None,
            shipping_address: shipping_address.into(), created_at: now, updated_at: now, events: vec![],
        };
        order.raise_event(DomainEvent::Order(OrderEvent::Placed { order_id: id, order_number, user_id }));
        Ok(order)
    }

    pub fn id(&self) -> Uuid { self.id }
    pub fn order_number(&self) -> &str { &self.order_number }
    pub fn user_id(&self) -> Uuid { self.user_id }
    pub fn items(&self) -> &[OrderItem] { &self.items }
    pub fn total_amount(&self) -> &Money { &self.total_amount }
    pub fn status(&self) -> OrderStatus { self.status }
    pub fn payment_status(&self) -> PaymentStatus { self.payment_status }
    pub fn transaction_status(&self) -> Option<&str> { self.transaction_status.as_deref() }
    pub fn fraud_status(&self) -> Option<&str> { self.fraud_status.as_deref() }
    pub fn shipping_address(&self) -> &str { &self.shipping_address }
    pub fn created_at(&self) -> DateTime<Utc> { self.created_at }
    pub fn is_owned_by(&self, user_id: Uuid) -> bool { self.user_id == user_id }
    pub fn is_paid(&self) -> bool { self.payment_status == PaymentStatus::Paid }

    /// Checks that a payment can still be started for this order.
    pub fn ensure_payable(&self) -> Result<(), OrderError> {
        match (self.payment_status, self.status) {
            (PaymentStatus::Paid, _) => Err(OrderError::AlreadyPaid),
            (_, OrderStatus::Cancelled) => Err(OrderError::Cancelled),
            _ => Ok(()),
        }
    }

    pub fn attach_payment(&mut self, token: impl Into<String>, redirect_url: impl Into<String>) {
        self.payment_token = Some(token.into());
        self.payment_url = Some(redirect_url.into());
        self.touch();
    }

    /// Customer-initiated cancellation; only before anything happened to the order.
    pub fn cancel(&mut self) -> Result<(), OrderError> {
        if self.status != OrderStatus::Pending { return Err(OrderError::CannotCancel); }
        self.status = OrderStatus::Cancelled;
        self.payment_status = PaymentStatus::Cancelled;
        self.touch();
        self.raise_event(DomainEvent::Order(OrderEvent::Cancelled { order_id: self.id }));
        Ok(())
    }

    /// Back-office status change. Any status may be set.
    pub fn set_status(&mut self, status: OrderStatus) {
        self.status = status;
        self.touch();
        self.raise_event(DomainEvent::Order(OrderEvent::StatusChanged { order_id: self.id, status }));
    }

    /// Applies a gateway transaction report. A paid order is never moved again.
    pub fn apply_report(&mut self, report: &GatewayReport) -> PaymentOutcome {
        if self.is_paid() { return PaymentOutcome::Unchanged; }
        match report.resolve() {
            Resolution::Paid => {
                self.payment_status = PaymentStatus::Paid;
                self.status = OrderStatus::BeingProcessed;
                self.record(report);
                self.raise_event(DomainEvent::Order(OrderEvent::Paid { order_id: self.id }));
                PaymentOutcome::Settled
            }
            Resolution::Failed if self.payment_status != PaymentStatus::Failed => {
                self.payment_status = PaymentStatus::Failed;
                self.status = OrderStatus::Cancelled;
                self.record(report);
                self.raise_event(DomainEvent::Order(OrderEvent::PaymentFailed { order_id: self.id }));
                PaymentOutcome::Failed
            }
            Resolution::Failed | Resolution::Pending => PaymentOutcome::Unchanged,
        }
    }

    fn record(&mut self, report: &GatewayReport) {
        self.transaction_status = Some(report.transaction_status.as_str().to_string());
        self.fraud_status = report.fraud_status.clone();
        self.touch();
    }

    pub fn take_events(&mut self) -> Vec<DomainEvent> { std::mem::take(&mut self.events) }
    fn raise_event(&mut self, e: DomainEvent) { self.events.push(e); }
    fn touch(&mut self) { self.updated_at = Utc::now(); }
}

#[derive(Debug, Clone, PartialEq, Eq)] pub enum OrderError { NoItems, CannotCancel, AlreadyPaid, Cancelled, InvalidStatus, Currency }
impl std::error::Error for OrderError {}
impl std::fmt::Display for OrderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoItems => write!(f, "No valid items in cart"),
            Self::CannotCancel => write!(f, "Cannot cancel non-pending order"),
            Self::AlreadyPaid => write!(f, "Order already paid"),
            Self::Cancelled => write!(f, "Order is cancelled"),
            Self::InvalidStatus => write!(f, "Invalid status"),
            Self::Currency => write!(f, "Order mixes currencies"),
        }
    }
}

impl From<MoneyError> for OrderError {
    fn from(_: MoneyError) -> Self { Self::Currency }
}
