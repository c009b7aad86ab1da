//! Payment gateway port.
//!
//! Checkout hands an order to the gateway and gets back a hosted payment
//! page. The gateway later reports the transaction outcome, either through
//! the notification webhook or when we ask for the status ourselves.

pub mod midtrans;

use async_trait::async_trait;
use serde::Deserialize;
use sha2::{Digest, Sha512};
use thiserror::Error;

use crate::domain::aggregates::{Order, User};
use crate::domain::payment::GatewayReport;

pub use midtrans::MidtransGateway;

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Parse error: {0}")]
    Parse(String),
}

/// Hosted payment page created for an order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentSession {
    pub token: String,
    pub redirect_url: String,
    /// Public key the storefront loads the payment widget with.
    pub client_key: String,
}

/// Body of the gateway's HTTP notification.
#[derive(Debug, Clone, Deserialize)]
pub struct Notification {
    pub order_id: String,
    pub transaction_status: String,
    #[serde(default)]
    pub fraud_status: Option<String>,
    #[serde(default)]
    pub status_code: Option<String>,
    #[serde(default)]
    pub gross_amount: Option<String>,
    #[serde(default)]
    pub signature_key: Option<String>,
}

impl Notification {
    pub fn report(&self) -> GatewayReport {
        GatewayReport::new(&self.transaction_status, self.fraud_status.as_deref())
    }
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    /// Open a hosted payment page for `order`, paid by `customer`.
    async fn create_transaction(&self, order: &Order, customer: &User) -> Result<PaymentSession, PaymentError>;

    /// Current transaction state, or `None` if the gateway has no transaction
    /// for this order number yet.
    async fn transaction_status(&self, order_number: &str) -> Result<Option<GatewayReport>, PaymentError>;

    /// Whether a webhook body really came from the gateway.
    fn verify_notification(&self, notification: &Notification) -> bool;
}

/// `hex(sha512(order_id + status_code + gross_amount + server_key))`.
pub fn notification_signature(order_id: &str, status_code: &str, gross_amount: &str, server_key: &str) -> String {
    let mut hasher = Sha512::new();
    hasher.update(order_id.as_bytes());
    hasher.update(status_code.as_bytes());
    hasher.update(gross_amount.as_bytes());
    hasher.update(server_key.as_bytes());
    hex::encode(hasher.finalize())
}
