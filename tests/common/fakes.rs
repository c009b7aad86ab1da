use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use uuid::Uuid;

use scentfix::domain::aggregates::{Order, Product, User};
use scentfix::domain::payment::GatewayReport;
use scentfix::domain::value_objects::Phone;
use scentfix::notify::{Messenger, NotifyError};
use scentfix::payment::{Notification, PaymentError, PaymentGateway, PaymentSession};
use scentfix::store::{ProductRepository, RepoResult, RepositoryError};

/// Notifications signed with this key are accepted.
pub const VALID_SIGNATURE: &str = "valid";

/// Payment gateway stand-in with a scripted transaction status.
#[derive(Default)]
pub struct FakeGateway {
    status: Mutex<Option<GatewayReport>>,
    unreachable: Mutex<bool>,
    created: Mutex<Vec<String>>,
}

impl FakeGateway {
    pub fn set_status(&self, transaction_status: &str, fraud_status: Option<&str>) {
        *self.status.lock().unwrap() = Some(GatewayReport::new(transaction_status, fraud_status));
    }

    pub fn set_unreachable(&self, unreachable: bool) {
        *self.unreachable.lock().unwrap() = unreachable;
    }

    /// Order numbers a payment page was opened for.
    pub fn created(&self) -> Vec<String> {
        self.created.lock().unwrap().clone()
    }
}

#[async_trait]
impl PaymentGateway for FakeGateway {
    async fn create_transaction(&self, order: &Order, _customer: &User) -> Result<PaymentSession, PaymentError> {
        self.created.lock().unwrap().push(order.order_number().to_string());
        Ok(PaymentSession {
            token: format!("snap-{}", order.order_number()),
            redirect_url: format!("https://pay.example/{}", order.order_number()),
            client_key: "client-test".into(),
        })
    }

    async fn transaction_status(&self, _order_number: &str) -> Result<Option<GatewayReport>, PaymentError> {
        if *self.unreachable.lock().unwrap() {
            return Err(PaymentError::Api { status: 503, message: "down".into() });
        }
        Ok(self.status.lock().unwrap().clone())
    }

    fn verify_notification(&self, notification: &Notification) -> bool {
        notification.signature_key.as_deref() == Some(VALID_SIGNATURE)
    }
}

/// Messenger that keeps what it was asked to send.
#[derive(Default)]
pub struct RecordingMessenger {
    sent: Mutex<Vec<(String, String)>>,
}

impl RecordingMessenger {
    pub fn sent(&self) -> Vec<(String, String)> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count_containing(&self, needle: &str) -> usize {
        self.sent.lock().unwrap().iter().filter(|(_, text)| text.contains(needle)).count()
    }
}

#[async_trait]
impl Messenger for RecordingMessenger {
    async fn send(&self, to: &Phone, message: &str) -> Result<(), NotifyError> {
        self.sent.lock().unwrap().push((to.digits(), message.to_string()));
        Ok(())
    }
}

/// Product store that cannot take stock off the shelf.
pub struct BrokenStock {
    inner: Arc<dyn ProductRepository>,
}

impl BrokenStock {
    pub fn new(inner: Arc<dyn ProductRepository>) -> Self {
        Self { inner }
    }
}

#[async_trait]
impl ProductRepository for BrokenStock {
    async fn list(&self) -> RepoResult<Vec<Product>> {
        self.inner.list().await
    }

    async fn find(&self, id: Uuid) -> RepoResult<Option<Product>> {
        self.inner.find(id).await
    }

    async fn insert(&self, product: &Product) -> RepoResult<()> {
        self.inner.insert(product).await
    }

    async fn update(&self, product: &Product) -> RepoResult<()> {
        self.inner.update(product).await
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        self.inner.delete(id).await
    }

    async fn decrement_stock(&self, _id: Uuid, _qty: u32) -> RepoResult<()> {
        Err(RepositoryError::Corrupt("stock table unavailable".into()))
    }
}
