//! Midtrans Snap and Core API client.

use async_trait::async_trait;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, CONTENT_TYPE};
use reqwest::StatusCode;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::instrument;

use super::{notification_signature, Notification, PaymentError, PaymentGateway, PaymentSession};
use crate::config::MidtransConfig;
use crate::domain::aggregates::{Order, User};
use crate::domain::payment::GatewayReport;

const SNAP_SANDBOX_URL: &str = "https://app.sandbox.midtrans.com/snap/v1/transactions";
const SNAP_PRODUCTION_URL: &str = "https://app.midtrans.com/snap/v1/transactions";
const CORE_SANDBOX_URL: &str = "https://api.sandbox.midtrans.com/v2";
const CORE_PRODUCTION_URL: &str = "https://api.midtrans.com/v2";

/// Payment pages expire after this many minutes.
const EXPIRY_MINUTES: u32 = 60;

#[derive(Clone)]
pub struct MidtransGateway {
    client: reqwest::Client,
    server_key: SecretString,
    client_key: String,
    snap_url: &'static str,
    core_url: &'static str,
    public_base_url: String,
}

impl MidtransGateway {
    /// Create a new Midtrans client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &MidtransConfig) -> Result<Self, PaymentError> {
        let mut headers = HeaderMap::new();

        // Basic auth with the server key as user and an empty password
        let credentials = STANDARD.encode(format!("{}:", config.server_key.expose_secret()));
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Basic {credentials}"))
                .map_err(|e| PaymentError::Parse(format!("Invalid server key format: {e}")))?,
        );
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let client = reqwest::Client::builder().default_headers(headers).build()?;

        let (snap_url, core_url) = if config.is_production {
            (SNAP_PRODUCTION_URL, CORE_PRODUCTION_URL)
        } else {
            (SNAP_SANDBOX_URL, CORE_SANDBOX_URL)
        };

        tracing::info!(production = config.is_production, snap_url, "Midtrans gateway configured");
        if config.server_key.expose_secret().is_empty() {
            tracing::warn!("MIDTRANS_SERVER_KEY not set, payment notifications will be rejected");
        }

        Ok(Self {
            client,
            server_key: config.server_key.clone(),
            client_key: config.client_key.clone(),
            snap_url,
            core_url,
            public_base_url: config.public_base_url.clone(),
        })
    }

    fn snap_request<'a>(&self, order: &'a Order, customer: &'a User) -> SnapRequest<'a> {
        let (first_name, last_name) = customer.split_name();
        let order_page = format!("{}/orders/{}", self.public_base_url, order.id());
        let item_details: Vec<ItemDetails<'a>> = order
            .items()
            .iter()
            .map(|item| ItemDetails {
                id: item.product_id.to_string(),
                price: item.price.whole_units(),
                quantity: item.quantity,
                name: &item.name,
            })
            .collect();
        // The gateway rejects a gross amount that differs from the sum of the item lines
        let gross_amount = item_details.iter().map(|item| item.price * i64::from(item.quantity)).sum();
        SnapRequest {
            transaction_details: TransactionDetails { order_id: order.order_number(), gross_amount },
            customer_details: CustomerDetails {
                first_name,
                last_name,
                email: customer.email().as_str(),
                phone: customer.phone().as_str(),
            },
            item_details,
            callbacks: Callbacks {
                finish: order_page.clone(),
                error: format!("{}/checkout?error=payment_failed", self.public_base_url),
                pending: order_page,
            },
            expiry: Expiry { unit: "minutes", duration: EXPIRY_MINUTES },
        }
    }
}

#[async_trait]
impl PaymentGateway for MidtransGateway {
    #[instrument(skip_all, fields(order_number = %order.order_number()))]
    async fn create_transaction(&self, order: &Order, customer: &User) -> Result<PaymentSession, PaymentError> {
        let body = self.snap_request(order, customer);
        let response = self.client.post(self.snap_url).json(&body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<SnapErrorResponse>(&text)
                .ok()
                .filter(|e| !e.error_messages.is_empty())
                .map_or(text, |e| e.error_messages.join(", "));
            tracing::warn!(status = status.as_u16(), %message, "Snap transaction rejected");
            return Err(PaymentError::Api { status: status.as_u16(), message });
        }

        let snap: SnapResponse = response.json().await.map_err(|e| PaymentError::Parse(e.to_string()))?;
        Ok(PaymentSession { token: snap.token, redirect_url: snap.redirect_url, client_key: self.client_key.clone() })
    }

    #[instrument(skip(self))]
    async fn transaction_status(&self, order_number: &str) -> Result<Option<GatewayReport>, PaymentError> {
        let url = format!("{}/{order_number}/status", self.core_url);
        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if status == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(PaymentError::Api { status: status.as_u16(), message });
        }

        let body: StatusResponse = response.json().await.map_err(|e| PaymentError::Parse(e.to_string()))?;
        // The Core API answers unknown transactions with HTTP 200 and a 404 status code in the body
        if body.status_code.as_deref() == Some("404") {
            return Ok(None);
        }
        let Some(transaction_status) = body.transaction_status else {
            return Err(PaymentError::Parse(
                body.status_message.unwrap_or_else(|| "missing transaction_status".to_string()),
            ));
        };
        Ok(Some(GatewayReport::new(&transaction_status, body.fraud_status.as_deref())))
    }

    fn verify_notification(&self, notification: &Notification) -> bool {
        // Anyone can sign with an empty key
        if self.server_key.expose_secret().is_empty() {
            return false;
        }
        let (Some(status_code), Some(gross_amount), Some(signature)) = (
            notification.status_code.as_deref(),
            notification.gross_amount.as_deref(),
            notification.signature_key.as_deref(),
        ) else {
            return false;
        };
        let expected = notification_signature(
            &notification.order_id,
            status_code,
            gross_amount,
            self.server_key.expose_secret(),
        );
        expected.eq_ignore_ascii_case(signature)
    }
}

#[derive(Debug, Serialize)]
struct SnapRequest<'a> {
    transaction_details: TransactionDetails<'a>,
    customer_details: CustomerDetails<'a>,
    item_details: Vec<ItemDetails<'a>>,
    callbacks: Callbacks,
    expiry: Expiry,
}

#[derive(Debug, Serialize)]
struct TransactionDetails<'a> {
    order_id: &'a str,
    gross_amount: i64,
}

#[derive(Debug, Serialize)]
struct CustomerDetails<'a> {
    first_name: &'a str,
    last_name: &'a str,
    email: &'a str,
    phone: &'a str,
}

#[derive(Debug, Serialize)]
struct ItemDetails<'a> {
    id: String,
    price: i64,
    quantity: u32,
    name: &'a str,
}

#[derive(Debug, Serialize)]
struct Callbacks {
    finish: String,
    error: String,
    pending: String,
}

#[derive(Debug, Serialize)]
struct Expiry {
    unit: &'static str,
    duration: u32,
}

#[derive(Debug, Deserialize)]
struct SnapResponse {
    token: String,
    redirect_url: String,
}

#[derive(Debug, Deserialize)]
struct SnapErrorResponse {
    #[serde(default)]
    error_messages: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct StatusResponse {
    status_code: Option<String>,
    status_message: Option<String>,
    transaction_status: Option<String>,
    fraud_status: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::aggregates::{Gender, NewUser, OrderItem};
    use crate::domain::value_objects::{Email, Money, Phone};
    use chrono::NaiveDate;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn gateway_with_key(server_key: &str) -> MidtransGateway {
        MidtransGateway::new(&MidtransConfig {
            server_key: SecretString::from(server_key.to_string()),
            client_key: "SB-Mid-client-test".into(),
            is_production: false,
            public_base_url: "https://scentfix.id".into(),
        })
        .unwrap()
    }

    fn gateway() -> MidtransGateway {
        gateway_with_key("SB-Mid-server-test")
    }

    fn customer() -> User {
        User::register(NewUser {
            name: "Budi Santoso Putra".into(),
            email: Email::parse("budi@example.com").unwrap(),
            password_hash: "x".into(),
            birthdate: NaiveDate::from_ymd_opt(1995, 5, 17).unwrap(),
            gender: Gender::Male,
            phone: Phone::parse("081234567890").unwrap(),
        })
        .unwrap()
    }

    #[test]
    fn test_snap_request_shape() {
        let item = OrderItem {
            product_id: Uuid::new_v4(),
            name: "ScentFix Classic".into(),
            price: Money::idr(Decimal::new(45_000, 0)),
            quantity: 2,
            image: None,
        };
        let order = Order::place(Uuid::new_v4(), vec![item], "Jl. Merdeka 1").unwrap();
        let user = customer();
        let body = serde_json::to_value(gateway().snap_request(&order, &user)).unwrap();

        assert_eq!(body["transaction_details"]["order_id"], order.order_number());
        assert_eq!(body["transaction_details"]["gross_amount"], 90_000);
        assert_eq!(body["customer_details"]["first_name"], "Budi");
        assert_eq!(body["customer_details"]["last_name"], "Santoso Putra");
        assert_eq!(body["item_details"][0]["price"], 45_000);
        assert_eq!(body["callbacks"]["error"], "https://scentfix.id/checkout?error=payment_failed");
        assert_eq!(body["callbacks"]["finish"], format!("https://scentfix.id/orders/{}", order.id()));
        assert_eq!(body["expiry"]["duration"], 60);
    }

    #[test]
    fn test_verify_notification() {
        let gateway = gateway();
        let mut notification = Notification {
            order_id: "SF-1".into(),
            transaction_status: "settlement".into(),
            fraud_status: None,
            status_code: Some("200".into()),
            gross_amount: Some("90000.00".into()),
            signature_key: Some(notification_signature("SF-1", "200", "90000.00", "SB-Mid-server-test")),
        };
        assert!(gateway.verify_notification(&notification));

        notification.gross_amount = Some("1.00".into());
        assert!(!gateway.verify_notification(&notification));

        notification.signature_key = None;
        assert!(!gateway.verify_notification(&notification));
    }

    #[test]
    fn test_gross_amount_matches_item_lines() {
        let item = OrderItem {
            product_id: Uuid::new_v4(),
            name: "Sample".into(),
            price: Money::idr(Decimal::new(125, 1)),
            quantity: 2,
            image: None,
        };
        let order = Order::place(Uuid::new_v4(), vec![item], "").unwrap();
        let body = serde_json::to_value(gateway().snap_request(&order, &customer())).unwrap();

        let price = body["item_details"][0]["price"].as_i64().unwrap();
        let quantity = body["item_details"][0]["quantity"].as_i64().unwrap();
        assert_eq!(body["transaction_details"]["gross_amount"].as_i64().unwrap(), price * quantity);
    }

    #[test]
    fn test_unset_server_key_rejects_every_notification() {
        let gateway = gateway_with_key("");
        let notification = Notification {
            order_id: "SF-1".into(),
            transaction_status: "settlement".into(),
            fraud_status: None,
            status_code: Some("200".into()),
            gross_amount: Some("1".into()),
            signature_key: Some(notification_signature("SF-1", "200", "1", "")),
        };
        assert!(!gateway.verify_notification(&notification));
    }
}
