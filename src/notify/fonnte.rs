//! Fonnte WhatsApp API client.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tracing::instrument;

use super::{Messenger, NotifyError};
use crate::domain::value_objects::Phone;

const SEND_URL: &str = "https://api.fonnte.com/send";

/// Indonesia; numbers starting with 0 get this prefix on Fonnte's side.
const COUNTRY_CODE: &str = "62";

#[derive(Clone)]
pub struct FonnteMessenger {
    client: reqwest::Client,
}

impl FonnteMessenger {
    /// # Errors
    ///
    /// Returns error if the token is not a valid header value or the HTTP client fails to build.
    pub fn new(token: &SecretString) -> Result<Self, NotifyError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(token.expose_secret()).map_err(|e| NotifyError::InvalidToken(e.to_string()))?,
        );
        let client = reqwest::Client::builder().default_headers(headers).build()?;
        Ok(Self { client })
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct SendRequest<'a> {
    target: String,
    message: &'a str,
    country_code: &'static str,
}

#[async_trait]
impl Messenger for FonnteMessenger {
    #[instrument(skip_all)]
    async fn send(&self, to: &Phone, message: &str) -> Result<(), NotifyError> {
        let body = SendRequest { target: to.digits(), message, country_code: COUNTRY_CODE };
        let response = self.client.post(SEND_URL).json(&body).send().await?;
        let status = response.status();

        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(NotifyError::Api { status: status.as_u16(), message });
        }
        Ok(())
    }
}

/// Used when no WhatsApp token is configured. Messages are only logged.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledMessenger;

#[async_trait]
impl Messenger for DisabledMessenger {
    async fn send(&self, to: &Phone, message: &str) -> Result<(), NotifyError> {
        tracing::debug!(to = %to.digits(), len = message.len(), "WhatsApp disabled, message dropped");
        Ok(())
    }
}
