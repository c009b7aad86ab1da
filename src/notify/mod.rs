//! Customer notifications over WhatsApp.

pub mod fonnte;
pub mod templates;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::value_objects::Phone;

pub use fonnte::{DisabledMessenger, FonnteMessenger};

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

/// Sends a text message to a customer's phone.
#[async_trait]
pub trait Messenger: Send + Sync {
    async fn send(&self, to: &Phone, message: &str) -> Result<(), NotifyError>;
}
