//! Shared application state handed to every handler.

use std::sync::Arc;

use crate::auth::TokenIssuer;
use crate::payment::PaymentGateway;
use crate::services::catalog::ImageStore;
use crate::services::dispatch::Dispatcher;
use crate::store::Repositories;

#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    pub gateway: Arc<dyn PaymentGateway>,
    pub dispatcher: Arc<Dispatcher>,
    pub tokens: Arc<TokenIssuer>,
    pub images: ImageStore,
    /// Appended to admin usernames given without a domain.
    pub admin_email_domain: String,
}
