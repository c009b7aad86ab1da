//! ScentFix storefront and back office.
//!
//! JSON API for a small Indonesian shop selling shoe deodorant patches.
//!
//! ## Features
//! - Customer accounts and admin sign-in
//! - Product catalogue with image uploads
//! - Shopping cart and checkout
//! - Midtrans payments, reconciled from the webhook and from status polls
//! - WhatsApp notifications through Fonnte
//! - Sales reports for the back office

pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod error;
pub mod notify;
pub mod payment;
pub mod reports;
pub mod services;
pub mod state;
pub mod store;

pub use config::Config;
pub use error::{AppError, Result};
pub use state::AppState;
