//! Service configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `JWT_SECRET` - Signing secret for customer and admin bearer tokens
//!
//! ## Optional
//! - `HOST` - Bind address (default: 0.0.0.0)
//! - `PORT` - Listen port (default: 3001)
//! - `DATABASE_URL` - `PostgreSQL` connection string; without it data is kept in memory
//! - `TOKEN_TTL_DAYS` - Bearer token lifetime, 1 to 3650 days (default: 7)
//! - `MIDTRANS_SERVER_KEY` / `MIDTRANS_CLIENT_KEY` - Payment gateway credentials
//! - `MIDTRANS_IS_PRODUCTION` - `true` selects the production gateway (default: sandbox)
//! - `PUBLIC_BASE_URL` - Storefront URL used for payment callbacks (falls back to `NEXT_URL`)
//! - `FONNTE_TOKEN` - WhatsApp API token; notifications are only logged without it
//! - `NATS_URL` - Publish domain events to this NATS server
//! - `ASSETS_DIR` - Where product images are written and served from (default: public/assets)
//! - `ADMIN_EMAIL_DOMAIN` - Domain appended to bare admin usernames (default: scentfix.com)
//! - `ADMIN_EMAIL`, `ADMIN_PASSWORD`, `ADMIN_NAME`, `ADMIN_PHONE` - Bootstrap admin account

use std::net::IpAddr;
use std::path::PathBuf;

use secrecy::SecretString;
use thiserror::Error;

/// Longest accepted bearer token lifetime.
pub const MAX_TOKEN_TTL_DAYS: i64 = 3650;

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(&'static str),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(&'static str, String),
}

#[derive(Debug, Clone)]
pub struct Config {
    pub host: IpAddr,
    pub port: u16,
    pub database_url: Option<SecretString>,
    pub auth: AuthConfig,
    pub midtrans: MidtransConfig,
    pub fonnte_token: Option<SecretString>,
    pub nats_url: Option<String>,
    pub assets_dir: PathBuf,
}

#[derive(Debug, Clone)]
pub struct AuthConfig {
    pub jwt_secret: SecretString,
    pub token_ttl_days: i64,
    pub admin_email_domain: String,
    pub bootstrap_admin: Option<AdminSeed>,
}

/// Admin account created at start-up when it does not exist yet.
#[derive(Debug, Clone)]
pub struct AdminSeed {
    pub email: String,
    pub password: SecretString,
    pub name: String,
    pub phone: String,
}

#[derive(Debug, Clone)]
pub struct MidtransConfig {
    pub server_key: SecretString,
    pub client_key: String,
    pub is_production: bool,
    /// Storefront origin the gateway redirects back to.
    pub public_base_url: String,
}

impl Config {
    /// Load configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a required variable is missing or a value does not parse.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let get = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let host = parse_or(get("HOST"), "HOST", IpAddr::from([0, 0, 0, 0]))?;
        let port = parse_or(get("PORT"), "PORT", 3001)?;
        let token_ttl_days: i64 = parse_or(get("TOKEN_TTL_DAYS"), "TOKEN_TTL_DAYS", 7)?;
        if !(1..=MAX_TOKEN_TTL_DAYS).contains(&token_ttl_days) {
            return Err(ConfigError::InvalidEnvVar("TOKEN_TTL_DAYS", format!("must be between 1 and {MAX_TOKEN_TTL_DAYS}")));
        }

        let bootstrap_admin = match (get("ADMIN_EMAIL"), get("ADMIN_PASSWORD")) {
            (Some(email), Some(password)) => Some(AdminSeed {
                email,
                password: SecretString::from(password),
                name: get("ADMIN_NAME").unwrap_or_else(|| "admin".to_string()),
                phone: get("ADMIN_PHONE").unwrap_or_else(|| "0".to_string()),
            }),
            _ => None,
        };

        Ok(Self {
            host,
            port,
            database_url: get("DATABASE_URL").map(SecretString::from),
            auth: AuthConfig {
                jwt_secret: get("JWT_SECRET").map(SecretString::from).ok_or(ConfigError::MissingEnvVar("JWT_SECRET"))?,
                token_ttl_days,
                admin_email_domain: get("ADMIN_EMAIL_DOMAIN").unwrap_or_else(|| "scentfix.com".to_string()),
                bootstrap_admin,
            },
            midtrans: MidtransConfig {
                server_key: SecretString::from(get("MIDTRANS_SERVER_KEY").unwrap_or_default()),
                client_key: get("MIDTRANS_CLIENT_KEY").unwrap_or_default(),
                is_production: get("MIDTRANS_IS_PRODUCTION").is_some_and(|v| v.eq_ignore_ascii_case("true")),
                public_base_url: get("PUBLIC_BASE_URL")
                    .or_else(|| get("NEXT_URL"))
                    .unwrap_or_else(|| "http://localhost:3000".to_string())
                    .trim_end_matches('/')
                    .to_string(),
            },
            fonnte_token: get("FONNTE_TOKEN").map(SecretString::from),
            nats_url: get("NATS_URL"),
            assets_dir: get("ASSETS_DIR").map_or_else(|| PathBuf::from("public/assets"), PathBuf::from),
        })
    }
}

fn parse_or<T: std::str::FromStr>(raw: Option<String>, key: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match raw {
        Some(v) => v.parse().map_err(|e: T::Err| ConfigError::InvalidEnvVar(key, e.to_string())),
        None => Ok(default),
    }
}
