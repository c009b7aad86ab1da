//! Password hashing, bearer tokens and the request extractors built on them.

use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    async_trait,
    extract::{FromRef, FromRequestParts},
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::config::MAX_TOKEN_TTL_DAYS;
use crate::domain::aggregates::User;
use crate::error::AppError;
use crate::state::AppState;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("password hashing error")]
    PasswordHash,

    #[error("token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),
}

/// Hash a password using Argon2id.
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|_| AuthError::PasswordHash)
}

/// Verify a password against a stored hash.
pub fn verify_password(password: &str, hash: &str) -> Result<(), AuthError> {
    let parsed = PasswordHash::new(hash).map_err(|_| AuthError::InvalidCredentials)?;
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .map_err(|_| AuthError::InvalidCredentials)
}

/// Bearer token payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claims {
    pub sub: Uuid,
    pub email: String,
    pub is_admin: bool,
    pub iat: i64,
    pub exp: i64,
}

/// Issues and checks HS256 bearer tokens.
pub struct TokenIssuer {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl TokenIssuer {
    /// `ttl_days` is clamped to `1..=MAX_TOKEN_TTL_DAYS`.
    pub fn new(secret: &SecretString, ttl_days: i64) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            ttl: Duration::try_days(ttl_days.clamp(1, MAX_TOKEN_TTL_DAYS)).unwrap_or_default(),
        }
    }

    pub fn issue(&self, user: &User) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.id(),
            email: user.email().to_string(),
            is_admin: user.is_admin(),
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    pub fn verify(&self, token: &str) -> Result<Claims, AuthError> {
        let data = decode::<Claims>(token, &self.decoding, &Validation::new(Algorithm::HS256))?;
        Ok(data.claims)
    }
}

/// Any signed-in account, customer or admin.
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub is_admin: bool,
}

/// A signed-in back-office account.
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

fn bearer(parts: &Parts) -> Option<&str> {
    parts.headers.get(AUTHORIZATION)?.to_str().ok()?.strip_prefix("Bearer ").map(str::trim)
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let state = AppState::from_ref(state);
        let token = bearer(parts).ok_or_else(|| AppError::Unauthorized("Unauthorized".into()))?;
        let claims = state.tokens.verify(token).map_err(|e| {
            tracing::debug!(error = %e, "Rejected bearer token");
            AppError::Unauthorized("Unauthorized".into())
        })?;
        Ok(Self { id: claims.sub, email: claims.email, is_admin: claims.is_admin })
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for AdminUser
where
    AppState: FromRef<S>,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.is_admin {
            return Err(AppError::Forbidden("Admin access required".into()));
        }
        Ok(Self(user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value_objects::{Email, Phone};

    fn admin() -> User {
        User::admin("admin", Email::parse("admin@scentfix.com").unwrap(), "x".into(), Phone::parse("0811").unwrap())
    }

    #[test]
    fn test_password_roundtrip() {
        let hash = hash_password("rahasia123").unwrap();
        assert!(verify_password("rahasia123", &hash).is_ok());
        assert!(matches!(verify_password("salah", &hash), Err(AuthError::InvalidCredentials)));
        assert!(matches!(verify_password("x", "not-a-hash"), Err(AuthError::InvalidCredentials)));
    }

    #[test]
    fn test_token_carries_admin_flag() {
        let issuer = TokenIssuer::new(&SecretString::from("test-secret".to_string()), 7);
        let user = admin();
        let claims = issuer.verify(&issuer.issue(&user).unwrap()).unwrap();
        assert_eq!(claims.sub, user.id());
        assert!(claims.is_admin);
        assert_eq!(claims.exp - claims.iat, 7 * 24 * 3600);
    }

    #[test]
    fn test_oversized_lifetime_is_clamped() {
        let issuer = TokenIssuer::new(&SecretString::from("test-secret".to_string()), i64::MAX);
        let claims = issuer.verify(&issuer.issue(&admin()).unwrap()).unwrap();
        assert_eq!(claims.exp - claims.iat, MAX_TOKEN_TTL_DAYS * 24 * 3600);
    }

    #[test]
    fn test_token_from_other_secret_rejected() {
        let issuer = TokenIssuer::new(&SecretString::from("one".to_string()), 7);
        let other = TokenIssuer::new(&SecretString::from("two".to_string()), 7);
        let token = other.issue(&admin()).unwrap();
        assert!(issuer.verify(&token).is_err());
    }
}
