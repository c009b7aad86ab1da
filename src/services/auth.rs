//! Account registration and sign-in.

use chrono::{DateTime, NaiveDate};
use secrecy::ExposeSecret;

use crate::auth::{hash_password, verify_password, AuthError};
use crate::config::AdminSeed;
use crate::domain::aggregates::{Gender, NewUser, User, UserError};
use crate::domain::value_objects::{Email, Phone};
use crate::error::{AppError, Result};
use crate::state::AppState;
use crate::store::{RepositoryError, UserRepository};

/// Registration form, already checked for presence of every field.
#[derive(Debug, Clone)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub birthdate: String,
    pub gender: String,
    pub phone: String,
}

/// A signed-in account and its bearer token.
pub struct Session {
    pub user: User,
    pub token: String,
}

pub async fn register(state: &AppState, form: Registration) -> Result<Session> {
    let email = Email::parse(&form.email).map_err(|_| AppError::bad_request("Invalid email format"))?;
    let phone = Phone::parse(&form.phone).map_err(|_| AppError::bad_request("Invalid phone number"))?;

    if state.repos.users.find_by_email(&email).await?.is_some() {
        return Err(AppError::bad_request("Email already registered"));
    }
    if state.repos.users.find_by_phone(&phone).await?.is_some() {
        return Err(AppError::bad_request("Phone number already registered"));
    }

    let mut user = User::register(NewUser {
        name: form.name,
        email,
        password_hash: hash_password(&form.password)?,
        birthdate: parse_birthdate(&form.birthdate)?,
        gender: form.gender.parse::<Gender>()?,
        phone,
    })?;

    // Lookups above race with concurrent sign-ups; the unique constraints decide
    state.repos.users.insert(&user).await.map_err(|e| match e {
        RepositoryError::Conflict("email") => AppError::bad_request("Email already registered"),
        RepositoryError::Conflict("phone") => AppError::bad_request("Phone number already registered"),
        other => other.into(),
    })?;
    tracing::info!(user_id = %user.id(), "User registered");

    state.dispatcher.dispatch(user.take_events()).await;
    let token = state.tokens.issue(&user)?;
    Ok(Session { user, token })
}

pub async fn login(state: &AppState, email: &str, password: &str) -> Result<Session> {
    let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;
    let user = state.repos.users.find_by_email(&email).await?.ok_or(AuthError::InvalidCredentials)?;
    verify_password(password, user.password_hash())?;
    let token = state.tokens.issue(&user)?;
    Ok(Session { user, token })
}

pub async fn admin_login(state: &AppState, username: &str, password: &str) -> Result<Session> {
    let email = admin_email(username, &state.admin_email_domain);
    let email = Email::parse(email).map_err(|_| AuthError::InvalidCredentials)?;
    let user = state.repos.users.find_admin_by_email(&email).await?.ok_or(AuthError::InvalidCredentials)?;
    verify_password(password, user.password_hash())?;
    tracing::info!(user_id = %user.id(), "Admin signed in");
    let token = state.tokens.issue(&user)?;
    Ok(Session { user, token })
}

/// Create the configured admin account unless it exists already.
///
/// Returns whether an account was created.
pub async fn ensure_admin(users: &dyn UserRepository, seed: &AdminSeed) -> Result<bool> {
    let email = Email::parse(&seed.email).map_err(|_| AppError::Internal("ADMIN_EMAIL is not an email address".into()))?;
    if users.find_by_email(&email).await?.is_some() {
        return Ok(false);
    }
    let phone = Phone::parse(&seed.phone).map_err(|_| AppError::Internal("ADMIN_PHONE is not a phone number".into()))?;
    let hash = hash_password(seed.password.expose_secret())?;
    users.insert(&User::admin(seed.name.as_str(), email, hash, phone)).await?;
    Ok(true)
}

fn admin_email(username: &str, domain: &str) -> String {
    let username = username.trim();
    if username.contains('@') {
        username.to_string()
    } else {
        format!("{username}@{domain}")
    }
}

/// Accepts `YYYY-MM-DD` or a full RFC 3339 timestamp.
fn parse_birthdate(raw: &str) -> std::result::Result<NaiveDate, UserError> {
    let raw = raw.trim();
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(raw).map(|dt| dt.date_naive()))
        .map_err(|_| UserError::InvalidBirthdate)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_email_expansion() {
        assert_eq!(admin_email("admin", "scentfix.com"), "admin@scentfix.com");
        assert_eq!(admin_email(" ops@other.id ", "scentfix.com"), "ops@other.id");
    }

    #[test]
    fn test_parse_birthdate() {
        assert_eq!(parse_birthdate("2000-02-29").unwrap(), NaiveDate::from_ymd_opt(2000, 2, 29).unwrap());
        assert_eq!(parse_birthdate("1990-01-15T00:00:00.000Z").unwrap(), NaiveDate::from_ymd_opt(1990, 1, 15).unwrap());
        assert_eq!(parse_birthdate("15/01/1990"), Err(UserError::InvalidBirthdate));
    }
}
