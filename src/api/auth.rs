//! Sign-up and sign-in handlers.

use axum::{extract::State, http::StatusCode, routing::post, Json, Router};
use serde::Deserialize;
use serde_json::{json, Value};
use validator::Validate;

use crate::api::ApiJson;
use crate::error::{AppError, Result};
use crate::services::auth::{self as accounts, Registration, Session};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/admin/login", post(admin_login))
}

#[derive(Debug, Deserialize, Validate)]
pub struct RegisterRequest {
    #[serde(default)]
    #[validate(length(min = 1, code = "required"))]
    pub name: String,
    #[serde(default)]
    #[validate(length(min = 1, code = "required"))]
    pub email: String,
    #[serde(default)]
    #[validate(length(min = 1, code = "required"))]
    pub password: String,
    #[serde(default)]
    #[validate(length(min = 1, code = "required"))]
    pub birthdate: String,
    #[serde(default)]
    #[validate(length(min = 1, code = "required"))]
    pub gender: String,
    #[serde(default)]
    #[validate(length(min = 1, code = "required"))]
    pub phone: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

fn session_body(message: &str, session: &Session) -> Json<Value> {
    Json(json!({ "message": message, "user": session.user, "token": session.token }))
}

async fn register(State(state): State<AppState>, ApiJson(req): ApiJson<RegisterRequest>) -> Result<(StatusCode, Json<Value>)> {
    req.validate()?;
    let session = accounts::register(
        &state,
        Registration {
            name: req.name,
            email: req.email,
            password: req.password,
            birthdate: req.birthdate,
            gender: req.gender,
            phone: req.phone,
        },
    )
    .await?;
    Ok((StatusCode::CREATED, session_body("Registration successful", &session)))
}

async fn login(State(state): State<AppState>, ApiJson(req): ApiJson<LoginRequest>) -> Result<Json<Value>> {
    if req.email.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::bad_request("Email and password are required"));
    }
    let session = accounts::login(&state, &req.email, &req.password).await?;
    Ok(session_body("Login successful", &session))
}

async fn admin_login(State(state): State<AppState>, ApiJson(req): ApiJson<AdminLoginRequest>) -> Result<Json<Value>> {
    if req.username.trim().is_empty() || req.password.is_empty() {
        return Err(AppError::bad_request("Username and password are required"));
    }
    let session = accounts::admin_login(&state, &req.username, &req.password).await?;
    Ok(session_body("Admin login successful", &session))
}
