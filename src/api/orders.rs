use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::ApiJson;
use crate::auth::{AdminUser, AuthUser};
use crate::domain::aggregates::Order;
use crate::error::Result;
use crate::payment::Notification;
use crate::services::orders::{self, AdminOrderView, StatusSnapshot};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list_all))
        .route("/create", post(create))
        .route("/notification", post(notification))
        .route("/user", get(list_mine))
        .route("/:id", get(show))
        .route("/:id/payment", post(pay))
        .route("/:id/cancel", post(cancel))
        .route("/:id/status", get(check_status).put(update_status))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    #[serde(default)]
    pub shipping_address: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    #[serde(default)]
    pub status: String,
}

async fn create(
    State(state): State<AppState>,
    user: AuthUser,
    body: Option<Json<CreateOrderRequest>>,
) -> Result<(StatusCode, Json<Value>)> {
    let Json(req) = body.unwrap_or_default();
    let order = orders::create(&state, user.id, req.shipping_address).await?;
    Ok((StatusCode::CREATED, Json(json!({ "message": "Order created successfully", "order": order }))))
}

async fn pay(State(state): State<AppState>, user: AuthUser, Path(id): Path<Uuid>) -> Result<Json<Value>> {
    let session = orders::initiate_payment(&state, &user, id).await?;
    Ok(Json(json!({
        "message": "Payment initiated",
        "token": session.token,
        "redirectUrl": session.redirect_url,
        "clientKey": session.client_key,
    })))
}

async fn cancel(State(state): State<AppState>, user: AuthUser, Path(id): Path<Uuid>) -> Result<Json<Value>> {
    let order = orders::cancel(&state, &user, id).await?;
    Ok(Json(json!({ "message": "Order cancelled successfully", "order": order })))
}

async fn check_status(State(state): State<AppState>, user: AuthUser, Path(id): Path<Uuid>) -> Result<Json<StatusSnapshot>> {
    Ok(Json(orders::check_status(&state, &user, id).await?))
}

async fn notification(State(state): State<AppState>, ApiJson(notification): ApiJson<Notification>) -> Result<Json<Value>> {
    orders::handle_notification(&state, notification).await?;
    Ok(Json(json!({ "message": "Notification processed" })))
}

async fn list_mine(State(state): State<AppState>, user: AuthUser) -> Result<Json<Vec<Order>>> {
    Ok(Json(orders::list_for_user(&state, user.id).await?))
}

async fn show(State(state): State<AppState>, user: AuthUser, Path(id): Path<Uuid>) -> Result<Json<Order>> {
    Ok(Json(orders::get(&state, &user, id).await?))
}

async fn list_all(State(state): State<AppState>, _admin: AdminUser) -> Result<Json<Vec<AdminOrderView>>> {
    Ok(Json(orders::list_all(&state).await?))
}

async fn update_status(
    State(state): State<AppState>,
    _admin: AdminUser,
    Path(id): Path<Uuid>,
    ApiJson(req): ApiJson<UpdateStatusRequest>,
) -> Result<Json<Value>> {
    let order = orders::update_status(&state, id, &req.status).await?;
    Ok(Json(json!({ "message": "Order status updated", "order": order })))
}
