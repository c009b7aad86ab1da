use axum::{
    extract::{Path, State},
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::api::ApiJson;
use crate::auth::AuthUser;
use crate::error::{AppError, Result};
use crate::services::cart;
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(show))
        .route("/add", post(add))
        .route("/update", put(update))
        .route("/remove/:product_id", delete(remove))
        .route("/clear", delete(clear))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemRequest {
    #[serde(default)]
    pub product_id: Option<String>,
    /// Signed so a negative amount reaches the handler and is reported like a missing one.
    #[serde(default)]
    pub quantity: Option<i64>,
}

impl CartItemRequest {
    fn product_id(&self) -> Result<Uuid> {
        let raw = self.product_id.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let raw = raw.ok_or_else(|| AppError::bad_request("Product ID and quantity are required"))?;
        // Ids that cannot exist are reported like unknown ones
        Uuid::parse_str(raw).map_err(|_| AppError::not_found("Product"))
    }

    /// Requested quantity, with anything below one as zero.
    fn quantity(&self) -> Option<u32> {
        self.quantity.map(|q| u32::try_from(q.max(0)).unwrap_or(u32::MAX))
    }
}

async fn show(State(state): State<AppState>, user: AuthUser) -> Result<Json<Value>> {
    let items = cart::lines(&state, user.id).await?;
    Ok(Json(json!({ "items": items })))
}

async fn add(State(state): State<AppState>, user: AuthUser, ApiJson(req): ApiJson<CartItemRequest>) -> Result<Json<Value>> {
    let quantity = req.quantity().filter(|q| *q > 0);
    let (product_id, Some(quantity)) = (req.product_id()?, quantity) else {
        return Err(AppError::bad_request("Product ID and quantity are required"));
    };
    let cart = cart::add(&state, user.id, product_id, quantity).await?;
    Ok(Json(json!({ "message": "Item added to cart", "cart": cart })))
}

async fn update(State(state): State<AppState>, user: AuthUser, ApiJson(req): ApiJson<CartItemRequest>) -> Result<Json<Value>> {
    let product_id = req.product_id()?;
    let cart = cart::update(&state, user.id, product_id, req.quantity().unwrap_or(0)).await?;
    Ok(Json(json!({ "message": "Cart updated", "cart": cart })))
}

async fn remove(State(state): State<AppState>, user: AuthUser, Path(product_id): Path<Uuid>) -> Result<Json<Value>> {
    cart::remove(&state, user.id, product_id).await?;
    Ok(Json(json!({ "message": "Item removed from cart" })))
}

async fn clear(State(state): State<AppState>, user: AuthUser) -> Result<Json<Value>> {
    cart::clear(&state, user.id).await?;
    Ok(Json(json!({ "message": "Cart cleared" })))
}
