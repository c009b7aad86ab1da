//! Catalogue handlers. Writes take `multipart/form-data` so an image can ride along.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::auth::AdminUser;
use crate::domain::aggregates::Product;
use crate::error::{AppError, Result};
use crate::services::catalog::{self, ImageUpload, ProductForm, MAX_IMAGE_BYTES};
use crate::state::AppState;

/// Room for the image plus the text fields.
const FORM_BODY_LIMIT: usize = MAX_IMAGE_BYTES + 1024 * 1024;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/", get(list).post(create))
        .route("/:id", get(show).put(update).delete(remove))
        .layer(DefaultBodyLimit::max(FORM_BODY_LIMIT))
}

async fn list(State(state): State<AppState>) -> Result<Json<Vec<Product>>> {
    Ok(Json(state.repos.products.list().await?))
}

async fn show(State(state): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Product>> {
    let product = state.repos.products.find(id).await?.ok_or_else(|| AppError::not_found("Product"))?;
    Ok(Json(product))
}

async fn create(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    multipart: Multipart,
) -> Result<(StatusCode, Json<Value>)> {
    let form = read_form(multipart).await?;
    let product = catalog::create_product(&state, form).await?;
    Ok((StatusCode::CREATED, Json(json!({ "message": "Product created successfully", "product": product }))))
}

async fn update(
    State(state): State<AppState>,
    AdminUser(_): AdminUser,
    Path(id): Path<Uuid>,
    multipart: Multipart,
) -> Result<Json<Value>> {
    let form = read_form(multipart).await?;
    let product = catalog::update_product(&state, id, form).await?;
    Ok(Json(json!({ "message": "Product updated successfully", "product": product })))
}

async fn remove(State(state): State<AppState>, AdminUser(_): AdminUser, Path(id): Path<Uuid>) -> Result<Json<Value>> {
    catalog::delete_product(&state, id).await?;
    Ok(Json(json!({ "message": "Product deleted successfully" })))
}

async fn read_form(mut multipart: Multipart) -> Result<ProductForm> {
    let mut form = ProductForm::default();
    while let Some(field) = multipart.next_field().await.map_err(|e| AppError::bad_request(e.body_text()))? {
        let Some(name) = field.name().map(str::to_string) else { continue };
        if name == "image" {
            let file_name = field.file_name().unwrap_or_default().to_string();
            let content_type = field.content_type().map(str::to_string);
            let bytes = field.bytes().await.map_err(|e| AppError::bad_request(e.body_text()))?;
            // Browsers send an empty file part when nothing was picked
            if !file_name.is_empty() || !bytes.is_empty() {
                form.image = Some(ImageUpload { file_name, content_type, bytes: bytes.to_vec() });
            }
            continue;
        }
        let value = field.text().await.map_err(|e| AppError::bad_request(e.body_text()))?;
        match name.as_str() {
            "name" => form.name = Some(value),
            "description" => form.description = Some(value),
            "price" => form.price = Some(value),
            "stock" => form.stock = Some(value),
            _ => {}
        }
    }
    Ok(form)
}
