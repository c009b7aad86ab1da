//! Shopping cart operations.

use serde::Serialize;
use uuid::Uuid;

use crate::domain::aggregates::Cart;
use crate::domain::value_objects::Money;
use crate::error::{AppError, Result};
use crate::state::AppState;

/// A cart entry joined with the live product.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub product_id: Uuid,
    pub name: String,
    pub price: Money,
    pub image: Option<String>,
    pub quantity: u32,
    pub stock: u32,
}

/// Priced cart lines. Entries whose product no longer exists are left out.
pub async fn lines(state: &AppState, user_id: Uuid) -> Result<Vec<CartLine>> {
    let Some(cart) = state.repos.carts.find(user_id).await? else {
        return Ok(vec![]);
    };
    let mut lines = Vec::with_capacity(cart.item_count());
    for item in cart.items() {
        if let Some(product) = state.repos.products.find(item.product_id).await? {
            lines.push(CartLine {
                product_id: product.id(),
                name: product.name().to_string(),
                price: product.price().clone(),
                image: product.image().map(str::to_string),
                quantity: item.quantity,
                stock: product.stock().value(),
            });
        }
    }
    Ok(lines)
}

pub async fn add(state: &AppState, user_id: Uuid, product_id: Uuid, quantity: u32) -> Result<Cart> {
    let product = state.repos.products.find(product_id).await?.ok_or_else(|| AppError::not_found("Product"))?;
    let mut cart = state.repos.carts.find(user_id).await?.unwrap_or_else(|| Cart::new(user_id));

    // What is already in the cart counts against stock too
    let wanted = cart.quantity_of(product_id).saturating_add(quantity);
    if !product.has_stock_for(wanted) {
        return Err(AppError::bad_request("Insufficient stock"));
    }
    cart.add_item(product_id, quantity)?;
    state.repos.carts.save(&cart).await?;
    Ok(cart)
}

pub async fn update(state: &AppState, user_id: Uuid, product_id: Uuid, quantity: u32) -> Result<Cart> {
    if quantity == 0 {
        return Err(AppError::bad_request("Quantity must be at least 1"));
    }
    let mut cart = state.repos.carts.find(user_id).await?.ok_or_else(|| AppError::not_found("Cart"))?;
    cart.update_quantity(product_id, quantity)?;

    let product = state.repos.products.find(product_id).await?.ok_or_else(|| AppError::not_found("Product"))?;
    if !product.has_stock_for(quantity) {
        return Err(AppError::bad_request("Insufficient stock"));
    }
    state.repos.carts.save(&cart).await?;
    Ok(cart)
}

pub async fn remove(state: &AppState, user_id: Uuid, product_id: Uuid) -> Result<()> {
    let mut cart = state.repos.carts.find(user_id).await?.ok_or_else(|| AppError::not_found("Cart"))?;
    cart.remove_item(product_id);
    state.repos.carts.save(&cart).await?;
    Ok(())
}

pub async fn clear(state: &AppState, user_id: Uuid) -> Result<()> {
    state.repos.carts.clear(user_id).await?;
    Ok(())
}
