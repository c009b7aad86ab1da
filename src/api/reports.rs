use axum::{
    extract::{Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::auth::AdminUser;
use crate::error::{AppError, Result};
use crate::reports::{self, DateRange, FinancialReport, OrderStatistics, ProductPerformance};
use crate::state::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/financial", get(financial))
        .route("/orders", get(order_statistics))
        .route("/products", get(product_performance))
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FinancialParams {
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

async fn financial(
    State(state): State<AppState>,
    _admin: AdminUser,
    Query(params): Query<FinancialParams>,
) -> Result<Json<FinancialReport>> {
    let range = DateRange::parse(params.start_date.as_deref(), params.end_date.as_deref()).map_err(AppError::bad_request)?;
    let orders = state.repos.orders.list_all().await?;
    Ok(Json(reports::financial(&orders, range)))
}

async fn order_statistics(State(state): State<AppState>, _admin: AdminUser) -> Result<Json<OrderStatistics>> {
    let orders = state.repos.orders.list_all().await?;
    Ok(Json(reports::order_statistics(&orders)))
}

async fn product_performance(State(state): State<AppState>, _admin: AdminUser) -> Result<Json<Vec<ProductPerformance>>> {
    let orders = state.repos.orders.list_all().await?;
    let products = state.repos.products.list().await?;
    Ok(Json(reports::product_performance(&orders, &products)))
}
