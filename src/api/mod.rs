//! HTTP routes.
//!
//! # Route Structure
//!
//! ```text
//! GET    /api/health                  - Liveness check
//!
//! # Auth
//! POST   /api/auth/register           - Customer sign-up
//! POST   /api/auth/login              - Customer sign-in
//! POST   /api/auth/admin/login        - Back-office sign-in
//!
//! # Products
//! GET    /api/products                - Catalogue, newest first
//! POST   /api/products                - Create (admin, multipart)
//! GET    /api/products/:id            - Product detail
//! PUT    /api/products/:id            - Edit (admin, multipart)
//! DELETE /api/products/:id            - Delete (admin)
//!
//! # Cart (signed in)
//! GET    /api/cart                    - Priced cart lines
//! POST   /api/cart/add                - Add a product
//! PUT    /api/cart/update             - Set a line's quantity
//! DELETE /api/cart/remove/:productId  - Drop a line
//! DELETE /api/cart/clear              - Empty the cart
//!
//! # Orders
//! POST   /api/orders/create           - Checkout the cart
//! POST   /api/orders/notification     - Payment gateway webhook
//! GET    /api/orders/user             - Caller's orders
//! GET    /api/orders                  - All orders (admin)
//! GET    /api/orders/:id              - Order detail
//! POST   /api/orders/:id/payment      - Start payment
//! POST   /api/orders/:id/cancel       - Cancel a pending order
//! GET    /api/orders/:id/status       - Poll payment status
//! PUT    /api/orders/:id/status       - Set fulfilment status (admin)
//!
//! # Reports (admin)
//! GET    /api/reports/financial       - Revenue summary
//! GET    /api/reports/orders          - Order counts
//! GET    /api/reports/products        - Sales per product
//!
//! GET    /assets/*                    - Product images
//! ```

pub mod auth;
pub mod cart;
pub mod health;
pub mod orders;
pub mod products;
pub mod reports;

use axum::{extract::FromRequest, Router};
use tower_http::{cors::CorsLayer, services::ServeDir, trace::TraceLayer};

use crate::error::AppError;
use crate::state::AppState;

/// JSON request body whose rejections answer with the usual `{ "error" }` body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

pub fn router(state: AppState) -> Router {
    let assets = ServeDir::new(state.images.root());

    Router::new()
        .nest("/api/health", health::routes())
        .nest("/api/auth", auth::routes())
        .nest("/api/products", products::routes())
        .nest("/api/cart", cart::routes())
        .nest("/api/orders", orders::routes())
        .nest("/api/reports", reports::routes())
        .nest_service("/assets", assets)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
