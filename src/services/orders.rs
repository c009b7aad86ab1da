//! Checkout, payment reconciliation and order administration.
//!
//! Payment state reaches an order from two directions: the gateway's webhook
//! and our own status polls. Both go through [`reconcile`], which persists a
//! transition with a compare-and-set on the payment status so settlement side
//! effects happen once per order no matter who observes the payment first.

use std::collections::HashMap;

use serde::Serialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::domain::aggregates::{Order, OrderItem, OrderStatus, PaymentOutcome, PaymentStatus};
use crate::domain::payment::GatewayReport;
use crate::error::{AppError, Result};
use crate::payment::{Notification, PaymentSession};
use crate::state::AppState;
use crate::store::RepositoryError;

/// Attempts at drawing a fresh order number on collision.
const ORDER_NUMBER_ATTEMPTS: usize = 3;
const STATUS_UPDATE_ATTEMPTS: usize = 3;

/// Order and payment status pair returned by the status check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusSnapshot {
    pub status: OrderStatus,
    pub payment_status: PaymentStatus,
}

impl From<&Order> for StatusSnapshot {
    fn from(order: &Order) -> Self {
        Self { status: order.status(), payment_status: order.payment_status() }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CustomerSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Order as listed in the back office, with its customer.
#[derive(Debug, Clone, Serialize)]
pub struct AdminOrderView {
    #[serde(flatten)]
    pub order: Order,
    pub user: Option<CustomerSummary>,
}

/// Turn the caller's cart into a pending order.
pub async fn create(state: &AppState, user_id: Uuid, shipping_address: Option<String>) -> Result<Order> {
    let cart = match state.repos.carts.find(user_id).await? {
        Some(cart) if !cart.is_empty() => cart,
        _ => return Err(AppError::bad_request("Cart is empty")),
    };

    let mut items = Vec::with_capacity(cart.item_count());
    for entry in cart.items() {
        // Products deleted since they were added are skipped
        let Some(product) = state.repos.products.find(entry.product_id).await? else { continue };
        if !product.has_stock_for(entry.quantity) {
            return Err(AppError::bad_request(format!("Insufficient stock for: {}", product.name())));
        }
        items.push(OrderItem {
            product_id: product.id(),
            name: product.name().to_string(),
            price: product.price().clone(),
            quantity: entry.quantity,
            image: product.image().map(str::to_string),
        });
    }

    let address = shipping_address.map(|a| a.trim().to_string()).unwrap_or_default();
    let mut attempt = 0;
    let mut order = loop {
        attempt += 1;
        let order = Order::place(user_id, items.clone(), address.as_str())?;
        match state.repos.orders.insert(&order).await {
            Ok(()) => break order,
            Err(RepositoryError::Conflict("order_number")) if attempt < ORDER_NUMBER_ATTEMPTS => {
                tracing::debug!(order_number = order.order_number(), "Order number taken, drawing another");
            }
            Err(e) => return Err(e.into()),
        }
    };

    tracing::info!(order_id = %order.id(), order_number = order.order_number(), total = %order.total_amount().amount(), "Order placed");
    state.dispatcher.dispatch(order.take_events()).await;
    Ok(order)
}

/// Open a gateway payment page for the caller's order.
pub async fn initiate_payment(state: &AppState, caller: &AuthUser, order_id: Uuid) -> Result<PaymentSession> {
    let mut order = load(state, order_id).await?;
    if !order.is_owned_by(caller.id) {
        return Err(AppError::Forbidden("Unauthorized".into()));
    }
    order.ensure_payable()?;

    let customer = state.repos.users.find_by_id(order.user_id()).await?.ok_or_else(|| AppError::not_found("User"))?;
    let session = state.gateway.create_transaction(&order, &customer).await?;

    let expected = order.payment_status();
    order.attach_payment(session.token.as_str(), session.redirect_url.as_str());
    save_if_unchanged(state, &order, expected).await?;
    tracing::info!(order_number = order.order_number(), "Payment initiated");
    Ok(session)
}

pub async fn cancel(state: &AppState, caller: &AuthUser, order_id: Uuid) -> Result<Order> {
    let mut order = load(state, order_id).await?;
    if !order.is_owned_by(caller.id) {
        return Err(AppError::Forbidden("Unauthorized".into()));
    }
    let expected = order.payment_status();
    order.cancel()?;
    save_if_unchanged(state, &order, expected).await?;
    tracing::info!(order_number = order.order_number(), "Order cancelled by customer");
    state.dispatcher.dispatch(order.take_events()).await;
    Ok(order)
}

/// Ask the gateway for the payment state of an unpaid order and apply it.
pub async fn check_status(state: &AppState, caller: &AuthUser, order_id: Uuid) -> Result<StatusSnapshot> {
    let order = load(state, order_id).await?;
    ensure_visible(&order, caller)?;
    if order.is_paid() {
        return Ok(StatusSnapshot::from(&order));
    }

    match state.gateway.transaction_status(order.order_number()).await? {
        Some(report) => {
            let order = reconcile(state, order, &report).await?;
            Ok(StatusSnapshot::from(&order))
        }
        // No transaction at the gateway yet
        None => Ok(StatusSnapshot { status: OrderStatus::Pending, payment_status: PaymentStatus::Pending }),
    }
}

/// Gateway webhook.
pub async fn handle_notification(state: &AppState, notification: Notification) -> Result<()> {
    if !state.gateway.verify_notification(&notification) {
        tracing::warn!(order_number = %notification.order_id, "Rejected payment notification with bad signature");
        return Err(AppError::Forbidden("Invalid signature".into()));
    }
    let order = state
        .repos
        .orders
        .find_by_number(&notification.order_id)
        .await?
        .ok_or_else(|| AppError::not_found("Order"))?;

    let report = notification.report();
    tracing::info!(
        order_number = order.order_number(),
        transaction_status = report.transaction_status.as_str(),
        "Payment notification received"
    );
    reconcile(state, order, &report).await?;
    Ok(())
}

/// One order for its owner or an admin. Pending payments are refreshed from
/// the gateway on the way out; gateway trouble leaves the stored state as is.
pub async fn get(state: &AppState, caller: &AuthUser, order_id: Uuid) -> Result<Order> {
    let order = load(state, order_id).await?;
    ensure_visible(&order, caller)?;
    if order.payment_status() != PaymentStatus::Pending {
        return Ok(order);
    }

    match state.gateway.transaction_status(order.order_number()).await {
        Ok(Some(report)) => reconcile(state, order, &report).await,
        Ok(None) => Ok(order),
        Err(e) => {
            tracing::debug!(error = %e, order_number = order.order_number(), "Lazy payment poll failed");
            Ok(order)
        }
    }
}

pub async fn list_for_user(state: &AppState, user_id: Uuid) -> Result<Vec<Order>> {
    Ok(state.repos.orders.list_for_user(user_id).await?)
}

pub async fn list_all(state: &AppState) -> Result<Vec<AdminOrderView>> {
    let orders = state.repos.orders.list_all().await?;
    let mut customers: HashMap<Uuid, Option<CustomerSummary>> = HashMap::new();
    let mut views = Vec::with_capacity(orders.len());
    for order in orders {
        if !customers.contains_key(&order.user_id()) {
            let summary = state.repos.users.find_by_id(order.user_id()).await?.map(|u| CustomerSummary {
                id: u.id(),
                name: u.name().to_string(),
                email: u.email().to_string(),
            });
            customers.insert(order.user_id(), summary);
        }
        let user = customers.get(&order.user_id()).cloned().flatten();
        views.push(AdminOrderView { order, user });
    }
    Ok(views)
}

/// Back-office status change.
pub async fn update_status(state: &AppState, order_id: Uuid, status: &str) -> Result<Order> {
    let status: OrderStatus = status.trim().parse()?;
    let mut attempt = 0;
    let mut order = loop {
        attempt += 1;
        let mut order = load(state, order_id).await?;
        let expected = order.payment_status();
        order.set_status(status);
        if state.repos.orders.transition_payment(&order, expected).await? {
            break order;
        }
        // A payment report landed in between; redo on top of it
        if attempt == STATUS_UPDATE_ATTEMPTS {
            return Err(AppError::bad_request("Order was updated meanwhile, please retry"));
        }
    };
    tracing::info!(order_number = order.order_number(), status = status.as_str(), "Order status updated");
    state.dispatcher.dispatch(order.take_events()).await;
    Ok(order)
}

/// Apply a gateway report to `order`, running settlement side effects if this
/// caller is the one whose transition was stored.
///
/// Returns the order as it now stands in the store.
pub async fn reconcile(state: &AppState, mut order: Order, report: &GatewayReport) -> Result<Order> {
    let expected = order.payment_status();
    let outcome = order.apply_report(report);
    if outcome == PaymentOutcome::Unchanged {
        return Ok(order);
    }

    if !state.repos.orders.transition_payment(&order, expected).await? {
        tracing::debug!(order_number = order.order_number(), "Payment transition already applied elsewhere");
        return load(state, order.id()).await;
    }

    if outcome == PaymentOutcome::Settled {
        settle(state, &order).await;
        tracing::info!(order_number = order.order_number(), "Order paid");
    } else {
        tracing::info!(order_number = order.order_number(), "Order payment failed");
    }
    state.dispatcher.dispatch(order.take_events()).await;
    Ok(order)
}

/// Take the goods off the shelf and empty the buyer's cart.
///
/// The order is already stored as paid and no later report will run this
/// again, so every step is attempted and failures are only logged.
async fn settle(state: &AppState, order: &Order) {
    for item in order.items() {
        if let Err(e) = state.repos.products.decrement_stock(item.product_id, item.quantity).await {
            tracing::error!(
                error = %e,
                order_number = order.order_number(),
                product_id = %item.product_id,
                quantity = item.quantity,
                "Failed to take paid items off stock"
            );
        }
    }
    if let Err(e) = state.repos.carts.clear(order.user_id()).await {
        tracing::error!(error = %e, order_number = order.order_number(), "Failed to clear cart after payment");
    }
}

async fn load(state: &AppState, order_id: Uuid) -> Result<Order> {
    state.repos.orders.find(order_id).await?.ok_or_else(|| AppError::not_found("Order"))
}

fn ensure_visible(order: &Order, caller: &AuthUser) -> Result<()> {
    if order.is_owned_by(caller.id) || caller.is_admin {
        Ok(())
    } else {
        Err(AppError::Forbidden("Unauthorized".into()))
    }
}

/// Persist a non-payment change without clobbering a payment transition that
/// landed since the order was loaded.
async fn save_if_unchanged(state: &AppState, order: &Order, expected: PaymentStatus) -> Result<()> {
    if state.repos.orders.transition_payment(order, expected).await? {
        return Ok(());
    }
    // Most likely the payment settled meanwhile; report that if so
    load(state, order.id()).await?.ensure_payable()?;
    Err(AppError::bad_request("Order was updated meanwhile, please retry"))
}
