//! In-process store backed by hash maps.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{CartRepository, OrderRepository, ProductRepository, RepoResult, RepositoryError, UserRepository};
use crate::domain::aggregates::{Cart, Order, PaymentStatus, Product, User};
use crate::domain::value_objects::{Email, Phone};

#[derive(Default)]
pub struct MemoryStore {
    users: RwLock<HashMap<Uuid, User>>,
    products: RwLock<HashMap<Uuid, Product>>,
    carts: RwLock<HashMap<Uuid, Cart>>,
    orders: RwLock<HashMap<Uuid, Order>>,
}

fn stored_user(user: &User) -> User {
    let mut user = user.clone();
    user.events.clear();
    user
}

fn stored_order(order: &Order) -> Order {
    let mut order = order.clone();
    order.events.clear();
    order
}

fn newest_first(orders: &mut [Order]) {
    orders.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert(&self, user: &User) -> RepoResult<()> {
        let mut users = self.users.write().await;
        if users.values().any(|u| u.email == user.email) { return Err(RepositoryError::Conflict("email")); }
        if users.values().any(|u| u.phone == user.phone) { return Err(RepositoryError::Conflict("phone")); }
        users.insert(user.id, stored_user(user));
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        Ok(self.users.read().await.get(&id).cloned())
    }

    async fn find_by_email(&self, email: &Email) -> RepoResult<Option<User>> {
        Ok(self.users.read().await.values().find(|u| &u.email == email).cloned())
    }

    async fn find_by_phone(&self, phone: &Phone) -> RepoResult<Option<User>> {
        Ok(self.users.read().await.values().find(|u| &u.phone == phone).cloned())
    }

    async fn find_admin_by_email(&self, email: &Email) -> RepoResult<Option<User>> {
        Ok(self.users.read().await.values().find(|u| u.is_admin && &u.email == email).cloned())
    }
}

#[async_trait]
impl ProductRepository for MemoryStore {
    async fn list(&self) -> RepoResult<Vec<Product>> {
        let mut products: Vec<Product> = self.products.read().await.values().cloned().collect();
        products.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(products)
    }

    async fn find(&self, id: Uuid) -> RepoResult<Option<Product>> {
        Ok(self.products.read().await.get(&id).cloned())
    }

    async fn insert(&self, product: &Product) -> RepoResult<()> {
        self.products.write().await.insert(product.id, product.clone());
        Ok(())
    }

    async fn update(&self, product: &Product) -> RepoResult<()> {
        let mut products = self.products.write().await;
        let slot = products.get_mut(&product.id).ok_or(RepositoryError::NotFound)?;
        *slot = product.clone();
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        Ok(self.products.write().await.remove(&id).is_some())
    }

    async fn decrement_stock(&self, id: Uuid, qty: u32) -> RepoResult<()> {
        if let Some(product) = self.products.write().await.get_mut(&id) {
            product.decrement_stock(qty);
        }
        Ok(())
    }
}

#[async_trait]
impl CartRepository for MemoryStore {
    async fn find(&self, user_id: Uuid) -> RepoResult<Option<Cart>> {
        Ok(self.carts.read().await.get(&user_id).cloned())
    }

    async fn save(&self, cart: &Cart) -> RepoResult<()> {
        self.carts.write().await.insert(cart.user_id, cart.clone());
        Ok(())
    }

    async fn clear(&self, user_id: Uuid) -> RepoResult<()> {
        if let Some(cart) = self.carts.write().await.get_mut(&user_id) {
            cart.clear();
        }
        Ok(())
    }
}

#[async_trait]
impl OrderRepository for MemoryStore {
    async fn insert(&self, order: &Order) -> RepoResult<()> {
        let mut orders = self.orders.write().await;
        if orders.values().any(|o| o.order_number == order.order_number) {
            return Err(RepositoryError::Conflict("order_number"));
        }
        orders.insert(order.id, stored_order(order));
        Ok(())
    }

    async fn find(&self, id: Uuid) -> RepoResult<Option<Order>> {
        Ok(self.orders.read().await.get(&id).cloned())
    }

    async fn find_by_number(&self, order_number: &str) -> RepoResult<Option<Order>> {
        Ok(self.orders.read().await.values().find(|o| o.order_number == order_number).cloned())
    }

    async fn list_for_user(&self, user_id: Uuid) -> RepoResult<Vec<Order>> {
        let mut orders: Vec<Order> = self.orders.read().await.values().filter(|o| o.user_id == user_id).cloned().collect();
        newest_first(&mut orders);
        Ok(orders)
    }

    async fn list_all(&self) -> RepoResult<Vec<Order>> {
        let mut orders: Vec<Order> = self.orders.read().await.values().cloned().collect();
        newest_first(&mut orders);
        Ok(orders)
    }

    async fn transition_payment(&self, order: &Order, expected: PaymentStatus) -> RepoResult<bool> {
        let mut orders = self.orders.write().await;
        let slot = orders.get_mut(&order.id).ok_or(RepositoryError::NotFound)?;
        if slot.payment_status != expected { return Ok(false); }
        *slot = stored_order(order);
        Ok(true)
    }
}
