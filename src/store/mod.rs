//! Persistence ports and their adapters.
//!
//! Each aggregate gets its own async repository trait. Two adapters implement
//! all of them: [`postgres::PgStore`] for deployments and
//! [`memory::MemoryStore`] for local runs without a database and for tests.

pub mod memory;
pub mod postgres;

use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::aggregates::{Cart, Order, PaymentStatus, Product, User};
use crate::domain::value_objects::{Email, Phone};

/// Persistence errors raised by repository adapters.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// A unique field (`email`, `phone`, `order_number`) is already taken.
    #[error("Duplicate {0}")]
    Conflict(&'static str),

    #[error("Record not found")]
    NotFound,

    /// A stored row could not be turned back into a domain value.
    #[error("Corrupt record: {0}")]
    Corrupt(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type RepoResult<T> = Result<T, RepositoryError>;

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Insert a new account; fails with `Conflict` on duplicate email or phone.
    async fn insert(&self, user: &User) -> RepoResult<()>;
    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>>;
    async fn find_by_email(&self, email: &Email) -> RepoResult<Option<User>>;
    async fn find_by_phone(&self, phone: &Phone) -> RepoResult<Option<User>>;
    async fn find_admin_by_email(&self, email: &Email) -> RepoResult<Option<User>>;
}

#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// All products, newest first.
    async fn list(&self) -> RepoResult<Vec<Product>>;
    async fn find(&self, id: Uuid) -> RepoResult<Option<Product>>;
    async fn insert(&self, product: &Product) -> RepoResult<()>;
    /// Overwrite an existing product; `NotFound` if it was deleted meanwhile.
    async fn update(&self, product: &Product) -> RepoResult<()>;
    /// Returns whether a product was removed.
    async fn delete(&self, id: Uuid) -> RepoResult<bool>;
    /// Take `qty` units off the shelf, never going below zero. Missing products are skipped.
    async fn decrement_stock(&self, id: Uuid, qty: u32) -> RepoResult<()>;
}

#[async_trait]
pub trait CartRepository: Send + Sync {
    async fn find(&self, user_id: Uuid) -> RepoResult<Option<Cart>>;
    async fn save(&self, cart: &Cart) -> RepoResult<()>;
    async fn clear(&self, user_id: Uuid) -> RepoResult<()>;
}

#[async_trait]
pub trait OrderRepository: Send + Sync {
    async fn insert(&self, order: &Order) -> RepoResult<()>;
    async fn find(&self, id: Uuid) -> RepoResult<Option<Order>>;
    async fn find_by_number(&self, order_number: &str) -> RepoResult<Option<Order>>;
    /// Orders of one customer, newest first.
    async fn list_for_user(&self, user_id: Uuid) -> RepoResult<Vec<Order>>;
    /// Every order, newest first.
    async fn list_all(&self) -> RepoResult<Vec<Order>>;
    /// Persist `order` only if the stored payment status still equals `expected`.
    ///
    /// Returns `false` when another writer got there first; the caller must then
    /// skip any side effects of the transition.
    async fn transition_payment(&self, order: &Order, expected: PaymentStatus) -> RepoResult<bool>;
}

/// The full set of repositories the service runs on.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub carts: Arc<dyn CartRepository>,
    pub orders: Arc<dyn OrderRepository>,
}

impl Repositories {
    pub fn memory() -> Self {
        let store = Arc::new(memory::MemoryStore::default());
        Self { users: store.clone(), products: store.clone(), carts: store.clone(), orders: store }
    }

    pub fn postgres(pool: sqlx::PgPool) -> Self {
        let store = Arc::new(postgres::PgStore::new(pool));
        Self { users: store.clone(), products: store.clone(), carts: store.clone(), orders: store }
    }
}
