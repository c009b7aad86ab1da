//! `PostgreSQL` adapter. Line items and cart contents live in JSONB columns.

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};
use uuid::Uuid;

use super::{CartRepository, OrderRepository, ProductRepository, RepoResult, RepositoryError, UserRepository};
use crate::domain::aggregates::{Cart, CartItem, Order, OrderItem, PaymentStatus, Product, User};
use crate::domain::value_objects::{Email, Money, Phone, Quantity};

#[derive(Clone)]
pub struct PgStore {
    db: PgPool,
}

impl PgStore {
    pub fn new(db: PgPool) -> Self { Self { db } }
}

fn corrupt(what: &str, detail: impl std::fmt::Display) -> RepositoryError {
    RepositoryError::Corrupt(format!("{what}: {detail}"))
}

fn conflict_or(e: sqlx::Error) -> RepositoryError {
    if let sqlx::Error::Database(db) = &e {
        if db.is_unique_violation() {
            let field = match db.constraint() {
                Some(c) if c.contains("phone") => "phone",
                Some(c) if c.contains("order_number") => "order_number",
                _ => "email",
            };
            return RepositoryError::Conflict(field);
        }
    }
    RepositoryError::Database(e)
}

fn to_i32(qty: u32) -> RepoResult<i32> {
    i32::try_from(qty).map_err(|e| corrupt("quantity", e))
}

fn user_from_row(row: &PgRow) -> RepoResult<User> {
    let email: String = row.try_get("email")?;
    let phone: String = row.try_get("phone")?;
    let gender: String = row.try_get("gender")?;
    Ok(User {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        email: Email::parse(&email).map_err(|e| corrupt("email", e))?,
        password_hash: row.try_get("password_hash")?,
        birthdate: row.try_get::<Option<NaiveDate>, _>("birthdate")?,
        gender: gender.parse().map_err(|e| corrupt("gender", e))?,
        phone: Phone::parse(&phone).map_err(|e| corrupt("phone", e))?,
        is_admin: row.try_get("is_admin")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
        events: vec![],
    })
}

fn product_from_row(row: &PgRow) -> RepoResult<Product> {
    let price: Decimal = row.try_get("price")?;
    let currency: String = row.try_get("currency")?;
    let stock: i32 = row.try_get("stock")?;
    Ok(Product {
        id: row.try_get("id")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        price: Money::new(price, &currency),
        stock: Quantity::new(u32::try_from(stock).map_err(|e| corrupt("stock", e))?),
        image: row.try_get("image")?,
        folder_name: row.try_get("folder_name")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

fn order_from_row(row: &PgRow) -> RepoResult<Order> {
    let Json(items): Json<Vec<OrderItem>> = row.try_get("items")?;
    let total: Decimal = row.try_get("total_amount")?;
    let currency: String = row.try_get("currency")?;
    let status: String = row.try_get("status")?;
    let payment_status: String = row.try_get("payment_status")?;
    Ok(Order {
        id: row.try_get("id")?,
        order_number: row.try_get("order_number")?,
        user_id: row.try_get("user_id")?,
        items,
        total_amount: Money::new(total, &currency),
        status: status.parse().map_err(|e| corrupt("status", e))?,
        payment_status: payment_status.parse().map_err(|e| corrupt("payment_status", e))?,
        payment_token: row.try_get("payment_token")?,
        payment_url: row.try_get("payment_url")?,
        transaction_status: row.try_get("transaction_status")?,
        fraud_status: row.try_get("fraud_status")?,
        shipping_address: row.try_get("shipping_address")?,
        created_at: row.try_get::<DateTime<Utc>, _>("created_at")?,
        updated_at: row.try_get::<DateTime<Utc>, _>("updated_at")?,
        events: vec![],
    })
}

#[async_trait]
impl UserRepository for PgStore {
    async fn insert(&self, u: &User) -> RepoResult<()> {
        sqlx::query("INSERT INTO users (id, name, email, password_hash, birthdate, gender, phone, is_admin, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)")
            .bind(u.id).bind(&u.name).bind(u.email.as_str()).bind(&u.password_hash).bind(u.birthdate).bind(u.gender.as_str())
            .bind(u.phone.as_str()).bind(u.is_admin).bind(u.created_at).bind(u.updated_at)
            .execute(&self.db).await.map_err(conflict_or)?;
        Ok(())
    }

    async fn find_by_id(&self, id: Uuid) -> RepoResult<Option<User>> {
        sqlx::query("SELECT * FROM users WHERE id = $1").bind(id).fetch_optional(&self.db).await?.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_email(&self, email: &Email) -> RepoResult<Option<User>> {
        sqlx::query("SELECT * FROM users WHERE email = $1").bind(email.as_str()).fetch_optional(&self.db).await?.as_ref().map(user_from_row).transpose()
    }

    async fn find_by_phone(&self, phone: &Phone) -> RepoResult<Option<User>> {
        sqlx::query("SELECT * FROM users WHERE phone = $1").bind(phone.as_str()).fetch_optional(&self.db).await?.as_ref().map(user_from_row).transpose()
    }

    async fn find_admin_by_email(&self, email: &Email) -> RepoResult<Option<User>> {
        sqlx::query("SELECT * FROM users WHERE email = $1 AND is_admin").bind(email.as_str()).fetch_optional(&self.db).await?.as_ref().map(user_from_row).transpose()
    }
}

#[async_trait]
impl ProductRepository for PgStore {
    async fn list(&self) -> RepoResult<Vec<Product>> {
        sqlx::query("SELECT * FROM products ORDER BY created_at DESC, id DESC").fetch_all(&self.db).await?.iter().map(product_from_row).collect()
    }

    async fn find(&self, id: Uuid) -> RepoResult<Option<Product>> {
        sqlx::query("SELECT * FROM products WHERE id = $1").bind(id).fetch_optional(&self.db).await?.as_ref().map(product_from_row).transpose()
    }

    async fn insert(&self, p: &Product) -> RepoResult<()> {
        sqlx::query("INSERT INTO products (id, name, description, price, currency, stock, image, folder_name, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)")
            .bind(p.id).bind(&p.name).bind(&p.description).bind(p.price.amount()).bind(p.price.currency()).bind(to_i32(p.stock.value())?)
            .bind(&p.image).bind(&p.folder_name).bind(p.created_at).bind(p.updated_at)
            .execute(&self.db).await?;
        Ok(())
    }

    async fn update(&self, p: &Product) -> RepoResult<()> {
        let done = sqlx::query("UPDATE products SET name = $2, description = $3, price = $4, currency = $5, stock = $6, image = $7, folder_name = $8, updated_at = $9 WHERE id = $1")
            .bind(p.id).bind(&p.name).bind(&p.description).bind(p.price.amount()).bind(p.price.currency()).bind(to_i32(p.stock.value())?)
            .bind(&p.image).bind(&p.folder_name).bind(p.updated_at)
            .execute(&self.db).await?;
        if done.rows_affected() == 0 { return Err(RepositoryError::NotFound); }
        Ok(())
    }

    async fn delete(&self, id: Uuid) -> RepoResult<bool> {
        let done = sqlx::query("DELETE FROM products WHERE id = $1").bind(id).execute(&self.db).await?;
        Ok(done.rows_affected() > 0)
    }

    async fn decrement_stock(&self, id: Uuid, qty: u32) -> RepoResult<()> {
        sqlx::query("UPDATE products SET stock = GREATEST(stock - $2, 0), updated_at = NOW() WHERE id = $1")
            .bind(id).bind(to_i32(qty)?).execute(&self.db).await?;
        Ok(())
    }
}

#[async_trait]
impl CartRepository for PgStore {
    async fn find(&self, user_id: Uuid) -> RepoResult<Option<Cart>> {
        let row = sqlx::query("SELECT user_id, items, updated_at FROM carts WHERE user_id = $1").bind(user_id).fetch_optional(&self.db).await?;
        row.map(|row| -> RepoResult<Cart> {
            let Json(items): Json<Vec<CartItem>> = row.try_get("items")?;
            Ok(Cart { user_id: row.try_get("user_id")?, items, updated_at: row.try_get("updated_at")? })
        }).transpose()
    }

    async fn save(&self, cart: &Cart) -> RepoResult<()> {
        sqlx::query("INSERT INTO carts (user_id, items, updated_at) VALUES ($1, $2, $3) ON CONFLICT (user_id) DO UPDATE SET items = EXCLUDED.items, updated_at = EXCLUDED.updated_at")
            .bind(cart.user_id).bind(Json(&cart.items)).bind(cart.updated_at)
            .execute(&self.db).await?;
        Ok(())
    }

    async fn clear(&self, user_id: Uuid) -> RepoResult<()> {
        sqlx::query("UPDATE carts SET items = '[]'::jsonb, updated_at = NOW() WHERE user_id = $1").bind(user_id).execute(&self.db).await?;
        Ok(())
    }
}

const ORDER_COLUMNS: &str = "status = $2, payment_status = $3, payment_token = $4, payment_url = $5, transaction_status = $6, fraud_status = $7, updated_at = $8";

#[async_trait]
impl OrderRepository for PgStore {
    async fn insert(&self, o: &Order) -> RepoResult<()> {
        sqlx::query("INSERT INTO orders (id, order_number, user_id, items, total_amount, currency, status, payment_status, payment_token, payment_url, transaction_status, fraud_status, shipping_address, created_at, updated_at) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15)")
            .bind(o.id).bind(&o.order_number).bind(o.user_id).bind(Json(&o.items)).bind(o.total_amount.amount()).bind(o.total_amount.currency())
            .bind(o.status.as_str()).bind(o.payment_status.as_str()).bind(&o.payment_token).bind(&o.payment_url)
            .bind(&o.transaction_status).bind(&o.fraud_status).bind(&o.shipping_address).bind(o.created_at).bind(o.updated_at)
            .execute(&self.db).await.map_err(conflict_or)?;
        Ok(())
    }

    async fn find(&self, id: Uuid) -> RepoResult<Option<Order>> {
        sqlx::query("SELECT * FROM orders WHERE id = $1").bind(id).fetch_optional(&self.db).await?.as_ref().map(order_from_row).transpose()
    }

    async fn find_by_number(&self, order_number: &str) -> RepoResult<Option<Order>> {
        sqlx::query("SELECT * FROM orders WHERE order_number = $1").bind(order_number).fetch_optional(&self.db).await?.as_ref().map(order_from_row).transpose()
    }

    async fn list_for_user(&self, user_id: Uuid) -> RepoResult<Vec<Order>> {
        sqlx::query("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC").bind(user_id).fetch_all(&self.db).await?.iter().map(order_from_row).collect()
    }

    async fn list_all(&self) -> RepoResult<Vec<Order>> {
        sqlx::query("SELECT * FROM orders ORDER BY created_at DESC, id DESC").fetch_all(&self.db).await?.iter().map(order_from_row).collect()
    }

    async fn transition_payment(&self, o: &Order, expected: PaymentStatus) -> RepoResult<bool> {
        let sql = format!("UPDATE orders SET {ORDER_COLUMNS} WHERE id = $1 AND payment_status = $9");
        let done = sqlx::query(&sql)
            .bind(o.id).bind(o.status.as_str()).bind(o.payment_status.as_str()).bind(&o.payment_token).bind(&o.payment_url)
            .bind(&o.transaction_status).bind(&o.fraud_status).bind(o.updated_at).bind(expected.as_str())
            .execute(&self.db).await?;
        Ok(done.rows_affected() == 1)
    }
}
