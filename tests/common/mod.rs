#![allow(dead_code)]

pub mod fakes;

use std::path::PathBuf;
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{header, Method, Request, StatusCode},
    Router,
};
use rust_decimal::Decimal;
use secrecy::SecretString;
use serde_json::Value;
use tower::ServiceExt;
use uuid::Uuid;

use scentfix::auth::TokenIssuer;
use scentfix::config::AdminSeed;
use scentfix::domain::aggregates::Product;
use scentfix::domain::value_objects::{Money, Quantity};
use scentfix::services::{auth::ensure_admin, catalog::ImageStore, dispatch::Dispatcher};
use scentfix::store::Repositories;
use scentfix::{api, AppState};

pub use fakes::{BrokenStock, FakeGateway, RecordingMessenger};

pub const ADMIN_PASSWORD: &str = "admin-secret";

/// The full router over the in-memory store, with fake gateway and messenger.
pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub gateway: Arc<FakeGateway>,
    pub messenger: Arc<RecordingMessenger>,
    pub assets: PathBuf,
}

impl TestApp {
    pub fn new() -> Self {
        Self::with_repos(Repositories::memory())
    }

    pub fn with_repos(repos: Repositories) -> Self {
        let gateway = Arc::new(FakeGateway::default());
        let messenger = Arc::new(RecordingMessenger::default());
        let assets = std::env::temp_dir().join(format!("scentfix-test-{}", Uuid::new_v4()));

        let state = AppState {
            gateway: gateway.clone(),
            dispatcher: Arc::new(Dispatcher::new(repos.users.clone(), repos.orders.clone(), messenger.clone(), None)),
            tokens: Arc::new(TokenIssuer::new(&SecretString::from("test-secret".to_string()), 7)),
            images: ImageStore::new(&assets),
            admin_email_domain: "scentfix.com".to_string(),
            repos,
        };

        Self { router: api::router(state.clone()), state, gateway, messenger, assets }
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap_or(Value::Null) };
        (status, body)
    }

    pub async fn call(&self, method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(serde_json::to_vec(&json).unwrap()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn get(&self, uri: &str, token: Option<&str>) -> (StatusCode, Value) {
        self.call(Method::GET, uri, token, None).await
    }

    pub async fn post(&self, uri: &str, token: Option<&str>, body: Value) -> (StatusCode, Value) {
        self.call(Method::POST, uri, token, Some(body)).await
    }

    /// Register a customer and return `(user_id, token)`.
    pub async fn customer(&self, name: &str, email: &str, phone: &str) -> (Uuid, String) {
        let (status, body) = self
            .post(
                "/api/auth/register",
                None,
                serde_json::json!({
                    "name": name,
                    "email": email,
                    "password": "rahasia123",
                    "birthdate": "1998-07-12",
                    "gender": "female",
                    "phone": phone,
                }),
            )
            .await;
        assert_eq!(status, StatusCode::CREATED, "{body}");
        let id = body["user"]["id"].as_str().unwrap().parse().unwrap();
        (id, body["token"].as_str().unwrap().to_string())
    }

    pub async fn admin_token(&self) -> String {
        let seed = AdminSeed {
            email: "admin@scentfix.com".into(),
            password: SecretString::from(ADMIN_PASSWORD.to_string()),
            name: "Admin".into(),
            phone: "0800000000".into(),
        };
        ensure_admin(self.state.repos.users.as_ref(), &seed).await.unwrap();
        let (status, body) = self
            .post("/api/auth/admin/login", None, serde_json::json!({ "username": "admin", "password": ADMIN_PASSWORD }))
            .await;
        assert_eq!(status, StatusCode::OK, "{body}");
        body["token"].as_str().unwrap().to_string()
    }

    /// Put a product straight into the store.
    pub async fn product(&self, name: &str, price: i64, stock: u32) -> Product {
        let product = Product::create(name, "Shoe deodorant patch", Money::idr(Decimal::new(price, 0)), Quantity::new(stock)).unwrap();
        self.state.repos.products.insert(&product).await.unwrap();
        product
    }

    pub async fn stock_of(&self, id: Uuid) -> u32 {
        self.state.repos.products.find(id).await.unwrap().unwrap().stock().value()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_dir_all(&self.assets);
    }
}
