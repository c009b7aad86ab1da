//! ScentFix API server

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use secrecy::ExposeSecret;
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use scentfix::auth::TokenIssuer;
use scentfix::notify::{DisabledMessenger, FonnteMessenger, Messenger};
use scentfix::payment::MidtransGateway;
use scentfix::services::{auth::ensure_admin, catalog::ImageStore, dispatch::Dispatcher};
use scentfix::store::Repositories;
use scentfix::{api, AppState, Config};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;

    let repos = match &config.database_url {
        Some(url) => {
            let db = PgPoolOptions::new().max_connections(10).connect(url.expose_secret()).await?;
            sqlx::migrate!("./migrations").run(&db).await?;
            tracing::info!("Connected to PostgreSQL");
            Repositories::postgres(db)
        }
        None => {
            tracing::warn!("DATABASE_URL not set, keeping data in memory");
            Repositories::memory()
        }
    };

    let nats = match &config.nats_url {
        Some(url) => match async_nats::connect(url.as_str()).await {
            Ok(client) => Some(client),
            Err(e) => {
                tracing::warn!(error = %e, "NATS unavailable, events will not be published");
                None
            }
        },
        None => None,
    };

    let messenger: Arc<dyn Messenger> = match &config.fonnte_token {
        Some(token) => Arc::new(FonnteMessenger::new(token)?),
        None => {
            tracing::warn!("FONNTE_TOKEN not set, WhatsApp notifications disabled");
            Arc::new(DisabledMessenger)
        }
    };

    if let Some(seed) = &config.auth.bootstrap_admin {
        if ensure_admin(repos.users.as_ref(), seed).await.context("failed to bootstrap admin account")? {
            tracing::info!(email = %seed.email, "Admin account created");
        }
    }

    let images = ImageStore::new(&config.assets_dir);
    tokio::fs::create_dir_all(images.root()).await.context("failed to create assets directory")?;

    let state = AppState {
        gateway: Arc::new(MidtransGateway::new(&config.midtrans)?),
        dispatcher: Arc::new(Dispatcher::new(repos.users.clone(), repos.orders.clone(), messenger, nats)),
        tokens: Arc::new(TokenIssuer::new(&config.auth.jwt_secret, config.auth.token_ttl_days)),
        images,
        admin_email_domain: config.auth.admin_email_domain.clone(),
        repos,
    };

    let app = api::router(state);
    let addr = SocketAddr::new(config.host, config.port);
    tracing::info!("🚀 ScentFix API listening on {}", addr);
    axum::serve(tokio::net::TcpListener::bind(addr).await?, app).await?;
    Ok(())
}
