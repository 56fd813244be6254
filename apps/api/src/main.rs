//! API Server Entry Point
//!
//! Application entry point and server initialization.
//! Uses `anyhow` for startup errors, but application-level
//! errors should use `kernel::error::AppError`.

use account::{account_router, AccountConfig, PgAccountStore};
use axum::{
    http,
    http::{header, Method},
    Router,
};
use base64::engine::general_purpose;
use base64::Engine;
use sqlx::postgres::PgPoolOptions;
use std::env;
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod seed;

// Re-export unified error types for use in handlers
pub use kernel::error::{
    app_error::{AppError, AppResult},
    kind::ErrorKind,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "api=info,account=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Database connection
    let database_url =
        env::var("DATABASE_URL").map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?;

    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await?;

    tracing::info!("Connected to database");

    // Run migrations
    sqlx::migrate!("../../database/migrations").run(&pool).await?;

    tracing::info!("Migrations completed");

    // Account configuration
    let config = if cfg!(debug_assertions) {
        AccountConfig::development()
    } else {
        production_config()?
    };

    let store = PgAccountStore::new(pool.clone());

    // Built-in roles and optional bootstrap admin
    // A seed failure should not prevent server startup
    if let Err(e) = seed::run(&store, &config, seed::SeedAdmin::from_env()).await {
        tracing::warn!(error = %e, "Seeding failed, continuing anyway");
    }

    // CORS configuration
    let frontend_origins = env::var("FRONTEND_ORIGINS")
        .unwrap_or_else(|_| "http://localhost:8080,http://127.0.0.1:8080".to_string());

    let allowed_origins: Vec<http::HeaderValue> = frontend_origins
        .split(',')
        .filter_map(|origin| origin.trim().parse().ok())
        .collect();

    let cors = CorsLayer::new()
        .allow_origin(allowed_origins)
        .allow_methods(AllowMethods::list([
            Method::GET,
            Method::POST,
            Method::DELETE,
            Method::OPTIONS,
        ]))
        .allow_headers(AllowHeaders::list([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
        ]))
        .allow_credentials(true);

    // Build router
    let app = Router::new()
        .nest("/api", account_router(store, config))
        .layer(TraceLayer::new_for_http())
        .layer(cors);

    // Start server
    let port: u16 = env::var("PORT")
        .ok()
        .and_then(|p| p.parse().ok())
        .unwrap_or(31113);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

/// Build production config from environment secrets.
fn production_config() -> anyhow::Result<AccountConfig> {
    let session_secret = decode_secret("SESSION_SECRET")?;
    let token_secret = decode_secret("TOKEN_SECRET")?;
    let bearer_key =
        env::var("TOKENS_KEY").map_err(|_| anyhow::anyhow!("TOKENS_KEY must be set"))?;

    let mut config = AccountConfig {
        session_secret,
        token_secret,
        bearer_key,
        ..AccountConfig::default()
    };

    if let Ok(issuer) = env::var("TOKENS_ISSUER") {
        config.bearer_issuer = issuer;
    }
    if let Ok(audience) = env::var("TOKENS_AUDIENCE") {
        config.bearer_audience = audience;
    }
    if let Ok(base_url) = env::var("PUBLIC_BASE_URL") {
        config.public_base_url = base_url;
    }
    if let Ok(pepper) = env::var("PASSWORD_PEPPER") {
        config.password_pepper = Some(pepper.into_bytes());
    }

    Ok(config)
}

/// Decode a base64-encoded 32-byte secret from the environment.
fn decode_secret(name: &str) -> anyhow::Result<[u8; 32]> {
    let value = env::var(name).map_err(|_| anyhow::anyhow!("{name} must be set in production"))?;
    let bytes = Engine::decode(&general_purpose::STANDARD, &value)?;
    let secret: [u8; 32] = bytes
        .try_into()
        .map_err(|_| anyhow::anyhow!("{name} must decode to exactly 32 bytes"))?;
    Ok(secret)
}
