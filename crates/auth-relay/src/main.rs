use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use auth_relay::auth::InMemoryUserStore;
use auth_relay::config::AppConfig;
use auth_relay::oauth::{InMemoryRefreshTokenStore, TokenExchangeService};
use auth_relay::{create_app, AppState};
use tokio::signal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "auth_relay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::from_env()?;

    tracing::info!("Starting auth relay");

    let exchange = TokenExchangeService::new(
        config.exchange_settings(),
        Arc::new(InMemoryRefreshTokenStore::new()),
    )?;
    if exchange.is_configured() {
        tracing::info!("Google token exchange enabled");
    }
    let users = InMemoryUserStore::new(config.login_users.clone());
    if users.is_empty() {
        tracing::warn!("LOGIN_USERS is empty, /login will reject every user");
    } else {
        tracing::info!("Loaded {} login user(s)", users.len());
    }

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    let app = create_app(AppState {
        config: Arc::new(config),
        exchange: Arc::new(exchange),
        users: Arc::new(users),
    });

    tracing::info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Auth relay stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutdown signal received, stopping...");
}
