//! TikTok Login Kit server
//!
//! Exposes the request and callback routes for the TikTok provider. See
//! [`tiktok_login_server::config`] for the environment variables it reads.

use anyhow::{Context, Result};
use ras_identity_oauth2::{InMemoryStateStore, OAuth2Config, OAuth2StateStore};
use ras_identity_tiktok::tiktok_provider;
use std::sync::Arc;
use std::time::Duration;
use tiktok_login_server::{AppConfig, AppState, create_router};
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

const STATE_CLEANUP_INTERVAL: Duration = Duration::from_secs(60);

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env()?;

    let state_store = Arc::new(InMemoryStateStore::new());
    let provider = tiktok_provider(
        config.tiktok.clone(),
        OAuth2Config::default(),
        state_store.clone(),
    )
    .context("Failed to create TikTok provider")?;

    tokio::spawn(cleanup_expired_states(state_store));

    let app = create_router(AppState::new(provider, config.public_url.clone()));

    let addr = config.bind_address();
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("TikTok login server listening on {}", addr);
    info!(
        "Start the flow at {}{}/tiktok-loginkit",
        config.public_url, config.tiktok.path_prefix
    );

    axum::serve(listener, app).await.context("Server error")?;
    Ok(())
}

async fn cleanup_expired_states(store: Arc<InMemoryStateStore>) {
    let mut interval = tokio::time::interval(STATE_CLEANUP_INTERVAL);
    loop {
        interval.tick().await;
        match store.cleanup_expired().await {
            Ok(0) => {}
            Ok(removed) => debug!("Removed {} expired OAuth2 states", removed),
            Err(e) => warn!("Failed to clean up OAuth2 states: {}", e),
        }
    }
}
