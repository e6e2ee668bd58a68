use anyhow::Context;
use std::path::Path;

use crate::analytics::Aggregator;
use crate::cli::open_store;
use crate::config::AppConfig;
use crate::routes::{app, AppState};

pub async fn handle(config: AppConfig, fixture: Option<&Path>, port: Option<u16>) -> anyhow::Result<()> {
    tracing::info!("Starting research portal API in {:?} mode", config.environment);

    if config.security.require_auth && config.security.jwt_secret.is_empty() {
        tracing::warn!("SECURITY_REQUIRE_AUTH is on but SECURITY_JWT_SECRET is empty; every /api request will be rejected");
    }

    let store = open_store(&config, fixture).await?;
    let aggregator = Aggregator::new(store.clone(), config.analytics.active_rule.clone());
    let state = AppState::new(store, aggregator, config.security.clone());
    let router = app(state, &config.api);

    let port = port.unwrap_or(config.api.port);
    let bind_addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Research portal API listening on http://{}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
