//! Main Entrypoint for the Voicecall Token Relay
//!
//! This binary is responsible for:
//! 1. Loading configuration from the environment.
//! 2. Building the voice platform client.
//! 3. Constructing the Axum router and applying middleware.
//! 4. Starting the web server and handling graceful shutdown.

use anyhow::Context;
use std::{net::SocketAddr, sync::Arc};
use tower_http::cors::{Any, CorsLayer};
use tracing::{info, warn};
use voicecall_api::{config::Config, router::create_router, state::AppState};
use voicecall_core::RetellPlatform;

/// Listens for the `Ctrl+C` signal to gracefully shut down the server.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "Failed to install Ctrl+C handler");
        return;
    }
    info!("Received shutdown signal. Shutting down gracefully...");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // --- 1. Load Configuration ---
    let mut config = Config::from_env().context("Failed to load configuration")?;

    // --- 2. Initialize Logging ---
    tracing_subscriber::fmt()
        .with_max_level(config.log_level)
        .with_timer(tracing_subscriber::fmt::time::ChronoLocal::rfc_3339())
        .init();

    if config.api_key.is_none() {
        warn!("RETELL_API_KEY is not set; call registration will fail.");
    }
    if config.agent_id.is_none() {
        warn!("RETELL_AGENT_ID is not set; call registration will fail.");
    }

    // --- 3. Initialize the Platform Client ---
    // The key moves into the platform client; handlers never see it.
    let platform = Arc::new(RetellPlatform::new(
        &config.platform_base_url,
        config.api_key.take(),
    ));

    let bind_address = config.bind_address;
    info!(
        platform = %config.platform_base_url,
        sample_rate = config.sample_rate,
        bind_address = %bind_address,
        "Service configured. Starting server..."
    );

    let app_state = Arc::new(AppState {
        platform,
        config: Arc::new(config),
    });

    // --- 4. Create Router and Apply Middleware ---
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let app = create_router(app_state).layer(cors);

    // --- 5. Start Server ---
    let listener = tokio::net::TcpListener::bind(bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    info!("Backend server listening on http://{}", bind_address);

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    info!("Server has shut down.");
    Ok(())
}
