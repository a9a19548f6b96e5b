//! Flightdeck server - hosts flight sessions and streams their playback.

use anyhow::Result;
use axum::routing::get;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use flightdeck_server::api;
use flightdeck_server::config::Config;
use flightdeck_server::state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("flightdeck_server=debug".parse()?),
        )
        .init();

    tracing::info!("Starting Flightdeck Server...");

    let config = Config::from_env();
    let port = config.server_port;
    tracing::info!(
        "Jump feedback {:?}, cluster threshold {}s",
        config.jump_feedback,
        config.cluster_threshold_secs
    );
    let state = Arc::new(AppState::new(config));

    let app = api::routes()
        .route("/health", get(|| async { "OK" }))
        .with_state(state.clone())
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive());

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    tracing::info!("Listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Dropping the sessions aborts their playback timers.
    tracing::info!("Shutting down; closing {} session(s)", state.session_count());
    state.clear();
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
}
