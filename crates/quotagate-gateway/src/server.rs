// SPDX-FileCopyrightText: 2026 Quotagate Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Proxy HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the proxy.

use std::future::Future;
use std::sync::Arc;

use axum::{
    routing::get,
    Router,
};
use quotagate_admission::AdmissionController;
use quotagate_core::QuotaError;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub controller: Arc<AdmissionController>,
}

/// Listener address for the proxy.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Build the proxy router.
///
/// Routes:
/// - GET /health
/// - POST /v1/chat/completions, POST /api/v1/chat/completions (admission)
/// - GET /v1/chat/completions, GET /api/v1/chat/completions (status)
/// - GET /pricing, GET /api/pricing
pub fn build_router(state: GatewayState) -> Router {
    let chat = get(handlers::get_info).post(handlers::post_chat_completions);

    Router::new()
        .route("/health", get(handlers::get_health))
        .route("/v1/chat/completions", chat.clone())
        .route("/api/v1/chat/completions", chat)
        .route("/pricing", get(handlers::get_pricing))
        .route("/api/pricing", get(handlers::get_pricing))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Start the proxy HTTP server and serve until `shutdown` resolves.
///
/// In-flight requests are allowed to finish once shutdown begins.
pub async fn start_server<F>(
    config: &ServerConfig,
    state: GatewayState,
    shutdown: F,
) -> Result<(), QuotaError>
where
    F: Future<Output = ()> + Send + 'static,
{
    let app = build_router(state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| QuotaError::Config(format!("failed to bind proxy to {addr}: {e}")))?;

    tracing::info!("proxy listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown)
        .await
        .map_err(|e| QuotaError::Internal(format!("proxy server error: {e}")))?;

    tracing::info!("proxy stopped");
    Ok(())
}
