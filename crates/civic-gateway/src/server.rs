// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Gateway HTTP server built on axum.
//!
//! Sets up routes, middleware, and shared state for the gateway.

use std::sync::Arc;

use axum::{Router, routing::get};
use civic_core::{CivicError, PluginAdapter};
use civic_engine::WebhookReceiver;
use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tower_http::trace::TraceLayer;

use crate::handlers;

/// Health state for the health and metrics endpoints.
#[derive(Clone)]
pub struct HealthState {
    /// Process start time for uptime calculation.
    pub start_time: std::time::Instant,
    /// Adapters whose health is aggregated at `GET /health`.
    pub adapters: Vec<Arc<dyn PluginAdapter>>,
    /// Optional Prometheus metrics render function.
    pub prometheus_render: Option<Arc<dyn Fn() -> String + Send + Sync>>,
}

/// Shared state for axum request handlers.
#[derive(Clone)]
pub struct GatewayState {
    pub receiver: Arc<WebhookReceiver>,
    /// Token expected in the subscription handshake. Handshakes are refused
    /// when unset.
    pub verify_token: Option<String>,
    /// Secret for `X-Hub-Signature-256` checks. Unsigned deliveries are
    /// accepted when unset.
    pub app_secret: Option<String>,
    /// Deliveries still being processed after their acknowledgement.
    pub deliveries: TaskTracker,
    pub health: HealthState,
}

/// Gateway server configuration (mirrors GatewayConfig from civic-config).
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub webhook_path: String,
}

/// Builds the application router.
///
/// - `GET {webhook_path}` subscription handshake
/// - `POST {webhook_path}` webhook delivery
/// - `GET /health`
/// - `GET /metrics`
pub fn build_router(webhook_path: &str, state: GatewayState) -> Router {
    Router::new()
        .route(
            webhook_path,
            get(handlers::verify_webhook).post(handlers::receive_webhook),
        )
        .route("/health", get(handlers::get_health))
        .route("/metrics", get(handlers::get_metrics))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Binds and serves until `cancel` fires.
pub async fn start_server(
    config: &ServerConfig,
    state: GatewayState,
    cancel: CancellationToken,
) -> Result<(), CivicError> {
    let app = build_router(&config.webhook_path, state);

    let addr = format!("{}:{}", config.host, config.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .map_err(|e| CivicError::Channel {
            message: format!("failed to bind gateway to {addr}: {e}"),
            source: Some(Box::new(e)),
        })?;

    tracing::info!("gateway listening on {addr}, webhook at {}", config.webhook_path);

    axum::serve(listener, app)
        .with_graceful_shutdown(cancel.cancelled_owned())
        .await
        .map_err(|e| CivicError::Channel {
            message: format!("gateway server error: {e}"),
            source: Some(Box::new(e)),
        })?;

    Ok(())
}
