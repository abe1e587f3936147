// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! HTTP request handlers.

use axum::{
    Json,
    body::Bytes,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
};
use civic_core::HealthStatus;
use civic_whatsapp::{SubscriptionQuery, verify_signature, verify_subscription};
use serde::Serialize;
use tracing::{debug, warn};

use crate::server::GatewayState;

pub const SIGNATURE_HEADER: &str = "x-hub-signature-256";

/// `GET {webhook_path}`: echoes the challenge for a valid handshake.
pub async fn verify_webhook(
    State(state): State<GatewayState>,
    Query(query): Query<SubscriptionQuery>,
) -> Response {
    match verify_subscription(&query, state.verify_token.as_deref()) {
        Some(challenge) => (StatusCode::OK, challenge).into_response(),
        None => {
            warn!(mode = ?query.mode, "webhook subscription handshake refused");
            StatusCode::FORBIDDEN.into_response()
        }
    }
}

/// `POST {webhook_path}`: acknowledges at once and processes the delivery
/// on a spawned task.
pub async fn receive_webhook(
    State(state): State<GatewayState>,
    headers: HeaderMap,
    body: Bytes,
) -> StatusCode {
    if let Some(secret) = state.app_secret.as_deref() {
        let Some(signature) = headers
            .get(SIGNATURE_HEADER)
            .and_then(|v| v.to_str().ok())
        else {
            warn!("webhook delivery without signature rejected");
            return StatusCode::UNAUTHORIZED;
        };
        if !verify_signature(secret, &body, signature) {
            warn!("webhook delivery with invalid signature rejected");
            return StatusCode::FORBIDDEN;
        }
    }

    debug!(bytes = body.len(), "webhook delivery accepted");
    let receiver = state.receiver.clone();
    state.deliveries.spawn(async move {
        receiver.receive(&body).await;
    });
    StatusCode::OK
}

/// Response body for GET /health.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: u64,
    pub adapters: Vec<AdapterHealth>,
}

#[derive(Debug, Serialize)]
pub struct AdapterHealth {
    pub name: String,
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// `GET /health`: 200 unless an adapter reports itself unhealthy.
pub async fn get_health(State(state): State<GatewayState>) -> Response {
    let mut adapters = Vec::with_capacity(state.health.adapters.len());
    let mut overall = "ok";
    for adapter in &state.health.adapters {
        let (status, detail) = match adapter.health_check().await {
            Ok(HealthStatus::Healthy) => ("healthy", None),
            Ok(HealthStatus::Degraded(reason)) => ("degraded", Some(reason)),
            Ok(HealthStatus::Unhealthy(reason)) => ("unhealthy", Some(reason)),
            Err(e) => ("unhealthy", Some(e.to_string())),
        };
        overall = match (overall, status) {
            (_, "unhealthy") | ("unhealthy", _) => "unhealthy",
            (_, "degraded") | ("degraded", _) => "degraded",
            _ => overall,
        };
        adapters.push(AdapterHealth {
            name: adapter.name().to_string(),
            status,
            detail,
        });
    }

    let code = if overall == "unhealthy" {
        StatusCode::SERVICE_UNAVAILABLE
    } else {
        StatusCode::OK
    };
    let body = HealthResponse {
        status: overall,
        uptime_secs: state.health.start_time.elapsed().as_secs(),
        adapters,
    };
    (code, Json(body)).into_response()
}

/// `GET /metrics`: Prometheus text format, 404 when metrics are disabled.
pub async fn get_metrics(State(state): State<GatewayState>) -> Response {
    match &state.health.prometheus_render {
        Some(render) => (
            StatusCode::OK,
            [("content-type", "text/plain; version=0.0.4")],
            render(),
        )
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
