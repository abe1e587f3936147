// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Prometheus metrics for the Civic webhook engine.
//!
//! Recording goes through the metrics-rs facade. [`PrometheusExporter`]
//! installs the Prometheus recorder and renders the text format served at
//! `GET /metrics`.

pub mod recording;

use civic_core::CivicError;
use metrics_exporter_prometheus::{PrometheusBuilder, PrometheusHandle};

pub use recording::{
    record_delivery, record_evicted, record_fallback, record_finalization, record_otp_check,
    record_transition, record_webhook_event, register_metrics, set_pending_follow_ups,
};

/// Installed Prometheus recorder.
#[derive(Clone)]
pub struct PrometheusExporter {
    handle: PrometheusHandle,
}

impl PrometheusExporter {
    /// Installs the Prometheus recorder globally. Only one recorder can be
    /// installed per process.
    pub fn install() -> Result<Self, CivicError> {
        let handle = PrometheusBuilder::new().install_recorder().map_err(|e| {
            CivicError::Internal(format!("failed to install Prometheus recorder: {e}"))
        })?;

        register_metrics();
        tracing::info!("prometheus metrics recorder installed");

        Ok(Self { handle })
    }

    /// Render all collected metrics in Prometheus text format.
    pub fn render(&self) -> String {
        self.handle.render()
    }
}
