// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Shutdown: signal handling and draining of acknowledged deliveries.
//!
//! The provider is told 200 before a delivery is processed, so a delivery
//! still in flight at shutdown is never redelivered. [`drain_deliveries`]
//! gives those tasks a bounded grace period.

use std::time::Duration;

use tokio_util::sync::CancellationToken;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

/// Returns a token that is cancelled on SIGINT or SIGTERM.
pub fn install_signal_handler() -> CancellationToken {
    let token = CancellationToken::new();
    let cancel = token.clone();
    tokio::spawn(async move {
        let signal = wait_for_signal().await;
        info!(signal, "shutdown requested");
        cancel.cancel();
    });
    token
}

#[cfg(unix)]
async fn wait_for_signal() -> &'static str {
    use tokio::signal::unix::{SignalKind, signal};

    let mut sigterm = match signal(SignalKind::terminate()) {
        Ok(sigterm) => sigterm,
        Err(e) => {
            warn!(error = %e, "SIGTERM handler unavailable, listening for Ctrl+C only");
            let _ = tokio::signal::ctrl_c().await;
            return "SIGINT";
        }
    };
    tokio::select! {
        _ = tokio::signal::ctrl_c() => "SIGINT",
        _ = sigterm.recv() => "SIGTERM",
    }
}

#[cfg(not(unix))]
async fn wait_for_signal() -> &'static str {
    let _ = tokio::signal::ctrl_c().await;
    "Ctrl+C"
}

/// Stops accepting new delivery tasks and waits up to `grace` for the rest.
///
/// Returns the number of tasks abandoned when the grace period ran out.
pub async fn drain_deliveries(deliveries: &TaskTracker, grace: Duration) -> usize {
    deliveries.close();
    let pending = deliveries.len();
    if pending == 0 {
        return 0;
    }

    info!(pending, "waiting for in-flight deliveries");
    match tokio::time::timeout(grace, deliveries.wait()).await {
        Ok(()) => 0,
        Err(_) => {
            let abandoned = deliveries.len();
            warn!(abandoned, "grace period elapsed with deliveries still running");
            abandoned
        }
    }
}
