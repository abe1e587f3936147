// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `civic serve`: wires collaborators, starts background tasks and the
//! HTTP gateway, and shuts everything down on a signal.

use std::sync::Arc;
use std::time::Duration;

use civic_config::CivicConfig;
use civic_config::model::SessionBackend;
use civic_core::{CivicError, PluginAdapter, SessionStore, SystemClock};
use civic_engine::{Collaborators, Pipeline, StaticTenantDirectory};
use civic_gateway::{GatewayState, HealthState, ServerConfig, start_server};
use civic_prometheus::PrometheusExporter;
use civic_storage::{
    Database, InMemorySessionStore, SqliteAuditSink, SqliteRecordStore, SqliteSessionStore,
};
use civic_whatsapp::WhatsAppClient;
use tokio_util::task::TaskTracker;
use tracing::{info, warn};

use crate::shutdown::{drain_deliveries, install_signal_handler};

/// How long acknowledged deliveries may keep running after shutdown starts.
const DELIVERY_GRACE: Duration = Duration::from_secs(10);

/// Runs the server until SIGINT or SIGTERM.
pub async fn run_serve(config: CivicConfig) -> Result<(), CivicError> {
    init_tracing(&config.service.log_level);

    info!(service = %config.service.name, "starting civic serve");

    let prometheus_render = if config.metrics.enabled {
        let exporter = PrometheusExporter::install()?;
        Some(Arc::new(move || exporter.render()) as Arc<dyn Fn() -> String + Send + Sync>)
    } else {
        None
    };

    let db = Database::open(&config.storage).await?;
    info!(path = %config.storage.database_path, "database opened");

    let sessions: Arc<dyn SessionStore> = match config.session.backend {
        SessionBackend::Memory => Arc::new(InMemorySessionStore::new()),
        SessionBackend::Sqlite => Arc::new(SqliteSessionStore::new(db.clone())),
    };
    let records = Arc::new(SqliteRecordStore::new(db.clone()));
    let messaging = Arc::new(WhatsAppClient::from_config(&config.whatsapp)?);

    let directory = StaticTenantDirectory::from_config(&config.tenants);
    if directory.is_empty() {
        warn!("no tenants configured, every delivery will be dropped");
    } else {
        info!(tenants = directory.len(), "tenant directory loaded");
    }
    if config.whatsapp.app_secret.is_none() {
        warn!("whatsapp.app_secret is not set, webhook signatures are not checked");
    }

    let pipeline = Pipeline::build(
        &config,
        Collaborators {
            directory: Arc::new(directory),
            sessions: sessions.clone(),
            records: records.clone(),
            audit: Arc::new(SqliteAuditSink::new(db.clone())),
            messaging: messaging.clone(),
            clock: Arc::new(SystemClock),
        },
    );
    let receiver = pipeline.receiver;

    let cancel = install_signal_handler();

    let sweeper_task = {
        let sweeper = pipeline.sweeper;
        let cancel = cancel.clone();
        tokio::spawn(async move { sweeper.run(cancel).await })
    };
    let follow_up_task = tokio::spawn(
        pipeline
            .follow_up_worker
            .run(receiver.clone(), cancel.clone()),
    );

    let adapters: Vec<Arc<dyn PluginAdapter>> = vec![
        sessions.clone() as Arc<dyn PluginAdapter>,
        records.clone() as Arc<dyn PluginAdapter>,
        messaging.clone() as Arc<dyn PluginAdapter>,
    ];
    let deliveries = TaskTracker::new();
    let state = GatewayState {
        receiver,
        verify_token: config.whatsapp.verify_token.clone(),
        app_secret: config.whatsapp.app_secret.clone(),
        deliveries: deliveries.clone(),
        health: HealthState {
            start_time: std::time::Instant::now(),
            adapters: adapters.clone(),
            prometheus_render,
        },
    };
    let server_config = ServerConfig {
        host: config.gateway.host.clone(),
        port: config.gateway.port,
        webhook_path: config.gateway.webhook_path.clone(),
    };

    let served = start_server(&server_config, state, cancel.clone()).await;
    cancel.cancel();
    drain_deliveries(&deliveries, DELIVERY_GRACE).await;

    let _ = sweeper_task.await;
    let _ = follow_up_task.await;
    for adapter in &adapters {
        if let Err(e) = adapter.shutdown().await {
            warn!(adapter = adapter.name(), error = %e, "adapter shutdown failed");
        }
    }
    if let Err(e) = db.checkpoint().await {
        warn!(error = %e, "final WAL checkpoint failed");
    }

    info!("civic stopped");
    served
}

fn init_tracing(log_level: &str) {
    use tracing_subscriber::EnvFilter;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("civic={log_level},warn")));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_names(false)
        .init();
}
