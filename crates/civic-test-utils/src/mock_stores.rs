// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock record store and audit sink.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Mutex;

use civic_core::{
    AdapterType, AuditEvent, AuditSink, CivicError, HealthStatus, NewRecord, PluginAdapter,
    RecordReceipt, RecordStore,
};

/// Record store that keeps records in memory and numbers them like the
/// SQLite store does.
pub struct MockRecordStore {
    records: Arc<Mutex<Vec<NewRecord>>>,
    fail: AtomicBool,
}

impl MockRecordStore {
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
            fail: AtomicBool::new(false),
        }
    }

    /// Make every subsequent `create_record` fail.
    pub fn fail(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    pub async fn records(&self) -> Vec<NewRecord> {
        self.records.lock().await.clone()
    }
}

impl Default for MockRecordStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockRecordStore {
    fn name(&self) -> &str {
        "mock-records"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::RecordStore
    }

    async fn health_check(&self) -> Result<HealthStatus, CivicError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CivicError> {
        Ok(())
    }
}

#[async_trait]
impl RecordStore for MockRecordStore {
    async fn create_record(&self, record: NewRecord) -> Result<RecordReceipt, CivicError> {
        if self.fail.load(Ordering::SeqCst) {
            return Err(CivicError::storage(std::io::Error::other(
                "mock record store failure",
            )));
        }
        let mut records = self.records.lock().await;
        records.push(record);
        Ok(RecordReceipt {
            reference: format!("GRV-{:06}", records.len()),
        })
    }
}

/// Audit sink that captures notifications.
pub struct MockAuditSink {
    events: Arc<Mutex<Vec<AuditEvent>>>,
}

impl MockAuditSink {
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
        }
    }

    pub async fn events(&self) -> Vec<AuditEvent> {
        self.events.lock().await.clone()
    }

    /// Polls until at least `count` events arrived or `timeout` elapsed.
    /// Notifications are fire-and-forget, so tests have to wait for them.
    pub async fn wait_for(&self, count: usize, timeout: Duration) -> Vec<AuditEvent> {
        let deadline = tokio::time::Instant::now() + timeout;
        loop {
            let events = self.events().await;
            if events.len() >= count || tokio::time::Instant::now() >= deadline {
                return events;
            }
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    }
}

impl Default for MockAuditSink {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl AuditSink for MockAuditSink {
    async fn notify(&self, event: AuditEvent) -> Result<(), CivicError> {
        self.events.lock().await.push(event);
        Ok(())
    }
}
