// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test harness for end-to-end conversation tests.
//!
//! `TestHarness` wires the full webhook pipeline against mock messaging,
//! mock record and audit stores, a manual clock, and either the in-memory or
//! a temporary SQLite session store. Follow-ups are drained by hand.

use std::collections::BTreeSet;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use civic_config::CivicConfig;
use civic_config::model::StorageConfig;
use civic_core::{
    ChannelCredentials, CivicError, Clock, MessageBody, Module, OrgUnit, Session, SessionKey,
    SessionStore, TenantChannelConfig,
};
use civic_engine::{
    Collaborators, DeliveryReport, FollowUpWorker, Pipeline, StaticTenantDirectory, Sweeper,
    WebhookReceiver,
};
use civic_storage::{Database, InMemorySessionStore, SqliteSessionStore};
use tokio::sync::Mutex;

use crate::clock::ManualClock;
use crate::mock_messaging::MockMessaging;
use crate::mock_stores::{MockAuditSink, MockRecordStore};
use crate::payloads::{button_reply, image_message, text_message, webhook_body};

/// Channel id of [`default_tenant`].
pub const DEFAULT_CHANNEL: &str = "PN-100";

/// An active tenant with the grievance module, credentials and two units.
pub fn default_tenant() -> TenantChannelConfig {
    tenant("pune-ward-12", DEFAULT_CHANNEL, &[Module::Grievance])
}

pub fn tenant(tenant_id: &str, channel_id: &str, modules: &[Module]) -> TenantChannelConfig {
    TenantChannelConfig {
        tenant_id: tenant_id.to_string(),
        name: "Ward Office".to_string(),
        active: true,
        credentials: Some(ChannelCredentials {
            channel_id: channel_id.to_string(),
            access_token: "test-token".to_string(),
        }),
        modules: modules.iter().copied().collect::<BTreeSet<_>>(),
        org_units: vec![
            OrgUnit {
                id: "pwd".to_string(),
                name: "Public Works".to_string(),
                categories: vec!["Roads".to_string(), "Drainage".to_string()],
            },
            OrgUnit {
                id: "water".to_string(),
                name: "Water Supply".to_string(),
                categories: vec![],
            },
        ],
    }
}

/// Builder for creating test environments with configurable options.
pub struct TestHarnessBuilder {
    config: CivicConfig,
    tenants: Vec<(String, TenantChannelConfig)>,
    sqlite_sessions: bool,
}

impl TestHarnessBuilder {
    fn new() -> Self {
        Self {
            config: CivicConfig::default(),
            tenants: Vec::new(),
            sqlite_sessions: false,
        }
    }

    pub fn with_config(mut self, config: CivicConfig) -> Self {
        self.config = config;
        self
    }

    /// Registers a tenant under `channel_id`. The first one registered is the
    /// harness's default target.
    pub fn with_tenant(mut self, channel_id: &str, tenant: TenantChannelConfig) -> Self {
        self.tenants.push((channel_id.to_string(), tenant));
        self
    }

    /// Use the SQLite session store on a temporary database.
    pub fn with_sqlite_sessions(mut self) -> Self {
        self.sqlite_sessions = true;
        self
    }

    pub async fn build(self) -> Result<TestHarness, CivicError> {
        let mut tenants = self.tenants;
        if tenants.is_empty() {
            tenants.push((DEFAULT_CHANNEL.to_string(), default_tenant()));
        }
        let (channel_id, first) = &tenants[0];
        let channel_id = channel_id.clone();
        let tenant_id = first.tenant_id.clone();

        let (sessions, temp_dir): (Arc<dyn SessionStore>, _) = if self.sqlite_sessions {
            let temp_dir = tempfile::TempDir::new().map_err(CivicError::storage)?;
            let db = Database::open(&StorageConfig {
                database_path: temp_dir.path().join("test.db").to_string_lossy().to_string(),
                wal_mode: true,
            })
            .await?;
            (Arc::new(SqliteSessionStore::new(db)), Some(temp_dir))
        } else {
            (Arc::new(InMemorySessionStore::new()), None)
        };

        let messaging = Arc::new(MockMessaging::new());
        let records = Arc::new(MockRecordStore::new());
        let audit = Arc::new(MockAuditSink::new());
        let clock = Arc::new(ManualClock::default());

        let pipeline = Pipeline::build(
            &self.config,
            Collaborators {
                directory: Arc::new(StaticTenantDirectory::new(tenants)),
                sessions: sessions.clone(),
                records: records.clone(),
                audit: audit.clone(),
                messaging: messaging.clone(),
                clock: clock.clone(),
            },
        );

        Ok(TestHarness {
            receiver: pipeline.receiver,
            sweeper: pipeline.sweeper,
            follow_up_worker: Mutex::new(pipeline.follow_up_worker),
            messaging,
            records,
            audit,
            sessions,
            clock,
            channel_id,
            tenant_id,
            next_message: AtomicU64::new(1),
            _temp_dir: temp_dir,
        })
    }
}

/// A fully wired engine with mock collaborators.
pub struct TestHarness {
    pub receiver: Arc<WebhookReceiver>,
    pub sweeper: Sweeper,
    pub messaging: Arc<MockMessaging>,
    pub records: Arc<MockRecordStore>,
    pub audit: Arc<MockAuditSink>,
    pub sessions: Arc<dyn SessionStore>,
    pub clock: Arc<ManualClock>,
    follow_up_worker: Mutex<FollowUpWorker>,
    channel_id: String,
    tenant_id: String,
    next_message: AtomicU64,
    _temp_dir: Option<tempfile::TempDir>,
}

impl TestHarness {
    pub fn builder() -> TestHarnessBuilder {
        TestHarnessBuilder::new()
    }

    /// A harness with the default tenant and in-memory sessions.
    pub async fn new() -> Result<Self, CivicError> {
        Self::builder().build().await
    }

    pub fn channel_id(&self) -> &str {
        &self.channel_id
    }

    /// A fresh provider message id.
    pub fn next_message_id(&self) -> String {
        format!("wamid.test.{}", self.next_message.fetch_add(1, Ordering::SeqCst))
    }

    /// Delivers a raw webhook body.
    pub async fn deliver(&self, body: &[u8]) -> DeliveryReport {
        self.receiver.receive(body).await
    }

    pub async fn send_text(&self, from: &str, body: &str) -> DeliveryReport {
        let message = text_message(from, &self.next_message_id(), body);
        self.deliver(&webhook_body(&self.channel_id, &[message])).await
    }

    pub async fn send_button(&self, from: &str, option_id: &str, title: &str) -> DeliveryReport {
        let message = button_reply(from, &self.next_message_id(), option_id, title);
        self.deliver(&webhook_body(&self.channel_id, &[message])).await
    }

    pub async fn send_media(
        &self,
        from: &str,
        media_id: &str,
        caption: Option<&str>,
    ) -> DeliveryReport {
        let message = image_message(from, &self.next_message_id(), media_id, caption);
        self.deliver(&webhook_body(&self.channel_id, &[message])).await
    }

    /// Current session of a citizen of the default tenant. A citizen with no
    /// stored session gets a fresh one at the start step.
    pub async fn session(&self, from: &str) -> Result<Session, CivicError> {
        let key = SessionKey::new(self.tenant_id.clone(), from);
        self.sessions.get(&key, self.clock.now()).await
    }

    pub async fn sent_to(&self, to: &str) -> Vec<MessageBody> {
        self.messaging.sent_to(to).await
    }

    /// The most recent verification code sent to `to`.
    pub async fn last_code(&self, to: &str) -> Option<String> {
        self.sent_to(to).await.iter().rev().find_map(|body| match body {
            MessageBody::Text(text) if text.contains("verification code is") => {
                crate::extract_code(text)
            }
            _ => None,
        })
    }

    /// Runs every queued follow-up immediately, ignoring its delay.
    pub async fn drain_follow_ups(&self) -> usize {
        let mut worker = self.follow_up_worker.lock().await;
        let mut ran = 0;
        while let Some(follow_up) = worker.try_next() {
            self.receiver.run_follow_up(follow_up).await;
            ran += 1;
        }
        ran
    }
}
