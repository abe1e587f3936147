// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Turns a completed draft into a persisted record.

use std::sync::Arc;

use civic_core::{
    AuditEvent, AuditSink, CivicError, Clock, NewRecord, RecordKind, RecordReceipt, RecordStatus,
    RecordStore, Session, TenantChannelConfig,
};
use civic_prometheus::record_finalization;
use tracing::{info, warn};

use crate::router::CategoryRouter;

/// Channel name stamped on audit notifications.
pub const AUDIT_CHANNEL: &str = "whatsapp";

pub struct Finalizer {
    records: Arc<dyn RecordStore>,
    audit: Arc<dyn AuditSink>,
    router: CategoryRouter,
    clock: Arc<dyn Clock>,
}

impl Finalizer {
    pub fn new(
        records: Arc<dyn RecordStore>,
        audit: Arc<dyn AuditSink>,
        router: CategoryRouter,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            records,
            audit,
            router,
            clock,
        }
    }

    /// Persists the session's grievance draft and returns its reference.
    ///
    /// The audit notification is spawned and never awaited.
    pub async fn finalize(
        &self,
        session: &Session,
        tenant: &TenantChannelConfig,
    ) -> Result<RecordReceipt, CivicError> {
        let result = self.create(session, tenant).await;
        record_finalization(if result.is_ok() { "ok" } else { "failed" });

        let receipt = result.inspect_err(|e| {
            warn!(session = %session.key, error = %e, "record finalization failed");
        })?;
        info!(session = %session.key, reference = %receipt.reference, "record created");

        let event = AuditEvent {
            tenant_id: tenant.tenant_id.clone(),
            kind: RecordKind::Grievance,
            channel: AUDIT_CHANNEL.to_string(),
            reference: receipt.reference.clone(),
            occurred_at: self.clock.now(),
        };
        let audit = Arc::clone(&self.audit);
        tokio::spawn(async move {
            let reference = event.reference.clone();
            if let Err(e) = audit.notify(event).await {
                warn!(reference = %reference, error = %e, "audit notification failed");
            }
        });

        Ok(receipt)
    }

    async fn create(
        &self,
        session: &Session,
        tenant: &TenantChannelConfig,
    ) -> Result<RecordReceipt, CivicError> {
        let draft = &session.draft;
        let citizen_name = draft
            .citizen_name
            .clone()
            .ok_or_else(|| CivicError::Internal("draft is missing the citizen name".into()))?;
        let description = draft
            .description
            .clone()
            .ok_or_else(|| CivicError::Internal("draft is missing the description".into()))?;
        let category = draft
            .category
            .clone()
            .unwrap_or_else(|| self.router.fallback_category().to_string());

        let record = NewRecord {
            tenant_id: tenant.tenant_id.clone(),
            kind: RecordKind::Grievance,
            org_unit_id: self.router.resolve(tenant, &category),
            citizen_name,
            phone: session.key.phone.clone(),
            category,
            description,
            address: draft.address.clone(),
            media: draft.media.clone(),
            language: session.language,
            status: RecordStatus::Pending,
        };
        self.records.create_record(record).await
    }
}
