// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audit trail persisted to the `audit_log` table.

use async_trait::async_trait;
use civic_core::{AuditEvent, AuditSink, CivicError};
use rusqlite::params;

use crate::database::{Database, encode_time, map_tr_err};

#[derive(Clone)]
pub struct SqliteAuditSink {
    db: Database,
}

impl SqliteAuditSink {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Number of audit entries written for a tenant.
    pub async fn count_for_tenant(&self, tenant_id: &str) -> Result<usize, CivicError> {
        let tenant_id = tenant_id.to_string();
        self.db
            .connection()
            .call(move |conn| {
                conn.query_row(
                    "SELECT COUNT(*) FROM audit_log WHERE tenant_id = ?1",
                    params![tenant_id],
                    |row| row.get::<_, i64>(0),
                )
            })
            .await
            .map(|n| n.max(0) as usize)
            .map_err(map_tr_err)
    }
}

#[async_trait]
impl AuditSink for SqliteAuditSink {
    async fn notify(&self, event: AuditEvent) -> Result<(), CivicError> {
        self.db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO audit_log (tenant_id, kind, channel, reference, occurred_at)
                     VALUES (?1, ?2, ?3, ?4, ?5)",
                    params![
                        event.tenant_id,
                        event.kind.to_string(),
                        event.channel,
                        event.reference,
                        encode_time(event.occurred_at),
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }
}
