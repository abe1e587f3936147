// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed record store.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::Utc;
use civic_core::{
    AdapterType, CivicError, HealthStatus, Language, NewRecord, PluginAdapter, RecordKind,
    RecordReceipt, RecordStatus, RecordStore,
};
use rusqlite::{OptionalExtension, params};
use tracing::info;

use crate::database::{Database, encode_time, map_tr_err};

/// A persisted record together with its reference.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredRecord {
    pub reference: String,
    pub record: NewRecord,
}

/// Writes finalized records and numbers them `GRV-000001`, `GRV-000002`, ...
#[derive(Clone)]
pub struct SqliteRecordStore {
    db: Database,
}

fn reference_prefix(kind: RecordKind) -> &'static str {
    match kind {
        RecordKind::Grievance => "GRV",
    }
}

impl SqliteRecordStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Looks up a record by the reference quoted to the citizen.
    pub async fn find_by_reference(
        &self,
        reference: &str,
    ) -> Result<Option<StoredRecord>, CivicError> {
        let reference = reference.to_string();
        type Row = (
            String,
            String,
            String,
            Option<String>,
            String,
            String,
            String,
            String,
            Option<String>,
            String,
            String,
            String,
        );
        let row: Option<Row> = self
            .db
            .connection()
            .call(move |conn| {
                conn.query_row(
                    "SELECT reference, tenant_id, kind, org_unit_id, citizen_name, phone, category,
                            description, address, media, language, status
                     FROM records WHERE reference = ?1",
                    params![reference],
                    |row| {
                        Ok((
                            row.get(0)?,
                            row.get(1)?,
                            row.get(2)?,
                            row.get(3)?,
                            row.get(4)?,
                            row.get(5)?,
                            row.get(6)?,
                            row.get(7)?,
                            row.get(8)?,
                            row.get(9)?,
                            row.get(10)?,
                            row.get(11)?,
                        ))
                    },
                )
                .optional()
            })
            .await
            .map_err(map_tr_err)?;

        let Some((
            reference,
            tenant_id,
            kind,
            org_unit_id,
            citizen_name,
            phone,
            category,
            description,
            address,
            media,
            language,
            status,
        )) = row
        else {
            return Ok(None);
        };

        Ok(Some(StoredRecord {
            reference,
            record: NewRecord {
                tenant_id,
                kind: RecordKind::from_str(&kind).map_err(CivicError::storage)?,
                org_unit_id,
                citizen_name,
                phone,
                category,
                description,
                address,
                media: serde_json::from_str(&media).map_err(CivicError::storage)?,
                language: Language::from_str(&language).map_err(CivicError::storage)?,
                status: RecordStatus::from_str(&status).map_err(CivicError::storage)?,
            },
        }))
    }
}

#[async_trait]
impl PluginAdapter for SqliteRecordStore {
    fn name(&self) -> &str {
        "sqlite-records"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::RecordStore
    }

    async fn health_check(&self) -> Result<HealthStatus, CivicError> {
        match self.db.ping().await {
            Ok(()) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), CivicError> {
        Ok(())
    }
}

#[async_trait]
impl RecordStore for SqliteRecordStore {
    async fn create_record(&self, record: NewRecord) -> Result<RecordReceipt, CivicError> {
        let media = serde_json::to_string(&record.media).map_err(CivicError::storage)?;
        let created_at = encode_time(Utc::now());
        let prefix = reference_prefix(record.kind);
        let tenant_id = record.tenant_id.clone();

        let reference = self
            .db
            .connection()
            .call(move |conn| {
                let tx = conn.transaction()?;
                tx.execute(
                    "INSERT INTO records
                        (tenant_id, kind, org_unit_id, citizen_name, phone, category,
                         description, address, media, language, status, created_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                    params![
                        record.tenant_id,
                        record.kind.to_string(),
                        record.org_unit_id,
                        record.citizen_name,
                        record.phone,
                        record.category,
                        record.description,
                        record.address,
                        media,
                        record.language.to_string(),
                        record.status.to_string(),
                        created_at,
                    ],
                )?;
                let id = tx.last_insert_rowid();
                let reference = format!("{prefix}-{id:06}");
                tx.execute(
                    "UPDATE records SET reference = ?1 WHERE id = ?2",
                    params![reference, id],
                )?;
                tx.commit()?;
                Ok(reference)
            })
            .await
            .map_err(map_tr_err)?;

        info!(tenant_id = %tenant_id, reference = %reference, "record created");
        Ok(RecordReceipt { reference })
    }
}
