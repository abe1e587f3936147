// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! SQLite-backed session store.

use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use civic_core::{
    AdapterType, CivicError, Draft, HealthStatus, Language, PendingAction, PluginAdapter, Session,
    SessionKey, SessionStore, Step,
};
use rusqlite::{OptionalExtension, params};

use crate::database::{Database, decode_time, encode_time, map_tr_err};

/// Session store that survives restarts. The draft is kept as a JSON column.
#[derive(Clone)]
pub struct SqliteSessionStore {
    db: Database,
}

struct SessionRow {
    language: String,
    step: String,
    pending_action: Option<String>,
    draft: String,
    created_at: String,
    last_activity_at: String,
}

impl SessionRow {
    fn into_session(self, key: SessionKey) -> Result<Session, CivicError> {
        let language = Language::from_str(&self.language).map_err(CivicError::storage)?;
        let step = Step::from_str(&self.step).map_err(CivicError::storage)?;
        let pending_action = self
            .pending_action
            .as_deref()
            .map(PendingAction::from_str)
            .transpose()
            .map_err(CivicError::storage)?;
        let draft: Draft = serde_json::from_str(&self.draft).map_err(CivicError::storage)?;
        Ok(Session {
            key,
            language,
            step,
            pending_action,
            draft,
            created_at: decode_time(&self.created_at)?,
            last_activity_at: decode_time(&self.last_activity_at)?,
        })
    }
}

impl SqliteSessionStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl PluginAdapter for SqliteSessionStore {
    fn name(&self) -> &str {
        "sqlite-sessions"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::SessionStore
    }

    async fn health_check(&self) -> Result<HealthStatus, CivicError> {
        match self.db.ping().await {
            Ok(()) => Ok(HealthStatus::Healthy),
            Err(e) => Ok(HealthStatus::Unhealthy(e.to_string())),
        }
    }

    async fn shutdown(&self) -> Result<(), CivicError> {
        self.db.checkpoint().await
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn get(&self, key: &SessionKey, now: DateTime<Utc>) -> Result<Session, CivicError> {
        let tenant_id = key.tenant_id.clone();
        let phone = key.phone.clone();
        let row = self
            .db
            .connection()
            .call(move |conn| {
                conn.query_row(
                    "SELECT language, step, pending_action, draft, created_at, last_activity_at
                     FROM sessions WHERE tenant_id = ?1 AND phone = ?2",
                    params![tenant_id, phone],
                    |row| {
                        Ok(SessionRow {
                            language: row.get(0)?,
                            step: row.get(1)?,
                            pending_action: row.get(2)?,
                            draft: row.get(3)?,
                            created_at: row.get(4)?,
                            last_activity_at: row.get(5)?,
                        })
                    },
                )
                .optional()
            })
            .await
            .map_err(map_tr_err)?;

        match row {
            Some(row) => row.into_session(key.clone()),
            None => Ok(Session::new(key.clone(), now)),
        }
    }

    async fn save(&self, session: &Session) -> Result<(), CivicError> {
        let draft = serde_json::to_string(&session.draft).map_err(CivicError::storage)?;
        let tenant_id = session.key.tenant_id.clone();
        let phone = session.key.phone.clone();
        let language = session.language.to_string();
        let step = session.step.to_string();
        let pending_action = session.pending_action.map(|p| p.to_string());
        let created_at = encode_time(session.created_at);
        let last_activity_at = encode_time(session.last_activity_at);

        self.db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "INSERT INTO sessions
                        (tenant_id, phone, language, step, pending_action, draft, created_at, last_activity_at)
                     VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
                     ON CONFLICT(tenant_id, phone) DO UPDATE SET
                        language = excluded.language,
                        step = excluded.step,
                        pending_action = excluded.pending_action,
                        draft = excluded.draft,
                        last_activity_at = excluded.last_activity_at",
                    params![
                        tenant_id,
                        phone,
                        language,
                        step,
                        pending_action,
                        draft,
                        created_at,
                        last_activity_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    async fn remove(&self, key: &SessionKey) -> Result<(), CivicError> {
        let tenant_id = key.tenant_id.clone();
        let phone = key.phone.clone();
        self.db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "DELETE FROM sessions WHERE tenant_id = ?1 AND phone = ?2",
                    params![tenant_id, phone],
                )?;
                Ok(())
            })
            .await
            .map_err(map_tr_err)
    }

    async fn evict(&self, older_than: DateTime<Utc>) -> Result<usize, CivicError> {
        let cutoff = encode_time(older_than);
        self.db
            .connection()
            .call(move |conn| {
                conn.execute(
                    "DELETE FROM sessions WHERE last_activity_at < ?1",
                    params![cutoff],
                )
            })
            .await
            .map_err(map_tr_err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn store() -> SqliteSessionStore {
        SqliteSessionStore::new(Database::open_in_memory().await.unwrap())
    }

    fn key(phone: &str) -> SessionKey {
        SessionKey::new("tenant-a", phone)
    }

    #[tokio::test]
    async fn fresh_session_for_unknown_key() {
        let store = store().await;
        let now = Utc::now();
        let session = store.get(&key("1"), now).await.unwrap();
        assert_eq!(session.step, Step::Start);
        assert!(session.draft.is_empty());
    }

    #[tokio::test]
    async fn save_and_reload_full_session() {
        let store = store().await;
        let now = Utc::now();
        let mut session = Session::new(key("919800000001"), now);
        session.language = Language::Marathi;
        session.step = Step::GrievanceLocation;
        session.pending_action = Some(PendingAction::Grievance);
        session.draft.citizen_name = Some("Asha".into());
        session.draft.description = Some("Streetlight out".into());
        session.draft.media = vec!["MEDIA1".into()];
        store.save(&session).await.unwrap();

        let loaded = store.get(&key("919800000001"), now).await.unwrap();
        assert_eq!(loaded.language, Language::Marathi);
        assert_eq!(loaded.step, Step::GrievanceLocation);
        assert_eq!(loaded.pending_action, Some(PendingAction::Grievance));
        assert_eq!(loaded.draft, session.draft);
        assert_eq!(
            loaded.last_activity_at.timestamp_millis(),
            now.timestamp_millis()
        );
    }

    #[tokio::test]
    async fn save_overwrites_existing_row() {
        let store = store().await;
        let now = Utc::now();
        let mut session = Session::new(key("1"), now);
        store.save(&session).await.unwrap();
        session.step = Step::MainMenu;
        session.touch(now + Duration::seconds(5));
        store.save(&session).await.unwrap();

        let loaded = store.get(&key("1"), now).await.unwrap();
        assert_eq!(loaded.step, Step::MainMenu);
    }

    #[tokio::test]
    async fn evict_and_remove() {
        let store = store().await;
        let now = Utc::now();
        let mut old = Session::new(key("old"), now - Duration::hours(2));
        old.touch(now - Duration::hours(2));
        store.save(&old).await.unwrap();
        store.save(&Session::new(key("new"), now)).await.unwrap();

        assert_eq!(store.evict(now - Duration::hours(1)).await.unwrap(), 1);
        assert_eq!(
            store.get(&key("old"), now).await.unwrap().step,
            Step::Start
        );

        store.remove(&key("new")).await.unwrap();
        assert_eq!(store.evict(now + Duration::hours(1)).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn health_check_reports_healthy() {
        let store = store().await;
        assert_eq!(store.health_check().await.unwrap(), HealthStatus::Healthy);
    }
}
