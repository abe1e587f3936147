// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Process-local session store.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use civic_core::{
    AdapterType, CivicError, HealthStatus, PluginAdapter, Session, SessionKey, SessionStore,
};
use dashmap::DashMap;

/// Session store backed by a concurrent map. Contents are lost on restart.
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    sessions: DashMap<SessionKey, Session>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }
}

#[async_trait]
impl PluginAdapter for InMemorySessionStore {
    fn name(&self) -> &str {
        "memory-sessions"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::SessionStore
    }

    async fn health_check(&self) -> Result<HealthStatus, CivicError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CivicError> {
        Ok(())
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn get(&self, key: &SessionKey, now: DateTime<Utc>) -> Result<Session, CivicError> {
        Ok(self
            .sessions
            .get(key)
            .map(|s| s.value().clone())
            .unwrap_or_else(|| Session::new(key.clone(), now)))
    }

    async fn save(&self, session: &Session) -> Result<(), CivicError> {
        self.sessions.insert(session.key.clone(), session.clone());
        Ok(())
    }

    async fn remove(&self, key: &SessionKey) -> Result<(), CivicError> {
        self.sessions.remove(key);
        Ok(())
    }

    async fn evict(&self, older_than: DateTime<Utc>) -> Result<usize, CivicError> {
        let before = self.sessions.len();
        self.sessions
            .retain(|_, session| session.last_activity_at >= older_than);
        Ok(before.saturating_sub(self.sessions.len()))
    }
}
