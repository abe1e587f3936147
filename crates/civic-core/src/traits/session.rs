// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Session store trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::CivicError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{Session, SessionKey};

/// Key-value store of conversation sessions.
///
/// Implementations never interpret `step` or `draft`. Callers serialize
/// access per key; the store only has to keep individual operations atomic.
#[async_trait]
pub trait SessionStore: PluginAdapter {
    /// Returns the stored session, or a fresh one at `start` stamped with
    /// `now`. A fresh session is not persisted until [`save`](Self::save).
    async fn get(&self, key: &SessionKey, now: DateTime<Utc>) -> Result<Session, CivicError>;

    /// Inserts or replaces the session under its key.
    async fn save(&self, session: &Session) -> Result<(), CivicError>;

    /// Deletes the session. Removing an absent key is not an error.
    async fn remove(&self, key: &SessionKey) -> Result<(), CivicError>;

    /// Deletes every session whose last activity is before `older_than` and
    /// returns how many were removed.
    async fn evict(&self, older_than: DateTime<Utc>) -> Result<usize, CivicError>;
}
