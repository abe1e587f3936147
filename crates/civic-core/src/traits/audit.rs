// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Audit sink trait.

use async_trait::async_trait;

use crate::error::CivicError;
use crate::types::AuditEvent;

/// Receives best-effort audit notifications. Callers never wait on the
/// outcome before answering the citizen.
#[async_trait]
pub trait AuditSink: Send + Sync + 'static {
    async fn notify(&self, event: AuditEvent) -> Result<(), CivicError>;
}
