// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tenant directory lookup.

use async_trait::async_trait;

use crate::error::CivicError;
use crate::types::TenantChannelConfig;

/// Resolves the tenant that owns a provider channel.
#[async_trait]
pub trait TenantDirectory: Send + Sync + 'static {
    /// Returns the tenant registered for `channel_id`, active or not.
    /// `Ok(None)` means no tenant owns the channel.
    async fn lookup(&self, channel_id: &str) -> Result<Option<TenantChannelConfig>, CivicError>;
}
