// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Base adapter trait shared by the stateful collaborators.

use async_trait::async_trait;

use crate::error::CivicError;
use crate::types::{AdapterType, HealthStatus};

/// Identity, health and lifecycle of a collaborator backend.
///
/// Session stores, record stores and messaging providers implement this so
/// the HTTP surface can report their health and the binary can shut them
/// down in order.
#[async_trait]
pub trait PluginAdapter: Send + Sync + 'static {
    /// Returns the human-readable name of this adapter instance.
    fn name(&self) -> &str;

    /// Returns the semantic version of this adapter.
    fn version(&self) -> semver::Version;

    /// Returns the kind of collaborator this adapter provides.
    fn adapter_type(&self) -> AdapterType;

    /// Performs a health check and returns the adapter's current status.
    async fn health_check(&self) -> Result<HealthStatus, CivicError>;

    /// Gracefully shuts down the adapter, releasing any held resources.
    async fn shutdown(&self) -> Result<(), CivicError>;
}
