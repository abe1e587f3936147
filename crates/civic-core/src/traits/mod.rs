// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Collaborator trait definitions.
//!
//! Every trait uses `#[async_trait]` so implementations can be held as
//! `Arc<dyn Trait>` and injected into the engine.

pub mod adapter;
pub mod audit;
pub mod messaging;
pub mod records;
pub mod session;
pub mod tenant;

pub use adapter::PluginAdapter;
pub use audit::AuditSink;
pub use messaging::MessagingProvider;
pub use records::RecordStore;
pub use session::SessionStore;
pub use tenant::TenantDirectory;
