// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Record store trait for finalized citizen submissions.

use async_trait::async_trait;

use crate::error::CivicError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{NewRecord, RecordReceipt};

/// Persists finalized records and hands back a human-facing reference.
#[async_trait]
pub trait RecordStore: PluginAdapter {
    async fn create_record(&self, record: NewRecord) -> Result<RecordReceipt, CivicError>;
}
