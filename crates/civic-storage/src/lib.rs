// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Persistence for the Civic webhook engine.
//!
//! Provides an in-memory session store plus SQLite-backed session, record and
//! audit stores sharing one WAL-mode connection with embedded migrations.

pub mod audit;
pub mod database;
pub mod memory;
pub mod migrations;
pub mod records;
pub mod sessions;

pub use audit::SqliteAuditSink;
pub use database::Database;
pub use memory::InMemorySessionStore;
pub use records::{SqliteRecordStore, StoredRecord};
pub use sessions::SqliteSessionStore;
