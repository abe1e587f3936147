// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Test utilities for Civic integration tests.
//!
//! Provides mock collaborators and a harness for fast, deterministic tests
//! without a messaging provider or database server.
//!
//! # Components
//!
//! - [`MockMessaging`] - messaging provider capturing sends, with switchable
//!   rejection and transport failure
//! - [`MockRecordStore`] / [`MockAuditSink`] - in-memory record and audit capture
//! - [`ManualClock`] - clock moved by hand
//! - [`TestHarness`] - the full webhook pipeline wired to the mocks

pub mod clock;
pub mod harness;
pub mod mock_messaging;
pub mod mock_stores;
pub mod payloads;

pub use clock::ManualClock;
pub use harness::{DEFAULT_CHANNEL, TestHarness, TestHarnessBuilder, default_tenant, tenant};
pub use mock_messaging::{MockMessaging, SentMessage};
pub use mock_stores::{MockAuditSink, MockRecordStore};

/// Finds the first run of at least four digits, as a verification code.
pub fn extract_code(text: &str) -> Option<String> {
    text.split(|c: char| !c.is_ascii_digit())
        .find(|run| run.len() >= 4)
        .map(str::to_string)
}
