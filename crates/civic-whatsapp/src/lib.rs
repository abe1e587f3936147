// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! WhatsApp Cloud API adapter.
//!
//! Parses inbound webhook deliveries into [`civic_core::InboundEvent`]s,
//! verifies subscription handshakes and payload signatures, and sends
//! outbound messages through the Graph API.

pub mod client;
pub mod payload;
pub mod verify;

pub use client::WhatsAppClient;
pub use payload::extract_events;
pub use verify::{SubscriptionQuery, sign_payload, verify_signature, verify_subscription};
