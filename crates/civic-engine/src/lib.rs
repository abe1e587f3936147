// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Conversation engine and webhook pipeline for the Civic service.
//!
//! The [`WebhookReceiver`] turns provider deliveries into conversation
//! transitions. Around it sit the one-time-code verifier, the category
//! router, record finalization, the outbound gateway with its plain-text
//! fallback, and the background sweeper and follow-up worker.

pub mod conversation;
pub mod dedup;
pub mod directory;
pub mod finalize;
pub mod followup;
pub mod gateway;
pub mod intent;
pub mod locks;
pub mod otp;
pub mod pipeline;
pub mod prompts;
pub mod receiver;
pub mod router;
pub mod sweeper;

pub use conversation::{ConversationEngine, ConversationSettings, Disposition, Transition};
pub use dedup::DedupCache;
pub use directory::{StaticTenantDirectory, tenant_from_config};
pub use finalize::Finalizer;
pub use followup::{FollowUp, FollowUpWorker, FollowUps, follow_up_channel};
pub use gateway::{DeliveryError, OutboundGateway};
pub use intent::{InboundIntent, MenuChoice};
pub use locks::KeyedLocks;
pub use otp::{OtpSettings, OtpVerifier};
pub use pipeline::{Collaborators, Pipeline};
pub use receiver::{DeliveryReport, EventOutcome, WebhookReceiver};
pub use router::CategoryRouter;
pub use sweeper::{SweepReport, SweepSettings, Sweeper};
