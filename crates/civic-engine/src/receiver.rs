// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Webhook receiver: the only entry point for provider deliveries.
//!
//! A delivery may carry several items. Each item is deduplicated, matched to
//! its tenant, and advanced through the conversation under the session's
//! lock. No failure escapes [`WebhookReceiver::receive`].

use std::sync::Arc;

use chrono::TimeDelta;
use civic_core::{
    Clock, InboundEvent, MessageBody, OutboundMessage, SessionKey, SessionStore, Step,
    TenantChannelConfig, TenantDirectory, mask_phone,
};
use civic_prometheus::record_webhook_event;
use civic_whatsapp::extract_events;
use tracing::{debug, error, info, warn};

use crate::conversation::{ConversationEngine, Disposition};
use crate::dedup::DedupCache;
use crate::followup::{FollowUp, FollowUps};
use crate::gateway::OutboundGateway;
use crate::locks::KeyedLocks;
use crate::prompts;

/// Per-delivery tally.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryReport {
    pub received: usize,
    pub processed: usize,
    pub duplicates: usize,
    pub dropped: usize,
    pub failed: usize,
}

/// What happened to one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventOutcome {
    Processed,
    Duplicate,
    /// Unknown or inactive tenant.
    Dropped,
    /// A collaborator failed; the dedup claim was released when a retry
    /// could still succeed.
    Failed,
}

impl EventOutcome {
    pub fn label(self) -> &'static str {
        match self {
            EventOutcome::Processed => "processed",
            EventOutcome::Duplicate => "duplicate",
            EventOutcome::Dropped => "dropped",
            EventOutcome::Failed => "failed",
        }
    }
}

pub struct WebhookReceiver {
    directory: Arc<dyn TenantDirectory>,
    sessions: Arc<dyn SessionStore>,
    engine: Arc<ConversationEngine>,
    gateway: Arc<OutboundGateway>,
    follow_ups: FollowUps,
    dedup: Arc<DedupCache>,
    locks: Arc<KeyedLocks>,
    clock: Arc<dyn Clock>,
}

impl WebhookReceiver {
    pub fn new(
        directory: Arc<dyn TenantDirectory>,
        sessions: Arc<dyn SessionStore>,
        engine: Arc<ConversationEngine>,
        gateway: Arc<OutboundGateway>,
        follow_ups: FollowUps,
        dedup_retention: TimeDelta,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            directory,
            sessions,
            engine,
            gateway,
            follow_ups,
            dedup: Arc::new(DedupCache::new(dedup_retention, clock.clone())),
            locks: Arc::new(KeyedLocks::new()),
            clock,
        }
    }

    pub fn dedup(&self) -> &Arc<DedupCache> {
        &self.dedup
    }

    pub fn locks(&self) -> &Arc<KeyedLocks> {
        &self.locks
    }

    pub fn sessions(&self) -> &Arc<dyn SessionStore> {
        &self.sessions
    }

    /// Processes one raw webhook body. Items run sequentially; one item's
    /// failure never stops the next.
    pub async fn receive(&self, body: &[u8]) -> DeliveryReport {
        let events = match extract_events(body, self.clock.now()) {
            Ok(events) => events,
            Err(e) => {
                warn!(error = %e, "discarding malformed webhook payload");
                record_webhook_event("malformed");
                return DeliveryReport::default();
            }
        };

        let mut report = DeliveryReport {
            received: events.len(),
            ..DeliveryReport::default()
        };
        for event in &events {
            let outcome = self.process_event(event).await;
            record_webhook_event(outcome.label());
            match outcome {
                EventOutcome::Processed => report.processed += 1,
                EventOutcome::Duplicate => report.duplicates += 1,
                EventOutcome::Dropped => report.dropped += 1,
                EventOutcome::Failed => report.failed += 1,
            }
        }

        if report.received > 0 {
            debug!(
                received = report.received,
                processed = report.processed,
                duplicates = report.duplicates,
                dropped = report.dropped,
                failed = report.failed,
                "webhook delivery handled"
            );
        }
        report
    }

    /// Runs one normalized item through dedup, tenant resolution and the
    /// conversation.
    pub async fn process_event(&self, event: &InboundEvent) -> EventOutcome {
        let dedup_key = event.dedup_key();
        if !self.dedup.claim(&dedup_key) {
            debug!(message_id = %event.provider_message_id, "duplicate delivery skipped");
            return EventOutcome::Duplicate;
        }

        let tenant = match self.directory.lookup(&event.channel_id).await {
            Ok(Some(tenant)) if tenant.active => tenant,
            Ok(Some(tenant)) => {
                info!(tenant = %tenant.tenant_id, "dropping event for inactive tenant");
                return EventOutcome::Dropped;
            }
            Ok(None) => {
                info!(channel = %event.channel_id, "dropping event for unknown channel");
                return EventOutcome::Dropped;
            }
            Err(e) => {
                warn!(channel = %event.channel_id, error = %e, "tenant lookup failed");
                self.dedup.release(&dedup_key);
                return EventOutcome::Failed;
            }
        };

        let key = SessionKey::new(tenant.tenant_id.clone(), event.from.clone());
        let _guard = self.locks.lock(&key).await;
        let now = self.clock.now();

        let mut session = match self.sessions.get(&key, now).await {
            Ok(session) => session,
            Err(e) => {
                error!(session = %key, error = %e, "session store unavailable, dropping event");
                self.dedup.release(&dedup_key);
                return EventOutcome::Failed;
            }
        };

        let transition = self.engine.advance(&mut session, &tenant, event).await;

        let stored = match transition.disposition {
            Disposition::Keep => {
                session.touch(now);
                self.sessions.save(&session).await
            }
            Disposition::Clear => self.sessions.remove(&key).await,
        };
        if let Err(e) = stored {
            error!(session = %key, error = %e, "session write failed, dropping replies");
            self.dedup.release(&dedup_key);
            return EventOutcome::Failed;
        }

        self.deliver(&tenant, &key.phone, &transition.replies).await;

        if let Some(delay) = transition.follow_up {
            self.follow_ups.schedule(FollowUp {
                tenant_id: tenant.tenant_id.clone(),
                channel_id: event.channel_id.clone(),
                phone: key.phone.clone(),
                language: session.language,
                delay,
            });
        }
        EventOutcome::Processed
    }

    /// Offers the main menu again after a completed flow, unless the
    /// citizen has already started a new conversation.
    pub async fn run_follow_up(&self, follow_up: FollowUp) {
        let tenant = match self.directory.lookup(&follow_up.channel_id).await {
            Ok(Some(tenant)) if tenant.active && tenant.has_modules() => tenant,
            Ok(_) => return,
            Err(e) => {
                warn!(channel = %follow_up.channel_id, error = %e, "follow-up tenant lookup failed");
                return;
            }
        };

        let key = SessionKey::new(tenant.tenant_id.clone(), follow_up.phone.clone());
        let _guard = self.locks.lock(&key).await;
        let now = self.clock.now();

        let mut session = match self.sessions.get(&key, now).await {
            Ok(session) => session,
            Err(e) => {
                warn!(session = %key, error = %e, "follow-up session read failed");
                return;
            }
        };
        if session.step != Step::Start {
            debug!(session = %key, step = %session.step, "citizen moved on, skipping follow-up");
            return;
        }

        session.language = follow_up.language;
        session.step = Step::MainMenu;
        session.touch(now);
        if let Err(e) = self.sessions.save(&session).await {
            warn!(session = %key, error = %e, "follow-up session write failed");
            return;
        }
        self.deliver(&tenant, &key.phone, &[prompts::main_menu(&tenant)])
            .await;
    }

    async fn deliver(&self, tenant: &TenantChannelConfig, to: &str, replies: &[MessageBody]) {
        for body in replies {
            let message = OutboundMessage {
                to: to.to_string(),
                credentials: tenant.credentials.clone(),
                body: body.clone(),
            };
            if let Err(e) = self.gateway.send(&message).await {
                warn!(
                    tenant = %tenant.tenant_id,
                    to = %mask_phone(to),
                    error = %e,
                    "reply delivery failed"
                );
            }
        }
    }
}
