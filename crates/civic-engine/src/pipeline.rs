// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Wiring of the engine components around injected collaborators.

use std::sync::Arc;

use civic_config::CivicConfig;
use civic_core::{AuditSink, Clock, MessagingProvider, RecordStore, SessionStore, TenantDirectory};

use crate::conversation::{ConversationEngine, ConversationSettings};
use crate::finalize::Finalizer;
use crate::followup::{FollowUpWorker, follow_up_channel};
use crate::gateway::OutboundGateway;
use crate::otp::{OtpSettings, OtpVerifier, seconds};
use crate::receiver::WebhookReceiver;
use crate::router::CategoryRouter;
use crate::sweeper::{SweepSettings, Sweeper};

/// External collaborators the engine runs against.
pub struct Collaborators {
    pub directory: Arc<dyn TenantDirectory>,
    pub sessions: Arc<dyn SessionStore>,
    pub records: Arc<dyn RecordStore>,
    pub audit: Arc<dyn AuditSink>,
    pub messaging: Arc<dyn MessagingProvider>,
    pub clock: Arc<dyn Clock>,
}

/// A fully wired engine. The worker and sweeper are not started.
pub struct Pipeline {
    pub receiver: Arc<WebhookReceiver>,
    pub follow_up_worker: FollowUpWorker,
    pub sweeper: Sweeper,
}

impl Pipeline {
    pub fn build(config: &CivicConfig, parts: Collaborators) -> Self {
        let Collaborators {
            directory,
            sessions,
            records,
            audit,
            messaging,
            clock,
        } = parts;

        let gateway = Arc::new(OutboundGateway::new(messaging));
        let otp = Arc::new(OtpVerifier::new(
            OtpSettings::from_config(&config.otp),
            gateway.clone(),
            clock.clone(),
        ));
        let router = CategoryRouter::new(config.conversation.fallback_category.clone());
        let finalizer = Finalizer::new(records, audit, router.clone(), clock.clone());
        let engine = Arc::new(ConversationEngine::new(
            otp.clone(),
            router,
            finalizer,
            ConversationSettings::from_config(&config.conversation),
        ));

        let (follow_ups, follow_up_worker) = follow_up_channel();
        let receiver = Arc::new(WebhookReceiver::new(
            directory,
            sessions.clone(),
            engine,
            gateway,
            follow_ups,
            seconds(config.dedup.retention_secs),
            clock.clone(),
        ));
        let sweeper = Sweeper::new(
            sessions,
            otp,
            receiver.dedup().clone(),
            receiver.locks().clone(),
            SweepSettings::from_config(&config.session),
            clock,
        );

        Self {
            receiver,
            follow_up_worker,
            sweeper,
        }
    }
}
