// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Delayed main-menu re-prompts after a completed flow.
//!
//! The receiver enqueues a [`FollowUp`]; the [`FollowUpWorker`] waits out the
//! delay and hands it back to the receiver. Tests drain the queue directly.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use civic_core::{Language, mask_phone};
use civic_prometheus::set_pending_follow_ups;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::receiver::WebhookReceiver;

/// A scheduled re-presentation of the main menu.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FollowUp {
    pub tenant_id: String,
    pub channel_id: String,
    pub phone: String,
    pub language: Language,
    pub delay: Duration,
}

/// Sending half, held by the receiver.
#[derive(Clone)]
pub struct FollowUps {
    tx: mpsc::UnboundedSender<FollowUp>,
    pending: Arc<AtomicUsize>,
}

impl FollowUps {
    pub fn schedule(&self, follow_up: FollowUp) {
        let phone = mask_phone(&follow_up.phone);
        match self.tx.send(follow_up) {
            Ok(()) => {
                let pending = self.pending.fetch_add(1, Ordering::SeqCst) + 1;
                set_pending_follow_ups(pending as f64);
                debug!(phone = %phone, "follow-up scheduled");
            }
            Err(_) => debug!(phone = %phone, "follow-up worker gone, dropping follow-up"),
        }
    }

    /// Follow-ups enqueued but not yet taken by the worker.
    pub fn pending(&self) -> usize {
        self.pending.load(Ordering::SeqCst)
    }
}

/// Receiving half.
pub struct FollowUpWorker {
    rx: mpsc::UnboundedReceiver<FollowUp>,
    pending: Arc<AtomicUsize>,
}

pub fn follow_up_channel() -> (FollowUps, FollowUpWorker) {
    let (tx, rx) = mpsc::unbounded_channel();
    let pending = Arc::new(AtomicUsize::new(0));
    (
        FollowUps {
            tx,
            pending: pending.clone(),
        },
        FollowUpWorker { rx, pending },
    )
}

impl FollowUpWorker {
    /// Takes the next queued follow-up without waiting.
    pub fn try_next(&mut self) -> Option<FollowUp> {
        let next = self.rx.try_recv().ok()?;
        self.taken();
        Some(next)
    }

    fn taken(&self) {
        let left = self
            .pending
            .fetch_sub(1, Ordering::SeqCst)
            .saturating_sub(1);
        set_pending_follow_ups(left as f64);
    }

    /// Runs until `cancel` fires. Each follow-up waits out its delay on its
    /// own task, so a long delay never holds back later ones.
    pub async fn run(mut self, receiver: Arc<WebhookReceiver>, cancel: CancellationToken) {
        info!("follow-up worker started");
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                next = self.rx.recv() => {
                    let Some(follow_up) = next else { break };
                    self.taken();
                    let receiver = receiver.clone();
                    let cancel = cancel.clone();
                    tokio::spawn(async move {
                        tokio::select! {
                            _ = cancel.cancelled() => {}
                            _ = tokio::time::sleep(follow_up.delay) => {
                                receiver.run_follow_up(follow_up).await;
                            }
                        }
                    });
                }
            }
        }
        info!("follow-up worker stopped");
    }
}
