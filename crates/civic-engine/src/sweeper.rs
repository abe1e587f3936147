// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Periodic eviction of idle sessions and expired in-memory state.

use std::sync::Arc;
use std::time::Duration;

use chrono::TimeDelta;
use civic_config::model::SessionConfig;
use civic_core::{Clock, SessionStore, earlier_by};
use civic_prometheus::record_evicted;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::dedup::DedupCache;
use crate::locks::KeyedLocks;
use crate::otp::{OtpVerifier, seconds};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SweepSettings {
    /// Sessions idle longer than this are evicted.
    pub inactivity: TimeDelta,
    pub interval: Duration,
}

impl SweepSettings {
    pub fn from_config(config: &SessionConfig) -> Self {
        Self {
            inactivity: seconds(config.inactivity_timeout_secs),
            interval: Duration::from_secs(config.sweep_interval_secs),
        }
    }
}

/// Counts of entries removed by one sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub sessions: usize,
    pub codes: usize,
    pub dedup_keys: usize,
    pub locks: usize,
}

pub struct Sweeper {
    sessions: Arc<dyn SessionStore>,
    otp: Arc<OtpVerifier>,
    dedup: Arc<DedupCache>,
    locks: Arc<KeyedLocks>,
    settings: SweepSettings,
    clock: Arc<dyn Clock>,
}

impl Sweeper {
    pub fn new(
        sessions: Arc<dyn SessionStore>,
        otp: Arc<OtpVerifier>,
        dedup: Arc<DedupCache>,
        locks: Arc<KeyedLocks>,
        settings: SweepSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            sessions,
            otp,
            dedup,
            locks,
            settings,
            clock,
        }
    }

    /// Runs one sweep. A session store failure is logged and the other
    /// caches are still swept.
    pub async fn sweep_once(&self) -> SweepReport {
        let cutoff = earlier_by(self.clock.now(), self.settings.inactivity);
        let sessions = match self.sessions.evict(cutoff).await {
            Ok(evicted) => evicted,
            Err(e) => {
                warn!(error = %e, "session eviction failed");
                0
            }
        };
        record_evicted(sessions);

        let report = SweepReport {
            sessions,
            codes: self.otp.purge_expired(),
            dedup_keys: self.dedup.purge_expired(),
            locks: self.locks.prune(),
        };
        if report != SweepReport::default() {
            debug!(
                sessions = report.sessions,
                codes = report.codes,
                dedup_keys = report.dedup_keys,
                locks = report.locks,
                "sweep removed stale entries"
            );
        }
        report
    }

    pub async fn run(&self, cancel: CancellationToken) {
        info!(interval_secs = self.settings.interval.as_secs(), "session sweeper started");
        let mut ticker = tokio::time::interval(self.settings.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.sweep_once().await;
                }
            }
        }
        info!("session sweeper stopped");
    }
}
