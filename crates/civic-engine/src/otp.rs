// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! One-time verification codes delivered over the citizen's own channel.
//!
//! A citizen holds at most one live code per session key. A correct code is
//! consumed and leaves a time-limited verification behind, so later flows in
//! the same window skip the code step.

use std::sync::Arc;

use chrono::{DateTime, TimeDelta, Utc};
use civic_config::model::OtpConfig;
use civic_core::{ChannelCredentials, Clock, SessionKey, later_by};
use civic_prometheus::record_otp_check;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use rand::Rng;
use tracing::{debug, info, warn};

use crate::gateway::OutboundGateway;
use crate::prompts;

/// Verifier tuning.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OtpSettings {
    pub code_length: usize,
    pub ttl: TimeDelta,
    pub verified_ttl: TimeDelta,
    /// Wrong guesses tolerated before the live code is burned. `None`
    /// disables the lockout.
    pub max_attempts: Option<u32>,
}

impl Default for OtpSettings {
    fn default() -> Self {
        Self::from_config(&OtpConfig::default())
    }
}

impl OtpSettings {
    pub fn from_config(config: &OtpConfig) -> Self {
        Self {
            code_length: config.code_length,
            ttl: seconds(config.ttl_secs),
            verified_ttl: seconds(config.verified_ttl_secs),
            max_attempts: config.max_attempts,
        }
    }
}

/// Converts configured seconds, capping at [`TimeDelta::MAX`].
///
/// Add the result to an instant with [`later_by`], never with `+`.
pub(crate) fn seconds(secs: u64) -> TimeDelta {
    i64::try_from(secs)
        .ok()
        .and_then(TimeDelta::try_seconds)
        .unwrap_or(TimeDelta::MAX)
}

#[derive(Debug, Clone)]
struct LiveCode {
    code: String,
    expires_at: DateTime<Utc>,
    attempts: u32,
}

enum CheckOutcome {
    Missing,
    Expired,
    Accepted,
    Mismatch,
    Locked,
}

impl CheckOutcome {
    fn label(&self) -> &'static str {
        match self {
            CheckOutcome::Missing => "missing",
            CheckOutcome::Expired => "expired",
            CheckOutcome::Accepted => "accepted",
            CheckOutcome::Mismatch => "mismatch",
            CheckOutcome::Locked => "locked",
        }
    }
}

pub struct OtpVerifier {
    settings: OtpSettings,
    codes: DashMap<SessionKey, LiveCode>,
    verified: DashMap<SessionKey, DateTime<Utc>>,
    gateway: Arc<OutboundGateway>,
    clock: Arc<dyn Clock>,
}

impl OtpVerifier {
    pub fn new(settings: OtpSettings, gateway: Arc<OutboundGateway>, clock: Arc<dyn Clock>) -> Self {
        Self {
            settings,
            codes: DashMap::new(),
            verified: DashMap::new(),
            gateway,
            clock,
        }
    }

    /// Issues a fresh code for `key`, replacing any live one, and sends it
    /// to the citizen. A failed send is logged; the code stays live.
    pub async fn issue(&self, key: &SessionKey, credentials: Option<&ChannelCredentials>) {
        let code = generate_code(self.settings.code_length);
        let expires_at = later_by(self.clock.now(), self.settings.ttl);
        let replaced = self
            .codes
            .insert(
                key.clone(),
                LiveCode {
                    code: code.clone(),
                    expires_at,
                    attempts: 0,
                },
            )
            .is_some();
        info!(session = %key, replaced, "verification code issued");

        let text = prompts::otp_code(&code, self.settings.ttl.num_minutes().max(1));
        if let Err(e) = self.gateway.send_text(credentials, &key.phone, &text).await {
            warn!(session = %key, error = %e, "verification code delivery failed");
        }
    }

    /// Checks `candidate` against the live code for `key`.
    ///
    /// Success consumes the code and records a verification. Expired or
    /// missing codes never match.
    pub fn check(&self, key: &SessionKey, candidate: &str) -> bool {
        let now = self.clock.now();
        let candidate = candidate.trim();

        let outcome = match self.codes.entry(key.clone()) {
            Entry::Vacant(_) => CheckOutcome::Missing,
            Entry::Occupied(mut slot) => {
                if slot.get().expires_at <= now {
                    slot.remove();
                    CheckOutcome::Expired
                } else if slot.get().code == candidate {
                    slot.remove();
                    CheckOutcome::Accepted
                } else {
                    let live = slot.get_mut();
                    live.attempts += 1;
                    match self.settings.max_attempts {
                        Some(max) if live.attempts >= max => {
                            slot.remove();
                            CheckOutcome::Locked
                        }
                        _ => CheckOutcome::Mismatch,
                    }
                }
            }
        };

        record_otp_check(outcome.label());
        debug!(session = %key, outcome = outcome.label(), "verification code checked");

        match outcome {
            CheckOutcome::Accepted => {
                self.verified
                    .insert(key.clone(), later_by(now, self.settings.verified_ttl));
                true
            }
            CheckOutcome::Locked => {
                warn!(session = %key, "verification code burned after repeated failures");
                false
            }
            _ => false,
        }
    }

    /// True while a successful check for `key` is still within its window.
    pub fn is_verified(&self, key: &SessionKey) -> bool {
        let now = self.clock.now();
        self.verified.get(key).is_some_and(|until| *until > now)
    }

    /// Drops expired codes and verifications, returning how many went.
    pub fn purge_expired(&self) -> usize {
        let now = self.clock.now();
        let before = self.codes.len() + self.verified.len();
        self.codes.retain(|_, live| live.expires_at > now);
        self.verified.retain(|_, until| *until > now);
        before.saturating_sub(self.codes.len() + self.verified.len())
    }
}

fn generate_code(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| char::from(b'0' + rng.gen_range(0..10u8)))
        .collect()
}
