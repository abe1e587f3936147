// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Metric registration and recording helpers.
//!
//! Uses the metrics-rs facade so any installed recorder collects these. With
//! no recorder installed every call is a no-op.

use civic_core::Step;
use metrics::{describe_counter, describe_gauge};

/// Register all Civic metric descriptions.
///
/// Called once at startup after the recorder is installed.
pub fn register_metrics() {
    describe_counter!(
        "civic_webhook_events_total",
        "Inbound webhook items by processing outcome"
    );
    describe_counter!(
        "civic_transitions_total",
        "Conversation transitions by source and target step"
    );
    describe_counter!(
        "civic_deliveries_total",
        "Outbound messages by body kind and outcome"
    );
    describe_counter!(
        "civic_delivery_fallbacks_total",
        "Structured messages resent as plain text after rejection"
    );
    describe_counter!("civic_otp_checks_total", "Verification code checks by result");
    describe_counter!("civic_records_total", "Record finalizations by result");
    describe_counter!("civic_sessions_evicted_total", "Sessions removed for inactivity");
    describe_gauge!("civic_pending_follow_ups", "Scheduled follow-ups not yet run");
}

/// Record the outcome of one inbound item (`processed`, `duplicate`, ...).
pub fn record_webhook_event(outcome: &'static str) {
    metrics::counter!("civic_webhook_events_total", "outcome" => outcome).increment(1);
}

pub fn record_transition(from: Step, to: Step) {
    metrics::counter!(
        "civic_transitions_total",
        "from" => from.to_string(),
        "to" => to.to_string()
    )
    .increment(1);
}

/// Record an outbound send. `kind` is `text`, `buttons` or `list`.
pub fn record_delivery(kind: &'static str, outcome: &'static str) {
    metrics::counter!("civic_deliveries_total", "kind" => kind, "outcome" => outcome).increment(1);
}

pub fn record_fallback(kind: &'static str) {
    metrics::counter!("civic_delivery_fallbacks_total", "kind" => kind).increment(1);
}

pub fn record_otp_check(result: &'static str) {
    metrics::counter!("civic_otp_checks_total", "result" => result).increment(1);
}

pub fn record_finalization(result: &'static str) {
    metrics::counter!("civic_records_total", "result" => result).increment(1);
}

pub fn record_evicted(count: usize) {
    metrics::counter!("civic_sessions_evicted_total").increment(count as u64);
}

pub fn set_pending_follow_ups(count: f64) {
    metrics::gauge!("civic_pending_follow_ups").set(count);
}
