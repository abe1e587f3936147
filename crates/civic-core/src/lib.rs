// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the Civic webhook engine.
//!
//! This crate provides the collaborator traits, the error type and the
//! conversation types shared by every other crate in the workspace.

pub mod clock;
pub mod error;
pub mod traits;
pub mod types;

pub use clock::{Clock, SystemClock, earlier_by, later_by};
pub use error::CivicError;
pub use types::{
    AdapterType, AuditEvent, ChannelCredentials, ChoiceOption, Draft, EventKind, EventPayload,
    HealthStatus, InboundEvent, Language, ListSection, MessageBody, MessageId, Module, NewRecord,
    OrgUnit, OutboundMessage, PendingAction, RecordKind, RecordReceipt, RecordStatus, Session,
    SessionKey, Step, TenantChannelConfig, mask_phone,
};

pub use traits::{
    AuditSink, MessagingProvider, PluginAdapter, RecordStore, SessionStore, TenantDirectory,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn adapter_type_round_trips_through_strings() {
        use std::str::FromStr;

        let variants = [
            AdapterType::TenantDirectory,
            AdapterType::SessionStore,
            AdapterType::RecordStore,
            AdapterType::AuditSink,
            AdapterType::Messaging,
        ];
        for variant in &variants {
            let s = variant.to_string();
            let parsed = AdapterType::from_str(&s).expect("should parse back");
            assert_eq!(*variant, parsed);
        }
    }

    #[test]
    fn health_status_variants() {
        let healthy = HealthStatus::Healthy;
        let degraded = HealthStatus::Degraded("slow".into());
        let unhealthy = HealthStatus::Unhealthy("down".into());

        assert_eq!(healthy, HealthStatus::Healthy);
        assert_ne!(degraded, healthy);
        assert_ne!(unhealthy, healthy);
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_plugin_adapter<T: PluginAdapter>() {}
        fn _assert_session_store<T: SessionStore>() {}
        fn _assert_record_store<T: RecordStore>() {}
        fn _assert_messaging<T: MessagingProvider>() {}
        fn _assert_directory<T: TenantDirectory>() {}
        fn _assert_audit<T: AuditSink>() {}
    }

    #[test]
    fn system_clock_moves_forward() {
        let clock = SystemClock;
        let a = clock.now();
        let b = clock.now();
        assert!(b >= a);
    }
}
