// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Common types shared by the webhook receiver, the conversation engine and
//! the collaborator adapters.

use std::collections::BTreeSet;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};

/// Provider-assigned identifier of an outbound message.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MessageId(pub String);

/// Health status reported by adapter health checks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HealthStatus {
    /// Adapter is fully operational.
    Healthy,
    /// Adapter is operational but experiencing issues.
    Degraded(String),
    /// Adapter is not operational.
    Unhealthy(String),
}

/// Identifies the kind of collaborator behind an adapter.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
pub enum AdapterType {
    TenantDirectory,
    SessionStore,
    RecordStore,
    AuditSink,
    Messaging,
}

// --- Sessions ---

/// Composite identity of a conversation: one per (tenant, citizen phone).
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SessionKey {
    pub tenant_id: String,
    pub phone: String,
}

impl SessionKey {
    pub fn new(tenant_id: impl Into<String>, phone: impl Into<String>) -> Self {
        Self {
            tenant_id: tenant_id.into(),
            phone: phone.into(),
        }
    }
}

impl fmt::Display for SessionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.tenant_id, mask_phone(&self.phone))
    }
}

/// Conversation languages a citizen can pick.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Language {
    #[default]
    English,
    Hindi,
    Marathi,
}

impl Language {
    /// Short code used in button ids (`lang_en`).
    pub fn code(self) -> &'static str {
        match self {
            Language::English => "en",
            Language::Hindi => "hi",
            Language::Marathi => "mr",
        }
    }

    /// Label shown to the citizen.
    pub fn label(self) -> &'static str {
        match self {
            Language::English => "English",
            Language::Hindi => "हिन्दी",
            Language::Marathi => "मराठी",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        match code {
            "en" => Some(Language::English),
            "hi" => Some(Language::Hindi),
            "mr" => Some(Language::Marathi),
            _ => None,
        }
    }

    /// Matches typed input such as "english", "Hindi" or the native label.
    pub fn from_label(input: &str) -> Option<Self> {
        let normalized = input.trim().to_lowercase();
        match normalized.as_str() {
            "english" => Some(Language::English),
            "hindi" | "हिन्दी" | "हिंदी" => Some(Language::Hindi),
            "marathi" | "मराठी" => Some(Language::Marathi),
            _ => None,
        }
    }

    pub const ALL: [Language; 3] = [Language::English, Language::Hindi, Language::Marathi];
}

/// Position of a citizen inside the conversation. The only field that drives
/// control flow.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Display, EnumString, EnumIter, Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Step {
    #[default]
    Start,
    LanguageSelection,
    MainMenu,
    OtpVerification,
    GrievanceName,
    GrievanceCategory,
    GrievanceDescription,
    GrievanceLocation,
    GrievancePhoto,
}

/// Flow a verification gate was entered for.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PendingAction {
    Grievance,
}

/// Fields collected so far for the record being assembled.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Draft {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub citizen_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub media: Vec<String>,
}

impl Draft {
    pub fn is_empty(&self) -> bool {
        *self == Draft::default()
    }
}

/// Per-citizen conversation state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub key: SessionKey,
    pub language: Language,
    pub step: Step,
    pub pending_action: Option<PendingAction>,
    pub draft: Draft,
    pub created_at: DateTime<Utc>,
    pub last_activity_at: DateTime<Utc>,
}

impl Session {
    /// A fresh session at [`Step::Start`].
    pub fn new(key: SessionKey, now: DateTime<Utc>) -> Self {
        Self {
            key,
            language: Language::default(),
            step: Step::Start,
            pending_action: None,
            draft: Draft::default(),
            created_at: now,
            last_activity_at: now,
        }
    }

    pub fn touch(&mut self, now: DateTime<Utc>) {
        self.last_activity_at = now;
    }

    /// Drops the in-progress flow but keeps identity and language.
    pub fn abandon_flow(&mut self) {
        self.pending_action = None;
        self.draft = Draft::default();
    }
}

// --- Inbound events ---

/// Kind of an inbound item, derived from its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "snake_case")]
pub enum EventKind {
    Text,
    Media,
    InteractiveReply,
}

/// Kind-specific content of an inbound item.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventPayload {
    Text {
        body: String,
    },
    Media {
        media_id: String,
        mime_type: Option<String>,
        caption: Option<String>,
    },
    Interactive {
        option_id: String,
        title: String,
    },
}

/// One provider-delivered unit of work, normalized.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InboundEvent {
    pub provider_message_id: String,
    pub channel_id: String,
    pub from: String,
    pub profile_name: Option<String>,
    pub payload: EventPayload,
    pub received_at: DateTime<Utc>,
}

impl InboundEvent {
    pub fn kind(&self) -> EventKind {
        match self.payload {
            EventPayload::Text { .. } => EventKind::Text,
            EventPayload::Media { .. } => EventKind::Media,
            EventPayload::Interactive { .. } => EventKind::InteractiveReply,
        }
    }

    /// Identity used to recognize redelivered items.
    pub fn dedup_key(&self) -> String {
        format!("{}:{}", self.channel_id, self.provider_message_id)
    }
}

// --- Tenants ---

/// Feature modules a tenant can enable.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    PartialOrd,
    Ord,
    Display,
    EnumString,
    EnumIter,
    Serialize,
    Deserialize,
)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum Module {
    Grievance,
    Appointment,
}

/// Credentials needed to send through a tenant's channel.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelCredentials {
    /// Provider phone-number id of the tenant's channel.
    pub channel_id: String,
    pub access_token: String,
}

impl fmt::Debug for ChannelCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChannelCredentials")
            .field("channel_id", &self.channel_id)
            .field("access_token", &"[redacted]")
            .finish()
    }
}

/// Department a finalized record can be routed to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrgUnit {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub categories: Vec<String>,
}

/// Read-only view of a tenant as seen by the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TenantChannelConfig {
    pub tenant_id: String,
    pub name: String,
    pub active: bool,
    pub credentials: Option<ChannelCredentials>,
    pub modules: BTreeSet<Module>,
    pub org_units: Vec<OrgUnit>,
}

impl TenantChannelConfig {
    pub fn is_enabled(&self, module: Module) -> bool {
        self.modules.contains(&module)
    }

    pub fn has_modules(&self) -> bool {
        !self.modules.is_empty()
    }
}

// --- Outbound messages ---

/// A selectable option in a button or list prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChoiceOption {
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ChoiceOption {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
            description: None,
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// A named group of rows in a list prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListSection {
    pub title: String,
    pub rows: Vec<ChoiceOption>,
}

/// Rendering-ready content of an outbound message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MessageBody {
    Text(String),
    Buttons {
        prompt: String,
        options: Vec<ChoiceOption>,
    },
    List {
        prompt: String,
        button_label: String,
        sections: Vec<ListSection>,
    },
}

impl MessageBody {
    pub fn text(body: impl Into<String>) -> Self {
        MessageBody::Text(body.into())
    }

    /// Plain-text rendering with numbered options, used when structured
    /// messages are unavailable.
    pub fn to_plain_text(&self) -> String {
        match self {
            MessageBody::Text(body) => body.clone(),
            MessageBody::Buttons { prompt, options } => {
                numbered(prompt, options.iter().map(|o| o.title.as_str()))
            }
            MessageBody::List {
                prompt, sections, ..
            } => numbered(
                prompt,
                sections
                    .iter()
                    .flat_map(|s| s.rows.iter().map(|r| r.title.as_str())),
            ),
        }
    }
}

fn numbered<'a>(prompt: &str, titles: impl Iterator<Item = &'a str>) -> String {
    let mut out = prompt.to_string();
    out.push('\n');
    for (i, title) in titles.enumerate() {
        out.push_str(&format!("\n{}. {}", i + 1, title));
    }
    out.push_str("\n\nReply with the number of your choice.");
    out
}

/// An instruction to deliver a message to a citizen.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutboundMessage {
    pub to: String,
    pub credentials: Option<ChannelCredentials>,
    pub body: MessageBody,
}

// --- Records and audit ---

/// Kind of finalized citizen record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RecordKind {
    Grievance,
}

/// Initial status of a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString, Serialize, Deserialize)]
#[strum(serialize_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RecordStatus {
    Pending,
}

/// A completed draft ready to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewRecord {
    pub tenant_id: String,
    pub kind: RecordKind,
    /// Absent when no organizational unit matched the category.
    pub org_unit_id: Option<String>,
    pub citizen_name: String,
    pub phone: String,
    pub category: String,
    pub description: String,
    pub address: Option<String>,
    pub media: Vec<String>,
    pub language: Language,
    pub status: RecordStatus,
}

/// Result of a successful record creation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordReceipt {
    /// Human-facing identifier quoted back to the citizen.
    pub reference: String,
}

/// Best-effort notification that a record was created through a channel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditEvent {
    pub tenant_id: String,
    pub kind: RecordKind,
    pub channel: String,
    pub reference: String,
    pub occurred_at: DateTime<Utc>,
}

/// Masks all but the last four digits of a phone number for log output.
pub fn mask_phone(phone: &str) -> String {
    let count = phone.chars().count();
    if count <= 4 {
        return "*".repeat(count);
    }
    phone
        .chars()
        .enumerate()
        .map(|(i, c)| if i < count - 4 { '*' } else { c })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn step_uses_snake_case_names() {
        assert_eq!(Step::GrievanceDescription.to_string(), "grievance_description");
        assert_eq!(Step::from_str("otp_verification").unwrap(), Step::OtpVerification);
        let json = serde_json::to_string(&Step::LanguageSelection).unwrap();
        assert_eq!(json, "\"language_selection\"");
    }

    #[test]
    fn language_lookup_by_code_and_label() {
        assert_eq!(Language::from_code("hi"), Some(Language::Hindi));
        assert_eq!(Language::from_label("  English "), Some(Language::English));
        assert_eq!(Language::from_label("मराठी"), Some(Language::Marathi));
        assert_eq!(Language::from_label("klingon"), None);
        assert_eq!(Language::from_label("hi"), None, "greetings are not languages");
    }

    #[test]
    fn new_session_starts_at_start() {
        let now = Utc::now();
        let session = Session::new(SessionKey::new("t1", "919800000001"), now);
        assert_eq!(session.step, Step::Start);
        assert_eq!(session.language, Language::English);
        assert!(session.draft.is_empty());
        assert_eq!(session.last_activity_at, now);
    }

    #[test]
    fn abandon_flow_clears_draft_and_pending() {
        let mut session = Session::new(SessionKey::new("t1", "1"), Utc::now());
        session.draft.description = Some("pothole".into());
        session.pending_action = Some(PendingAction::Grievance);
        session.language = Language::Hindi;
        session.abandon_flow();
        assert!(session.draft.is_empty());
        assert!(session.pending_action.is_none());
        assert_eq!(session.language, Language::Hindi);
    }

    #[test]
    fn dedup_key_combines_channel_and_message() {
        let event = InboundEvent {
            provider_message_id: "wamid.1".into(),
            channel_id: "PN1".into(),
            from: "91".into(),
            profile_name: None,
            payload: EventPayload::Text { body: "hi".into() },
            received_at: Utc::now(),
        };
        assert_eq!(event.dedup_key(), "PN1:wamid.1");
        assert_eq!(event.kind(), EventKind::Text);
    }

    #[test]
    fn buttons_render_as_numbered_text() {
        let body = MessageBody::Buttons {
            prompt: "Choose a language".into(),
            options: vec![
                ChoiceOption::new("lang_en", "English"),
                ChoiceOption::new("lang_hi", "हिन्दी"),
            ],
        };
        let text = body.to_plain_text();
        assert!(text.starts_with("Choose a language"));
        assert!(text.contains("1. English"));
        assert!(text.contains("2. हिन्दी"));
    }

    #[test]
    fn list_numbering_continues_across_sections() {
        let body = MessageBody::List {
            prompt: "Menu".into(),
            button_label: "Open".into(),
            sections: vec![
                ListSection {
                    title: "A".into(),
                    rows: vec![ChoiceOption::new("a", "First")],
                },
                ListSection {
                    title: "B".into(),
                    rows: vec![ChoiceOption::new("b", "Second")],
                },
            ],
        };
        let text = body.to_plain_text();
        assert!(text.contains("1. First"));
        assert!(text.contains("2. Second"));
    }

    #[test]
    fn credentials_debug_redacts_token() {
        let creds = ChannelCredentials {
            channel_id: "PN1".into(),
            access_token: "EAAG-secret".into(),
        };
        let debug = format!("{creds:?}");
        assert!(debug.contains("PN1"));
        assert!(!debug.contains("EAAG-secret"));
    }

    #[test]
    fn mask_phone_keeps_last_four() {
        assert_eq!(mask_phone("919876543210"), "********3210");
        assert_eq!(mask_phone("123"), "***");
    }
}
