// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Inbound webhook payload types and event extraction.
//!
//! A delivery is an `entry[].changes[].value` tree. Each value carries the
//! receiving channel in `metadata.phone_number_id`, optional sender profiles
//! in `contacts[]`, citizen messages in `messages[]` and delivery receipts in
//! `statuses[]`. Receipts and unsupported message types are skipped.
//!
//! Entries, changes, contacts and messages are decoded one at a time, so a
//! single malformed item is dropped without losing its siblings.

use chrono::{DateTime, Utc};
use civic_core::{CivicError, EventPayload, InboundEvent, mask_phone};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, warn};

#[derive(Debug, Deserialize)]
struct WebhookNotification {
    #[serde(default)]
    entry: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct WebhookEntry {
    #[serde(default)]
    changes: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct WebhookChange {
    #[serde(default)]
    value: Option<WebhookValue>,
}

#[derive(Debug, Deserialize)]
struct WebhookValue {
    #[serde(default)]
    metadata: Option<WebhookMetadata>,
    #[serde(default)]
    contacts: Vec<Value>,
    #[serde(default)]
    messages: Vec<Value>,
    #[serde(default)]
    statuses: Vec<Value>,
}

#[derive(Debug, Deserialize)]
struct WebhookMetadata {
    #[serde(default)]
    phone_number_id: String,
}

#[derive(Debug, Deserialize)]
struct WebhookContact {
    #[serde(default)]
    wa_id: String,
    #[serde(default)]
    profile: Option<WebhookProfile>,
}

#[derive(Debug, Deserialize)]
struct WebhookProfile {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct WebhookMessage {
    #[serde(default)]
    from: String,
    #[serde(default)]
    id: String,
    #[serde(default, rename = "type")]
    msg_type: String,
    #[serde(default)]
    text: Option<TextContent>,
    #[serde(default)]
    interactive: Option<InteractiveContent>,
    #[serde(default)]
    button: Option<ButtonContent>,
    #[serde(default)]
    image: Option<MediaContent>,
    #[serde(default)]
    document: Option<MediaContent>,
    #[serde(default)]
    audio: Option<MediaContent>,
    #[serde(default)]
    video: Option<MediaContent>,
    #[serde(default)]
    location: Option<LocationContent>,
}

#[derive(Debug, Deserialize)]
struct TextContent {
    #[serde(default)]
    body: String,
}

#[derive(Debug, Deserialize)]
struct InteractiveContent {
    #[serde(default)]
    button_reply: Option<ReplyContent>,
    #[serde(default)]
    list_reply: Option<ReplyContent>,
}

#[derive(Debug, Deserialize)]
struct ReplyContent {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
}

/// Quick-reply button on a template message.
#[derive(Debug, Deserialize)]
struct ButtonContent {
    #[serde(default)]
    payload: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct MediaContent {
    #[serde(default)]
    id: String,
    #[serde(default)]
    mime_type: Option<String>,
    #[serde(default)]
    caption: Option<String>,
}

#[derive(Debug, Deserialize)]
struct LocationContent {
    #[serde(default)]
    latitude: f64,
    #[serde(default)]
    longitude: f64,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    address: Option<String>,
}

/// Parses a raw delivery body into normalized events, in delivery order.
///
/// Returns an error only when the body is not a webhook notification at all.
/// Individual items that cannot be used are skipped.
pub fn extract_events(
    body: &[u8],
    received_at: DateTime<Utc>,
) -> Result<Vec<InboundEvent>, CivicError> {
    let notification: WebhookNotification =
        serde_json::from_slice(body).map_err(|e| CivicError::Channel {
            message: format!("malformed webhook payload: {e}"),
            source: Some(Box::new(e)),
        })?;

    let mut events = Vec::new();
    for value in decode_each::<WebhookEntry>(notification.entry, "entry")
        .flat_map(|e| decode_each::<WebhookChange>(e.changes, "change"))
        .filter_map(|c| c.value)
    {
        if !value.statuses.is_empty() {
            debug!(count = value.statuses.len(), "ignoring delivery status updates");
        }

        let channel_id = match value.metadata {
            Some(meta) if !meta.phone_number_id.is_empty() => meta.phone_number_id,
            _ => {
                if !value.messages.is_empty() {
                    debug!("change without phone_number_id, skipping its messages");
                }
                continue;
            }
        };

        let contacts: Vec<WebhookContact> = decode_each(value.contacts, "contact").collect();
        for msg in decode_each::<WebhookMessage>(value.messages, "message") {
            if msg.id.is_empty() || msg.from.is_empty() {
                debug!("message without id or sender, skipping");
                continue;
            }
            let Some(payload) = message_payload(&msg) else {
                debug!(
                    msg_type = %msg.msg_type,
                    from = %mask_phone(&msg.from),
                    "unsupported or incomplete message, skipping"
                );
                continue;
            };
            let profile_name = profile_for(&contacts, &msg.from);
            events.push(InboundEvent {
                provider_message_id: msg.id,
                channel_id: channel_id.clone(),
                from: msg.from,
                profile_name,
                payload,
                received_at,
            });
        }
    }

    Ok(events)
}

/// Decodes each item on its own, logging and dropping the ones that fail.
fn decode_each<T: DeserializeOwned>(
    items: Vec<Value>,
    item: &'static str,
) -> impl Iterator<Item = T> {
    items
        .into_iter()
        .enumerate()
        .filter_map(move |(index, raw)| match serde_json::from_value(raw) {
            Ok(decoded) => Some(decoded),
            Err(e) => {
                warn!(item, index, error = %e, "malformed webhook item, skipping");
                None
            }
        })
}

fn message_payload(msg: &WebhookMessage) -> Option<EventPayload> {
    match msg.msg_type.as_str() {
        "text" => msg.text.as_ref().map(|t| EventPayload::Text {
            body: t.body.clone(),
        }),
        "interactive" => {
            let interactive = msg.interactive.as_ref()?;
            let reply = interactive
                .button_reply
                .as_ref()
                .or(interactive.list_reply.as_ref())
                .filter(|r| !r.id.is_empty())?;
            Some(EventPayload::Interactive {
                option_id: reply.id.clone(),
                title: reply.title.clone(),
            })
        }
        "button" => msg.button.as_ref().map(|b| EventPayload::Interactive {
            option_id: if b.payload.is_empty() {
                b.text.clone()
            } else {
                b.payload.clone()
            },
            title: b.text.clone(),
        }),
        "image" => media(msg.image.as_ref()),
        "document" => media(msg.document.as_ref()),
        "audio" => media(msg.audio.as_ref()),
        "video" => media(msg.video.as_ref()),
        "location" => msg.location.as_ref().map(|loc| EventPayload::Text {
            body: location_text(loc),
        }),
        _ => None,
    }
}

fn media(content: Option<&MediaContent>) -> Option<EventPayload> {
    content.filter(|m| !m.id.is_empty()).map(|m| EventPayload::Media {
        media_id: m.id.clone(),
        mime_type: m.mime_type.clone(),
        caption: m.caption.clone().filter(|c| !c.trim().is_empty()),
    })
}

fn location_text(loc: &LocationContent) -> String {
    match (&loc.name, &loc.address) {
        (Some(name), Some(address)) => format!("{name}, {address}"),
        (None, Some(address)) => address.clone(),
        (Some(name), None) => format!("{name} ({}, {})", loc.latitude, loc.longitude),
        (None, None) => format!("{}, {}", loc.latitude, loc.longitude),
    }
}

fn profile_for(contacts: &[WebhookContact], from: &str) -> Option<String> {
    contacts
        .iter()
        .find(|c| c.wa_id == from)
        .or_else(|| contacts.first())
        .and_then(|c| c.profile.as_ref())
        .map(|p| p.name.clone())
        .filter(|n| !n.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use civic_core::EventKind;
    use serde_json::json;

    fn wrap(value: serde_json::Value) -> Vec<u8> {
        serde_json::to_vec(&json!({
            "object": "whatsapp_business_account",
            "entry": [{"id": "WABA", "changes": [{"field": "messages", "value": value}]}]
        }))
        .unwrap()
    }

    fn now() -> DateTime<Utc> {
        Utc::now()
    }

    #[test]
    fn text_message_is_extracted() {
        let body = wrap(json!({
            "messaging_product": "whatsapp",
            "metadata": {"display_phone_number": "15550001111", "phone_number_id": "PN1"},
            "contacts": [{"profile": {"name": "Asha"}, "wa_id": "919800000001"}],
            "messages": [{
                "from": "919800000001", "id": "wamid.A", "timestamp": "1700000000",
                "type": "text", "text": {"body": "hello"}
            }]
        }));
        let events = extract_events(&body, now()).unwrap();
        assert_eq!(events.len(), 1);
        let event = &events[0];
        assert_eq!(event.channel_id, "PN1");
        assert_eq!(event.provider_message_id, "wamid.A");
        assert_eq!(event.profile_name.as_deref(), Some("Asha"));
        assert_eq!(
            event.payload,
            EventPayload::Text {
                body: "hello".into()
            }
        );
    }

    #[test]
    fn button_and_list_replies_become_interactive() {
        let body = wrap(json!({
            "metadata": {"phone_number_id": "PN1"},
            "messages": [
                {"from": "91", "id": "m1", "type": "interactive",
                 "interactive": {"type": "button_reply", "button_reply": {"id": "lang_hi", "title": "हिन्दी"}}},
                {"from": "91", "id": "m2", "type": "interactive",
                 "interactive": {"type": "list_reply", "list_reply": {"id": "menu_grievance", "title": "Grievance", "description": "x"}}},
                {"from": "91", "id": "m3", "type": "button",
                 "button": {"payload": "menu_track", "text": "Track"}}
            ]
        }));
        let events = extract_events(&body, now()).unwrap();
        assert_eq!(events.len(), 3);
        assert!(events.iter().all(|e| e.kind() == EventKind::InteractiveReply));
        assert_eq!(
            events[1].payload,
            EventPayload::Interactive {
                option_id: "menu_grievance".into(),
                title: "Grievance".into()
            }
        );
        assert_eq!(
            events[2].payload,
            EventPayload::Interactive {
                option_id: "menu_track".into(),
                title: "Track".into()
            }
        );
    }

    #[test]
    fn media_keeps_id_caption_and_mime() {
        let body = wrap(json!({
            "metadata": {"phone_number_id": "PN1"},
            "messages": [{"from": "91", "id": "m1", "type": "image",
                "image": {"id": "MEDIA1", "mime_type": "image/jpeg", "caption": "broken pipe"}}]
        }));
        let events = extract_events(&body, now()).unwrap();
        assert_eq!(
            events[0].payload,
            EventPayload::Media {
                media_id: "MEDIA1".into(),
                mime_type: Some("image/jpeg".into()),
                caption: Some("broken pipe".into()),
            }
        );
    }

    #[test]
    fn location_becomes_text() {
        let body = wrap(json!({
            "metadata": {"phone_number_id": "PN1"},
            "messages": [{"from": "91", "id": "m1", "type": "location",
                "location": {"latitude": 18.52, "longitude": 73.85, "address": "FC Road, Pune"}}]
        }));
        let events = extract_events(&body, now()).unwrap();
        assert_eq!(
            events[0].payload,
            EventPayload::Text {
                body: "FC Road, Pune".into()
            }
        );
    }

    #[test]
    fn statuses_and_unsupported_types_are_skipped() {
        let body = wrap(json!({
            "metadata": {"phone_number_id": "PN1"},
            "statuses": [{"id": "wamid.X", "status": "delivered"}],
            "messages": [
                {"from": "91", "id": "m1", "type": "reaction", "reaction": {"emoji": "👍"}},
                {"from": "91", "id": "m2", "type": "text", "text": {"body": "ok"}}
            ]
        }));
        let events = extract_events(&body, now()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].provider_message_id, "m2");
    }

    #[test]
    fn empty_delivery_yields_nothing() {
        let events = extract_events(br#"{"object":"whatsapp_business_account","entry":[]}"#, now())
            .unwrap();
        assert!(events.is_empty());
    }

    #[test]
    fn missing_metadata_skips_messages() {
        let body = wrap(json!({
            "messages": [{"from": "91", "id": "m1", "type": "text", "text": {"body": "hi"}}]
        }));
        assert!(extract_events(&body, now()).unwrap().is_empty());
    }

    #[test]
    fn malformed_message_does_not_drop_its_siblings() {
        let body = wrap(json!({
            "metadata": {"phone_number_id": "PN1"},
            "messages": [
                {"from": "91", "id": "wamid.good", "type": "text", "text": {"body": "water leak"}},
                {"from": "91", "id": "wamid.bad", "type": "image", "image": {"mime_type": "image/jpeg"}},
                {"from": 91, "id": "wamid.typed", "type": "text", "text": {"body": "x"}},
                "not an object"
            ]
        }));
        let events = extract_events(&body, now()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].provider_message_id, "wamid.good");
    }

    #[test]
    fn reply_without_id_is_skipped() {
        let body = wrap(json!({
            "metadata": {"phone_number_id": "PN1"},
            "messages": [
                {"from": "91", "id": "m1", "type": "interactive",
                 "interactive": {"type": "button_reply", "button_reply": {"title": "Yes"}}},
                {"from": "91", "id": "m2", "type": "text", "text": {"body": "yes"}}
            ]
        }));
        let events = extract_events(&body, now()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].provider_message_id, "m2");
    }

    #[test]
    fn malformed_change_does_not_drop_other_changes() {
        let body = serde_json::to_vec(&json!({
            "object": "whatsapp_business_account",
            "entry": [
                {"id": "WABA1", "changes": [
                    {"field": "messages", "value": {"metadata": "oops", "messages": []}},
                    {"field": "messages", "value": {
                        "metadata": {"phone_number_id": "PN1"},
                        "contacts": [{"wa_id": 7}],
                        "messages": [{"from": "91", "id": "m1", "type": "text", "text": {"body": "hi"}}]
                    }}
                ]},
                {"id": "WABA2", "changes": "not a list"}
            ]
        }))
        .unwrap();
        let events = extract_events(&body, now()).unwrap();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].channel_id, "PN1");
        assert_eq!(events[0].profile_name, None);
    }

    #[test]
    fn malformed_body_is_an_error() {
        let err = extract_events(b"not json", now()).unwrap_err();
        assert!(err.to_string().contains("malformed webhook payload"));
    }
}
