// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Builders for WhatsApp Cloud API webhook bodies.

use serde_json::{Value, json};

/// Wraps messages into a single-entry notification for `channel_id`.
pub fn webhook_body(channel_id: &str, messages: &[Value]) -> Vec<u8> {
    let contacts: Vec<Value> = messages
        .iter()
        .filter_map(|m| m.get("from").and_then(Value::as_str))
        .map(|from| json!({ "wa_id": from, "profile": { "name": "Test Citizen" } }))
        .collect();
    let body = json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "id": "WABA-1",
            "changes": [{
                "field": "messages",
                "value": {
                    "messaging_product": "whatsapp",
                    "metadata": {
                        "display_phone_number": "15550000000",
                        "phone_number_id": channel_id
                    },
                    "contacts": contacts,
                    "messages": messages
                }
            }]
        }]
    });
    body.to_string().into_bytes()
}

/// A delivery-receipt-only notification.
pub fn status_body(channel_id: &str, message_id: &str) -> Vec<u8> {
    json!({
        "object": "whatsapp_business_account",
        "entry": [{
            "id": "WABA-1",
            "changes": [{
                "field": "messages",
                "value": {
                    "messaging_product": "whatsapp",
                    "metadata": { "phone_number_id": channel_id },
                    "statuses": [{ "id": message_id, "status": "delivered" }]
                }
            }]
        }]
    })
    .to_string()
    .into_bytes()
}

pub fn text_message(from: &str, id: &str, body: &str) -> Value {
    json!({
        "from": from,
        "id": id,
        "timestamp": "1767225600",
        "type": "text",
        "text": { "body": body }
    })
}

pub fn button_reply(from: &str, id: &str, option_id: &str, title: &str) -> Value {
    json!({
        "from": from,
        "id": id,
        "timestamp": "1767225600",
        "type": "interactive",
        "interactive": {
            "type": "button_reply",
            "button_reply": { "id": option_id, "title": title }
        }
    })
}

pub fn list_reply(from: &str, id: &str, option_id: &str, title: &str) -> Value {
    json!({
        "from": from,
        "id": id,
        "timestamp": "1767225600",
        "type": "interactive",
        "interactive": {
            "type": "list_reply",
            "list_reply": { "id": option_id, "title": title }
        }
    })
}

pub fn image_message(from: &str, id: &str, media_id: &str, caption: Option<&str>) -> Value {
    let mut image = json!({ "id": media_id, "mime_type": "image/jpeg" });
    if let Some(caption) = caption {
        image["caption"] = json!(caption);
    }
    json!({
        "from": from,
        "id": id,
        "timestamp": "1767225600",
        "type": "image",
        "image": image
    })
}
