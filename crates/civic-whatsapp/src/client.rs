// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Graph API client implementing [`MessagingProvider`].

use std::time::Duration;

use async_trait::async_trait;
use civic_config::model::WhatsAppConfig;
use civic_core::{
    AdapterType, ChannelCredentials, ChoiceOption, CivicError, HealthStatus, ListSection,
    MessageId, MessagingProvider, PluginAdapter, mask_phone,
};
use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, warn};

/// Sends messages through `POST {base}/{version}/{phone_number_id}/messages`.
///
/// Credentials are supplied per call because every tenant owns its own
/// channel and token.
#[derive(Debug, Clone)]
pub struct WhatsAppClient {
    client: reqwest::Client,
    base_url: String,
    api_version: String,
}

#[derive(Debug, Deserialize)]
struct SendResponse {
    #[serde(default)]
    messages: Vec<SentMessage>,
}

#[derive(Debug, Deserialize)]
struct SentMessage {
    id: String,
}

impl WhatsAppClient {
    pub fn new(
        base_url: impl Into<String>,
        api_version: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, CivicError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| CivicError::Channel {
                message: format!("failed to build HTTP client: {e}"),
                source: Some(Box::new(e)),
            })?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_version: api_version.into(),
        })
    }

    pub fn from_config(config: &WhatsAppConfig) -> Result<Self, CivicError> {
        Self::new(
            &config.api_base_url,
            &config.api_version,
            Duration::from_secs(config.request_timeout_secs),
        )
    }

    fn endpoint(&self, channel_id: &str) -> String {
        format!("{}/{}/{}/messages", self.base_url, self.api_version, channel_id)
    }

    async fn post(
        &self,
        credentials: &ChannelCredentials,
        to: &str,
        message: Value,
    ) -> Result<MessageId, CivicError> {
        let mut payload = json!({
            "messaging_product": "whatsapp",
            "recipient_type": "individual",
            "to": to,
        });
        if let (Some(target), Value::Object(fields)) = (payload.as_object_mut(), message) {
            target.extend(fields);
        }

        let response = self
            .client
            .post(self.endpoint(&credentials.channel_id))
            .bearer_auth(&credentials.access_token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| CivicError::Channel {
                message: format!("WhatsApp request failed: {e}"),
                source: Some(Box::new(e)),
            })?;

        let status = response.status();
        if !status.is_success() {
            let body: Value = response.json().await.unwrap_or_default();
            let detail = body
                .get("error")
                .and_then(|err| err.get("message"))
                .and_then(Value::as_str)
                .unwrap_or("unknown API error")
                .to_string();
            warn!(status = %status, detail = %detail, to = %mask_phone(to), "WhatsApp API error");

            // 4xx means the request itself was refused; anything else is
            // treated as the transport being unavailable.
            if status.is_client_error() && status.as_u16() != 429 {
                return Err(CivicError::Provider {
                    status: status.as_u16(),
                    message: detail,
                });
            }
            return Err(CivicError::Channel {
                message: format!("WhatsApp API returned {status}: {detail}"),
                source: None,
            });
        }

        let parsed: SendResponse = response.json().await.map_err(|e| CivicError::Channel {
            message: format!("failed to parse WhatsApp response: {e}"),
            source: Some(Box::new(e)),
        })?;
        let id = parsed
            .messages
            .into_iter()
            .next()
            .map(|m| m.id)
            .ok_or_else(|| CivicError::Channel {
                message: "WhatsApp response carried no message id".into(),
                source: None,
            })?;

        debug!(to = %mask_phone(to), message_id = %id, "message accepted");
        Ok(MessageId(id))
    }
}

#[async_trait]
impl PluginAdapter for WhatsAppClient {
    fn name(&self) -> &str {
        "whatsapp-cloud"
    }

    fn version(&self) -> semver::Version {
        semver::Version::new(0, 1, 0)
    }

    fn adapter_type(&self) -> AdapterType {
        AdapterType::Messaging
    }

    async fn health_check(&self) -> Result<HealthStatus, CivicError> {
        Ok(HealthStatus::Healthy)
    }

    async fn shutdown(&self) -> Result<(), CivicError> {
        Ok(())
    }
}

#[async_trait]
impl MessagingProvider for WhatsAppClient {
    async fn send_text(
        &self,
        credentials: &ChannelCredentials,
        to: &str,
        body: &str,
    ) -> Result<MessageId, CivicError> {
        let message = json!({
            "type": "text",
            "text": {"preview_url": false, "body": body},
        });
        self.post(credentials, to, message).await
    }

    async fn send_buttons(
        &self,
        credentials: &ChannelCredentials,
        to: &str,
        prompt: &str,
        options: &[ChoiceOption],
    ) -> Result<MessageId, CivicError> {
        let buttons: Vec<Value> = options
            .iter()
            .map(|o| json!({"type": "reply", "reply": {"id": o.id, "title": o.title}}))
            .collect();
        let message = json!({
            "type": "interactive",
            "interactive": {
                "type": "button",
                "body": {"text": prompt},
                "action": {"buttons": buttons},
            },
        });
        self.post(credentials, to, message).await
    }

    async fn send_list(
        &self,
        credentials: &ChannelCredentials,
        to: &str,
        prompt: &str,
        button_label: &str,
        sections: &[ListSection],
    ) -> Result<MessageId, CivicError> {
        let sections: Vec<Value> = sections
            .iter()
            .map(|s| {
                let rows: Vec<Value> = s
                    .rows
                    .iter()
                    .map(|r| {
                        let mut row = json!({"id": r.id, "title": r.title});
                        if let Some(description) = &r.description {
                            row["description"] = json!(description);
                        }
                        row
                    })
                    .collect();
                json!({"title": s.title, "rows": rows})
            })
            .collect();
        let message = json!({
            "type": "interactive",
            "interactive": {
                "type": "list",
                "body": {"text": prompt},
                "action": {"button": button_label, "sections": sections},
            },
        });
        self.post(credentials, to, message).await
    }
}
