// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Mock messaging provider for deterministic testing.
//!
//! `MockMessaging` captures every accepted send for later assertions. It can
//! be switched to refuse structured messages, which exercises the plain-text
//! fallback, or to fail every call as a transport error.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use civic_core::{
    AdapterType, ChannelCredentials, ChoiceOption, CivicError, HealthStatus, ListSection,
    MessageBody, MessageId, MessagingProvider, PluginAdapter,
};

/// A message accepted by the mock provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentMessage {
    pub channel_id: String,
    pub to: String,
    pub body: MessageBody,
}

pub struct MockMessaging {
    sent: Arc<Mutex<Vec<SentMessage>>>,
    reject_structured: AtomicBool,
    fail_transport: AtomicBool,
    next_id: AtomicU64,
}

impl MockMessaging {
    pub fn new() -> Self {
        Self {
            sent: Arc::new(Mutex::new(Vec::new())),
            reject_structured: AtomicBool::new(false),
            fail_transport: AtomicBool::new(false),
            next_id: AtomicU64::new(1),
        }
    }

    /// Refuse buttons and lists with a 400, as a provider does for payloads
    /// it cannot render.
    pub fn reject_structured(&self, reject: bool) {
        self.reject_structured.store(reject, Ordering::SeqCst);
    }

    /// Fail every send as if the provider were unreachable.
    pub fn fail_transport(&self, fail: bool) {
        self.fail_transport.store(fail, Ordering::SeqCst);
    }

    pub async fn sent_messages(&self) -> Vec<SentMessage> {
        self.sent.lock().await.clone()
    }

    pub async fn sent_count(&self) -> usize {
        self.sent.lock().await.len()
    }

    /// Bodies sent to one recipient, in order.
    pub async fn sent_to(&self, to: &str) -> Vec<MessageBody> {
        self.sent
            .lock()
            .await
            .iter()
            .filter(|m| m.to == to)
            .map(|m| m.body.clone())
            .collect()
    }

    pub async fn clear_sent(&self) {
        self.sent.lock().await.clear();
    }

    async fn accept(
        &self,
        credentials: &ChannelCredentials,
        to: &str,
        body: MessageBody,
    ) -> Result<MessageId, CivicError> {
        if self.fail_transport.load(Ordering::SeqCst) {
            return Err(CivicError::Channel {
                message: "mock transport failure".into(),
                source: None,
            });
        }
        let structured = !matches!(body, MessageBody::Text(_));
        if structured && self.reject_structured.load(Ordering::SeqCst) {
            return Err(CivicError::Provider {
                status: 400,
                message: "interactive messages are not supported".into(),
            });
        }

        self.sent.lock().await.push(SentMessage {
            channel_id: credentials.channel_id.clone(),
            to: to.to_string(),
            body,
        });
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        Ok(MessageId(format!("mock-{id}")))
    }
}

impl Default for MockMessaging {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PluginAdapter for MockMessaging {
    fn name(&self) -> &str {
        "mock-messaging"
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
impl MessagingProvider for MockMessaging {
    async fn send_text(
        &self,
        credentials: &ChannelCredentials,
        to: &str,
        body: &str,
    ) -> Result<MessageId, CivicError> {
        self.accept(credentials, to, MessageBody::text(body)).await
    }

    async fn send_buttons(
        &self,
        credentials: &ChannelCredentials,
        to: &str,
        prompt: &str,
        options: &[ChoiceOption],
    ) -> Result<MessageId, CivicError> {
        let body = MessageBody::Buttons {
            prompt: prompt.to_string(),
            options: options.to_vec(),
        };
        self.accept(credentials, to, body).await
    }

    async fn send_list(
        &self,
        credentials: &ChannelCredentials,
        to: &str,
        prompt: &str,
        button_label: &str,
        sections: &[ListSection],
    ) -> Result<MessageId, CivicError> {
        let body = MessageBody::List {
            prompt: prompt.to_string(),
            button_label: button_label.to_string(),
            sections: sections.to_vec(),
        };
        self.accept(credentials, to, body).await
    }
}
