// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Outbound messaging gateway.
//!
//! Enforces provider limits on structured messages and falls back to a
//! numbered plain-text rendering when the provider refuses a structured one.

use std::sync::Arc;

use civic_core::{
    ChannelCredentials, ChoiceOption, CivicError, ListSection, MessageBody, MessageId,
    MessagingProvider, OutboundMessage, mask_phone,
};
use civic_prometheus::{record_delivery, record_fallback};
use thiserror::Error;
use tracing::{debug, warn};

/// Reply buttons allowed per message.
pub const MAX_BUTTONS: usize = 3;
/// Characters allowed in a reply button title.
pub const MAX_BUTTON_TITLE: usize = 20;
/// Rows allowed across all sections of a list.
pub const MAX_LIST_ROWS: usize = 10;
pub const MAX_LIST_SECTIONS: usize = 10;
pub const MAX_ROW_TITLE: usize = 24;
pub const MAX_ROW_DESCRIPTION: usize = 72;
pub const MAX_SECTION_TITLE: usize = 24;
pub const MAX_LIST_BUTTON_LABEL: usize = 20;
/// Characters allowed in the body of an interactive message.
pub const MAX_INTERACTIVE_BODY: usize = 1024;
pub const MAX_TEXT_BODY: usize = 4096;

/// Why a message was not delivered.
#[derive(Debug, Error)]
pub enum DeliveryError {
    /// The tenant has no channel credentials configured.
    #[error("tenant has no channel credentials")]
    MissingCredentials,

    /// The provider refused the message (and its plain-text fallback, when
    /// one was attempted).
    #[error("provider rejected message ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The provider could not be reached.
    #[error("transport failure: {0}")]
    Transport(String),
}

impl From<CivicError> for DeliveryError {
    fn from(err: CivicError) -> Self {
        match err {
            CivicError::Provider { status, message } => DeliveryError::Rejected { status, message },
            other => DeliveryError::Transport(other.to_string()),
        }
    }
}

/// Rendering-aware front of a [`MessagingProvider`].
#[derive(Clone)]
pub struct OutboundGateway {
    provider: Arc<dyn MessagingProvider>,
}

impl OutboundGateway {
    pub fn new(provider: Arc<dyn MessagingProvider>) -> Self {
        Self { provider }
    }

    /// Delivers any outbound message.
    pub async fn send(&self, message: &OutboundMessage) -> Result<MessageId, DeliveryError> {
        let credentials = message.credentials.as_ref();
        match &message.body {
            MessageBody::Text(body) => self.send_text(credentials, &message.to, body).await,
            MessageBody::Buttons { prompt, options } => {
                self.send_buttons(credentials, &message.to, prompt, options)
                    .await
            }
            MessageBody::List {
                prompt,
                button_label,
                sections,
            } => {
                self.send_list(credentials, &message.to, prompt, button_label, sections)
                    .await
            }
        }
    }

    pub async fn send_text(
        &self,
        credentials: Option<&ChannelCredentials>,
        to: &str,
        body: &str,
    ) -> Result<MessageId, DeliveryError> {
        let credentials = require(credentials, to, "text")?;
        let body = clip(body, MAX_TEXT_BODY);
        let result = self.provider.send_text(credentials, to, &body).await;
        finish("text", to, result)
    }

    /// Sends reply buttons, keeping only the first [`MAX_BUTTONS`] options.
    pub async fn send_buttons(
        &self,
        credentials: Option<&ChannelCredentials>,
        to: &str,
        prompt: &str,
        options: &[ChoiceOption],
    ) -> Result<MessageId, DeliveryError> {
        let credentials = require(credentials, to, "buttons")?;
        let body = normalize_buttons(prompt, options);
        let MessageBody::Buttons { prompt, options } = &body else {
            return Err(DeliveryError::Transport("unexpected body".into()));
        };
        if options.is_empty() {
            return self.send_text(Some(credentials), to, prompt).await;
        }

        let result = self
            .provider
            .send_buttons(credentials, to, prompt, options)
            .await;
        self.with_fallback("buttons", credentials, to, &body, result)
            .await
    }

    /// Sends a list prompt, clipping sections and rows to provider limits.
    pub async fn send_list(
        &self,
        credentials: Option<&ChannelCredentials>,
        to: &str,
        prompt: &str,
        button_label: &str,
        sections: &[ListSection],
    ) -> Result<MessageId, DeliveryError> {
        let credentials = require(credentials, to, "list")?;
        let body = normalize_list(prompt, button_label, sections);
        let MessageBody::List {
            prompt,
            button_label,
            sections,
        } = &body
        else {
            return Err(DeliveryError::Transport("unexpected body".into()));
        };

        let result = self
            .provider
            .send_list(credentials, to, prompt, button_label, sections)
            .await;
        self.with_fallback("list", credentials, to, &body, result)
            .await
    }

    async fn with_fallback(
        &self,
        kind: &'static str,
        credentials: &ChannelCredentials,
        to: &str,
        body: &MessageBody,
        result: Result<MessageId, CivicError>,
    ) -> Result<MessageId, DeliveryError> {
        match result {
            Err(err) if err.is_rejection() => {
                warn!(
                    kind,
                    to = %mask_phone(to),
                    error = %err,
                    "structured message rejected, falling back to plain text"
                );
                record_delivery(kind, "rejected");
                record_fallback(kind);
                let text = clip(&body.to_plain_text(), MAX_TEXT_BODY);
                let result = self.provider.send_text(credentials, to, &text).await;
                finish("text", to, result)
            }
            other => finish(kind, to, other),
        }
    }
}

fn require<'a>(
    credentials: Option<&'a ChannelCredentials>,
    to: &str,
    kind: &'static str,
) -> Result<&'a ChannelCredentials, DeliveryError> {
    credentials.ok_or_else(|| {
        warn!(kind, to = %mask_phone(to), "cannot deliver without channel credentials");
        record_delivery(kind, "missing_credentials");
        DeliveryError::MissingCredentials
    })
}

fn finish(
    kind: &'static str,
    to: &str,
    result: Result<MessageId, CivicError>,
) -> Result<MessageId, DeliveryError> {
    match result {
        Ok(id) => {
            debug!(kind, to = %mask_phone(to), message_id = %id.0, "delivered");
            record_delivery(kind, "ok");
            Ok(id)
        }
        Err(err) => {
            record_delivery(kind, if err.is_rejection() { "rejected" } else { "failed" });
            Err(err.into())
        }
    }
}

/// Truncates to `max` characters, marking the cut with an ellipsis.
pub fn clip(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let mut out: String = text.chars().take(max.saturating_sub(1)).collect();
    out.push('…');
    out
}

fn clip_option(option: &ChoiceOption, title_max: usize) -> ChoiceOption {
    ChoiceOption {
        id: option.id.clone(),
        title: clip(&option.title, title_max),
        description: option
            .description
            .as_deref()
            .map(|d| clip(d, MAX_ROW_DESCRIPTION)),
    }
}

/// Applies button limits: at most [`MAX_BUTTONS`] options, titles clipped.
pub fn normalize_buttons(prompt: &str, options: &[ChoiceOption]) -> MessageBody {
    MessageBody::Buttons {
        prompt: clip(prompt, MAX_INTERACTIVE_BODY),
        options: options
            .iter()
            .take(MAX_BUTTONS)
            .map(|o| ChoiceOption {
                description: None,
                ..clip_option(o, MAX_BUTTON_TITLE)
            })
            .collect(),
    }
}

/// Applies list limits: section and row counts, titles and descriptions.
pub fn normalize_list(prompt: &str, button_label: &str, sections: &[ListSection]) -> MessageBody {
    let mut remaining = MAX_LIST_ROWS;
    let mut clipped = Vec::new();
    for section in sections.iter().take(MAX_LIST_SECTIONS) {
        if remaining == 0 {
            break;
        }
        let rows: Vec<ChoiceOption> = section
            .rows
            .iter()
            .take(remaining)
            .map(|r| clip_option(r, MAX_ROW_TITLE))
            .collect();
        remaining -= rows.len();
        if !rows.is_empty() {
            clipped.push(ListSection {
                title: clip(&section.title, MAX_SECTION_TITLE),
                rows,
            });
        }
    }
    MessageBody::List {
        prompt: clip(prompt, MAX_INTERACTIVE_BODY),
        button_label: clip(button_label, MAX_LIST_BUTTON_LABEL),
        sections: clipped,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use civic_test_utils::MockMessaging;

    fn creds() -> ChannelCredentials {
        ChannelCredentials {
            channel_id: "PN1".into(),
            access_token: "token".into(),
        }
    }

    fn options(n: usize) -> Vec<ChoiceOption> {
        (0..n)
            .map(|i| ChoiceOption::new(format!("opt_{i}"), format!("Option {i}")))
            .collect()
    }

    #[tokio::test]
    async fn buttons_are_truncated_before_the_provider_call() {
        let mock = Arc::new(MockMessaging::new());
        let gateway = OutboundGateway::new(mock.clone());
        let mut opts = options(5);
        opts[0].title = "A very long category title indeed".into();

        gateway
            .send_buttons(Some(&creds()), "91", "Pick one", &opts)
            .await
            .unwrap();

        let sent = mock.sent_messages().await;
        assert_eq!(sent.len(), 1);
        let MessageBody::Buttons { options, .. } = &sent[0].body else {
            panic!("expected buttons, got {:?}", sent[0].body);
        };
        assert_eq!(options.len(), MAX_BUTTONS);
        assert!(options[0].title.chars().count() <= MAX_BUTTON_TITLE);
        assert_eq!(options[1].title, "Option 1");
    }

    #[tokio::test]
    async fn rejected_structured_message_falls_back_to_text() {
        let mock = Arc::new(MockMessaging::new());
        mock.reject_structured(true);
        let gateway = OutboundGateway::new(mock.clone());

        let id = gateway
            .send_buttons(Some(&creds()), "91", "Choose a language", &options(2))
            .await
            .unwrap();
        assert!(id.0.starts_with("mock-"));

        let sent = mock.sent_messages().await;
        assert_eq!(sent.len(), 1);
        let MessageBody::Text(text) = &sent[0].body else {
            panic!("expected text fallback");
        };
        assert!(text.contains("Choose a language"));
        assert!(text.contains("1. Option 0"));
        assert!(text.contains("2. Option 1"));
    }

    #[tokio::test]
    async fn list_fallback_numbers_rows() {
        let mock = Arc::new(MockMessaging::new());
        mock.reject_structured(true);
        let gateway = OutboundGateway::new(mock.clone());
        let sections = vec![ListSection {
            title: "Services".into(),
            rows: options(3),
        }];

        gateway
            .send_list(Some(&creds()), "91", "Main menu", "Open", &sections)
            .await
            .unwrap();

        let sent = mock.sent_messages().await;
        let MessageBody::Text(text) = &sent[0].body else {
            panic!("expected text fallback");
        };
        assert!(text.contains("3. Option 2"));
    }

    #[tokio::test]
    async fn transport_failure_does_not_fall_back() {
        let mock = Arc::new(MockMessaging::new());
        mock.fail_transport(true);
        let gateway = OutboundGateway::new(mock.clone());

        let err = gateway
            .send_buttons(Some(&creds()), "91", "p", &options(2))
            .await
            .unwrap_err();
        assert!(matches!(err, DeliveryError::Transport(_)));
        assert_eq!(mock.sent_count().await, 0);
    }

    #[tokio::test]
    async fn missing_credentials_is_structured_error() {
        let mock = Arc::new(MockMessaging::new());
        let gateway = OutboundGateway::new(mock.clone());
        let err = gateway.send_text(None, "91", "hello").await.unwrap_err();
        assert!(matches!(err, DeliveryError::MissingCredentials));
        assert_eq!(mock.sent_count().await, 0);
    }

    #[test]
    fn list_rows_are_capped_across_sections() {
        let sections = vec![
            ListSection {
                title: "A".into(),
                rows: options(7),
            },
            ListSection {
                title: "B".into(),
                rows: options(7),
            },
        ];
        let MessageBody::List { sections, .. } = normalize_list("p", "Open", &sections) else {
            panic!("expected list");
        };
        let total: usize = sections.iter().map(|s| s.rows.len()).sum();
        assert_eq!(total, MAX_LIST_ROWS);
        assert_eq!(sections[1].rows.len(), 3);
    }

    #[test]
    fn clip_keeps_short_text_and_marks_cuts() {
        assert_eq!(clip("Roads", 20), "Roads");
        let clipped = clip("abcdefghijklmnopqrstuvwxyz", 20);
        assert_eq!(clipped.chars().count(), 20);
        assert!(clipped.ends_with('…'));
    }
}
