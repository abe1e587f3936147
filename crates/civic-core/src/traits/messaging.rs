// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Messaging provider trait for the outbound chat API.

use async_trait::async_trait;

use crate::error::CivicError;
use crate::traits::adapter::PluginAdapter;
use crate::types::{ChannelCredentials, ChoiceOption, ListSection, MessageId};

/// Low-level transport to the chat provider.
///
/// Implementations send exactly what they are given. Limits and plain-text
/// fallback are applied one layer up. A request the provider refuses must be
/// reported as [`CivicError::Provider`] so the caller can tell it apart from a
/// transport failure.
#[async_trait]
pub trait MessagingProvider: PluginAdapter {
    async fn send_text(
        &self,
        credentials: &ChannelCredentials,
        to: &str,
        body: &str,
    ) -> Result<MessageId, CivicError>;

    async fn send_buttons(
        &self,
        credentials: &ChannelCredentials,
        to: &str,
        prompt: &str,
        options: &[ChoiceOption],
    ) -> Result<MessageId, CivicError>;

    async fn send_list(
        &self,
        credentials: &ChannelCredentials,
        to: &str,
        prompt: &str,
        button_label: &str,
        sections: &[ListSection],
    ) -> Result<MessageId, CivicError>;
}
