// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Error types for the Civic webhook engine.

use thiserror::Error;

/// The primary error type used across all collaborator traits and core operations.
#[derive(Debug, Error)]
pub enum CivicError {
    /// Configuration errors (invalid TOML, missing credentials, bad values).
    #[error("configuration error: {0}")]
    Config(String),

    /// Storage backend errors (session store, record store, audit log).
    #[error("storage error: {source}")]
    Storage {
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Transport-level failures talking to the messaging provider
    /// (connection refused, timeout, unreadable response).
    #[error("channel error: {message}")]
    Channel {
        message: String,
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// The messaging provider received the request and rejected it.
    #[error("provider rejected request ({status}): {message}")]
    Provider { status: u16, message: String },

    /// No tenant is registered for the channel.
    #[error("no tenant registered for channel {channel_id}")]
    TenantNotFound { channel_id: String },

    /// Operation timed out.
    #[error("operation timed out after {duration:?}")]
    Timeout { duration: std::time::Duration },

    /// Internal or unexpected errors.
    #[error("internal error: {0}")]
    Internal(String),
}

impl CivicError {
    /// Wraps any error as a storage failure.
    pub fn storage<E>(err: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        CivicError::Storage {
            source: Box::new(err),
        }
    }

    /// True when the provider explicitly refused the request, as opposed to
    /// the request never reaching it.
    pub fn is_rejection(&self) -> bool {
        matches!(self, CivicError::Provider { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_errors_are_rejections() {
        let rejected = CivicError::Provider {
            status: 400,
            message: "invalid interactive payload".into(),
        };
        assert!(rejected.is_rejection());

        let transport = CivicError::Channel {
            message: "connection reset".into(),
            source: None,
        };
        assert!(!transport.is_rejection());
    }

    #[test]
    fn storage_helper_preserves_message() {
        let err = CivicError::storage(std::io::Error::other("disk full"));
        assert_eq!(err.to_string(), "storage error: disk full");
    }
}
