// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Post-deserialization validation for configuration values.
//!
//! Checks semantic constraints serde attributes cannot express, such as
//! bounded code lengths, durations between one second and one year, and
//! unique tenant channels.

use std::collections::HashSet;

use crate::diagnostic::ConfigError;
use crate::model::CivicConfig;

const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

/// Longest accepted duration setting: one year.
pub const MAX_DURATION_SECS: u64 = 365 * 24 * 60 * 60;

/// Validate a deserialized configuration for semantic correctness.
///
/// Collects every failure instead of stopping at the first.
pub fn validate_config(config: &CivicConfig) -> Result<(), Vec<ConfigError>> {
    let mut errors = Vec::new();
    let mut fail = |message: String| errors.push(ConfigError::Validation { message });

    if !LOG_LEVELS.contains(&config.service.log_level.as_str()) {
        fail(format!(
            "service.log_level `{}` must be one of {}",
            config.service.log_level,
            LOG_LEVELS.join(", ")
        ));
    }

    let host = config.gateway.host.trim();
    if host.is_empty() {
        fail("gateway.host must not be empty".to_string());
    } else {
        let is_valid_ip = host.parse::<std::net::IpAddr>().is_ok();
        let is_valid_hostname = host
            .chars()
            .all(|c| c.is_alphanumeric() || c == '.' || c == '-' || c == ':');
        if !is_valid_ip && !is_valid_hostname {
            fail(format!(
                "gateway.host `{host}` is not a valid IP address or hostname"
            ));
        }
    }

    if !config.gateway.webhook_path.starts_with('/') {
        fail(format!(
            "gateway.webhook_path `{}` must start with `/`",
            config.gateway.webhook_path
        ));
    }

    let base = &config.whatsapp.api_base_url;
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        fail(format!(
            "whatsapp.api_base_url `{base}` must be an http(s) URL"
        ));
    }

    let durations = [
        ("whatsapp.request_timeout_secs", config.whatsapp.request_timeout_secs, false),
        ("session.inactivity_timeout_secs", config.session.inactivity_timeout_secs, false),
        ("session.sweep_interval_secs", config.session.sweep_interval_secs, false),
        ("dedup.retention_secs", config.dedup.retention_secs, false),
        ("otp.ttl_secs", config.otp.ttl_secs, false),
        ("otp.verified_ttl_secs", config.otp.verified_ttl_secs, false),
        (
            "conversation.menu_redisplay_delay_secs",
            config.conversation.menu_redisplay_delay_secs,
            true,
        ),
    ];
    for (key, secs, zero_ok) in durations {
        if secs == 0 && !zero_ok {
            fail(format!("{key} must be greater than 0"));
        } else if secs > MAX_DURATION_SECS {
            fail(format!(
                "{key} must be at most {MAX_DURATION_SECS} (one year), got {secs}"
            ));
        }
    }

    if !(4..=10).contains(&config.otp.code_length) {
        fail(format!(
            "otp.code_length must be between 4 and 10, got {}",
            config.otp.code_length
        ));
    }

    if config.otp.max_attempts == Some(0) {
        fail("otp.max_attempts must be at least 1 when set".to_string());
    }

    if config.conversation.fallback_category.trim().is_empty() {
        fail("conversation.fallback_category must not be empty".to_string());
    }

    if config.storage.database_path.trim().is_empty() {
        fail("storage.database_path must not be empty".to_string());
    }

    let mut seen_ids = HashSet::new();
    let mut seen_channels = HashSet::new();
    for (i, tenant) in config.tenants.iter().enumerate() {
        if tenant.id.trim().is_empty() {
            fail(format!("tenants[{i}].id must not be empty"));
        } else if !seen_ids.insert(tenant.id.as_str()) {
            fail(format!("duplicate tenant id `{}` in [[tenants]]", tenant.id));
        }

        if tenant.channel_id.trim().is_empty() {
            fail(format!("tenants[{i}].channel_id must not be empty"));
        } else if !seen_channels.insert(tenant.channel_id.as_str()) {
            fail(format!(
                "channel `{}` is assigned to more than one tenant",
                tenant.channel_id
            ));
        }

        let mut unit_ids = HashSet::new();
        for unit in &tenant.org_units {
            if !unit_ids.insert(unit.id.as_str()) {
                fail(format!(
                    "tenant `{}` has duplicate org unit id `{}`",
                    tenant.id, unit.id
                ));
            }
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
