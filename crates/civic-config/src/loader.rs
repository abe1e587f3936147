// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration loader using Figment for layered config merging.
//!
//! Lookup order: `./civic.toml` > `~/.config/civic/civic.toml` >
//! `/etc/civic/civic.toml`, with `CIVIC_` environment variable overrides.

#![allow(clippy::result_large_err)] // figment::Error is external and cannot be boxed without wrapper

use std::path::Path;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};

use crate::model::CivicConfig;

/// Sections that can be addressed from environment variables.
const ENV_SECTIONS: &[&str] = &[
    "service",
    "gateway",
    "whatsapp",
    "session",
    "dedup",
    "otp",
    "conversation",
    "storage",
    "metrics",
];

/// Load configuration from the standard XDG hierarchy with env var overrides.
///
/// Merge order (later overrides earlier):
/// 1. Compiled defaults
/// 2. `/etc/civic/civic.toml` (system-wide)
/// 3. `~/.config/civic/civic.toml` (user XDG config)
/// 4. `./civic.toml` (local directory)
/// 5. `CIVIC_*` environment variables
pub fn load_config() -> Result<CivicConfig, figment::Error> {
    build_figment().extract()
}

/// Load configuration from a TOML string only (no file lookup, no env).
pub fn load_config_from_str(toml_content: &str) -> Result<CivicConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CivicConfig::default()))
        .merge(Toml::string(toml_content))
        .extract()
}

/// Load configuration from a specific file path with env var overrides.
pub fn load_config_from_path(path: &Path) -> Result<CivicConfig, figment::Error> {
    Figment::new()
        .merge(Serialized::defaults(CivicConfig::default()))
        .merge(Toml::file(path))
        .merge(env_provider())
        .extract()
}

/// Build the Figment used for config loading, before extraction.
pub fn build_figment() -> Figment {
    Figment::new()
        .merge(Serialized::defaults(CivicConfig::default()))
        .merge(Toml::file("/etc/civic/civic.toml"))
        .merge(Toml::file(
            dirs::config_dir()
                .map(|d| d.join("civic/civic.toml"))
                .unwrap_or_default(),
        ))
        .merge(Toml::file("civic.toml"))
        .merge(env_provider())
}

/// Environment provider mapping `CIVIC_SECTION_KEY` to `section.key`.
///
/// Uses `Env::map()` rather than `Env::split("_")` because key names contain
/// underscores: `CIVIC_WHATSAPP_APP_SECRET` must land on `whatsapp.app_secret`.
fn env_provider() -> Env {
    Env::prefixed("CIVIC_").map(|key| env_key_to_path(key.as_str()).into())
}

/// Maps a lowercased, prefix-stripped env key to its dotted config path.
pub(crate) fn env_key_to_path(key: &str) -> String {
    for section in ENV_SECTIONS {
        if let Some(rest) = key
            .strip_prefix(section)
            .and_then(|r| r.strip_prefix('_'))
        {
            return format!("{section}.{rest}");
        }
    }
    key.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn env_keys_split_on_section_only() {
        assert_eq!(env_key_to_path("whatsapp_app_secret"), "whatsapp.app_secret");
        assert_eq!(
            env_key_to_path("session_inactivity_timeout_secs"),
            "session.inactivity_timeout_secs"
        );
        assert_eq!(env_key_to_path("otp_max_attempts"), "otp.max_attempts");
    }

    #[test]
    fn unknown_env_section_is_left_alone() {
        assert_eq!(env_key_to_path("something_else"), "something_else");
    }

    #[test]
    fn serialized_defaults_load_back() {
        let rendered = toml::to_string(&CivicConfig::default()).unwrap();
        let config = load_config_from_str(&rendered).unwrap();
        assert_eq!(config.gateway.webhook_path, CivicConfig::default().gateway.webhook_path);
        assert_eq!(config.otp.code_length, 6);
        assert!(config.tenants.is_empty());
    }
}
