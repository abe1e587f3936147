// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Configuration model structs for the Civic webhook engine.
//!
//! All structs use `#[serde(deny_unknown_fields)]` to reject unrecognized
//! config keys at startup, providing actionable error messages.

use civic_core::Module;
use serde::{Deserialize, Serialize};

/// Top-level Civic configuration.
///
/// Loaded from TOML files following the XDG hierarchy, with environment
/// variable overrides. Every section is optional and defaults to sensible
/// values.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct CivicConfig {
    /// Service identity and logging.
    #[serde(default)]
    pub service: ServiceConfig,

    /// HTTP listener settings.
    #[serde(default)]
    pub gateway: GatewayConfig,

    /// WhatsApp Cloud API settings.
    #[serde(default)]
    pub whatsapp: WhatsAppConfig,

    /// Session store settings.
    #[serde(default)]
    pub session: SessionConfig,

    /// Webhook redelivery protection.
    #[serde(default)]
    pub dedup: DedupConfig,

    /// One-time verification code settings.
    #[serde(default)]
    pub otp: OtpConfig,

    /// Conversation flow settings.
    #[serde(default)]
    pub conversation: ConversationConfig,

    /// SQLite storage settings.
    #[serde(default)]
    pub storage: StorageConfig,

    /// Prometheus exporter settings.
    #[serde(default)]
    pub metrics: MetricsConfig,

    /// Static tenant directory.
    #[serde(default)]
    pub tenants: Vec<TenantConfig>,
}

/// Service identity configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ServiceConfig {
    /// Name used in logs.
    #[serde(default = "default_service_name")]
    pub name: String,

    /// Logging level (trace, debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
        }
    }
}

fn default_service_name() -> String {
    "civic".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

/// HTTP listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct GatewayConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Path that receives both the verification handshake and deliveries.
    #[serde(default = "default_webhook_path")]
    pub webhook_path: String,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            webhook_path: default_webhook_path(),
        }
    }
}

fn default_host() -> String {
    "127.0.0.1".to_string()
}

fn default_port() -> u16 {
    8080
}

fn default_webhook_path() -> String {
    "/webhook".to_string()
}

/// WhatsApp Cloud API configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct WhatsAppConfig {
    /// Token echoed back during the subscription handshake.
    #[serde(default)]
    pub verify_token: Option<String>,

    /// App secret used to check `X-Hub-Signature-256`. Unsigned deliveries
    /// are accepted when unset.
    #[serde(default)]
    pub app_secret: Option<String>,

    #[serde(default = "default_api_base_url")]
    pub api_base_url: String,

    #[serde(default = "default_api_version")]
    pub api_version: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for WhatsAppConfig {
    fn default() -> Self {
        Self {
            verify_token: None,
            app_secret: None,
            api_base_url: default_api_base_url(),
            api_version: default_api_version(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

fn default_api_base_url() -> String {
    "https://graph.facebook.com".to_string()
}

fn default_api_version() -> String {
    "v18.0".to_string()
}

fn default_request_timeout_secs() -> u64 {
    10
}

/// Which session store backs conversations.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionBackend {
    #[default]
    Memory,
    Sqlite,
}

/// Session store configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct SessionConfig {
    #[serde(default)]
    pub backend: SessionBackend,

    /// Sessions idle for longer than this are evicted.
    #[serde(default = "default_inactivity_timeout_secs")]
    pub inactivity_timeout_secs: u64,

    /// How often the eviction sweep runs.
    #[serde(default = "default_sweep_interval_secs")]
    pub sweep_interval_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: SessionBackend::default(),
            inactivity_timeout_secs: default_inactivity_timeout_secs(),
            sweep_interval_secs: default_sweep_interval_secs(),
        }
    }
}

fn default_inactivity_timeout_secs() -> u64 {
    30 * 60
}

fn default_sweep_interval_secs() -> u64 {
    60
}

/// Redelivery protection configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct DedupConfig {
    /// How long a processed provider message id is remembered.
    #[serde(default = "default_retention_secs")]
    pub retention_secs: u64,
}

impl Default for DedupConfig {
    fn default() -> Self {
        Self {
            retention_secs: default_retention_secs(),
        }
    }
}

fn default_retention_secs() -> u64 {
    24 * 60 * 60
}

/// One-time verification code configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OtpConfig {
    #[serde(default = "default_code_length")]
    pub code_length: usize,

    /// Lifetime of an issued code.
    #[serde(default = "default_otp_ttl_secs")]
    pub ttl_secs: u64,

    /// How long a successful verification is honoured.
    #[serde(default = "default_verified_ttl_secs")]
    pub verified_ttl_secs: u64,

    /// Wrong guesses allowed before the live code is burned. Unlimited when
    /// unset.
    #[serde(default)]
    pub max_attempts: Option<u32>,
}

impl Default for OtpConfig {
    fn default() -> Self {
        Self {
            code_length: default_code_length(),
            ttl_secs: default_otp_ttl_secs(),
            verified_ttl_secs: default_verified_ttl_secs(),
            max_attempts: None,
        }
    }
}

fn default_code_length() -> usize {
    6
}

fn default_otp_ttl_secs() -> u64 {
    5 * 60
}

fn default_verified_ttl_secs() -> u64 {
    24 * 60 * 60
}

/// Conversation flow configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct ConversationConfig {
    /// Delay before the main menu is shown again after a completed flow.
    #[serde(default = "default_menu_redisplay_delay_secs")]
    pub menu_redisplay_delay_secs: u64,

    /// Category assigned when the citizen's choice matches nothing.
    #[serde(default = "default_fallback_category")]
    pub fallback_category: String,
}

impl Default for ConversationConfig {
    fn default() -> Self {
        Self {
            menu_redisplay_delay_secs: default_menu_redisplay_delay_secs(),
            fallback_category: default_fallback_category(),
        }
    }
}

fn default_menu_redisplay_delay_secs() -> u64 {
    3
}

fn default_fallback_category() -> String {
    "General".to_string()
}

/// SQLite storage configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct StorageConfig {
    #[serde(default = "default_database_path")]
    pub database_path: String,

    /// Enable write-ahead logging.
    #[serde(default = "default_wal_mode")]
    pub wal_mode: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: default_database_path(),
            wal_mode: default_wal_mode(),
        }
    }
}

fn default_database_path() -> String {
    dirs::data_dir()
        .map(|p| p.join("civic").join("civic.db"))
        .unwrap_or_else(|| std::path::PathBuf::from("civic.db"))
        .to_string_lossy()
        .into_owned()
}

fn default_wal_mode() -> bool {
    true
}

/// Prometheus exporter configuration.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Serve `GET /metrics` in Prometheus text format.
    #[serde(default)]
    pub enabled: bool,
}

/// One entry of the static tenant directory.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct TenantConfig {
    pub id: String,

    pub name: String,

    #[serde(default = "default_active")]
    pub active: bool,

    /// Provider phone-number id the tenant receives messages on.
    pub channel_id: String,

    /// Bearer token for outbound sends. Replies are not delivered without it.
    #[serde(default)]
    pub access_token: Option<String>,

    #[serde(default)]
    pub modules: Vec<Module>,

    #[serde(default)]
    pub org_units: Vec<OrgUnitConfig>,
}

fn default_active() -> bool {
    true
}

/// Department entry of a tenant.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct OrgUnitConfig {
    pub id: String,

    pub name: String,

    /// Category labels routed to this unit.
    #[serde(default)]
    pub categories: Vec<String>,
}
