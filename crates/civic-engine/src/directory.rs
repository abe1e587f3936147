// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Tenant directory backed by the `[[tenants]]` configuration table.

use std::collections::HashMap;

use async_trait::async_trait;
use civic_config::model::TenantConfig;
use civic_core::{ChannelCredentials, CivicError, OrgUnit, TenantChannelConfig, TenantDirectory};

/// Immutable channel-to-tenant map.
#[derive(Debug, Clone, Default)]
pub struct StaticTenantDirectory {
    by_channel: HashMap<String, TenantChannelConfig>,
}

impl StaticTenantDirectory {
    /// Builds the directory from `(channel_id, tenant)` pairs.
    pub fn new(entries: impl IntoIterator<Item = (String, TenantChannelConfig)>) -> Self {
        Self {
            by_channel: entries.into_iter().collect(),
        }
    }

    pub fn from_config(tenants: &[TenantConfig]) -> Self {
        Self::new(
            tenants
                .iter()
                .map(|t| (t.channel_id.clone(), tenant_from_config(t))),
        )
    }

    pub fn len(&self) -> usize {
        self.by_channel.len()
    }

    pub fn is_empty(&self) -> bool {
        self.by_channel.is_empty()
    }
}

/// Engine view of one configured tenant.
pub fn tenant_from_config(config: &TenantConfig) -> TenantChannelConfig {
    TenantChannelConfig {
        tenant_id: config.id.clone(),
        name: config.name.clone(),
        active: config.active,
        credentials: config
            .access_token
            .as_ref()
            .map(|token| ChannelCredentials {
                channel_id: config.channel_id.clone(),
                access_token: token.clone(),
            }),
        modules: config.modules.iter().copied().collect(),
        org_units: config
            .org_units
            .iter()
            .map(|unit| OrgUnit {
                id: unit.id.clone(),
                name: unit.name.clone(),
                categories: unit.categories.clone(),
            })
            .collect(),
    }
}

#[async_trait]
impl TenantDirectory for StaticTenantDirectory {
    async fn lookup(&self, channel_id: &str) -> Result<Option<TenantChannelConfig>, CivicError> {
        Ok(self.by_channel.get(channel_id).cloned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use civic_config::model::OrgUnitConfig;
    use civic_core::Module;

    fn config() -> TenantConfig {
        TenantConfig {
            id: "pune".into(),
            name: "Pune Ward 12".into(),
            active: true,
            channel_id: "PN1".into(),
            access_token: Some("token".into()),
            modules: vec![Module::Grievance, Module::Grievance],
            org_units: vec![OrgUnitConfig {
                id: "pwd".into(),
                name: "Public Works".into(),
                categories: vec!["Roads".into()],
            }],
        }
    }

    #[tokio::test]
    async fn lookup_by_channel() {
        let directory = StaticTenantDirectory::from_config(&[config()]);
        let tenant = directory.lookup("PN1").await.unwrap().unwrap();
        assert_eq!(tenant.tenant_id, "pune");
        assert_eq!(tenant.modules.len(), 1);
        assert_eq!(tenant.credentials.unwrap().channel_id, "PN1");
        assert_eq!(tenant.org_units[0].id, "pwd");

        assert!(directory.lookup("PN2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_token_means_no_credentials() {
        let mut cfg = config();
        cfg.access_token = None;
        cfg.active = false;
        let directory = StaticTenantDirectory::from_config(&[cfg]);
        let tenant = directory.lookup("PN1").await.unwrap().unwrap();
        assert!(tenant.credentials.is_none());
        assert!(!tenant.active);
    }
}
