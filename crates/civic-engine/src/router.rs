// SPDX-FileCopyrightText: 2026 Civic Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Maps free-text categories to organizational units.

use civic_core::TenantChannelConfig;

/// Categories offered when a tenant has no organizational units.
pub const DEFAULT_CATEGORIES: &[&str] = &["Roads", "Water Supply", "Sanitation", "Streetlights"];

/// Deterministic category lookup over a tenant's organizational units.
#[derive(Debug, Clone)]
pub struct CategoryRouter {
    fallback_category: String,
}

impl CategoryRouter {
    pub fn new(fallback_category: impl Into<String>) -> Self {
        Self {
            fallback_category: fallback_category.into(),
        }
    }

    /// Label used when a citizen's choice matches nothing.
    pub fn fallback_category(&self) -> &str {
        &self.fallback_category
    }

    /// Ordered category labels for a tenant, deduplicated case-insensitively.
    ///
    /// Each unit contributes its categories, or its name when it lists none.
    /// Tenants without units get [`DEFAULT_CATEGORIES`].
    pub fn available_categories(&self, tenant: &TenantChannelConfig) -> Vec<String> {
        if tenant.org_units.is_empty() {
            return DEFAULT_CATEGORIES.iter().map(|c| c.to_string()).collect();
        }

        let mut seen = std::collections::HashSet::new();
        let mut categories = Vec::new();
        for unit in &tenant.org_units {
            let labels: Vec<&str> = if unit.categories.is_empty() {
                vec![unit.name.as_str()]
            } else {
                unit.categories.iter().map(String::as_str).collect()
            };
            for label in labels {
                let label = label.trim();
                if !label.is_empty() && seen.insert(label.to_lowercase()) {
                    categories.push(label.to_string());
                }
            }
        }
        categories
    }

    /// Finds the unit handling `label`. The first unit listing the category,
    /// or named like it, wins. `None` is a valid outcome.
    pub fn resolve(&self, tenant: &TenantChannelConfig, label: &str) -> Option<String> {
        let wanted = label.trim().to_lowercase();
        if wanted.is_empty() {
            return None;
        }
        tenant
            .org_units
            .iter()
            .find(|unit| {
                unit.categories.iter().any(|c| c.trim().to_lowercase() == wanted)
                    || unit.name.trim().to_lowercase() == wanted
            })
            .map(|unit| unit.id.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use civic_core::OrgUnit;
    use std::collections::BTreeSet;

    fn tenant(units: Vec<OrgUnit>) -> TenantChannelConfig {
        TenantChannelConfig {
            tenant_id: "pune".into(),
            name: "Pune".into(),
            active: true,
            credentials: None,
            modules: BTreeSet::new(),
            org_units: units,
        }
    }

    fn unit(id: &str, name: &str, categories: &[&str]) -> OrgUnit {
        OrgUnit {
            id: id.into(),
            name: name.into(),
            categories: categories.iter().map(|c| c.to_string()).collect(),
        }
    }

    #[test]
    fn categories_come_from_units_in_order() {
        let router = CategoryRouter::new("General");
        let t = tenant(vec![
            unit("roads", "Roads Dept", &["Potholes", "Streetlights"]),
            unit("water", "Water Supply", &[]),
            unit("lights", "Electrical", &["streetlights", "Power"]),
        ]);
        assert_eq!(
            router.available_categories(&t),
            vec!["Potholes", "Streetlights", "Water Supply", "Power"]
        );
    }

    #[test]
    fn no_units_gives_default_set() {
        let router = CategoryRouter::new("General");
        assert_eq!(router.available_categories(&tenant(vec![])).len(), DEFAULT_CATEGORIES.len());
    }

    #[test]
    fn resolve_matches_category_or_name_case_insensitively() {
        let router = CategoryRouter::new("General");
        let t = tenant(vec![
            unit("roads", "Roads Dept", &["Potholes"]),
            unit("water", "Water Supply", &[]),
        ]);
        assert_eq!(router.resolve(&t, "POTHOLES").as_deref(), Some("roads"));
        assert_eq!(router.resolve(&t, " water supply ").as_deref(), Some("water"));
        assert_eq!(router.resolve(&t, "General"), None);
        assert_eq!(router.resolve(&t, ""), None);
    }
}
