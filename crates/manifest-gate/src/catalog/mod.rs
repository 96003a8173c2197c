//! Canonical settings catalog.
//!
//! Every known parameter has a type, a documented default and an upgrade
//! policy. The validator uses the catalog to fill in absent values, and the
//! diff engine uses it to decide which changes are static.

pub(crate) mod entries;
pub mod sections;

use serde::Serialize;
use std::collections::HashMap;
use std::sync::{Arc, LazyLock};

use crate::error::ValidationError;
use crate::value::{canonical_seconds, parse_timespan_literal, ValueKind};

static STANDARD_CATALOG: LazyLock<Arc<SettingsCatalog>> = LazyLock::new(|| {
    let mut catalog = SettingsCatalog::new();
    entries::register_standard(&mut catalog);
    log::debug!(
        "Settings catalog ready: {} entries, {} property groups",
        catalog.entries.len(),
        catalog.groups.len()
    );
    Arc::new(catalog)
});

/// How a parameter may change between manifest versions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum UpgradePolicy {
    /// Changing it requires a redeploy; reported by the diff.
    Static,
    /// Hot-reloadable; never reported.
    Dynamic,
    /// May move between its default and an explicit value once.
    SingleChange,
    /// Never allowed to change after deployment.
    NotAllowed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ConfigEntry {
    pub section: String,
    pub name: String,
    pub kind: ValueKind,
    /// Default as written in the catalog. Durations use constructor literals.
    pub default_literal: String,
    pub policy: UpgradePolicy,
}

impl ConfigEntry {
    pub fn new(
        section: &str,
        name: &str,
        kind: ValueKind,
        default_literal: &str,
        policy: UpgradePolicy,
    ) -> Self {
        Self {
            section: section.to_string(),
            name: name.to_string(),
            kind,
            default_literal: default_literal.to_string(),
            policy,
        }
    }

    /// Default in the same form a parameter value is written.
    pub fn default_value(&self) -> Option<String> {
        match self.kind {
            ValueKind::TimeSpan => parse_timespan_literal(&self.default_literal).map(canonical_seconds),
            _ => Some(self.default_literal.clone()),
        }
    }
}

/// Open-ended parameters: every key in `section` starting with `prefix` is
/// an instance name (metric, property, application type). An empty prefix
/// covers the whole section.
#[derive(Debug, Clone, PartialEq)]
pub struct GroupEntry {
    pub section: String,
    pub prefix: String,
    pub kind: ValueKind,
    pub policy: UpgradePolicy,
}

impl GroupEntry {
    pub fn matches(&self, section: &str, name: &str) -> bool {
        self.section.eq_ignore_ascii_case(section)
            && name.len() >= self.prefix.len()
            && name.is_char_boundary(self.prefix.len())
            && name[..self.prefix.len()].eq_ignore_ascii_case(&self.prefix)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SettingsCatalog {
    entries: Vec<ConfigEntry>,
    index: HashMap<(String, String), usize>,
    groups: Vec<GroupEntry>,
}

fn key(section: &str, name: &str) -> (String, String) {
    (section.to_ascii_lowercase(), name.to_ascii_lowercase())
}

impl SettingsCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    /// The built-in catalog, constructed on first use.
    pub fn standard() -> Arc<SettingsCatalog> {
        Arc::clone(&STANDARD_CATALOG)
    }

    /// Adds an entry. A later entry for the same key replaces the earlier one.
    pub fn add(&mut self, entry: ConfigEntry) {
        let k = key(&entry.section, &entry.name);
        match self.index.get(&k) {
            Some(&i) => self.entries[i] = entry,
            None => {
                self.index.insert(k, self.entries.len());
                self.entries.push(entry);
            }
        }
    }

    pub fn add_group(&mut self, section: &str, kind: ValueKind, policy: UpgradePolicy) {
        self.add_group_prefix(section, "", kind, policy);
    }

    pub fn add_group_prefix(
        &mut self,
        section: &str,
        prefix: &str,
        kind: ValueKind,
        policy: UpgradePolicy,
    ) {
        self.groups.push(GroupEntry {
            section: section.to_string(),
            prefix: prefix.to_string(),
            kind,
            policy,
        });
    }

    pub fn entries(&self) -> &[ConfigEntry] {
        &self.entries
    }

    pub fn entry(&self, section: &str, name: &str) -> Option<&ConfigEntry> {
        self.index.get(&key(section, name)).map(|&i| &self.entries[i])
    }

    /// The group covering `name` in `section`, if any.
    pub fn group(&self, section: &str, name: &str) -> Option<&GroupEntry> {
        self.groups.iter().find(|g| g.matches(section, name))
    }

    /// True when the whole section is an open-ended key/value group.
    pub fn is_group_section(&self, section: &str) -> bool {
        self.groups
            .iter()
            .any(|g| g.prefix.is_empty() && g.section.eq_ignore_ascii_case(section))
    }

    /// Documented default for a parameter, in parameter-value form.
    pub fn default_value(&self, section: &str, name: &str) -> Option<String> {
        self.entry(section, name).and_then(ConfigEntry::default_value)
    }

    /// Upgrade policy for a parameter. Unknown parameters are treated as static.
    pub fn policy(&self, section: &str, name: &str) -> UpgradePolicy {
        if let Some(entry) = self.entry(section, name) {
            return entry.policy;
        }
        if let Some(group) = self.group(section, name) {
            return group.policy;
        }
        UpgradePolicy::Static
    }

    /// Rejects any duration default not written as `Zero`, `MinValue`,
    /// `MaxValue` or a `FromX(n)` constructor.
    pub fn verify_default_literals(&self) -> Result<(), ValidationError> {
        for entry in &self.entries {
            if entry.kind == ValueKind::TimeSpan
                && parse_timespan_literal(&entry.default_literal).is_none()
            {
                return Err(ValidationError::range(
                    &entry.section,
                    &entry.name,
                    format!(
                        "Default value '{}' is not a supported duration literal (Zero, MinValue, MaxValue or FromX(n))",
                        entry.default_literal
                    ),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_standard_catalog_literals_are_valid() {
        assert!(SettingsCatalog::standard().verify_default_literals().is_ok());
    }

    #[test]
    fn test_timespan_default_is_canonical() {
        let catalog = SettingsCatalog::standard();
        assert_eq!(
            catalog.default_value("KtlLogger", "PeriodicFlushTime").as_deref(),
            Some("60")
        );
        assert_eq!(
            catalog
                .default_value("Replication", "BatchAcknowledgementInterval")
                .as_deref(),
            Some("0.015")
        );
    }

    #[test]
    fn test_lookup_is_case_insensitive() {
        let catalog = SettingsCatalog::standard();
        assert!(catalog.entry("ktllogger", "periodicflushtime").is_some());
        assert!(catalog.entry("KtlLogger", "NoSuchParameter").is_none());
    }

    #[test]
    fn test_policies() {
        let catalog = SettingsCatalog::standard();
        assert_eq!(
            catalog.policy("Setup", "FabricDataRoot"),
            UpgradePolicy::NotAllowed
        );
        assert_eq!(
            catalog.policy("PlacementAndLoadBalancing", "SwapPrimaryProbability"),
            UpgradePolicy::Dynamic
        );
        assert_eq!(
            catalog.policy("MetricBalancingThresholds", "Memory"),
            UpgradePolicy::Dynamic
        );
        assert_eq!(
            catalog.policy(
                "HealthManager/ClusterHealthPolicy",
                "ApplicationTypeMaxPercentUnhealthyApplications-Web"
            ),
            UpgradePolicy::Dynamic
        );
        assert!(catalog.is_group_section("NodeProperties"));
        assert!(!catalog.is_group_section("HealthManager/ClusterHealthPolicy"));
        assert_eq!(catalog.policy("Unknown", "Anything"), UpgradePolicy::Static);
    }

    #[test]
    fn test_replicator_rows_generated_per_section() {
        let catalog = SettingsCatalog::standard();
        for section in sections::REPLICATION_SECTIONS {
            assert!(
                catalog.entry(section, "MaxReplicationQueueSize").is_some(),
                "missing queue row for {}",
                section
            );
        }
        for section in sections::NATIVE_TRANSACTIONAL_REPLICATOR_SECTIONS {
            assert!(catalog.entry(section, "CheckpointThresholdInMB").is_some());
        }
        assert!(catalog
            .entry("TransactionalReplicator", "SharedLogId")
            .is_some());
        assert!(catalog
            .entry("TransactionalReplicator", "MaxReplicationQueueSize")
            .is_none());
    }

    #[test]
    fn test_invalid_literal_rejected() {
        let mut catalog = SettingsCatalog::new();
        catalog.add(ConfigEntry::new(
            "Custom",
            "Interval",
            ValueKind::TimeSpan,
            "TimeSpan::FromSeconds(5)",
            UpgradePolicy::Static,
        ));
        let err = catalog.verify_default_literals().unwrap_err();
        assert_eq!(err.section(), "Custom");
        assert_eq!(err.parameter(), "Interval");
    }

    #[test]
    fn test_add_replaces_existing() {
        let mut catalog = SettingsCatalog::new();
        catalog.add(ConfigEntry::new("A", "B", ValueKind::Int, "1", UpgradePolicy::Static));
        catalog.add(ConfigEntry::new("a", "b", ValueKind::Int, "2", UpgradePolicy::Dynamic));
        assert_eq!(catalog.entries().len(), 1);
        assert_eq!(catalog.default_value("A", "B").as_deref(), Some("2"));
    }
}
