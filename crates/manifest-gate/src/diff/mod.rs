//! Static differences between two manifests.
//!
//! A parameter differs when its effective value (explicit, or the catalog
//! default when absent) differs between the two manifests. Dynamic settings
//! are never reported. Node types are matched by name and their properties,
//! capacities, certificates and ports are compared per key.

use std::sync::Arc;

use secrecy::ExposeSecret;
use serde::Serialize;
use tracing::{debug, info_span, warn};

use crate::catalog::sections::{
    FABRIC_NODE_SECTION, NODE_CAPACITIES_SECTION, NODE_PROPERTIES_SECTION, NODE_SFSS_POLICIES_SECTION,
};
use crate::catalog::{SettingsCatalog, UpgradePolicy};
use crate::document::{ClusterManifest, NamedValue, NodeType, Parameter, SettingsDocument};
use crate::secrets::SecretResolver;
use crate::value::{canonical_seconds, parse_timespan, ValueKind};

/// One static change. `node_type` is set for entries that come from a node type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DiffEntry {
    pub section: String,
    pub parameter: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub node_type: Option<String>,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
    pub policy: UpgradePolicy,
}

impl DiffEntry {
    pub fn is(&self, section: &str, parameter: &str) -> bool {
        self.section.eq_ignore_ascii_case(section) && self.parameter.eq_ignore_ascii_case(parameter)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffResult {
    entries: Vec<DiffEntry>,
}

impl DiffResult {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: DiffEntry) {
        self.entries.push(entry);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// First entry for a settings parameter (case-insensitive).
    pub fn get(&self, section: &str, parameter: &str) -> Option<&DiffEntry> {
        self.entries.iter().find(|e| e.is(section, parameter))
    }

    pub fn iter(&self) -> std::slice::Iter<'_, DiffEntry> {
        self.entries.iter()
    }

    pub fn entries(&self) -> &[DiffEntry] {
        &self.entries
    }

    pub fn into_entries(self) -> Vec<DiffEntry> {
        self.entries
    }
}

impl<'a> IntoIterator for &'a DiffResult {
    type Item = &'a DiffEntry;
    type IntoIter = std::slice::Iter<'a, DiffEntry>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.iter()
    }
}

/// A parameter value ready for comparison.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolved {
    Absent,
    Plain(String),
    /// Encrypted with a key the resolver does not have.
    Unresolved(String),
}

impl Resolved {
    fn comparable(&self) -> Option<&str> {
        match self {
            Resolved::Absent => None,
            Resolved::Plain(v) | Resolved::Unresolved(v) => Some(v),
        }
    }
}

pub struct ManifestDiffEngine {
    catalog: Arc<SettingsCatalog>,
    resolver: Option<Arc<dyn SecretResolver>>,
}

impl Default for ManifestDiffEngine {
    fn default() -> Self {
        Self::new(SettingsCatalog::standard())
    }
}

impl ManifestDiffEngine {
    pub fn new(catalog: Arc<SettingsCatalog>) -> Self {
        Self { catalog, resolver: None }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn SecretResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn catalog(&self) -> &SettingsCatalog {
        &self.catalog
    }

    pub fn compare(&self, current: &ClusterManifest, target: &ClusterManifest) -> DiffResult {
        let _span = info_span!("compare", current = %current.version, target = %target.version).entered();

        let mut result = DiffResult::new();
        for section in union(
            current.settings.sections().iter().map(|s| s.name.as_str()),
            target.settings.sections().iter().map(|s| s.name.as_str()),
        ) {
            self.compare_section(section, &current.settings, &target.settings, &mut result);
        }
        for node_type in &current.node_types {
            self.compare_node_type(node_type, target.node_type(&node_type.name), &mut result);
        }

        debug!("{} static change(s)", result.len());
        result
    }

    /// Effective value of a settings parameter, decrypted when possible.
    pub fn resolve(&self, settings: &SettingsDocument, section: &str, name: &str) -> Resolved {
        match settings.parameter(section, name) {
            Some(parameter) if parameter.is_encrypted => self.decrypt(section, parameter),
            Some(parameter) => Resolved::Plain(self.normalize(section, name, &parameter.value)),
            None => match self.catalog.default_value(section, name) {
                Some(default) => Resolved::Plain(default),
                None => Resolved::Absent,
            },
        }
    }

    fn decrypt(&self, section: &str, parameter: &Parameter) -> Resolved {
        let Some(resolver) = &self.resolver else {
            return Resolved::Unresolved(parameter.value.clone());
        };
        match resolver.resolve(section, &parameter.name, &parameter.value) {
            Ok(secret) => Resolved::Plain(secret.expose_secret().to_string()),
            Err(e) => {
                warn!(
                    "Cannot decrypt {}/{} ({}); comparing the encrypted text",
                    section, parameter.name, e
                );
                Resolved::Unresolved(parameter.value.clone())
            }
        }
    }

    /// Durations compare by length, so `60` equals `FromSeconds(60)`.
    fn normalize(&self, section: &str, name: &str, value: &str) -> String {
        match self.catalog.entry(section, name) {
            Some(entry) if entry.kind == ValueKind::TimeSpan => parse_timespan(value.trim())
                .map(canonical_seconds)
                .unwrap_or_else(|| value.to_string()),
            _ => value.to_string(),
        }
    }

    fn compare_section(
        &self,
        section: &str,
        current: &SettingsDocument,
        target: &SettingsDocument,
        result: &mut DiffResult,
    ) {
        let names = |doc: &SettingsDocument| -> Vec<String> {
            doc.section(section)
                .map(|s| s.parameters().iter().map(|p| p.name.clone()).collect())
                .unwrap_or_default()
        };
        let (current_names, target_names) = (names(current), names(target));

        for name in union(
            current_names.iter().map(String::as_str),
            target_names.iter().map(String::as_str),
        ) {
            let policy = self.catalog.policy(section, name);
            if policy == UpgradePolicy::Dynamic {
                continue;
            }
            let old = self.resolve(current, section, name);
            let new = self.resolve(target, section, name);
            if old.comparable() == new.comparable() {
                continue;
            }
            result.push(DiffEntry {
                section: section.to_string(),
                parameter: name.to_string(),
                node_type: None,
                old_value: display_value(current, section, name, &old),
                new_value: display_value(target, section, name, &new),
                policy,
            });
        }
    }

    /// A removed node type (`next == None`) reports every key it had.
    fn compare_node_type(&self, node_type: &NodeType, next: Option<&NodeType>, result: &mut DiffResult) {
        let empty = NodeType::new(node_type.name.clone());
        let next = next.unwrap_or(&empty);

        for (section, old, new) in [
            (NODE_PROPERTIES_SECTION, &node_type.placement_properties, &next.placement_properties),
            (NODE_CAPACITIES_SECTION, &node_type.capacities, &next.capacities),
            (NODE_SFSS_POLICIES_SECTION, &node_type.sfss_rg_policies, &next.sfss_rg_policies),
        ] {
            self.compare_pairs(section, &node_type.name, &named(old), &named(new), result);
        }
        self.compare_pairs(
            FABRIC_NODE_SECTION,
            &node_type.name,
            &fabric_node_values(node_type),
            &fabric_node_values(next),
            result,
        );
    }

    fn compare_pairs(
        &self,
        section: &str,
        node_type: &str,
        old: &[(String, String)],
        new: &[(String, String)],
        result: &mut DiffResult,
    ) {
        let lookup = |pairs: &[(String, String)], key: &str| -> Option<String> {
            pairs
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v.clone())
        };

        for key in union(old.iter().map(|(k, _)| k.as_str()), new.iter().map(|(k, _)| k.as_str())) {
            let policy = self.catalog.policy(section, key);
            if policy == UpgradePolicy::Dynamic {
                continue;
            }
            let (old_value, new_value) = (lookup(old, key), lookup(new, key));
            if old_value == new_value {
                continue;
            }
            result.push(DiffEntry {
                section: section.to_string(),
                parameter: key.to_string(),
                node_type: Some(node_type.to_string()),
                old_value,
                new_value,
                policy,
            });
        }
    }
}

/// Values reported in an entry; encrypted values are shown as written.
fn display_value(settings: &SettingsDocument, section: &str, name: &str, resolved: &Resolved) -> Option<String> {
    match settings.parameter(section, name) {
        Some(parameter) if parameter.is_encrypted => Some(parameter.value.clone()),
        _ => resolved.comparable().map(str::to_string),
    }
}

fn named(values: &[NamedValue]) -> Vec<(String, String)> {
    values.iter().map(|v| (v.name.clone(), v.value.clone())).collect()
}

/// Certificates and ports of a node type, keyed by node setting name.
fn fabric_node_values(node_type: &NodeType) -> Vec<(String, String)> {
    let mut values = Vec::new();
    for (role, certificate) in node_type.certificates.by_role() {
        if let Some(certificate) = certificate {
            values.push((format!("{}X509FindType", role), certificate.find_type.clone()));
            values.push((format!("{}X509FindValue", role), certificate.find_value.clone()));
            values.push((format!("{}X509StoreName", role), certificate.store_name.clone()));
        }
    }
    for (name, port) in node_type.endpoints.ports() {
        values.push((name.to_string(), port.trim().to_string()));
    }
    for (start, end, range) in node_type.endpoints.ranges() {
        values.push((start.to_string(), range.start_port.trim().to_string()));
        values.push((end.to_string(), range.end_port.trim().to_string()));
    }
    values
}

/// Keys of `first` in order, then keys only in `second`; case-insensitive.
fn union<'a>(first: impl Iterator<Item = &'a str>, second: impl Iterator<Item = &'a str>) -> Vec<&'a str> {
    let mut keys: Vec<&'a str> = Vec::new();
    for key in first.chain(second) {
        if !keys.iter().any(|k| k.eq_ignore_ascii_case(key)) {
            keys.push(key);
        }
    }
    keys
}
