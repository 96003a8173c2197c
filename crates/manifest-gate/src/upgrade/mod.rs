//! Upgrade admission.
//!
//! [`UpgradeGate::analyze`] validates the target manifest, diffs it against
//! the current one and rejects the upgrade if any change breaks the
//! immutability policy. A rejection carries no partial diff.

pub mod connection_string;

use std::sync::Arc;

use tracing::{debug, info, info_span};

use crate::catalog::UpgradePolicy;
use crate::diff::{DiffEntry, DiffResult, ManifestDiffEngine, Resolved};
use crate::document::{ClusterManifest, InfrastructureNode};
use crate::error::UpgradeError;
use crate::validator::ConfigurationValidator;
use crate::value::parse_bool;

use connection_string::ImageStoreConnection;

const MANAGEMENT_SECTION: &str = "Management";
const IMAGE_STORE_CONNECTION_STRING: &str = "ImageStoreConnectionString";
const ALLOW_IMAGE_STORE_CHANGE: &str = "AllowImageStoreConnectionStringChange";

pub struct UpgradeGate {
    validator: ConfigurationValidator,
    diff: ManifestDiffEngine,
}

impl Default for UpgradeGate {
    fn default() -> Self {
        Self::new(ConfigurationValidator::default())
    }
}

impl UpgradeGate {
    /// The diff engine shares the validator's catalog and secret resolver.
    pub fn new(validator: ConfigurationValidator) -> Self {
        let mut diff = ManifestDiffEngine::new(Arc::clone(validator.catalog()));
        if let Some(resolver) = validator.resolver() {
            diff = diff.with_resolver(Arc::clone(resolver));
        }
        Self { validator, diff }
    }

    pub fn validator(&self) -> &ConfigurationValidator {
        &self.validator
    }

    pub fn diff_engine(&self) -> &ManifestDiffEngine {
        &self.diff
    }

    pub fn analyze(
        &self,
        current: &ClusterManifest,
        target: &ClusterManifest,
        infrastructure: Option<&[InfrastructureNode]>,
    ) -> Result<DiffResult, UpgradeError> {
        let _span = info_span!(
            "analyze",
            current = %current.version,
            target = %target.version,
        )
        .entered();

        self.validator.validate(target, infrastructure)?;

        let diff = self.diff.compare(current, target);
        for entry in &diff {
            self.check_entry(entry, current, target)?;
        }

        info!(
            "Upgrade {} -> {} admitted with {} static change(s)",
            current.version,
            target.version,
            diff.len()
        );
        Ok(diff)
    }

    fn check_entry(
        &self,
        entry: &DiffEntry,
        current: &ClusterManifest,
        target: &ClusterManifest,
    ) -> Result<(), UpgradeError> {
        if entry.node_type.is_none() && entry.is(MANAGEMENT_SECTION, IMAGE_STORE_CONNECTION_STRING) {
            return self.check_image_store(current, target);
        }

        match entry.policy {
            UpgradePolicy::NotAllowed => Err(immutable(entry, "the setting cannot change after deployment")),
            UpgradePolicy::SingleChange => {
                let default = self.diff.catalog().default_value(&entry.section, &entry.parameter);
                let from_default = entry.old_value == default;
                let to_default = entry.new_value == default;
                if from_default || to_default {
                    debug!(
                        "{}/{} moves to or from its default; admitted once",
                        entry.section, entry.parameter
                    );
                    Ok(())
                } else {
                    Err(immutable(
                        entry,
                        "the setting may only move between its default and one explicit value",
                    ))
                }
            }
            UpgradePolicy::Static | UpgradePolicy::Dynamic => Ok(()),
        }
    }

    /// A new connection string must address the same store unless the target
    /// explicitly allows the move.
    fn check_image_store(&self, current: &ClusterManifest, target: &ClusterManifest) -> Result<(), UpgradeError> {
        let allowed = target
            .settings
            .value(MANAGEMENT_SECTION, ALLOW_IMAGE_STORE_CHANGE)
            .and_then(|v| parse_bool(v.trim()))
            .unwrap_or(false);
        if allowed {
            debug!("{} is set; image store change admitted", ALLOW_IMAGE_STORE_CHANGE);
            return Ok(());
        }

        let reject = |reason: String| UpgradeError::ImmutableSetting {
            section: MANAGEMENT_SECTION.to_string(),
            parameter: IMAGE_STORE_CONNECTION_STRING.to_string(),
            reason,
        };

        let old = self.diff.resolve(&current.settings, MANAGEMENT_SECTION, IMAGE_STORE_CONNECTION_STRING);
        let new = self.diff.resolve(&target.settings, MANAGEMENT_SECTION, IMAGE_STORE_CONNECTION_STRING);
        let (old, new) = match (old, new) {
            (Resolved::Plain(old), Resolved::Plain(new)) => (old, new),
            (Resolved::Unresolved(_), _) | (_, Resolved::Unresolved(_)) => {
                return Err(reject(format!(
                    "the encrypted value cannot be compared; set {}=true to change it",
                    ALLOW_IMAGE_STORE_CHANGE
                )))
            }
            _ => return Err(reject("the image store cannot be added or removed".to_string())),
        };

        let parsed = (ImageStoreConnection::parse(&old), ImageStoreConnection::parse(&new));
        match parsed {
            (Ok(old), Ok(new)) if old.same_store(&new) => Ok(()),
            (Ok(old), Ok(new)) => Err(reject(format!(
                "{} and {} are different stores; set {}=true to move",
                old, new, ALLOW_IMAGE_STORE_CHANGE
            ))),
            _ => Err(reject(format!(
                "the store kind changed or a connection string is not recognized; set {}=true to move",
                ALLOW_IMAGE_STORE_CHANGE
            ))),
        }
    }
}

fn immutable(entry: &DiffEntry, reason: &str) -> UpgradeError {
    UpgradeError::ImmutableSetting {
        section: entry.section.clone(),
        parameter: entry.parameter.clone(),
        reason: reason.to_string(),
    }
}
