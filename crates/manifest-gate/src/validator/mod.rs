//! Manifest validation.
//!
//! [`ConfigurationValidator::validate`] walks a manifest in a fixed order and
//! returns the first violation it finds:
//!
//! 1. catalog default literals
//! 2. structure: node types, infrastructure, required parameters
//! 3. endpoints
//! 4. each parameter against its rule or catalog type
//! 5. composite rules, in registration order

pub mod cluster;
pub mod endpoints;
pub mod file_store;
pub mod image_store;
pub mod ktl;
pub mod placement;
pub mod plb;
pub mod replicator;
pub mod security;
pub mod structural;

use std::sync::Arc;

use tracing::{debug, info, info_span, warn};

use crate::catalog::SettingsCatalog;
use crate::config::ValidatorConfig;
use crate::document::{ClusterManifest, InfrastructureNode, Parameter};
use crate::error::ValidationError;
use crate::rules::{RuleContext, ValidationRuleSet};
use crate::secrets::SecretResolver;

pub struct ConfigurationValidator {
    rules: ValidationRuleSet,
    catalog: Arc<SettingsCatalog>,
    config: ValidatorConfig,
    resolver: Option<Arc<dyn SecretResolver>>,
}

impl Default for ConfigurationValidator {
    fn default() -> Self {
        Self::new(ValidatorConfig::default())
    }
}

impl ConfigurationValidator {
    /// Standard rules and catalog.
    pub fn new(config: ValidatorConfig) -> Self {
        Self {
            rules: ValidationRuleSet::standard(),
            catalog: SettingsCatalog::standard(),
            config,
            resolver: None,
        }
    }

    pub fn with_rules(mut self, rules: ValidationRuleSet) -> Self {
        self.rules = rules;
        self
    }

    pub fn with_catalog(mut self, catalog: Arc<SettingsCatalog>) -> Self {
        self.catalog = catalog;
        self
    }

    /// Resolver for encrypted values; without one, checks that need the
    /// plaintext of an encrypted value are skipped.
    pub fn with_resolver(mut self, resolver: Arc<dyn SecretResolver>) -> Self {
        self.resolver = Some(resolver);
        self
    }

    pub fn catalog(&self) -> &Arc<SettingsCatalog> {
        &self.catalog
    }

    pub fn config(&self) -> &ValidatorConfig {
        &self.config
    }

    pub fn resolver(&self) -> Option<&Arc<dyn SecretResolver>> {
        self.resolver.as_ref()
    }

    pub fn validate(
        &self,
        manifest: &ClusterManifest,
        infrastructure: Option<&[InfrastructureNode]>,
    ) -> Result<(), ValidationError> {
        let _span = info_span!(
            "validate",
            manifest = %manifest.name,
            sections = manifest.settings.sections().len(),
            node_types = manifest.node_types.len(),
        )
        .entered();

        let ctx = RuleContext::new(
            manifest,
            infrastructure,
            &self.catalog,
            &self.config,
            self.resolver.as_deref(),
        );

        // Step 1: catalog
        self.catalog.verify_default_literals()?;

        // Step 2: structure
        {
            let _step = info_span!("structural").entered();
            structural::validate_topology(&ctx)?;
        }

        // Step 3: endpoints
        {
            let _step = info_span!("endpoints").entered();
            endpoints::validate_endpoints(&ctx)?;
        }

        // Step 4: parameters
        {
            let _step = info_span!("parameters").entered();
            for section in manifest.settings.sections() {
                for parameter in section.parameters() {
                    self.check_parameter(&section.name, parameter)?;
                }
            }
        }

        // Step 5: composite rules
        {
            let _step = info_span!("composite").entered();
            for rule in self.rules.cross_rules() {
                if rule.sections.is_empty() {
                    debug!("Running rule {}", rule.name);
                    (rule.check)(&ctx)?;
                    continue;
                }
                for section in &rule.sections {
                    debug!("Running rule {} on {}", rule.name, section);
                    (rule.check)(&ctx.for_section(section))?;
                }
            }
        }

        info!("Manifest '{}' is valid", manifest.name);
        Ok(())
    }

    fn check_parameter(&self, section: &str, parameter: &Parameter) -> Result<(), ValidationError> {
        let name = parameter.name.as_str();
        if name.trim() != name {
            warn!(
                "Parameter '{}' in section {} has leading or trailing whitespace",
                name, section
            );
        }
        let name = name.trim();

        if parameter.is_encrypted {
            if !security::is_encryptable(section, name) {
                return Err(ValidationError::structural(
                    section,
                    name,
                    format!("Parameter {} in section {} cannot be encrypted.", name, section),
                ));
            }
            if parameter.value.trim().is_empty() {
                return Err(ValidationError::range(
                    section,
                    name,
                    "Encrypted value cannot be empty.",
                ));
            }
            // Ciphertext has no type to check.
            return Ok(());
        }

        if let Some(rule) = self.rules.find(section, name) {
            return rule.check(section, name, &parameter.value);
        }

        let kind = match self.catalog.entry(section, name) {
            Some(entry) => entry.kind,
            None => match self.catalog.group(section, name) {
                Some(group) => group.kind,
                None => {
                    debug!("No rule or catalog entry for {}/{}; skipping", section, name);
                    return Ok(());
                }
            },
        };
        if !kind.accepts(&parameter.value) {
            return Err(ValidationError::range(
                section,
                name,
                format!(
                    "Invalid value {} found for {} under {}; {} expected.",
                    parameter.value,
                    name,
                    section,
                    kind.describe()
                ),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::{NodeType, SettingsDocument};
    use crate::error::ErrorKind;

    fn create_minimal_manifest() -> ClusterManifest {
        let mut settings = SettingsDocument::new();
        settings.set("Security", Parameter::new("ClusterCredentialType", "None"));
        settings.set("Security", Parameter::new("ServerAuthCredentialType", "None"));
        let mut manifest = ClusterManifest::new(settings);
        manifest.name = "test".to_string();
        manifest.node_types.push(NodeType::new("Front"));
        manifest
    }

    #[test]
    fn test_minimal_manifest_is_valid() {
        let validator = ConfigurationValidator::default();
        assert!(validator.validate(&create_minimal_manifest(), None).is_ok());
    }

    #[test]
    fn test_catalog_type_check_for_unruled_parameter() {
        let mut manifest = create_minimal_manifest();
        manifest
            .settings
            .set("ImageStoreService", Parameter::new("Enabled", "yes"));
        let err = ConfigurationValidator::default()
            .validate(&manifest, None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RangeOrFormat);
        assert!(err.to_string().contains("boolean expected"));
    }

    #[test]
    fn test_unknown_parameter_is_skipped() {
        let mut manifest = create_minimal_manifest();
        manifest
            .settings
            .set("MadeUpSection", Parameter::new("Anything", "at all"));
        assert!(ConfigurationValidator::default().validate(&manifest, None).is_ok());
    }

    #[test]
    fn test_encryption_only_where_allowed() {
        let mut manifest = create_minimal_manifest();
        manifest
            .settings
            .set("KtlLogger", Parameter::encrypted("PeriodicFlushTime", "k:00"));
        let err = ConfigurationValidator::default()
            .validate(&manifest, None)
            .unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structural);

        let mut manifest = create_minimal_manifest();
        manifest
            .settings
            .set("Hosting", Parameter::encrypted("NTLMAuthenticationPasswordSecret", " "));
        assert!(ConfigurationValidator::default().validate(&manifest, None).is_err());
    }

    #[test]
    fn test_whitespace_in_name_only_warns() {
        let mut manifest = create_minimal_manifest();
        manifest
            .settings
            .set("KtlLogger", Parameter::new(" PeriodicFlushTime ", "60"));
        assert!(ConfigurationValidator::default().validate(&manifest, None).is_ok());
    }

    #[test]
    fn test_empty_rule_set_still_checks_structure() {
        let mut manifest = create_minimal_manifest();
        manifest.settings.remove("Security", "ClusterCredentialType");
        let validator = ConfigurationValidator::default().with_rules(ValidationRuleSet::new());
        assert!(validator.validate(&manifest, None).is_err());
    }
}
