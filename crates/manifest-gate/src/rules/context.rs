use secrecy::ExposeSecret;

use crate::catalog::SettingsCatalog;
use crate::config::ValidatorConfig;
use crate::document::{ClusterManifest, InfrastructureNode, SettingsDocument};
use crate::error::ValidationError;
use crate::secrets::SecretResolver;
use crate::value::{parse_bool, parse_double, parse_int, parse_timespan};

/// Read access for cross rules: one section of the manifest, with catalog
/// defaults filling in absent parameters.
#[derive(Clone, Copy)]
pub struct RuleContext<'a> {
    manifest: &'a ClusterManifest,
    infrastructure: Option<&'a [InfrastructureNode]>,
    section: &'a str,
    catalog: &'a SettingsCatalog,
    config: &'a ValidatorConfig,
    resolver: Option<&'a dyn SecretResolver>,
}

impl<'a> RuleContext<'a> {
    pub fn new(
        manifest: &'a ClusterManifest,
        infrastructure: Option<&'a [InfrastructureNode]>,
        catalog: &'a SettingsCatalog,
        config: &'a ValidatorConfig,
        resolver: Option<&'a dyn SecretResolver>,
    ) -> Self {
        Self {
            manifest,
            infrastructure,
            section: "",
            catalog,
            config,
            resolver,
        }
    }

    /// The same context pointed at another section.
    pub fn for_section(&self, section: &'a str) -> Self {
        Self { section, ..*self }
    }

    pub fn section(&self) -> &'a str {
        self.section
    }

    pub fn manifest(&self) -> &'a ClusterManifest {
        self.manifest
    }

    pub fn settings(&self) -> &'a SettingsDocument {
        &self.manifest.settings
    }

    pub fn infrastructure(&self) -> Option<&'a [InfrastructureNode]> {
        self.infrastructure
    }

    pub fn config(&self) -> &'a ValidatorConfig {
        self.config
    }

    pub fn catalog(&self) -> &'a SettingsCatalog {
        self.catalog
    }

    /// The value written in the manifest, if any.
    pub fn explicit(&self, name: &str) -> Option<&'a str> {
        self.settings().value(self.section, name)
    }

    pub fn is_explicit(&self, name: &str) -> bool {
        self.explicit(name).is_some()
    }

    /// Present with a non-blank value.
    pub fn is_set(&self, name: &str) -> bool {
        self.explicit(name).is_some_and(|v| !v.trim().is_empty())
    }

    pub fn is_encrypted(&self, name: &str) -> bool {
        self.settings()
            .parameter(self.section, name)
            .is_some_and(|p| p.is_encrypted)
    }

    /// Explicit value, else the catalog default.
    pub fn value(&self, name: &str) -> Option<String> {
        match self.explicit(name) {
            Some(v) => Some(v.to_string()),
            None => self.catalog.default_value(self.section, name),
        }
    }

    /// Like [`value`](Self::value), decrypting encrypted parameters. `None`
    /// when the value is encrypted and cannot be decrypted.
    pub fn plaintext(&self, name: &str) -> Option<String> {
        let value = self.value(name)?;
        if !self.is_encrypted(name) {
            return Some(value);
        }
        let resolver = self.resolver?;
        resolver
            .resolve(self.section, name, &value)
            .ok()
            .map(|s| s.expose_secret().to_string())
    }

    fn required(&self, name: &str) -> Result<String, ValidationError> {
        self.value(name).ok_or_else(|| {
            self.structural_error(
                name,
                format!("Parameter {} in section {} is required.", name, self.section),
            )
        })
    }

    fn parsed<T>(
        &self,
        name: &str,
        expected: &str,
        parse: impl Fn(&str) -> Option<T>,
    ) -> Result<T, ValidationError> {
        let raw = self.required(name)?;
        parse(&raw).ok_or_else(|| {
            self.range_error(
                name,
                format!("Invalid value {} found for {} under {}; {} expected.", raw, name, self.section, expected),
            )
        })
    }

    pub fn int(&self, name: &str) -> Result<i64, ValidationError> {
        self.parsed(name, "integer", |s| parse_int(s).map(i64::from))
    }

    pub fn double(&self, name: &str) -> Result<f64, ValidationError> {
        self.parsed(name, "number", parse_double)
    }

    pub fn boolean(&self, name: &str) -> Result<bool, ValidationError> {
        self.parsed(name, "boolean", parse_bool)
    }

    pub fn seconds(&self, name: &str) -> Result<f64, ValidationError> {
        self.parsed(name, "duration in seconds", parse_timespan)
    }

    /// Lenient boolean read: true only for a value that parses as `true`.
    pub fn flag(&self, name: &str) -> bool {
        self.value(name).and_then(|v| parse_bool(v.trim())).unwrap_or(false)
    }

    pub fn structural_error(&self, name: &str, message: impl Into<String>) -> ValidationError {
        ValidationError::structural(self.section, name, message)
    }

    pub fn range_error(&self, name: &str, message: impl Into<String>) -> ValidationError {
        ValidationError::range(self.section, name, message)
    }

    pub fn cross_error(&self, name: &str, message: impl Into<String>) -> ValidationError {
        ValidationError::cross(self.section, name, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::Parameter;
    use crate::error::ErrorKind;

    fn create_manifest() -> ClusterManifest {
        let mut settings = SettingsDocument::new();
        settings.set("KtlLogger", Parameter::new("PeriodicFlushTime", "120"));
        settings.set("KtlLogger", Parameter::new("SharedLogSizeInMB", "lots"));
        settings.set("Hosting", Parameter::new("RunAsPolicyEnabled", " True "));
        ClusterManifest::new(settings)
    }

    #[test]
    fn test_explicit_then_default() {
        let manifest = create_manifest();
        let catalog = SettingsCatalog::standard();
        let config = ValidatorConfig::default();
        let ctx = RuleContext::new(&manifest, None, &catalog, &config, None).for_section("KtlLogger");

        assert_eq!(ctx.seconds("PeriodicFlushTime").unwrap(), 120.0);
        assert_eq!(ctx.seconds("PeriodicTimerInterval").unwrap(), 5.0);
        assert!(ctx.is_explicit("periodicflushtime"));
        assert!(!ctx.is_explicit("PeriodicTimerInterval"));
    }

    #[test]
    fn test_parse_failures_are_range_errors() {
        let manifest = create_manifest();
        let catalog = SettingsCatalog::standard();
        let config = ValidatorConfig::default();
        let ctx = RuleContext::new(&manifest, None, &catalog, &config, None).for_section("KtlLogger");

        let err = ctx.int("SharedLogSizeInMB").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::RangeOrFormat);
        assert!(err.to_string().contains("integer expected"));

        let err = ctx.int("NotInCatalog").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structural);
        assert!(err.to_string().contains("is required"));
    }

    #[test]
    fn test_flag_trims() {
        let manifest = create_manifest();
        let catalog = SettingsCatalog::standard();
        let config = ValidatorConfig::default();
        let ctx = RuleContext::new(&manifest, None, &catalog, &config, None).for_section("Hosting");
        assert!(ctx.flag("RunAsPolicyEnabled"));
        assert!(!ctx.flag("NTLMAuthenticationEnabled"));
    }
}
