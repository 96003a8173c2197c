use std::path::Path;
use std::sync::Arc;

use manifest_gate::{
    load_config, load_manifest, ConfigurationValidator, DiffResult, GateError, Keyring,
    ManifestDiffEngine, UpgradeGate, ValidatorConfig,
};
use tracing::info;

use crate::error::{CliError, CliResult};

pub fn load_validator_config(path: Option<&Path>) -> CliResult<ValidatorConfig> {
    match path {
        Some(path) => {
            info!("Loading validator config from {}", path.display());
            Ok(load_config(path).map_err(GateError::from)?)
        }
        None => Ok(ValidatorConfig::default()),
    }
}

fn keyring(config: &ValidatorConfig) -> CliResult<Keyring> {
    Ok(Keyring::from_config(&config.secrets).map_err(GateError::from)?)
}

/// The validator gets a resolver only when keys are configured.
fn build_validator(config: ValidatorConfig) -> CliResult<ConfigurationValidator> {
    let keyring = keyring(&config)?;
    let validator = ConfigurationValidator::new(config);
    if keyring.key_ids().is_empty() {
        return Ok(validator);
    }
    Ok(validator.with_resolver(Arc::new(keyring)))
}

pub fn validate(config: ValidatorConfig, manifest: &Path) -> CliResult<String> {
    let loaded = load_manifest(manifest).map_err(GateError::from)?;
    let validator = build_validator(config)?;
    validator
        .validate(&loaded.manifest, loaded.infrastructure())
        .map_err(GateError::from)?;
    Ok(format!("Manifest '{}' is valid", loaded.manifest.name))
}

pub fn compare(config: ValidatorConfig, current: &Path, target: &Path) -> CliResult<DiffResult> {
    let current = load_manifest(current).map_err(GateError::from)?;
    let target = load_manifest(target).map_err(GateError::from)?;
    let validator = build_validator(config)?;

    let mut engine = ManifestDiffEngine::new(Arc::clone(validator.catalog()));
    if let Some(resolver) = validator.resolver() {
        engine = engine.with_resolver(Arc::clone(resolver));
    }
    Ok(engine.compare(&current.manifest, &target.manifest))
}

pub fn analyze(config: ValidatorConfig, current: &Path, target: &Path) -> CliResult<DiffResult> {
    let current = load_manifest(current).map_err(GateError::from)?;
    let target = load_manifest(target).map_err(GateError::from)?;
    let gate = UpgradeGate::new(build_validator(config)?);
    Ok(gate
        .analyze(&current.manifest, &target.manifest, target.infrastructure())
        .map_err(GateError::from)?)
}

pub fn encrypt(config: ValidatorConfig, key_id: Option<&str>, value: &str) -> CliResult<String> {
    let keyring = keyring(&config)?;
    let key_id = match (key_id, keyring.key_ids().as_slice()) {
        (Some(id), _) => id.to_string(),
        (None, [only]) => only.to_string(),
        (None, []) => return Err(CliError::Usage("no keys are configured".to_string())),
        (None, _) => {
            return Err(CliError::Usage(
                "several keys are configured; pass --key-id".to_string(),
            ))
        }
    };
    Ok(keyring.encrypt(&key_id, value).map_err(GateError::from)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    const KEY: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";

    const MANIFEST: &str = r#"
name: Dev
version: "1.0"
nodeTypes:
  - name: Front
fabricSettings:
  - name: Security
    parameters:
      - name: ClusterCredentialType
        value: None
      - name: ServerAuthCredentialType
        value: None
"#;

    fn write(dir: &TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn config_with_key() -> ValidatorConfig {
        let json = format!(
            r#"{{"version": "1.0", "secrets": {{"keys": [{{"id": "k1", "key": "{}"}}]}}}}"#,
            KEY
        );
        manifest_gate::load_config_from_str(&json).unwrap()
    }

    #[test]
    fn test_validate_and_compare_files() {
        let dir = TempDir::new().unwrap();
        let current = write(&dir, "current.yaml", MANIFEST);
        let target = write(&dir, "target.yaml", &MANIFEST.replace("version: \"1.0\"", "version: \"1.1\""));

        let message = validate(ValidatorConfig::default(), &current).unwrap();
        assert!(message.contains("Dev"));

        let diff = compare(ValidatorConfig::default(), &current, &target).unwrap();
        assert!(diff.is_empty());

        let diff = analyze(ValidatorConfig::default(), &current, &target).unwrap();
        assert!(diff.is_empty());
    }

    #[test]
    fn test_missing_manifest_is_input_error() {
        let err = validate(ValidatorConfig::default(), Path::new("/nonexistent/manifest.yaml")).unwrap_err();
        assert_eq!(err.exit_code(), 2);
    }

    #[test]
    fn test_encrypt_with_single_key() {
        let config = config_with_key();
        let sealed = encrypt(config.clone(), None, "secret").unwrap();
        assert!(sealed.starts_with("k1:"));

        let err = encrypt(config, Some("k2"), "secret").unwrap_err();
        assert_eq!(err.exit_code(), 2);

        let err = encrypt(ValidatorConfig::default(), None, "secret").unwrap_err();
        assert!(matches!(err, CliError::Usage(_)));
    }
}
