use std::collections::HashSet;
use std::path::Path;

use crate::config::schema::ValidatorConfig;
use crate::error::ConfigError;
use crate::secrets::has_secret_source;

const SCHEMA_JSON: &str = include_str!("../../schema/validator-config-v1.json");

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<ValidatorConfig, ConfigError> {
    let path = path.as_ref();
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    load_config_from_str(&content)
}

pub fn load_config_from_str(content: &str) -> Result<ValidatorConfig, ConfigError> {
    let json_value: serde_json::Value = serde_json::from_str(content)?;

    validate_schema(&json_value)?;

    let config: ValidatorConfig = serde_json::from_value(json_value)?;

    validate_config(&config)?;

    Ok(config)
}

fn validate_schema(json_value: &serde_json::Value) -> Result<(), ConfigError> {
    let schema: serde_json::Value =
        serde_json::from_str(SCHEMA_JSON).map_err(|e| ConfigError::Validation {
            message: format!("Invalid embedded schema JSON: {}", e),
        })?;

    let validator = jsonschema::validator_for(&schema).map_err(|e| ConfigError::Validation {
        message: format!("Failed to compile JSON schema: {}", e),
    })?;

    let error_messages: Vec<String> = validator
        .iter_errors(json_value)
        .map(|e| e.to_string())
        .collect();
    if !error_messages.is_empty() {
        return Err(ConfigError::SchemaValidation {
            errors: error_messages.join("; "),
        });
    }

    Ok(())
}

fn validate_config(config: &ValidatorConfig) -> Result<(), ConfigError> {
    if config.version != "1.0" {
        return Err(ConfigError::Validation {
            message: format!("Unsupported config version: {}", config.version),
        });
    }

    if !config.is_single_machine() && config.deployment.machine_address.is_some() {
        log::warn!("deployment.machineAddress is only used in scaleMin mode; ignoring it");
    }

    let mut seen = HashSet::new();
    for key in &config.secrets.keys {
        if !seen.insert(key.id.to_ascii_lowercase()) {
            return Err(ConfigError::InvalidKey {
                id: key.id.clone(),
                reason: "duplicate key id".to_string(),
            });
        }
        if !has_secret_source(
            key.key.as_deref(),
            key.key_file.as_deref(),
            key.key_env_var.as_deref(),
        ) {
            return Err(ConfigError::InvalidKey {
                id: key.id.clone(),
                reason: "one of key, keyFile or keyEnvVar is required".to_string(),
            });
        }
    }

    Ok(())
}

// ==== Tests ====
