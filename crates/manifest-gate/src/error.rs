use std::path::PathBuf;
use thiserror::Error;

use crate::secrets::SecretError;

#[derive(Error, Debug)]
pub enum GateError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    #[error("Validation failed: {0}")]
    Validation(#[from] ValidationError),

    #[error("Upgrade rejected: {0}")]
    Upgrade(#[from] UpgradeError),

    #[error("Secret error: {0}")]
    Secret(#[from] SecretError),
}

/// Broad classification of everything the validator and the upgrade gate can reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Structural,
    RangeOrFormat,
    CrossParameter,
    ImmutableSetting,
}

/// A single validation failure. Validation stops at the first one found.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    #[error("Section '{section}', parameter '{parameter}': {message}")]
    Structural {
        section: String,
        parameter: String,
        message: String,
    },

    #[error("Section '{section}', parameter '{parameter}': {message}")]
    RangeOrFormat {
        section: String,
        parameter: String,
        message: String,
    },

    #[error("Section '{section}', parameter '{parameter}': {message}")]
    CrossParameter {
        section: String,
        parameter: String,
        message: String,
    },
}

impl ValidationError {
    pub fn structural(
        section: impl Into<String>,
        parameter: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::Structural {
            section: section.into(),
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    pub fn range(
        section: impl Into<String>,
        parameter: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::RangeOrFormat {
            section: section.into(),
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    pub fn cross(
        section: impl Into<String>,
        parameter: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self::CrossParameter {
            section: section.into(),
            parameter: parameter.into(),
            message: message.into(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Structural { .. } => ErrorKind::Structural,
            Self::RangeOrFormat { .. } => ErrorKind::RangeOrFormat,
            Self::CrossParameter { .. } => ErrorKind::CrossParameter,
        }
    }

    pub fn section(&self) -> &str {
        match self {
            Self::Structural { section, .. }
            | Self::RangeOrFormat { section, .. }
            | Self::CrossParameter { section, .. } => section,
        }
    }

    pub fn parameter(&self) -> &str {
        match self {
            Self::Structural { parameter, .. }
            | Self::RangeOrFormat { parameter, .. }
            | Self::CrossParameter { parameter, .. } => parameter,
        }
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum UpgradeError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Section '{section}', parameter '{parameter}' cannot be changed by an upgrade: {reason}")]
    ImmutableSetting {
        section: String,
        parameter: String,
        reason: String,
    },
}

impl UpgradeError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Validation(e) => e.kind(),
            Self::ImmutableSetting { .. } => ErrorKind::ImmutableSetting,
        }
    }
}

#[derive(Error, Debug)]
pub enum ManifestError {
    #[error("Failed to read manifest '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse manifest YAML: {0}")]
    ParseYaml(#[from] serde_yaml::Error),

    #[error("Duplicate section '{name}'")]
    DuplicateSection { name: String },

    #[error("Duplicate parameter '{name}' in section '{section}'")]
    DuplicateParameter { section: String, name: String },

    #[error("Invalid manifest: {message}")]
    Invalid { message: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },

    #[error("Invalid key '{id}': {reason}")]
    InvalidKey { id: String, reason: String },
}

pub type Result<T> = std::result::Result<T, GateError>;
