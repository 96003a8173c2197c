pub mod catalog;
pub mod config;
pub mod diff;
pub mod document;
pub mod error;
pub mod rules;
pub mod secrets;
pub mod upgrade;
pub mod validator;
pub mod value;

pub use catalog::{ConfigEntry, SettingsCatalog, UpgradePolicy};
pub use config::{load_config, load_config_from_str, DeploymentMode, ValidatorConfig};
pub use diff::{DiffEntry, DiffResult, ManifestDiffEngine};
pub use document::{
    load_manifest, load_manifest_from_str, ClusterManifest, InfrastructureNode, LoadedManifest,
    NodeType, Parameter, Section, SettingsDocument,
};
pub use error::{
    ConfigError, ErrorKind, GateError, ManifestError, Result, UpgradeError, ValidationError,
};
pub use rules::{Constraint, CrossRule, FormatCheck, ParameterRule, RuleContext, RuleKey, ValidationRuleSet};
pub use secrets::{resolve_secret, Keyring, SecretError, SecretResolver};
pub use upgrade::connection_string::ImageStoreConnection;
pub use upgrade::UpgradeGate;
pub use validator::ConfigurationValidator;
pub use value::ValueKind;
