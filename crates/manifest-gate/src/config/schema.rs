use serde::{Deserialize, Serialize};

/// Settings for the validator itself, as opposed to the manifest under test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidatorConfig {
    pub version: String,
    #[serde(default)]
    pub deployment: DeploymentConfig,
    #[serde(default)]
    pub secrets: SecretsConfig,
}

impl Default for ValidatorConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            deployment: DeploymentConfig::default(),
            secrets: SecretsConfig::default(),
        }
    }
}

impl ValidatorConfig {
    pub fn is_single_machine(&self) -> bool {
        self.deployment.mode == DeploymentMode::ScaleMin
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum DeploymentMode {
    #[default]
    MultiMachine,
    /// Several logical nodes on one physical machine.
    ScaleMin,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentConfig {
    #[serde(default)]
    pub mode: DeploymentMode,
    /// Address of the machine hosting a scale-min deployment.
    #[serde(default)]
    pub machine_address: Option<String>,
    #[serde(default)]
    pub allow_colocated_seed_nodes: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SecretsConfig {
    #[serde(default)]
    pub keys: Vec<KeyConfig>,
}

/// A 256-bit key for encrypted parameter values, given directly, as a file
/// or as an environment variable name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KeyConfig {
    pub id: String,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub key_file: Option<String>,
    #[serde(default)]
    pub key_env_var: Option<String>,
}
