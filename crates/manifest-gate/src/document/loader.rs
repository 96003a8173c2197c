//! YAML manifest loader.
//!
//! Manifests look like:
//!
//! ```yaml
//! name: DevCluster
//! version: "1.0"
//! nodeTypes:
//!   - name: NodeType0
//!     endpoints:
//!       clientConnectionEndpoint: "19000"
//! fabricSettings:
//!   - name: Setup
//!     parameters:
//!       - name: FabricDataRoot
//!         value: /var/lib/fabric/data
//! infrastructure:
//!   nodes:
//!     - nodeName: Node0
//!       ipAddressOrFqdn: 10.0.0.4
//!       nodeTypeRef: NodeType0
//!       isSeedNode: true
//! ```

use std::fs;
use std::path::Path;

use serde::Deserialize;

use super::topology::{ClusterManifest, InfrastructureNode, NodeType};
use super::{Parameter, Section, SettingsDocument};
use crate::error::ManifestError;

/// A parsed manifest plus the infrastructure it was written for, if any.
#[derive(Debug, Clone)]
pub struct LoadedManifest {
    pub manifest: ClusterManifest,
    pub infrastructure: Option<Vec<InfrastructureNode>>,
}

impl LoadedManifest {
    pub fn infrastructure(&self) -> Option<&[InfrastructureNode]> {
        self.infrastructure.as_deref()
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawManifest {
    #[serde(default)]
    name: String,
    #[serde(default)]
    version: String,
    #[serde(default)]
    node_types: Vec<NodeType>,
    #[serde(default)]
    fabric_settings: Vec<RawSection>,
    #[serde(default)]
    infrastructure: Option<RawInfrastructure>,
}

#[derive(Debug, Deserialize)]
struct RawSection {
    name: String,
    #[serde(default)]
    parameters: Vec<RawParameter>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawParameter {
    name: String,
    #[serde(default)]
    value: serde_yaml::Value,
    #[serde(default)]
    is_encrypted: bool,
}

#[derive(Debug, Deserialize)]
struct RawInfrastructure {
    #[serde(default)]
    nodes: Vec<InfrastructureNode>,
}

pub fn load_manifest<P: AsRef<Path>>(path: P) -> Result<LoadedManifest, ManifestError> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| ManifestError::ReadFile {
        path: path.to_path_buf(),
        source: e,
    })?;

    log::debug!("Loading manifest from {}", path.display());
    load_manifest_from_str(&content)
}

pub fn load_manifest_from_str(content: &str) -> Result<LoadedManifest, ManifestError> {
    let raw: RawManifest = serde_yaml::from_str(content)?;

    let mut settings = SettingsDocument::new();
    for raw_section in raw.fabric_settings {
        let mut section = Section::new(raw_section.name.trim());
        for raw_parameter in raw_section.parameters {
            let value = scalar_to_string(&section.name, &raw_parameter.name, raw_parameter.value)?;
            section.add_parameter(Parameter {
                name: raw_parameter.name,
                value,
                is_encrypted: raw_parameter.is_encrypted,
            })?;
        }
        settings.push_section(section)?;
    }

    for node_type in &raw.node_types {
        if node_type.name.trim().is_empty() {
            return Err(ManifestError::Invalid {
                message: "node type name cannot be empty".to_string(),
            });
        }
    }

    let manifest = ClusterManifest {
        name: raw.name,
        version: raw.version,
        settings,
        node_types: raw.node_types,
    };

    log::info!(
        "Loaded manifest '{}' with {} sections and {} node types",
        manifest.name,
        manifest.settings.sections().len(),
        manifest.node_types.len()
    );

    Ok(LoadedManifest {
        manifest,
        infrastructure: raw.infrastructure.map(|i| i.nodes),
    })
}

/// Parameter values are strings in the document model; YAML scalars are
/// accepted as written so that `value: 60` and `value: "60"` are equivalent.
fn scalar_to_string(
    section: &str,
    name: &str,
    value: serde_yaml::Value,
) -> Result<String, ManifestError> {
    match value {
        serde_yaml::Value::Null => Ok(String::new()),
        serde_yaml::Value::Bool(b) => Ok(b.to_string()),
        serde_yaml::Value::Number(n) => Ok(n.to_string()),
        serde_yaml::Value::String(s) => Ok(s),
        _ => Err(ManifestError::Invalid {
            message: format!(
                "Section '{}', parameter '{}': value must be a scalar",
                section, name
            ),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MANIFEST: &str = r#"
name: DevCluster
version: "1.0"
nodeTypes:
  - name: NodeType0
    endpoints:
      clientConnectionEndpoint: "19000"
      applicationEndpoints:
        startPort: "30001"
        endPort: "31000"
    placementProperties:
      - name: HasSSD
        value: "true"
fabricSettings:
  - name: Setup
    parameters:
      - name: FabricDataRoot
        value: /var/lib/fabric/data
  - name: KtlLogger
    parameters:
      - name: PeriodicFlushTime
        value: 60
      - name: SharedLogId
        value: ""
infrastructure:
  nodes:
    - nodeName: Node0
      ipAddressOrFqdn: 10.0.0.4
      nodeTypeRef: NodeType0
      isSeedNode: true
"#;

    #[test]
    fn test_load_manifest_from_str() {
        let loaded = load_manifest_from_str(MANIFEST).unwrap();
        let manifest = &loaded.manifest;

        assert_eq!(manifest.name, "DevCluster");
        assert_eq!(manifest.node_types.len(), 1);
        assert_eq!(
            manifest.settings.value("KtlLogger", "PeriodicFlushTime"),
            Some("60")
        );
        assert_eq!(manifest.settings.value("KtlLogger", "SharedLogId"), Some(""));

        let node_type = &manifest.node_types[0];
        let range = node_type.endpoints.application_endpoints.as_ref().unwrap();
        assert_eq!(range.start_port, "30001");
        assert_eq!(node_type.placement_properties[0].name, "HasSSD");

        let nodes = loaded.infrastructure().unwrap();
        assert_eq!(nodes.len(), 1);
        assert!(nodes[0].is_seed_node);
        assert_eq!(nodes[0].fault_domain, "fd:/0");
    }

    #[test]
    fn test_duplicate_parameter_rejected() {
        let yaml = r#"
fabricSettings:
  - name: Setup
    parameters:
      - name: FabricDataRoot
        value: a
      - name: fabricdataroot
        value: b
"#;
        let result = load_manifest_from_str(yaml);
        assert!(matches!(
            result,
            Err(ManifestError::DuplicateParameter { .. })
        ));
    }

    #[test]
    fn test_duplicate_section_rejected() {
        let yaml = r#"
fabricSettings:
  - name: Setup
  - name: SETUP
"#;
        let result = load_manifest_from_str(yaml);
        assert!(matches!(result, Err(ManifestError::DuplicateSection { .. })));
    }

    #[test]
    fn test_non_scalar_value_rejected() {
        let yaml = r#"
fabricSettings:
  - name: Setup
    parameters:
      - name: FabricDataRoot
        value: [a, b]
"#;
        let err = load_manifest_from_str(yaml).unwrap_err();
        assert!(err.to_string().contains("FabricDataRoot"));
    }

    #[test]
    fn test_load_manifest_from_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", MANIFEST).unwrap();

        let loaded = load_manifest(file.path()).unwrap();
        assert_eq!(loaded.manifest.version, "1.0");
    }

    #[test]
    fn test_missing_file() {
        let result = load_manifest("/nonexistent/manifest.yaml");
        assert!(matches!(result, Err(ManifestError::ReadFile { .. })));
    }

    #[test]
    fn test_no_infrastructure() {
        let loaded = load_manifest_from_str("name: Empty\n").unwrap();
        assert!(loaded.infrastructure().is_none());
        assert!(loaded.manifest.settings.is_empty());
    }
}
