//! Builders for manifests and infrastructure.

#![allow(dead_code)]

use std::sync::Arc;

use manifest_gate::document::PortRange;
use manifest_gate::{
    ClusterManifest, ConfigurationValidator, InfrastructureNode, Keyring, NodeType, Parameter,
    SettingsDocument, UpgradeGate,
};

pub const KEY_A: &str = "000102030405060708090a0b0c0d0e0f101112131415161718191a1b1c1d1e1f";
pub const KEY_B: &str = "1f1e1d1c1b1a191817161514131211100f0e0d0c0b0a09080706050403020100";

/// Builder for `ClusterManifest` starting from a minimal valid manifest:
/// unsecured cluster, one node type `Front` with distinct endpoints.
pub struct ManifestBuilder {
    name: String,
    version: String,
    settings: SettingsDocument,
    node_types: Vec<NodeType>,
}

impl ManifestBuilder {
    pub fn new() -> Self {
        let mut settings = SettingsDocument::new();
        settings.set("Security", Parameter::new("ClusterCredentialType", "None"));
        settings.set("Security", Parameter::new("ServerAuthCredentialType", "None"));
        Self {
            name: "TestCluster".to_string(),
            version: "1.0".to_string(),
            settings,
            node_types: vec![front_node_type()],
        }
    }

    pub fn version(mut self, version: &str) -> Self {
        self.version = version.to_string();
        self
    }

    /// Set a plain parameter, replacing any previous value.
    pub fn param(mut self, section: &str, name: &str, value: &str) -> Self {
        self.settings.set(section, Parameter::new(name, value));
        self
    }

    pub fn encrypted(mut self, section: &str, name: &str, value: &str) -> Self {
        self.settings.set(section, Parameter::encrypted(name, value));
        self
    }

    pub fn without(mut self, section: &str, name: &str) -> Self {
        self.settings.remove(section, name);
        self
    }

    pub fn node_type(mut self, node_type: NodeType) -> Self {
        self.node_types.retain(|n| !n.name.eq_ignore_ascii_case(&node_type.name));
        self.node_types.push(node_type);
        self
    }

    pub fn build(self) -> ClusterManifest {
        let mut manifest = ClusterManifest::new(self.settings);
        manifest.name = self.name;
        manifest.version = self.version;
        manifest.node_types = self.node_types;
        manifest
    }
}

impl Default for ManifestBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub fn front_node_type() -> NodeType {
    let mut node_type = NodeType::new("Front");
    node_type.endpoints.client_connection_endpoint = Some("19000".to_string());
    node_type.endpoints.http_gateway_endpoint = Some("19080".to_string());
    node_type.endpoints.application_endpoints = Some(PortRange::new("20000", "30000"));
    node_type
}

/// `count` nodes of type `Front` on distinct addresses; the first is the seed.
pub fn infrastructure(count: usize) -> Vec<InfrastructureNode> {
    (0..count)
        .map(|i| InfrastructureNode::new(format!("Node{}", i), format!("10.0.0.{}", i + 4), "Front", i == 0))
        .collect()
}

pub fn keyring() -> Keyring {
    let mut keyring = Keyring::new();
    keyring.add_hex_key("a", KEY_A).unwrap();
    keyring.add_hex_key("b", KEY_B).unwrap();
    keyring
}

pub fn gate_with_keyring() -> UpgradeGate {
    UpgradeGate::new(ConfigurationValidator::default().with_resolver(Arc::new(keyring())))
}
