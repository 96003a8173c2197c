//! Node types and infrastructure nodes.
//!
//! These are read-only inputs: the validator checks them for consistency and
//! the diff engine compares them between manifest versions.

use serde::{Deserialize, Serialize};

use super::SettingsDocument;

/// A complete cluster manifest: settings plus the node types they run on.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClusterManifest {
    pub name: String,
    pub version: String,
    pub settings: SettingsDocument,
    pub node_types: Vec<NodeType>,
}

impl ClusterManifest {
    pub fn new(settings: SettingsDocument) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn node_type(&self, name: &str) -> Option<&NodeType> {
        self.node_types
            .iter()
            .find(|n| n.name.eq_ignore_ascii_case(name))
    }
}

/// A key/value pair inside an open-ended property list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedValue {
    pub name: String,
    pub value: String,
}

impl NamedValue {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeType {
    pub name: String,
    #[serde(default)]
    pub endpoints: Endpoints,
    #[serde(default)]
    pub certificates: Certificates,
    #[serde(default)]
    pub placement_properties: Vec<NamedValue>,
    #[serde(default)]
    pub capacities: Vec<NamedValue>,
    #[serde(default)]
    pub sfss_rg_policies: Vec<NamedValue>,
}

impl NodeType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

/// Port range such as the application or ephemeral port range.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortRange {
    pub start_port: String,
    pub end_port: String,
}

impl PortRange {
    pub fn new(start: impl Into<String>, end: impl Into<String>) -> Self {
        Self {
            start_port: start.into(),
            end_port: end.into(),
        }
    }
}

/// Endpoint ports as written in the manifest. Values stay strings so the
/// validator can report malformed input rather than the loader.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Endpoints {
    #[serde(default)]
    pub client_connection_endpoint: Option<String>,
    #[serde(default)]
    pub lease_driver_endpoint: Option<String>,
    #[serde(default)]
    pub cluster_connection_endpoint: Option<String>,
    #[serde(default)]
    pub service_connection_endpoint: Option<String>,
    #[serde(default)]
    pub http_gateway_endpoint: Option<String>,
    #[serde(default)]
    pub http_app_gateway_endpoint: Option<String>,
    #[serde(default)]
    pub default_replicator_endpoint: Option<String>,
    #[serde(default)]
    pub application_endpoints: Option<PortRange>,
    #[serde(default)]
    pub ephemeral_endpoints: Option<PortRange>,
}

impl Endpoints {
    /// Single-port endpoints keyed by the node setting name they map to.
    pub fn ports(&self) -> Vec<(&'static str, &str)> {
        [
            ("ClientConnectionAddress", &self.client_connection_endpoint),
            ("LeaseAgentAddress", &self.lease_driver_endpoint),
            ("NodeAddress", &self.cluster_connection_endpoint),
            ("RuntimeServiceAddress", &self.service_connection_endpoint),
            ("HttpGatewayListenAddress", &self.http_gateway_endpoint),
            (
                "HttpApplicationGatewayListenAddress",
                &self.http_app_gateway_endpoint,
            ),
            ("ReplicatorAddress", &self.default_replicator_endpoint),
        ]
        .into_iter()
        .filter_map(|(name, value)| value.as_deref().map(|v| (name, v)))
        .collect()
    }

    /// Port ranges keyed by the (start, end) node setting names.
    pub fn ranges(&self) -> Vec<(&'static str, &'static str, &PortRange)> {
        let mut ranges = Vec::new();
        if let Some(range) = &self.application_endpoints {
            ranges.push((
                "StartApplicationPortRange",
                "EndApplicationPortRange",
                range,
            ));
        }
        if let Some(range) = &self.ephemeral_endpoints {
            ranges.push(("StartDynamicPortRange", "EndDynamicPortRange", range));
        }
        ranges
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CertificateRef {
    #[serde(default = "default_find_type")]
    pub find_type: String,
    pub find_value: String,
    #[serde(default = "default_store_name")]
    pub store_name: String,
}

fn default_find_type() -> String {
    "FindByThumbprint".to_string()
}

fn default_store_name() -> String {
    "My".to_string()
}

impl CertificateRef {
    pub fn thumbprint(value: impl Into<String>) -> Self {
        Self {
            find_type: default_find_type(),
            find_value: value.into(),
            store_name: default_store_name(),
        }
    }

    pub fn is_thumbprint(&self) -> bool {
        self.find_type.eq_ignore_ascii_case("FindByThumbprint")
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Certificates {
    #[serde(default)]
    pub cluster_certificate: Option<CertificateRef>,
    #[serde(default)]
    pub server_certificate: Option<CertificateRef>,
    #[serde(default)]
    pub client_certificate: Option<CertificateRef>,
}

impl Certificates {
    /// Certificates keyed by their node setting prefix (`Cluster`, `ServerAuth`, `ClientAuth`).
    pub fn by_role(&self) -> [(&'static str, Option<&CertificateRef>); 3] {
        [
            ("Cluster", self.cluster_certificate.as_ref()),
            ("ServerAuth", self.server_certificate.as_ref()),
            ("ClientAuth", self.client_certificate.as_ref()),
        ]
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InfrastructureNode {
    pub node_name: String,
    pub ip_address_or_fqdn: String,
    pub node_type_ref: String,
    #[serde(default)]
    pub is_seed_node: bool,
    #[serde(default = "default_fault_domain")]
    pub fault_domain: String,
    #[serde(default = "default_upgrade_domain")]
    pub upgrade_domain: String,
}

fn default_fault_domain() -> String {
    "fd:/0".to_string()
}

fn default_upgrade_domain() -> String {
    "0".to_string()
}

impl InfrastructureNode {
    pub fn new(
        node_name: impl Into<String>,
        address: impl Into<String>,
        node_type_ref: impl Into<String>,
        is_seed_node: bool,
    ) -> Self {
        Self {
            node_name: node_name.into(),
            ip_address_or_fqdn: address.into(),
            node_type_ref: node_type_ref.into(),
            is_seed_node,
            fault_domain: default_fault_domain(),
            upgrade_domain: default_upgrade_domain(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ports_skip_unset_endpoints() {
        let endpoints = Endpoints {
            client_connection_endpoint: Some("19000".to_string()),
            http_gateway_endpoint: Some("19080".to_string()),
            ..Endpoints::default()
        };
        assert_eq!(
            endpoints.ports(),
            vec![
                ("ClientConnectionAddress", "19000"),
                ("HttpGatewayListenAddress", "19080")
            ]
        );
        assert!(endpoints.ranges().is_empty());
    }

    #[test]
    fn test_node_type_lookup_case_insensitive() {
        let manifest = ClusterManifest {
            node_types: vec![NodeType::new("NodeType0")],
            ..ClusterManifest::default()
        };
        assert!(manifest.node_type("nodetype0").is_some());
        assert!(manifest.node_type("NodeType1").is_none());
    }
}
