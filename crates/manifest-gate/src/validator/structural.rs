//! Node types, infrastructure and required parameters.

use std::collections::HashSet;

use crate::catalog::sections::{NODE_CAPACITIES_SECTION, NODE_PROPERTIES_SECTION};
use crate::error::ValidationError;
use crate::rules::RuleContext;
use crate::value::{is_digits_only, parse_uint};

use super::security::node_type_section;

/// Placement property names the runtime defines for every node.
const SYSTEM_PLACEMENT_PROPERTIES: [&str; 4] = ["NodeType", "NodeName", "UpgradeDomain", "FaultDomain"];

const REQUIRED_PARAMETERS: [(&str, &str); 2] = [
    ("Security", "ClusterCredentialType"),
    ("Security", "ServerAuthCredentialType"),
];

pub fn validate_topology(ctx: &RuleContext<'_>) -> Result<(), ValidationError> {
    check_node_types(ctx)?;
    check_infrastructure(ctx)?;
    check_seed_placement(ctx)?;
    check_expected_cluster_size(ctx)?;
    check_required_parameters(ctx)
}

fn check_node_types(ctx: &RuleContext<'_>) -> Result<(), ValidationError> {
    let mut names = HashSet::new();
    for node_type in &ctx.manifest().node_types {
        if !names.insert(node_type.name.to_ascii_lowercase()) {
            return Err(ValidationError::structural(
                "NodeTypes",
                &node_type.name,
                format!("Duplicate node type {} found.", node_type.name),
            ));
        }

        let section = node_type_section(&node_type.name);
        let mut properties = HashSet::new();
        for property in &node_type.placement_properties {
            if SYSTEM_PLACEMENT_PROPERTIES
                .iter()
                .any(|p| p.eq_ignore_ascii_case(&property.name))
            {
                return Err(ValidationError::structural(
                    &section,
                    &property.name,
                    format!("{} is a system-defined placement property", property.name),
                ));
            }
            if !properties.insert(property.name.to_ascii_lowercase()) {
                return Err(ValidationError::structural(
                    &section,
                    &property.name,
                    format!("Duplicate {} entry {} found.", NODE_PROPERTIES_SECTION, property.name),
                ));
            }
        }

        let mut capacities = HashSet::new();
        for capacity in &node_type.capacities {
            if !capacities.insert(capacity.name.to_ascii_lowercase()) {
                return Err(ValidationError::structural(
                    &section,
                    &capacity.name,
                    format!("Duplicate {} entry {} found.", NODE_CAPACITIES_SECTION, capacity.name),
                ));
            }
            if parse_uint(&capacity.value).is_none() {
                return Err(ValidationError::range(
                    &section,
                    &capacity.name,
                    format!(
                        "Invalid value {} found for {} under {}; unsigned integer expected.",
                        capacity.value, capacity.name, NODE_CAPACITIES_SECTION
                    ),
                ));
            }
        }
    }
    Ok(())
}

fn check_infrastructure(ctx: &RuleContext<'_>) -> Result<(), ValidationError> {
    let Some(nodes) = ctx.infrastructure() else {
        return Ok(());
    };

    let mut names = HashSet::new();
    for node in nodes {
        if !names.insert(node.node_name.to_ascii_lowercase()) {
            return Err(ValidationError::structural(
                "Infrastructure",
                &node.node_name,
                format!("Duplicate node {} found.", node.node_name),
            ));
        }
        if ctx.manifest().node_type(&node.node_type_ref).is_none() {
            return Err(ValidationError::structural(
                "Infrastructure",
                &node.node_name,
                format!(
                    "Node {} references node type {} which is not defined.",
                    node.node_name, node.node_type_ref
                ),
            ));
        }
    }

    if !nodes.is_empty() && !nodes.iter().any(|n| n.is_seed_node) {
        return Err(ValidationError::structural(
            "Infrastructure",
            "IsSeedNode",
            "At least one seed node is required.",
        ));
    }
    Ok(())
}

/// Scale-min: logical nodes share one machine, and only one of them may be a seed.
fn check_seed_placement(ctx: &RuleContext<'_>) -> Result<(), ValidationError> {
    let deployment = &ctx.config().deployment;
    if !ctx.config().is_single_machine() || deployment.allow_colocated_seed_nodes {
        return Ok(());
    }
    let Some(nodes) = ctx.infrastructure() else {
        return Ok(());
    };

    let address = match &deployment.machine_address {
        Some(address) => address.as_str(),
        None => match nodes.first() {
            Some(first) if nodes.iter().all(|n| n.ip_address_or_fqdn.eq_ignore_ascii_case(&first.ip_address_or_fqdn)) => {
                first.ip_address_or_fqdn.as_str()
            }
            _ => return Ok(()),
        },
    };

    let seeds: Vec<&str> = nodes
        .iter()
        .filter(|n| n.is_seed_node && n.ip_address_or_fqdn.eq_ignore_ascii_case(address))
        .map(|n| n.node_name.as_str())
        .collect();
    if seeds.len() > 1 {
        return Err(ValidationError::structural(
            "Infrastructure",
            "IsSeedNode",
            format!(
                "Seed nodes {} share machine {}; at most one seed node is allowed per machine.",
                seeds.join(", "),
                address
            ),
        ));
    }
    Ok(())
}

fn check_expected_cluster_size(ctx: &RuleContext<'_>) -> Result<(), ValidationError> {
    let failover = ctx.for_section("FailoverManager");
    let Some(raw) = failover.explicit("ExpectedClusterSize") else {
        return Ok(());
    };
    let raw = raw.trim();
    let size = match parse_uint(raw) {
        Some(size) if is_digits_only(raw) => size,
        _ => {
            return Err(failover.range_error(
                "ExpectedClusterSize",
                format!("Invalid value {} found for ExpectedClusterSize; digits expected.", raw),
            ))
        }
    };
    if size == 0 {
        return Err(failover.range_error("ExpectedClusterSize", "ExpectedClusterSize must be greater than 0."));
    }
    if let Some(nodes) = ctx.infrastructure() {
        if size as usize > nodes.len() {
            return Err(failover.cross_error(
                "ExpectedClusterSize",
                format!(
                    "ExpectedClusterSize {} exceeds the number of nodes ({}).",
                    size,
                    nodes.len()
                ),
            ));
        }
    }
    Ok(())
}

fn check_required_parameters(ctx: &RuleContext<'_>) -> Result<(), ValidationError> {
    for (section, parameter) in REQUIRED_PARAMETERS {
        if ctx.settings().parameter(section, parameter).is_none() {
            return Err(ValidationError::structural(
                section,
                parameter,
                format!("Parameter {} in section {} is required.", parameter, section),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::SettingsCatalog;
    use crate::config::{DeploymentMode, ValidatorConfig};
    use crate::document::{ClusterManifest, InfrastructureNode, NamedValue, NodeType, Parameter, SettingsDocument};
    use crate::error::ErrorKind;

    fn create_minimal_manifest() -> ClusterManifest {
        let mut settings = SettingsDocument::new();
        settings.set("Security", Parameter::new("ClusterCredentialType", "None"));
        settings.set("Security", Parameter::new("ServerAuthCredentialType", "None"));
        let mut manifest = ClusterManifest::new(settings);
        manifest.node_types.push(NodeType::new("Front"));
        manifest
    }

    fn run(
        manifest: &ClusterManifest,
        infrastructure: Option<&[InfrastructureNode]>,
        config: &ValidatorConfig,
    ) -> Result<(), ValidationError> {
        let catalog = SettingsCatalog::standard();
        let ctx = RuleContext::new(manifest, infrastructure, &catalog, config, None);
        validate_topology(&ctx)
    }

    fn nodes(addresses: &[(&str, bool)]) -> Vec<InfrastructureNode> {
        addresses
            .iter()
            .enumerate()
            .map(|(i, (addr, seed))| InfrastructureNode::new(format!("N{}", i), *addr, "Front", *seed))
            .collect()
    }

    #[test]
    fn test_minimal_manifest_passes() {
        let manifest = create_minimal_manifest();
        assert!(run(&manifest, None, &ValidatorConfig::default()).is_ok());
    }

    #[test]
    fn test_duplicate_node_type() {
        let mut manifest = create_minimal_manifest();
        manifest.node_types.push(NodeType::new("front"));
        let err = run(&manifest, None, &ValidatorConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structural);
        assert!(err.to_string().contains("Duplicate node type front found."));
    }

    #[test]
    fn test_placement_properties_and_capacities() {
        let mut manifest = create_minimal_manifest();
        manifest.node_types[0]
            .placement_properties
            .push(NamedValue::new("NodeName", "x"));
        assert!(run(&manifest, None, &ValidatorConfig::default()).is_err());

        let mut manifest = create_minimal_manifest();
        manifest.node_types[0].capacities.push(NamedValue::new("Memory", "-5"));
        let err = run(&manifest, None, &ValidatorConfig::default()).unwrap_err();
        assert!(err.to_string().contains("unsigned integer expected"));
    }

    #[test]
    fn test_node_type_ref_must_resolve() {
        let manifest = create_minimal_manifest();
        let mut infra = nodes(&[("10.0.0.1", true)]);
        infra[0].node_type_ref = "Back".to_string();
        let err = run(&manifest, Some(&infra), &ValidatorConfig::default()).unwrap_err();
        assert!(err.to_string().contains("not defined"));
    }

    #[test]
    fn test_scale_min_colocated_seeds() {
        let manifest = create_minimal_manifest();
        let infra = nodes(&[("localhost", true), ("localhost", true), ("localhost", false)]);
        let mut config = ValidatorConfig::default();
        config.deployment.mode = DeploymentMode::ScaleMin;

        let err = run(&manifest, Some(&infra), &config).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structural);

        config.deployment.allow_colocated_seed_nodes = true;
        assert!(run(&manifest, Some(&infra), &config).is_ok());

        // Multi-machine deployments are not restricted.
        assert!(run(&manifest, Some(&infra), &ValidatorConfig::default()).is_ok());
    }

    #[test]
    fn test_scale_min_with_configured_address() {
        let manifest = create_minimal_manifest();
        let infra = nodes(&[("hostA", true), ("hostB", true), ("hostA", false)]);
        let mut config = ValidatorConfig::default();
        config.deployment.mode = DeploymentMode::ScaleMin;
        config.deployment.machine_address = Some("hostA".to_string());
        assert!(run(&manifest, Some(&infra), &config).is_ok());
    }

    #[test]
    fn test_expected_cluster_size() {
        let infra = nodes(&[("a", true), ("b", false), ("c", false)]);
        for (value, ok) in [("3", true), ("1", true), ("4", false), ("0", false), ("-1", false), ("3x", false)] {
            let mut manifest = create_minimal_manifest();
            manifest
                .settings
                .set("FailoverManager", Parameter::new("ExpectedClusterSize", value));
            assert_eq!(
                run(&manifest, Some(&infra), &ValidatorConfig::default()).is_ok(),
                ok,
                "ExpectedClusterSize={}",
                value
            );
        }
    }

    #[test]
    fn test_required_security_parameters() {
        let mut manifest = create_minimal_manifest();
        manifest.settings.remove("Security", "ServerAuthCredentialType");
        let err = run(&manifest, None, &ValidatorConfig::default()).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Structural);
        assert_eq!(
            err.to_string(),
            "Section 'Security', parameter 'ServerAuthCredentialType': Parameter ServerAuthCredentialType in section Security is required."
        );
    }
}
