//! Node type endpoint ports and port ranges.

use std::collections::HashMap;

use crate::error::ValidationError;
use crate::rules::RuleContext;
use crate::value::is_digits_only;

use super::security::node_type_section;

const MAX_PORT: i64 = 65535;

pub fn validate_endpoints(ctx: &RuleContext<'_>) -> Result<(), ValidationError> {
    for node_type in &ctx.manifest().node_types {
        let section = node_type_section(&node_type.name);

        let mut used: HashMap<i64, &str> = HashMap::new();
        for (name, value) in node_type.endpoints.ports() {
            let port = parse_port(&section, name, value)?;
            if let Some(other) = used.insert(port, name) {
                return Err(ValidationError::structural(
                    &section,
                    name,
                    format!("Port {} is already used by {}", port, other),
                ));
            }
        }

        for (start_name, end_name, range) in node_type.endpoints.ranges() {
            let start = parse_port(&section, start_name, &range.start_port)?;
            let end = parse_port(&section, end_name, &range.end_port)?;
            if start > end {
                return Err(ValidationError::range(
                    &section,
                    start_name,
                    format!("{} ({}) must not exceed {} ({})", start_name, start, end_name, end),
                ));
            }
        }
    }

    check_activator_address(&ctx.for_section("FabricHost"))
}

fn parse_port(section: &str, name: &str, value: &str) -> Result<i64, ValidationError> {
    let value = value.trim();
    if !is_digits_only(value) {
        return Err(ValidationError::range(
            section,
            name,
            format!("Invalid port '{}'; digits expected", value),
        ));
    }
    let port: i64 = value
        .parse()
        .map_err(|_| ValidationError::range(section, name, format!("Invalid port '{}'", value)))?;
    if !(1..=MAX_PORT).contains(&port) {
        return Err(ValidationError::range(
            section,
            name,
            format!("Port {} is outside [1, {}]", port, MAX_PORT),
        ));
    }
    Ok(port)
}

/// `FabricHost/ActivatorServiceAddress` is `host:port`.
fn check_activator_address(ctx: &RuleContext<'_>) -> Result<(), ValidationError> {
    let Some(address) = ctx.explicit("ActivatorServiceAddress").map(str::trim) else {
        return Ok(());
    };
    if address.is_empty() {
        return Ok(());
    }
    let Some((host, port)) = address.rsplit_once(':') else {
        return Err(ctx.range_error(
            "ActivatorServiceAddress",
            format!("'{}' is not of the form host:port", address),
        ));
    };
    if host.is_empty() {
        return Err(ctx.range_error(
            "ActivatorServiceAddress",
            format!("'{}' has no host", address),
        ));
    }
    parse_port(ctx.section(), "ActivatorServiceAddress", port).map(|_| ())
}
