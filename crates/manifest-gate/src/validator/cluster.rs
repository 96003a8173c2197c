//! Cluster-wide settings: votes, health policy and inter-parameter dependencies.

use crate::error::ValidationError;
use crate::rules::RuleContext;

use super::security::node_type_section;

pub const APPLICATION_TYPE_HEALTH_PREFIX: &str = "ApplicationTypeMaxPercentUnhealthyApplications-";

const SQL_VOTE_TYPE: &str = "SQL";

/// What an enabled setting pulls in.
enum Requirement {
    Parameter(&'static str, &'static str),
    NodeCertificate(&'static str),
}

struct Dependency {
    section: &'static str,
    parameter: &'static str,
    when: &'static str,
    requires: &'static [Requirement],
}

const DEPENDENCIES: &[Dependency] = &[
    Dependency {
        section: "Hosting",
        parameter: "NTLMAuthenticationEnabled",
        when: "true",
        requires: &[Requirement::Parameter("Hosting", "NTLMAuthenticationPasswordSecret")],
    },
    Dependency {
        section: "Security",
        parameter: "ServerAuthCredentialType",
        when: "X509",
        requires: &[
            Requirement::NodeCertificate("ServerAuth"),
            Requirement::NodeCertificate("ClientAuth"),
        ],
    },
    Dependency {
        section: "Security",
        parameter: "ClusterCredentialType",
        when: "X509",
        requires: &[Requirement::NodeCertificate("Cluster")],
    },
    Dependency {
        section: "DiagnosticFileStore",
        parameter: "IsEnabled",
        when: "true",
        requires: &[Requirement::Parameter("DiagnosticFileStore", "StoreConnectionString")],
    },
    Dependency {
        section: "DiagnosticTableStore",
        parameter: "IsEnabled",
        when: "true",
        requires: &[Requirement::Parameter("DiagnosticTableStore", "StoreConnectionString")],
    },
];

/// Every vote is `SQL,<connection string>`.
pub fn check_votes(ctx: &RuleContext<'_>) -> Result<(), ValidationError> {
    let Some(section) = ctx.settings().section(ctx.section()) else {
        return Ok(());
    };
    for parameter in section.parameters() {
        let (vote_type, connection) = parameter
            .value
            .split_once(',')
            .unwrap_or((parameter.value.as_str(), ""));
        if !vote_type.trim().eq_ignore_ascii_case(SQL_VOTE_TYPE) {
            return Err(ctx.range_error(
                &parameter.name,
                format!(
                    "Vote type '{}' is not supported; only {} votes are allowed",
                    vote_type.trim(),
                    SQL_VOTE_TYPE
                ),
            ));
        }
        if connection.trim().is_empty() {
            return Err(ctx.range_error(&parameter.name, "SQL vote requires a connection string"));
        }
    }
    Ok(())
}

pub fn check_dependencies(ctx: &RuleContext<'_>) -> Result<(), ValidationError> {
    for dependency in DEPENDENCIES {
        let source = ctx.for_section(dependency.section);
        let enabled = source
            .value(dependency.parameter)
            .is_some_and(|v| v.trim().eq_ignore_ascii_case(dependency.when));
        if !enabled {
            continue;
        }

        let because = format!(
            "required when {}/{} is {}",
            dependency.section, dependency.parameter, dependency.when
        );
        for requirement in dependency.requires {
            match requirement {
                Requirement::Parameter(section, parameter) => {
                    if !ctx.for_section(section).is_set(parameter) {
                        return Err(ValidationError::cross(
                            *section,
                            *parameter,
                            format!("Parameter {} in section {} is {}.", parameter, section, because),
                        ));
                    }
                }
                Requirement::NodeCertificate(role) => {
                    for node_type in &ctx.manifest().node_types {
                        let present = node_type
                            .certificates
                            .by_role()
                            .into_iter()
                            .any(|(r, cert)| r == *role && cert.is_some());
                        if !present {
                            return Err(ValidationError::cross(
                                node_type_section(&node_type.name),
                                format!("{}Certificate", role),
                                format!("{} certificate is {}.", role, because),
                            ));
                        }
                    }
                }
            }
        }
    }
    Ok(())
}
