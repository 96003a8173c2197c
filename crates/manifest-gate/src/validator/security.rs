//! Certificates, accounts and credential settings.

use regex::Regex;
use std::net::IpAddr;
use std::sync::LazyLock;

use crate::error::ValidationError;
use crate::rules::RuleContext;

static RE_DOMAIN_ACCOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\\@\s]+\\[^\\@\s]+$").unwrap());
static RE_UPN_ACCOUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\\@\s]+@[^\\@\s]+$").unwrap());

const THUMBPRINT_HEX_DIGITS: usize = 40;

/// Parameters that may carry `isEncrypted`.
const ENCRYPTABLE: &[(&str, &str)] = &[
    ("Management", "ImageStoreConnectionString"),
    ("Hosting", "NTLMAuthenticationPasswordSecret"),
    ("DiagnosticFileStore", "StoreConnectionString"),
    ("DiagnosticTableStore", "StoreConnectionString"),
    ("FileStoreService", "PrimaryAccountUserPassword"),
    ("FileStoreService", "PrimaryAccountNTLMPasswordSecret"),
    ("FileStoreService", "SecondaryAccountUserPassword"),
    ("FileStoreService", "SecondaryAccountNTLMPasswordSecret"),
    ("RunAs", "RunAsPassword"),
    ("RunAs_Fabric", "RunAsPassword"),
    ("RunAs_DCA", "RunAsPassword"),
    ("RunAs_HttpGateway", "RunAsPassword"),
];

pub fn is_encryptable(section: &str, parameter: &str) -> bool {
    ENCRYPTABLE
        .iter()
        .any(|(s, p)| s.eq_ignore_ascii_case(section) && p.eq_ignore_ascii_case(parameter))
}

/// A thumbprint is either 40 hex digits, or hex pairs separated by single spaces.
pub fn check_thumbprint(value: &str) -> Result<(), String> {
    if let Some(bad) = value.chars().find(|c| !c.is_ascii_hexdigit() && *c != ' ') {
        if bad.is_control() || !bad.is_ascii() || bad.is_ascii_whitespace() {
            return Err(format!(
                "Thumbprint '{}' contains a non-printable character (U+{:04X})",
                value.escape_default(),
                bad as u32
            ));
        }
        return Err(format!("Thumbprint '{}' contains invalid character '{}'", value, bad));
    }

    if value.contains(' ') {
        if value.split(' ').all(|pair| pair.len() == 2) {
            return Ok(());
        }
        return Err(format!(
            "Thumbprint '{}' must use hex pairs separated by single spaces",
            value
        ));
    }

    if value.len() == THUMBPRINT_HEX_DIGITS {
        Ok(())
    } else {
        Err(format!(
            "Thumbprint '{}' must be {} hex digits",
            value, THUMBPRINT_HEX_DIGITS
        ))
    }
}

pub fn check_thumbprint_list(value: &str) -> Result<(), String> {
    value
        .split(',')
        .map(|t| t.trim_matches(' '))
        .filter(|t| !t.is_empty())
        .try_for_each(check_thumbprint)
}

pub fn is_valid_account_name(name: &str) -> bool {
    RE_DOMAIN_ACCOUNT.is_match(name) || RE_UPN_ACCOUNT.is_match(name)
}

pub fn node_type_section(node_type: &str) -> String {
    format!("NodeTypes/{}", node_type)
}

/// Node type certificates found by thumbprint must carry a well-formed thumbprint.
pub fn check_node_certificates(ctx: &RuleContext<'_>) -> Result<(), ValidationError> {
    for node_type in &ctx.manifest().node_types {
        for (role, certificate) in node_type.certificates.by_role() {
            let Some(certificate) = certificate else {
                continue;
            };
            let parameter = format!("{}X509FindValue", role);
            if certificate.find_value.trim().is_empty() {
                return Err(ValidationError::range(
                    node_type_section(&node_type.name),
                    parameter,
                    "Certificate find value cannot be empty",
                ));
            }
            if certificate.is_thumbprint() {
                check_thumbprint(&certificate.find_value).map_err(|message| {
                    ValidationError::range(node_type_section(&node_type.name), &parameter, message)
                })?;
            }
        }
    }
    Ok(())
}

pub fn check_run_as(ctx: &RuleContext<'_>) -> Result<(), ValidationError> {
    let Some(account_type) = ctx.explicit("RunAsAccountType").map(str::trim) else {
        return Ok(());
    };

    let is = |name: &str| account_type.eq_ignore_ascii_case(name);
    let needs_name = is("DomainUser") || is("ManagedServiceAccount");
    let needs_password = is("DomainUser");

    if needs_name {
        match ctx.explicit("RunAsAccountName").map(str::trim) {
            None | Some("") => {
                return Err(ctx.cross_error(
                    "RunAsAccountName",
                    format!("RunAsAccountName is required for account type {}", account_type),
                ))
            }
            Some(name) if !is_valid_account_name(name) => {
                return Err(ctx.range_error(
                    "RunAsAccountName",
                    format!("'{}' is not a valid account name (DOMAIN\\user or user@domain)", name),
                ))
            }
            Some(_) => {}
        }
    }

    let has_password = ctx.is_set("RunAsPassword");
    if needs_password && !has_password {
        return Err(ctx.cross_error(
            "RunAsPassword",
            format!("RunAsPassword is required for account type {}", account_type),
        ));
    }
    if !needs_password && has_password {
        return Err(ctx.cross_error(
            "RunAsPassword",
            format!("RunAsPassword is only allowed for DomainUser, not {}", account_type),
        ));
    }
    Ok(())
}

pub fn check_client_claims(ctx: &RuleContext<'_>) -> Result<(), ValidationError> {
    if !ctx.flag("ClientClaimAuthEnabled") {
        return Ok(());
    }
    let server = ctx.value("ServerAuthCredentialType").unwrap_or_default();
    if !server.trim().eq_ignore_ascii_case("X509") {
        return Err(ctx.cross_error(
            "ClientClaimAuthEnabled",
            "ClientClaimAuthEnabled requires ServerAuthCredentialType to be X509",
        ));
    }
    for name in ["ClientClaims", "AdminClientClaims"] {
        if !ctx.is_set(name) {
            return Err(ctx.cross_error(
                name,
                format!("{} is required when ClientClaimAuthEnabled is true", name),
            ));
        }
    }
    Ok(())
}

/// Windows cluster credentials with fabric running as a machine account
/// need node addresses that resolve to machine identities, not raw IPs.
pub fn check_windows_identity(ctx: &RuleContext<'_>) -> Result<(), ValidationError> {
    let security = ctx.for_section("Security");
    let credential = security.value("ClusterCredentialType").unwrap_or_default();
    if !credential.trim().eq_ignore_ascii_case("Windows") {
        return Ok(());
    }
    let Some(nodes) = ctx.infrastructure() else {
        return Ok(());
    };

    let fabric_account = ctx
        .for_section("RunAs_Fabric")
        .explicit("RunAsAccountType")
        .map(str::trim)
        .unwrap_or("NetworkService");
    let machine_account = ["NetworkService", "LocalSystem"]
        .iter()
        .any(|a| a.eq_ignore_ascii_case(fabric_account));
    if !machine_account {
        return Ok(());
    }

    for node in nodes {
        if node.ip_address_or_fqdn.parse::<IpAddr>().is_ok() {
            return Err(ValidationError::structural(
                "Infrastructure",
                &node.node_name,
                format!(
                    "IP address {} cannot be used with Windows cluster credentials while fabric runs as {}; use a machine name",
                    node.ip_address_or_fqdn, fabric_account
                ),
            ));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_thumbprint_forms() {
        assert!(check_thumbprint("0123456789abcdef0123456789ABCDEF01234567").is_ok());
        assert!(check_thumbprint("01 23 45 67 89 ab cd ef").is_ok());
        assert!(check_thumbprint("0123").is_err());
        assert!(check_thumbprint("01  23").is_err());
        assert!(check_thumbprint("012 345").is_err());
        assert!(check_thumbprint("0123456789abcdef0123456789abcdef0123456g").is_err());
    }

    #[test]
    fn test_thumbprint_non_printable() {
        let err = check_thumbprint("\u{200e}0123456789abcdef0123456789abcdef01234567").unwrap_err();
        assert!(err.contains("non-printable"));
        let err = check_thumbprint("01\t23").unwrap_err();
        assert!(err.contains("non-printable"));
    }

    #[test]
    fn test_thumbprint_list() {
        let good = "0123456789abcdef0123456789abcdef01234567, 89ab89ab89ab89ab89ab89ab89ab89ab89ab89ab";
        assert!(check_thumbprint_list(good).is_ok());
        assert!(check_thumbprint_list("").is_ok());
        assert!(check_thumbprint_list("0123456789abcdef0123456789abcdef01234567,zz").is_err());
    }

    #[test]
    fn test_account_names() {
        assert!(is_valid_account_name("CONTOSO\\svc-fabric"));
        assert!(is_valid_account_name("svc@contoso.com"));
        assert!(!is_valid_account_name("svc-fabric"));
        assert!(!is_valid_account_name("CONTOSO\\"));
        assert!(!is_valid_account_name("a b\\c"));
    }

    #[test]
    fn test_encryptable() {
        assert!(is_encryptable("management", "imagestoreconnectionstring"));
        assert!(is_encryptable("RunAs_DCA", "RunAsPassword"));
        assert!(!is_encryptable("Setup", "FabricDataRoot"));
    }
}
