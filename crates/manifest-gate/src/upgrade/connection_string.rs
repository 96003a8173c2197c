//! Image store connection strings.
//!
//! Three store kinds are recognized, by prefix:
//! - `xstore:` blob storage, `Key=Value;...` pairs
//! - `file:` a file share path, optionally followed by `;userName=..;password=..`
//! - `fabric:` the cluster-hosted image store service
//!
//! `_default_` stands for the single-machine local store.

use std::fmt;

const XSTORE_PREFIX: &str = "xstore:";
const FILE_PREFIX: &str = "file:";
const FABRIC_PREFIX: &str = "fabric:";
pub const DEFAULT_STORE: &str = "_default_";

/// Credential fields that may rotate without changing which store is addressed.
const XSTORE_CREDENTIAL_KEYS: [&str; 2] = ["AccountKey", "SharedAccessSignature"];

/// Identity fields compared ignoring case.
const XSTORE_CASE_INSENSITIVE_KEYS: [&str; 2] = ["AccountName", "DefaultEndpointsProtocol"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImageStoreConnection {
    Default,
    XStore { fields: Vec<(String, String)> },
    File { path: String, user_name: Option<String>, password: Option<String> },
    Fabric { location: String },
}

impl ImageStoreConnection {
    pub fn parse(value: &str) -> Result<Self, String> {
        let value = value.trim();
        if value.eq_ignore_ascii_case(DEFAULT_STORE) {
            return Ok(Self::Default);
        }
        if let Some(rest) = strip_prefix_ignore_case(value, XSTORE_PREFIX) {
            return parse_xstore(rest);
        }
        if let Some(rest) = strip_prefix_ignore_case(value, FILE_PREFIX) {
            return parse_file(rest);
        }
        if let Some(rest) = strip_prefix_ignore_case(value, FABRIC_PREFIX) {
            if rest.trim().is_empty() {
                return Err("fabric: connection string needs a store location".to_string());
            }
            return Ok(Self::Fabric { location: rest.trim().to_string() });
        }
        Err(format!(
            "Image store connection string must start with {}, {} or {}",
            XSTORE_PREFIX, FILE_PREFIX, FABRIC_PREFIX
        ))
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Default => DEFAULT_STORE,
            Self::XStore { .. } => "xstore",
            Self::File { .. } => "file",
            Self::Fabric { .. } => "fabric",
        }
    }

    /// A field of an xstore connection, case-insensitive on the key.
    pub fn xstore_field(&self, key: &str) -> Option<&str> {
        match self {
            Self::XStore { fields } => fields
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(key))
                .map(|(_, v)| v.as_str()),
            _ => None,
        }
    }

    /// Whether both strings address the same store, ignoring rotated credentials.
    pub fn same_store(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Default, Self::Default) => true,
            (Self::XStore { .. }, Self::XStore { .. }) => {
                let identity = |c: &Self| -> Vec<(String, String)> {
                    let mut fields: Vec<(String, String)> = match c {
                        Self::XStore { fields } => fields
                            .iter()
                            .filter(|(k, _)| !XSTORE_CREDENTIAL_KEYS.iter().any(|ck| ck.eq_ignore_ascii_case(k)))
                            .map(|(k, v)| {
                                let case_insensitive =
                                    XSTORE_CASE_INSENSITIVE_KEYS.iter().any(|ik| ik.eq_ignore_ascii_case(k));
                                let v = if case_insensitive { v.to_ascii_lowercase() } else { v.clone() };
                                (k.to_ascii_lowercase(), v)
                            })
                            .collect(),
                        _ => Vec::new(),
                    };
                    fields.sort();
                    fields
                };
                identity(self) == identity(other)
            }
            (
                Self::File { path: a, user_name: ua, .. },
                Self::File { path: b, user_name: ub, .. },
            ) => {
                a.eq_ignore_ascii_case(b)
                    && ua.as_deref().map(str::to_ascii_lowercase) == ub.as_deref().map(str::to_ascii_lowercase)
            }
            (Self::Fabric { location: a }, Self::Fabric { location: b }) => a == b,
            _ => false,
        }
    }
}

impl fmt::Display for ImageStoreConnection {
    /// Renders without credentials.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => write!(f, "{}", DEFAULT_STORE),
            Self::XStore { .. } => write!(
                f,
                "xstore:AccountName={};Container={}",
                self.xstore_field("AccountName").unwrap_or(""),
                self.xstore_field("Container").unwrap_or("")
            ),
            Self::File { path, .. } => write!(f, "file:{}", path),
            Self::Fabric { location } => write!(f, "fabric:{}", location),
        }
    }
}

fn strip_prefix_ignore_case<'a>(value: &'a str, prefix: &str) -> Option<&'a str> {
    if value.len() >= prefix.len()
        && value.is_char_boundary(prefix.len())
        && value[..prefix.len()].eq_ignore_ascii_case(prefix)
    {
        Some(&value[prefix.len()..])
    } else {
        None
    }
}

fn parse_xstore(rest: &str) -> Result<ImageStoreConnection, String> {
    let mut fields: Vec<(String, String)> = Vec::new();
    for pair in rest.split(';').map(str::trim).filter(|p| !p.is_empty()) {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| format!("xstore: field '{}' is not Key=Value", pair))?;
        let key = key.trim();
        if fields.iter().any(|(k, _)| k.eq_ignore_ascii_case(key)) {
            return Err(format!("xstore: field '{}' appears more than once", key));
        }
        fields.push((key.to_string(), value.trim().to_string()));
    }

    let connection = ImageStoreConnection::XStore { fields };
    if missing(connection.xstore_field("Container")) {
        return Err("xstore: connection string needs a Container".to_string());
    }
    if missing(connection.xstore_field("AccountName")) && missing(connection.xstore_field("BlobEndpoint")) {
        return Err("xstore: connection string needs an AccountName or BlobEndpoint".to_string());
    }
    Ok(connection)
}

fn parse_file(rest: &str) -> Result<ImageStoreConnection, String> {
    let mut parts = rest.split(';');
    let path = parts.next().unwrap_or_default().trim();
    if path.is_empty() {
        return Err("file: connection string needs a path".to_string());
    }

    let (mut user_name, mut password) = (None, None);
    for pair in parts.map(str::trim).filter(|p| !p.is_empty()) {
        let (key, value) = pair
            .split_once('=')
            .ok_or_else(|| format!("file: option '{}' is not key=value", pair))?;
        match key.trim() {
            k if k.eq_ignore_ascii_case("userName") => user_name = Some(value.trim().to_string()),
            k if k.eq_ignore_ascii_case("password") => password = Some(value.to_string()),
            k => return Err(format!("file: unknown option '{}'", k)),
        }
    }

    Ok(ImageStoreConnection::File { path: path.to_string(), user_name, password })
}

fn missing(value: Option<&str>) -> bool {
    value.map_or(true, str::is_empty)
}

#[cfg(test)]
mod tests {
    use super::*;

    const XSTORE: &str =
        "xstore:DefaultEndpointsProtocol=https;AccountName=images;AccountKey=k1;Container=store";

    #[test]
    fn test_parse_kinds() {
        assert_eq!(ImageStoreConnection::parse("_DEFAULT_").unwrap(), ImageStoreConnection::Default);
        assert_eq!(ImageStoreConnection::parse(XSTORE).unwrap().kind(), "xstore");
        assert_eq!(
            ImageStoreConnection::parse("fabric:ImageStore").unwrap(),
            ImageStoreConnection::Fabric { location: "ImageStore".to_string() }
        );
        match ImageStoreConnection::parse("file:\\\\share\\images;userName=svc;password=p").unwrap() {
            ImageStoreConnection::File { path, user_name, password } => {
                assert_eq!(path, "\\\\share\\images");
                assert_eq!(user_name.as_deref(), Some("svc"));
                assert_eq!(password.as_deref(), Some("p"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_rejects() {
        for value in [
            "http://images",
            "xstore:AccountName=a",
            "xstore:Container=c",
            "xstore:AccountName=a;Container",
            "file:",
            "file:\\\\share;domain=x",
            "fabric:",
        ] {
            assert!(ImageStoreConnection::parse(value).is_err(), "{} should fail", value);
        }
    }

    #[test]
    fn test_xstore_key_rotation_is_same_store() {
        let a = ImageStoreConnection::parse(XSTORE).unwrap();
        let b = ImageStoreConnection::parse(
            "xstore:accountname=IMAGES;DefaultEndpointsProtocol=HTTPS;Container=store;AccountKey=k2",
        )
        .unwrap();
        assert!(a.same_store(&b));

        let sas = ImageStoreConnection::parse(
            "xstore:DefaultEndpointsProtocol=https;AccountName=images;SharedAccessSignature=sv=1;Container=store",
        )
        .unwrap();
        assert!(a.same_store(&sas));

        let other_container = ImageStoreConnection::parse(
            "xstore:DefaultEndpointsProtocol=https;AccountName=images;AccountKey=k1;Container=other",
        )
        .unwrap();
        assert!(!a.same_store(&other_container));
    }

    #[test]
    fn test_file_and_fabric_identity() {
        let a = ImageStoreConnection::parse("file:\\\\share\\images;userName=svc;password=one").unwrap();
        let b = ImageStoreConnection::parse("file:\\\\SHARE\\images;userName=svc;password=two").unwrap();
        let c = ImageStoreConnection::parse("file:\\\\share\\other").unwrap();
        assert!(a.same_store(&b));
        assert!(!a.same_store(&c));

        let fabric = ImageStoreConnection::parse("fabric:ImageStore").unwrap();
        assert!(!a.same_store(&fabric));
        assert!(fabric.same_store(&ImageStoreConnection::parse("fabric:ImageStore").unwrap()));
    }

    #[test]
    fn test_display_hides_credentials() {
        let a = ImageStoreConnection::parse(XSTORE).unwrap();
        assert_eq!(a.to_string(), "xstore:AccountName=images;Container=store");
    }
}
