//! Encrypted parameter values.
//!
//! A parameter marked `isEncrypted` holds `<keyId>:<hex(nonce || ciphertext)>`,
//! sealed with AES-256-GCM under the named key. The same plaintext sealed
//! under two different keys decrypts to the same value, which is what the
//! diff engine compares.
//!
//! Key material is looked up in order from a direct value, a file, or an
//! environment variable, so keys never have to live in the config file.

use std::fmt;
use std::fmt::Write as _;

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use secrecy::{ExposeSecret, SecretString};

use crate::config::schema::SecretsConfig;

#[derive(Debug, thiserror::Error)]
pub enum SecretError {
    #[error("No secret source provided (need one of: direct value, file path, or env var name)")]
    NoSourceProvided,

    #[error("Failed to read secret from file '{path}': {source}")]
    FileReadError {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Environment variable '{name}' not set")]
    EnvVarNotSet { name: String },

    #[error("Environment variable '{name}' contains invalid UTF-8")]
    EnvVarNotUnicode { name: String },

    #[error("Invalid encryption key '{id}': {reason}")]
    InvalidKey { id: String, reason: String },

    #[error("No key with id '{id}' is configured")]
    UnknownKey { id: String },

    #[error("Encryption error: {0}")]
    EncryptionError(String),

    #[error("Decryption error: {0}")]
    DecryptionError(String),
}

pub type Result<T> = std::result::Result<T, SecretError>;

/// Turns an encrypted parameter value into its plaintext.
pub trait SecretResolver: Send + Sync {
    fn resolve(&self, section: &str, parameter: &str, value: &str) -> Result<SecretString>;
}

/// Returns the first non-empty source: direct value, then file contents,
/// then environment variable. File and environment values are trimmed.
pub fn resolve_secret(
    direct: Option<&str>,
    file_path: Option<&str>,
    env_var: Option<&str>,
) -> Result<SecretString> {
    fn non_empty(s: Option<&str>) -> Option<&str> {
        s.filter(|v| !v.is_empty())
    }

    if let Some(value) = non_empty(direct) {
        return Ok(SecretString::from(value.to_string()));
    }

    if let Some(path) = non_empty(file_path) {
        let expanded = expand_home(path);
        let content = std::fs::read_to_string(&expanded).map_err(|source| {
            SecretError::FileReadError {
                path: expanded.clone(),
                source,
            }
        })?;
        return Ok(SecretString::from(content.trim().to_string()));
    }

    if let Some(name) = non_empty(env_var) {
        return match std::env::var(name) {
            Ok(value) => Ok(SecretString::from(value.trim().to_string())),
            Err(std::env::VarError::NotPresent) => Err(SecretError::EnvVarNotSet {
                name: name.to_string(),
            }),
            Err(std::env::VarError::NotUnicode(_)) => Err(SecretError::EnvVarNotUnicode {
                name: name.to_string(),
            }),
        };
    }

    Err(SecretError::NoSourceProvided)
}

pub fn has_secret_source(
    direct: Option<&str>,
    file_path: Option<&str>,
    env_var: Option<&str>,
) -> bool {
    [direct, file_path, env_var]
        .iter()
        .any(|s| s.is_some_and(|v| !v.is_empty()))
}

/// Expands a leading `~` using HOME, or USERPROFILE on Windows.
fn expand_home(path: &str) -> String {
    let Some(rest) = path.strip_prefix('~') else {
        return path.to_string();
    };
    if !(rest.is_empty() || rest.starts_with('/')) {
        return path.to_string();
    }
    match std::env::var_os("HOME").or_else(|| std::env::var_os("USERPROFILE")) {
        Some(home) => format!("{}{}", home.to_string_lossy(), rest),
        None => path.to_string(),
    }
}

// ============================================
// Keyring
// ============================================

const NONCE_SIZE: usize = 12;
const KEY_SIZE: usize = 32;

/// AES-256-GCM keys indexed by id.
#[derive(Default)]
pub struct Keyring {
    keys: Vec<(String, Aes256Gcm)>,
}

impl fmt::Debug for Keyring {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Keyring")
            .field("key_ids", &self.key_ids())
            .finish()
    }
}

impl Keyring {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a keyring from configuration, resolving each key's material.
    pub fn from_config(config: &SecretsConfig) -> Result<Self> {
        let mut keyring = Self::new();
        for key in &config.keys {
            let material = resolve_secret(
                key.key.as_deref(),
                key.key_file.as_deref(),
                key.key_env_var.as_deref(),
            )?;
            keyring.add_hex_key(&key.id, material.expose_secret())?;
        }
        log::debug!("Keyring loaded with {} keys", keyring.keys.len());
        Ok(keyring)
    }

    /// Adds a key given as 64 hex characters.
    pub fn add_hex_key(&mut self, id: &str, key_hex: &str) -> Result<()> {
        let invalid = |reason: String| SecretError::InvalidKey {
            id: id.to_string(),
            reason,
        };

        if id.is_empty() || id.contains(':') {
            return Err(invalid("key id must be non-empty and cannot contain ':'".to_string()));
        }
        let bytes = hex_decode(key_hex).map_err(invalid)?;
        if bytes.len() != KEY_SIZE {
            return Err(invalid(format!(
                "key must be {} bytes ({} hex chars), got {} bytes",
                KEY_SIZE,
                KEY_SIZE * 2,
                bytes.len()
            )));
        }
        let cipher = Aes256Gcm::new_from_slice(&bytes).map_err(|e| invalid(e.to_string()))?;

        self.keys.retain(|(existing, _)| !existing.eq_ignore_ascii_case(id));
        self.keys.push((id.to_string(), cipher));
        Ok(())
    }

    pub fn key_ids(&self) -> Vec<&str> {
        self.keys.iter().map(|(id, _)| id.as_str()).collect()
    }

    fn cipher(&self, id: &str) -> Result<&Aes256Gcm> {
        self.keys
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(id))
            .map(|(_, cipher)| cipher)
            .ok_or_else(|| SecretError::UnknownKey { id: id.to_string() })
    }

    /// Seals `plaintext` under `key_id`. Every call uses a fresh nonce.
    pub fn encrypt(&self, key_id: &str, plaintext: &str) -> Result<String> {
        let cipher = self.cipher(key_id)?;

        let mut nonce_bytes = [0u8; NONCE_SIZE];
        getrandom::fill(&mut nonce_bytes).map_err(|e| {
            SecretError::EncryptionError(format!("Failed to generate nonce: {}", e))
        })?;

        let sealed = cipher
            .encrypt(Nonce::from_slice(&nonce_bytes), plaintext.as_bytes())
            .map_err(|e| SecretError::EncryptionError(e.to_string()))?;

        let mut payload = nonce_bytes.to_vec();
        payload.extend_from_slice(&sealed);
        Ok(format!("{}:{}", key_id, hex_encode(&payload)))
    }

    pub fn decrypt(&self, value: &str) -> Result<SecretString> {
        let (key_id, payload_hex) = value.split_once(':').ok_or_else(|| {
            SecretError::DecryptionError("expected '<keyId>:<hex payload>'".to_string())
        })?;
        let cipher = self.cipher(key_id)?;

        let payload = hex_decode(payload_hex).map_err(SecretError::DecryptionError)?;
        if payload.len() <= NONCE_SIZE {
            return Err(SecretError::DecryptionError(
                "payload too short".to_string(),
            ));
        }
        let (nonce, sealed) = payload.split_at(NONCE_SIZE);

        let opened = cipher
            .decrypt(Nonce::from_slice(nonce), sealed)
            .map_err(|e| SecretError::DecryptionError(e.to_string()))?;
        let plaintext = String::from_utf8(opened)
            .map_err(|e| SecretError::DecryptionError(format!("Invalid UTF-8: {}", e)))?;
        Ok(SecretString::from(plaintext))
    }
}

impl SecretResolver for Keyring {
    fn resolve(&self, section: &str, parameter: &str, value: &str) -> Result<SecretString> {
        self.decrypt(value).inspect_err(|e| {
            log::debug!(
                "Could not decrypt section '{}', parameter '{}': {}",
                section,
                parameter,
                e
            )
        })
    }
}

fn hex_encode(bytes: &[u8]) -> String {
    bytes
        .iter()
        .fold(String::with_capacity(bytes.len() * 2), |mut out, b| {
            let _ = write!(out, "{:02x}", b);
            out
        })
}

fn hex_decode(hex: &str) -> std::result::Result<Vec<u8>, String> {
    if hex.len() % 2 != 0 || !hex.is_ascii() {
        return Err("hex string must be ASCII with an even length".to_string());
    }
    hex.as_bytes()
        .chunks(2)
        .enumerate()
        .map(|(i, pair)| {
            std::str::from_utf8(pair)
                .ok()
                .and_then(|s| u8::from_str_radix(s, 16).ok())
                .ok_or_else(|| format!("invalid hex at position {}", i * 2))
        })
        .collect()
}
