use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::errors::TlsError;

/// Client certificate and key used for mutual TLS against the backend.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientAuth {
    pub cert_file: PathBuf,
    pub key_file: PathBuf,
}

/// TLS trust and identity settings for the backend transport.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TlsConfig {
    /// PEM bundle replacing the system trust roots
    #[serde(default)]
    pub ca_cert_file: Option<PathBuf>,

    /// Directory of PEM files replacing the system trust roots (ignored when
    /// `ca_cert_file` is set)
    #[serde(default)]
    pub ca_cert_dir: Option<PathBuf>,

    /// Client auth blocks as supplied by the caller. At most one is accepted.
    #[serde(default)]
    pub client_auth: Vec<ClientAuth>,

    /// Accept any server certificate. Development backends only.
    #[serde(default)]
    pub skip_tls_verify: bool,
}

impl TlsConfig {
    /// Load TLS settings through a variable lookup (`VAULT_CACERT`,
    /// `VAULT_CAPATH`, `VAULT_CLIENT_CERT`, `VAULT_CLIENT_KEY`,
    /// `VAULT_SKIP_VERIFY`).
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let path = |name: &str| {
            lookup(name)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
                .map(PathBuf::from)
        };

        let client_auth = match (path("VAULT_CLIENT_CERT"), path("VAULT_CLIENT_KEY")) {
            (None, None) => Vec::new(),
            (cert_file, key_file) => vec![ClientAuth {
                cert_file: cert_file.unwrap_or_default(),
                key_file: key_file.unwrap_or_default(),
            }],
        };

        Self {
            ca_cert_file: path("VAULT_CACERT"),
            ca_cert_dir: path("VAULT_CAPATH"),
            client_auth,
            skip_tls_verify: lookup("VAULT_SKIP_VERIFY").map(|v| parse_flag(&v)).unwrap_or(false),
        }
    }

    /// The single client identity to present, if any.
    ///
    /// Fails when more than one block was supplied or when a block is missing
    /// the certificate path, the key path, or both.
    pub fn client_identity(&self) -> Result<Option<&ClientAuth>, TlsError> {
        match self.client_auth.as_slice() {
            [] => Ok(None),
            [auth] => {
                if auth.cert_file.as_os_str().is_empty() || auth.key_file.as_os_str().is_empty() {
                    return Err(TlsError::IncompleteClientAuth);
                }
                Ok(Some(auth))
            }
            _ => Err(TlsError::DuplicateClientAuth),
        }
    }
}

pub(crate) fn parse_flag(value: &str) -> bool {
    matches!(value.trim().to_lowercase().as_str(), "1" | "true" | "yes" | "on")
}
