//! # Configuration Settings
//!
//! Provider-level configuration: where the backend lives, how to authenticate
//! to it, and how to trust it.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use validator::Validate;

use super::tls::{parse_flag, ClientAuth, TlsConfig};
use crate::errors::{Error, Result};
use crate::provider::AttributeBag;
use crate::secrets::SecretString;

/// Lease TTL hint used when neither the caller nor `TERRAFORM_VAULT_MAX_TTL`
/// provides one.
pub const DEFAULT_MAX_LEASE_TTL_SECONDS: u64 = 1200;

/// Timeout applied to every backend read and write.
pub const DEFAULT_REQUEST_TIMEOUT_SECONDS: u64 = 60;

/// Provider configuration resolved at Configure time.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ProviderConfig {
    /// Root URL of the backend (e.g. "https://vault.example.com:8200")
    #[validate(url(message = "address must be an absolute URL"))]
    pub address: String,

    /// Static session token
    #[serde(default)]
    pub token: Option<SecretString>,

    /// GitHub personal access token exchanged for a session token
    #[serde(default)]
    pub personal_access_token: Option<SecretString>,

    /// GitHub organization; also the tenant segment of every derived path
    #[serde(default)]
    pub github_org: Option<String>,

    /// Namespace domain; the namespace segment of every derived path
    #[serde(default)]
    pub namespace_domain: Option<String>,

    #[serde(default)]
    pub tls: TlsConfig,

    /// Advisory upper bound for leases requested on behalf of the caller
    #[validate(range(min = 1, message = "max_lease_ttl_seconds must be positive"))]
    pub max_lease_ttl_seconds: u64,

    /// Timeout for backend reads and writes
    #[validate(range(
        min = 1,
        max = 600,
        message = "request_timeout_seconds must be between 1 and 600"
    ))]
    pub request_timeout_seconds: u64,
}

impl ProviderConfig {
    /// Minimal configuration for an address, everything else defaulted.
    pub fn new(address: impl Into<String>) -> Self {
        Self {
            address: address.into(),
            token: None,
            personal_access_token: None,
            github_org: None,
            namespace_domain: None,
            tls: TlsConfig::default(),
            max_lease_ttl_seconds: DEFAULT_MAX_LEASE_TTL_SECONDS,
            request_timeout_seconds: DEFAULT_REQUEST_TIMEOUT_SECONDS,
        }
    }

    /// Resolve configuration from the orchestrator's attribute bag, falling
    /// back to the supplied variable lookup for the conventional `VAULT_*`
    /// variables.
    pub fn from_attributes_with<F>(bag: &dyn AttributeBag, lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let env = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());
        let attr_or_env = |attr: &str, var: &str| -> Result<Option<String>> {
            Ok(bag.get_str(attr)?.map(str::to_string).or_else(|| env(var)))
        };

        let address = attr_or_env("address", "VAULT_ADDR")?
            .ok_or_else(|| Error::config("address is required (or set VAULT_ADDR)"))?;

        let env_tls = TlsConfig::from_lookup(&lookup);

        let client_auth = {
            let blocks = bag.get_blocks("client_auth")?;
            if blocks.is_empty() {
                env_tls.client_auth.clone()
            } else {
                blocks
                    .iter()
                    .map(|block| {
                        // Blank entries count as unset so the variables still apply.
                        let field = |name: &str, var: &str| {
                            block
                                .get(name)
                                .filter(|v| !v.trim().is_empty())
                                .cloned()
                                .or_else(|| env(var))
                                .map(PathBuf::from)
                                .unwrap_or_default()
                        };
                        ClientAuth {
                            cert_file: field("cert_file", "VAULT_CLIENT_CERT"),
                            key_file: field("key_file", "VAULT_CLIENT_KEY"),
                        }
                    })
                    .collect()
            }
        };

        let tls = TlsConfig {
            ca_cert_file: bag.get_str("ca_cert_file")?.map(PathBuf::from).or(env_tls.ca_cert_file),
            ca_cert_dir: bag.get_str("ca_cert_dir")?.map(PathBuf::from).or(env_tls.ca_cert_dir),
            client_auth,
            skip_tls_verify: bag.get_bool("skip_tls_verify")?.unwrap_or(env_tls.skip_tls_verify),
        };

        let max_lease_ttl_seconds = match bag.get_int("max_lease_ttl_seconds")? {
            Some(value) => non_negative("max_lease_ttl_seconds", value)?,
            None => match env("TERRAFORM_VAULT_MAX_TTL") {
                Some(raw) => raw.trim().parse().map_err(|e| {
                    Error::config_with_source(
                        format!("invalid TERRAFORM_VAULT_MAX_TTL '{}'", raw),
                        e,
                    )
                })?,
                None => DEFAULT_MAX_LEASE_TTL_SECONDS,
            },
        };

        let request_timeout_seconds = match bag.get_int("request_timeout_seconds")? {
            Some(value) => non_negative("request_timeout_seconds", value)?,
            None => DEFAULT_REQUEST_TIMEOUT_SECONDS,
        };

        let config = Self {
            address,
            token: attr_or_env("token", "VAULT_TOKEN")?.map(SecretString::new),
            personal_access_token: bag.get_str("personal_access_token")?.map(SecretString::new),
            github_org: tenant_segment(bag.get_str("github_org")?),
            namespace_domain: tenant_segment(bag.get_str("namespace_domain")?),
            tls,
            max_lease_ttl_seconds,
            request_timeout_seconds,
        };

        config.validate()?;
        Ok(config)
    }

    /// Resolve configuration from the attribute bag and the process environment.
    pub fn from_attributes(bag: &dyn AttributeBag) -> Result<Self> {
        Self::from_attributes_with(bag, |name| std::env::var(name).ok())
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        Validate::validate(self)?;

        let address = url::Url::parse(&self.address).map_err(|e| {
            Error::config_with_source(format!("invalid address '{}'", self.address), e)
        })?;
        if !matches!(address.scheme(), "http" | "https") {
            return Err(Error::config(format!(
                "address scheme '{}' is not supported, use http or https",
                address.scheme()
            )));
        }

        self.tls.client_identity()?;
        Ok(())
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    /// Organization and namespace as the engine uses them for path derivation.
    ///
    /// Segments are trimmed the same way GitHub login trims them, so the login
    /// mount and every derived path name the same tenant.
    pub fn tenancy(&self) -> TenancyContext {
        let segment = |value: &Option<String>| {
            value.as_deref().map(str::trim).unwrap_or_default().to_string()
        };
        TenancyContext {
            organization: segment(&self.github_org),
            namespace_domain: segment(&self.namespace_domain),
        }
    }
}

fn non_negative(name: &str, value: i64) -> Result<u64> {
    u64::try_from(value).map_err(|_| Error::config(format!("{} must not be negative", name)))
}

fn tenant_segment(value: Option<&str>) -> Option<String> {
    value.map(str::trim).filter(|v| !v.is_empty()).map(str::to_string)
}

/// Tenant scoping shared by every controller for the lifetime of a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenancyContext {
    pub organization: String,
    pub namespace_domain: String,
}

/// Logging configuration for binaries embedding the engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Default filter directive when `RUST_LOG` is unset
    pub log_level: String,

    /// Emit JSON lines instead of human-readable output
    pub json_logging: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self { log_level: "info".to_string(), json_logging: false }
    }
}

impl LoggingConfig {
    /// Load from `IMMUTABILITY_LOG_LEVEL` and `IMMUTABILITY_LOG_JSON`.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            log_level: std::env::var("IMMUTABILITY_LOG_LEVEL").unwrap_or(defaults.log_level),
            json_logging: std::env::var("IMMUTABILITY_LOG_JSON")
                .map(|v| parse_flag(&v))
                .unwrap_or(defaults.json_logging),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::provider::{AttributeValue, MapAttributes};
    use std::collections::{BTreeMap, HashMap};

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> =
            vars.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_address_from_attributes() {
        let bag = MapAttributes::new()
            .with("address", "https://vault.test:8200")
            .with("github_org", "acme")
            .with("namespace_domain", "acme.io");

        let config = ProviderConfig::from_attributes_with(&bag, lookup(&[])).unwrap();
        assert_eq!(config.address, "https://vault.test:8200");
        assert_eq!(config.max_lease_ttl_seconds, DEFAULT_MAX_LEASE_TTL_SECONDS);
        assert_eq!(config.request_timeout(), Duration::from_secs(60));
        assert_eq!(
            config.tenancy(),
            TenancyContext { organization: "acme".into(), namespace_domain: "acme.io".into() }
        );
    }

    #[test]
    fn test_env_fallbacks() {
        let bag = MapAttributes::new();
        let config = ProviderConfig::from_attributes_with(
            &bag,
            lookup(&[
                ("VAULT_ADDR", "https://vault.env:8200"),
                ("VAULT_TOKEN", "s.env"),
                ("VAULT_SKIP_VERIFY", "true"),
                ("TERRAFORM_VAULT_MAX_TTL", "600"),
            ]),
        )
        .unwrap();

        assert_eq!(config.address, "https://vault.env:8200");
        assert_eq!(config.token.as_ref().map(|t| t.expose_secret()), Some("s.env"));
        assert!(config.tls.skip_tls_verify);
        assert_eq!(config.max_lease_ttl_seconds, 600);
    }

    #[test]
    fn test_attributes_override_env() {
        let bag = MapAttributes::new()
            .with("address", "https://vault.attr:8200")
            .with("token", "s.attr")
            .with("skip_tls_verify", false);
        let config = ProviderConfig::from_attributes_with(
            &bag,
            lookup(&[("VAULT_TOKEN", "s.env"), ("VAULT_SKIP_VERIFY", "1")]),
        )
        .unwrap();

        assert_eq!(config.token.as_ref().map(|t| t.expose_secret()), Some("s.attr"));
        assert!(!config.tls.skip_tls_verify);
    }

    #[test]
    fn test_missing_address() {
        let err = ProviderConfig::from_attributes_with(&MapAttributes::new(), lookup(&[]))
            .unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_invalid_address() {
        let bag = MapAttributes::new().with("address", "not a url");
        let err = ProviderConfig::from_attributes_with(&bag, lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("address"));
    }

    #[test]
    fn test_unsupported_address_scheme() {
        let err = ProviderConfig::new("ftp://vault.test").validate().unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert!(err.to_string().contains("scheme 'ftp'"));
    }

    #[test]
    fn test_duplicate_client_auth_blocks() {
        let block: BTreeMap<String, String> = [
            ("cert_file".to_string(), "/c.pem".to_string()),
            ("key_file".to_string(), "/k.pem".to_string()),
        ]
        .into_iter()
        .collect();

        let mut bag = MapAttributes::new().with("address", "https://vault.test:8200");
        bag.values.insert(
            "client_auth".to_string(),
            AttributeValue::Blocks(vec![block.clone(), block]),
        );

        let err = ProviderConfig::from_attributes_with(&bag, lookup(&[])).unwrap_err();
        assert!(err.to_string().contains("client auth block may appear only once"));
    }

    #[test]
    fn test_client_auth_block_falls_back_to_env_paths() {
        let mut bag = MapAttributes::new().with("address", "https://vault.test:8200");
        bag.values.insert("client_auth".to_string(), AttributeValue::Blocks(vec![BTreeMap::new()]));

        let config = ProviderConfig::from_attributes_with(
            &bag,
            lookup(&[("VAULT_CLIENT_CERT", "/env/c.pem"), ("VAULT_CLIENT_KEY", "/env/k.pem")]),
        )
        .unwrap();

        let auth = config.tls.client_identity().unwrap().unwrap();
        assert_eq!(auth.cert_file, PathBuf::from("/env/c.pem"));
        assert_eq!(auth.key_file, PathBuf::from("/env/k.pem"));
    }

    #[test]
    fn test_blank_client_auth_block_falls_back_to_env_paths() {
        let blank: BTreeMap<String, String> = [
            ("cert_file".to_string(), String::new()),
            ("key_file".to_string(), " ".to_string()),
        ]
        .into_iter()
        .collect();
        let mut bag = MapAttributes::new().with("address", "https://vault.test:8200");
        bag.values.insert("client_auth".to_string(), AttributeValue::Blocks(vec![blank]));

        let config = ProviderConfig::from_attributes_with(
            &bag,
            lookup(&[("VAULT_CLIENT_CERT", "/env/c.pem"), ("VAULT_CLIENT_KEY", "/env/k.pem")]),
        )
        .unwrap();
        let auth = config.tls.client_identity().unwrap().unwrap();
        assert_eq!(auth.cert_file, PathBuf::from("/env/c.pem"));
        assert_eq!(auth.key_file, PathBuf::from("/env/k.pem"));

        let err = ProviderConfig::from_attributes_with(&bag, lookup(&[])).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert!(err.to_string().contains("requires both cert_file and key_file"));
    }

    #[test]
    fn test_tenant_segments_are_trimmed() {
        let bag = MapAttributes::new()
            .with("address", "https://vault.test:8200")
            .with("github_org", " acme ")
            .with("namespace_domain", "acme.io\n")
            .with("personal_access_token", "pat123");

        let config = ProviderConfig::from_attributes_with(&bag, lookup(&[])).unwrap();
        assert_eq!(config.github_org.as_deref(), Some("acme"));
        assert_eq!(config.namespace_domain.as_deref(), Some("acme.io"));

        let mut padded = ProviderConfig::new("https://vault.test:8200");
        padded.github_org = Some(" acme ".into());
        padded.namespace_domain = Some(" acme.io".into());
        assert_eq!(padded.tenancy(), config.tenancy());
    }

    #[test]
    fn test_negative_timeout_rejected() {
        let bag = MapAttributes::new()
            .with("address", "https://vault.test:8200")
            .with("request_timeout_seconds", -5i64);
        assert!(ProviderConfig::from_attributes_with(&bag, lookup(&[])).is_err());
    }

    #[test]
    fn test_debug_redacts_tokens() {
        let mut config = ProviderConfig::new("https://vault.test:8200");
        config.token = Some(SecretString::new("s.super-secret"));
        config.personal_access_token = Some(SecretString::new("ghp_secret"));

        let debug = format!("{:?}", config);
        assert!(!debug.contains("s.super-secret"));
        assert!(!debug.contains("ghp_secret"));
    }
}
