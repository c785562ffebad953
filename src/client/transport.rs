//! HTTPS transport construction.
//!
//! Builds the single `reqwest::Client` a session uses for every backend call,
//! applying custom trust roots, an optional mutual-TLS identity and the
//! insecure override.

use std::path::{Path, PathBuf};
use std::time::Duration;

use reqwest::{Certificate, Client, Identity};
use tracing::{debug, warn};

use crate::config::{ClientAuth, TlsConfig};
use crate::errors::{Result, TlsError};

const USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// Build the HTTPS client described by `tls`.
///
/// A CA file takes precedence over a CA directory; when either is present the
/// built-in roots are disabled so only the configured pool is trusted.
pub fn build_http_client(tls: &TlsConfig, timeout: Duration) -> Result<Client> {
    let identity = tls.client_identity()?.map(load_identity).transpose()?;

    let mut builder = Client::builder().timeout(timeout).user_agent(USER_AGENT);

    if let Some(roots) = load_trust_roots(tls)? {
        debug!(certificates = roots.len(), "Using configured CA trust pool");
        builder = builder.tls_built_in_root_certs(false);
        for root in roots {
            builder = builder.add_root_certificate(root);
        }
    }

    if let Some(identity) = identity {
        builder = builder.identity(identity);
    }

    if tls.skip_tls_verify {
        warn!("TLS certificate verification disabled for backend connections");
        builder = builder.danger_accept_invalid_certs(true);
    }

    builder.build().map_err(|e| TlsError::ClientBuild(e).into())
}

/// Certificates to trust instead of the system roots, if any are configured.
pub fn load_trust_roots(tls: &TlsConfig) -> Result<Option<Vec<Certificate>>> {
    if let Some(ref file) = tls.ca_cert_file {
        return Ok(Some(load_pem_bundle(file)?));
    }

    if let Some(ref dir) = tls.ca_cert_dir {
        return Ok(Some(load_pem_dir(dir)?));
    }

    Ok(None)
}

fn load_pem_bundle(path: &Path) -> std::result::Result<Vec<Certificate>, TlsError> {
    let pem = std::fs::read(path).map_err(|source| TlsError::CaCertificateReadError {
        path: path.to_path_buf(),
        source,
    })?;

    let certificates = Certificate::from_pem_bundle(&pem).map_err(|source| {
        TlsError::InvalidCertificatePem { path: path.to_path_buf(), source }
    })?;

    if certificates.is_empty() {
        return Err(TlsError::EmptyCertificateBundle { path: path.to_path_buf() });
    }

    Ok(certificates)
}

fn load_pem_dir(dir: &Path) -> std::result::Result<Vec<Certificate>, TlsError> {
    let dir_error = |source| TlsError::CaDirectoryReadError { path: dir.to_path_buf(), source };

    let mut files: Vec<PathBuf> = Vec::new();
    for entry in std::fs::read_dir(dir).map_err(dir_error)? {
        let path = entry.map_err(dir_error)?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    let mut certificates = Vec::new();
    for file in &files {
        certificates.extend(load_pem_bundle(file)?);
    }

    if certificates.is_empty() {
        return Err(TlsError::EmptyCertificateBundle { path: dir.to_path_buf() });
    }

    Ok(certificates)
}

fn load_identity(auth: &ClientAuth) -> std::result::Result<Identity, TlsError> {
    let mut pem = std::fs::read(&auth.cert_file).map_err(|source| {
        TlsError::CertificateReadError { path: auth.cert_file.clone(), source }
    })?;
    let key = std::fs::read(&auth.key_file).map_err(|source| TlsError::PrivateKeyReadError {
        path: auth.key_file.clone(),
        source,
    })?;

    pem.push(b'\n');
    pem.extend_from_slice(&key);

    Identity::from_pem(&pem).map_err(|source| TlsError::InvalidClientIdentity {
        cert_path: auth.cert_file.clone(),
        key_path: auth.key_file.clone(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::Error;

    #[test]
    fn test_default_transport_builds() {
        assert!(build_http_client(&TlsConfig::default(), Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_insecure_transport_builds() {
        let tls = TlsConfig { skip_tls_verify: true, ..TlsConfig::default() };
        assert!(build_http_client(&tls, Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn test_no_roots_configured() {
        assert!(load_trust_roots(&TlsConfig::default()).unwrap().is_none());
    }

    #[test]
    fn test_missing_ca_file_is_configuration_error() {
        let tls = TlsConfig {
            ca_cert_file: Some(PathBuf::from("/nonexistent/ca.pem")),
            ..TlsConfig::default()
        };
        let err = build_http_client(&tls, Duration::from_secs(5)).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
        assert!(err.to_string().contains("/nonexistent/ca.pem"));
    }

    #[test]
    fn test_duplicate_client_auth_fails_before_io() {
        let auth = ClientAuth { cert_file: "/a.pem".into(), key_file: "/a-key.pem".into() };
        let tls = TlsConfig { client_auth: vec![auth.clone(), auth], ..TlsConfig::default() };
        let err = build_http_client(&tls, Duration::from_secs(5)).unwrap_err();
        assert!(err.to_string().contains("client auth block may appear only once"));
    }
}
