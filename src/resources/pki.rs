//! PKI certificate resource (`immutability_ssl`).
//!
//! Issues an X.509 certificate from the organization's PKI role and revokes it
//! by serial number on destroy. The private key is only available in the
//! issuance response.

use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::{debug, error, info, Instrument};

use crate::client::{SecretResponse, Session};
use crate::errors::{Error, Operation, Result};
use crate::lifecycle_span;
use crate::paths;
use crate::provider::{AttributeBag, ResourceHandler};
use crate::secrets::SecretString;

pub const RESOURCE_TYPE: &str = "immutability_ssl";

/// PKI mount used when the caller does not name one.
pub const DEFAULT_PKI_MOUNT: &str = "vault_intermediate";

/// Caller-supplied certificate attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateConfig {
    pub common_name: String,
    /// PKI mount path
    pub mount_path: String,
    /// Comma-delimited DNS subject alternative names
    pub alt_names: Option<String>,
    /// Comma-delimited IP subject alternative names
    pub ip_sans: Option<String>,
    /// Requested TTL, e.g. "8760h"
    pub ttl: Option<String>,
}

impl CertificateConfig {
    pub fn new(common_name: impl Into<String>) -> Self {
        Self {
            common_name: common_name.into(),
            mount_path: DEFAULT_PKI_MOUNT.to_string(),
            alt_names: None,
            ip_sans: None,
            ttl: None,
        }
    }

    pub fn from_attributes(bag: &dyn AttributeBag) -> Result<Self> {
        let optional = |name: &str| -> Result<Option<String>> {
            Ok(bag.get_str(name)?.map(str::to_string))
        };

        Ok(Self {
            common_name: bag.require_str("common_name")?.to_string(),
            mount_path: optional("path")?.unwrap_or_else(|| DEFAULT_PKI_MOUNT.to_string()),
            alt_names: optional("alt_names")?,
            ip_sans: optional("ip_sans")?,
            ttl: optional("ttl")?,
        })
    }

    /// Issuance request body; optional fields are sent only when non-empty.
    pub fn issue_request(&self) -> Value {
        let mut body = Map::new();
        body.insert("common_name".to_string(), Value::String(self.common_name.clone()));

        let optional = [("alt_names", &self.alt_names), ("ip_sans", &self.ip_sans), ("ttl", &self.ttl)];
        for (name, value) in optional {
            if let Some(value) = value.as_deref().filter(|v| !v.is_empty()) {
                body.insert(name.to_string(), Value::String(value.to_string()));
            }
        }

        Value::Object(body)
    }
}

/// Material returned by a successful issuance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CertificateCredential {
    /// Serial number; the resource identity and the revocation key
    pub serial_number: String,
    pub certificate: String,
    pub private_key: SecretString,
    pub issuing_ca: String,
    pub private_key_type: String,
}

impl CertificateCredential {
    fn from_response(response: &SecretResponse, issue_path: &str) -> Result<Self> {
        let required = |field: &str| {
            response
                .data_str(field)
                .map(str::to_string)
                .ok_or_else(|| Error::credential_lookup(Operation::Write, issue_path, field))
        };
        let optional = |field: &str| response.data_str(field).unwrap_or_default().to_string();

        Ok(Self {
            serial_number: required("serial_number")?,
            certificate: required("certificate")?,
            private_key: SecretString::new(required("private_key")?),
            issuing_ca: optional("issuing_ca"),
            private_key_type: optional("private_key_type"),
        })
    }

    pub fn write_to(&self, bag: &mut dyn AttributeBag) {
        bag.set_id(&self.serial_number);
        bag.set("certificate", self.certificate.clone().into());
        bag.set("private_key", self.private_key.expose_secret().into());
        bag.set("issuing_ca", self.issuing_ca.clone().into());
        bag.set("private_key_type", self.private_key_type.clone().into());
        bag.set("serial_number", self.serial_number.clone().into());
    }
}

/// Issue a certificate for `config.common_name` from the tenant's PKI role.
pub async fn issue(session: &Session, config: &CertificateConfig) -> Result<CertificateCredential> {
    let issue_path = paths::pki_issue_path(&config.mount_path, &session.tenancy().organization);
    debug!(path = %issue_path, common_name = %config.common_name, ttl = ?config.ttl, "Issuing certificate");

    let response = session
        .write(&issue_path, &config.issue_request())
        .await
        .inspect_err(|e| error!(error = %e, path = %issue_path, "Certificate issuance failed"))?
        .ok_or_else(|| Error::credential_lookup(Operation::Write, &issue_path, "serial_number"))?;

    let credential = CertificateCredential::from_response(&response, &issue_path)?;

    info!(
        common_name = %config.common_name,
        serial_number = %credential.serial_number,
        mount = %config.mount_path,
        "Issued certificate"
    );

    Ok(credential)
}

/// Revoke the certificate with `serial_number` and return the backend's
/// revocation time, when it reports one.
pub async fn revoke(session: &Session, mount_path: &str, serial_number: &str) -> Result<Option<i64>> {
    let revoke_path = paths::pki_revoke_path(mount_path);
    let response = session
        .revoke(&revoke_path, &json!({ "serial_number": serial_number }))
        .await
        .inspect_err(|e| {
            error!(error = %e, serial_number = %serial_number, "Certificate revocation failed")
        })?;

    let revocation_time = response.as_ref().and_then(|r| r.data_i64("revocation_time"));
    info!(serial_number = %serial_number, revocation_time = ?revocation_time, "Revoked certificate");

    Ok(revocation_time)
}

/// Lifecycle handler for certificate resources.
#[derive(Debug, Default, Clone, Copy)]
pub struct CertificateResource;

#[async_trait]
impl ResourceHandler for CertificateResource {
    fn type_name(&self) -> &'static str {
        RESOURCE_TYPE
    }

    async fn create(&self, bag: &mut dyn AttributeBag, session: &Session) -> Result<()> {
        let config = CertificateConfig::from_attributes(bag)?;
        let credential = issue(session, &config)
            .instrument(lifecycle_span!(RESOURCE_TYPE, "create", common_name = %config.common_name))
            .await?;
        credential.write_to(bag);
        Ok(())
    }

    /// Issued material cannot be fetched again; recorded state is authoritative.
    async fn read(&self, _bag: &mut dyn AttributeBag, _session: &Session) -> Result<()> {
        Ok(())
    }

    async fn delete(&self, bag: &mut dyn AttributeBag, session: &Session) -> Result<()> {
        let serial_number = match bag.id().filter(|id| !id.is_empty()) {
            Some(id) => id.to_string(),
            None => bag
                .get_str("serial_number")?
                .map(str::to_string)
                .ok_or_else(|| Error::config("certificate resource has no recorded serial number"))?,
        };
        let mount_path = bag.get_str("path")?.unwrap_or(DEFAULT_PKI_MOUNT).to_string();

        let revocation_time = revoke(session, &mount_path, &serial_number)
            .instrument(lifecycle_span!(RESOURCE_TYPE, "delete", serial_number = %serial_number))
            .await?;

        if let Some(revocation_time) = revocation_time {
            bag.set("revocation_time", revocation_time.into());
        }
        Ok(())
    }
}
