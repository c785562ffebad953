//! AppRole credential resource (`immutability_approle`).
//!
//! Create reads the role ID of the repository's role and generates a fresh
//! secret ID. The secret ID is returned by the backend exactly once, so Read
//! never goes back to the backend. Delete destroys the recorded secret ID.

use async_trait::async_trait;
use serde_json::json;
use tracing::{error, info, Instrument};

use crate::client::Session;
use crate::errors::{Error, Operation, Result};
use crate::lifecycle_span;
use crate::paths::{self, APPROLE_AUTH_PROVIDER};
use crate::provider::{AttributeBag, ResourceHandler};
use crate::secrets::SecretString;

pub const RESOURCE_TYPE: &str = "immutability_approle";

/// Caller-supplied AppRole attributes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppRoleConfig {
    /// GitHub repository the role belongs to
    pub repository: String,
}

impl AppRoleConfig {
    pub fn from_attributes(bag: &dyn AttributeBag) -> Result<Self> {
        Ok(Self { repository: bag.require_str("repository")?.to_string() })
    }
}

/// AppRole login pair issued for a repository.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppRoleCredential {
    /// Resolved role path; the resource identity
    pub id: String,
    pub repository: String,
    pub role_id: String,
    pub secret_id: SecretString,
    /// Full URL a client logs in against with `role_id` + `secret_id`
    pub auth_path: String,
}

impl AppRoleCredential {
    pub fn write_to(&self, bag: &mut dyn AttributeBag) {
        bag.set_id(&self.id);
        bag.set("role_id", self.role_id.clone().into());
        bag.set("secret_id", self.secret_id.expose_secret().into());
        bag.set("auth_path", self.auth_path.clone().into());
    }
}

/// Read the role ID and generate a new secret ID for `config.repository`.
///
/// Nothing is returned unless both backend calls succeed.
pub async fn issue(session: &Session, config: &AppRoleConfig) -> Result<AppRoleCredential> {
    let tenancy = session.tenancy();
    let role_path = paths::approle_role_path(
        &tenancy.namespace_domain,
        &tenancy.organization,
        &config.repository,
    );

    let role_id_path = paths::approle_role_id_path(&role_path);
    let role_id = session
        .read(&role_id_path)
        .await?
        .and_then(|response| response.data_str("role_id").map(str::to_string))
        .ok_or_else(|| Error::credential_lookup(Operation::Read, &role_id_path, "role_id"))?;

    let secret_id_path = paths::approle_secret_id_path(&role_path);
    let secret_id = session
        .write(&secret_id_path, &json!({}))
        .await?
        .and_then(|response| response.data_str("secret_id").map(SecretString::new))
        .ok_or_else(|| Error::credential_lookup(Operation::Write, &secret_id_path, "secret_id"))?;

    let auth_path = paths::login_url(
        session.address(),
        APPROLE_AUTH_PROVIDER,
        &tenancy.namespace_domain,
        &tenancy.organization,
    );

    info!(path = %role_path, repository = %config.repository, "Issued AppRole secret id");

    Ok(AppRoleCredential {
        id: role_path,
        repository: config.repository.clone(),
        role_id,
        secret_id,
        auth_path,
    })
}

/// Destroy `secret_id` under the role at `role_path`.
pub async fn destroy(session: &Session, role_path: &str, secret_id: &SecretString) -> Result<()> {
    let destroy_path = paths::approle_secret_id_destroy_path(role_path);
    session
        .revoke(&destroy_path, &json!({ "secret_id": secret_id.expose_secret() }))
        .await
        .inspect_err(|e| error!(error = %e, path = %role_path, "Failed to revoke AppRole secret id"))?;

    info!(path = %role_path, "Revoked AppRole secret id");
    Ok(())
}

/// Lifecycle handler for AppRole resources.
#[derive(Debug, Default, Clone, Copy)]
pub struct AppRoleResource;

#[async_trait]
impl ResourceHandler for AppRoleResource {
    fn type_name(&self) -> &'static str {
        RESOURCE_TYPE
    }

    async fn create(&self, bag: &mut dyn AttributeBag, session: &Session) -> Result<()> {
        let config = AppRoleConfig::from_attributes(bag)?;
        let credential = issue(session, &config)
            .instrument(lifecycle_span!(RESOURCE_TYPE, "create", repository = %config.repository))
            .await?;
        credential.write_to(bag);
        Ok(())
    }

    /// Recorded state is authoritative; the backend cannot return the secret
    /// ID again.
    async fn read(&self, _bag: &mut dyn AttributeBag, _session: &Session) -> Result<()> {
        Ok(())
    }

    async fn delete(&self, bag: &mut dyn AttributeBag, session: &Session) -> Result<()> {
        let role_path = bag
            .id()
            .filter(|id| !id.is_empty())
            .ok_or_else(|| Error::config("AppRole resource has no recorded identity"))?
            .to_string();
        let secret_id = bag
            .get_str("secret_id")?
            .map(SecretString::new)
            .ok_or_else(|| Error::config("AppRole resource has no recorded secret_id"))?;

        destroy(session, &role_path, &secret_id)
            .instrument(lifecycle_span!(RESOURCE_TYPE, "delete", path = %role_path))
            .await
    }
}
