//! Authenticated backend session.
//!
//! A [`Session`] is built once by Configure and then only read. It owns the
//! configured HTTPS transport, the session token and the tenancy context, and
//! exposes the two primitive backend operations every controller is written
//! in terms of: a logical read and a logical write.
//!
//! # Wire format
//!
//! - read: `GET <address>/v1/<path>`
//! - write: `POST <address>/v1/<path>` with a JSON object body
//! - the token is presented as `X-Vault-Token` on every call
//! - a 404 on read, or a 204/empty body on either, means "no object"

pub mod transport;

use std::fmt;
use std::time::Duration;

use reqwest::{Client, Method, StatusCode};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use crate::auth::{self, AuthMethod};
use crate::config::{ProviderConfig, TenancyContext};
use crate::errors::{Error, Operation, Result};
use crate::paths;
use crate::secrets::SecretString;

pub use transport::build_http_client;

/// Header carrying the session token.
pub const TOKEN_HEADER: &str = "X-Vault-Token";

/// Envelope returned by backend logical reads and writes.
#[derive(Clone, Default, Deserialize)]
pub struct SecretResponse {
    #[serde(default)]
    pub request_id: String,

    #[serde(default)]
    pub lease_id: String,

    #[serde(default)]
    pub renewable: bool,

    #[serde(default)]
    pub lease_duration: i64,

    #[serde(default)]
    pub data: Option<Map<String, Value>>,

    #[serde(default)]
    pub warnings: Option<Vec<String>>,
}

impl SecretResponse {
    /// String field from `data`, if present and a string.
    pub fn data_str(&self, field: &str) -> Option<&str> {
        self.data.as_ref()?.get(field)?.as_str()
    }

    /// Integer field from `data`, if present and numeric.
    pub fn data_i64(&self, field: &str) -> Option<i64> {
        self.data.as_ref()?.get(field)?.as_i64()
    }
}

// Only key names are printed; values can be secret material.
impl fmt::Debug for SecretResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let keys: Vec<&str> = self
            .data
            .as_ref()
            .map(|data| data.keys().map(String::as_str).collect())
            .unwrap_or_default();

        f.debug_struct("SecretResponse")
            .field("request_id", &self.request_id)
            .field("lease_id", &self.lease_id)
            .field("renewable", &self.renewable)
            .field("lease_duration", &self.lease_duration)
            .field("data_keys", &keys)
            .field("warnings", &self.warnings)
            .finish()
    }
}

#[derive(Deserialize)]
struct ErrorResponse {
    #[serde(default)]
    errors: Vec<String>,
}

/// Authenticated handle to the backend for one orchestrator run.
///
/// Immutable after construction and cheap to clone; share it by reference
/// across concurrently running controllers.
///
/// Requests go straight through reqwest rather than a typed Vault client.
/// Controllers need the whole lease envelope (request id, lease id and
/// duration, renewable) from arbitrary logical paths, a 404 on read must map
/// to "no object", GitHub login must accept nothing but a 200, and AppRole and
/// PKI paths are tenant-templated mounts no typed endpoint covers.
#[derive(Clone)]
pub struct Session {
    address: String,
    token: SecretString,
    http: Client,
    tenancy: TenancyContext,
    auth_method: AuthMethod,
    request_timeout: Duration,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("address", &self.address)
            .field("token", &self.token)
            .field("tenancy", &self.tenancy)
            .field("auth_method", &self.auth_method)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

impl Session {
    /// Build the transport, authenticate, and return the live session.
    pub async fn establish(config: &ProviderConfig) -> Result<Self> {
        config.validate()?;

        let http = build_http_client(&config.tls, config.request_timeout())?;
        let (token, auth_method) = auth::authenticate(config, &http).await?;

        info!(
            address = %config.address,
            auth_method = %auth_method,
            organization = config.github_org.as_deref().unwrap_or(""),
            namespace_domain = config.namespace_domain.as_deref().unwrap_or(""),
            max_lease_ttl_seconds = config.max_lease_ttl_seconds,
            "Backend session established"
        );

        Ok(Self {
            address: config.address.trim_end_matches('/').to_string(),
            token,
            http,
            tenancy: config.tenancy(),
            auth_method,
            request_timeout: config.request_timeout(),
        })
    }

    /// Assemble a session from already-resolved parts.
    pub fn from_parts(
        address: impl Into<String>,
        token: SecretString,
        http: Client,
        tenancy: TenancyContext,
        auth_method: AuthMethod,
        request_timeout: Duration,
    ) -> Self {
        let address: String = address.into();
        Self {
            address: address.trim_end_matches('/').to_string(),
            token,
            http,
            tenancy,
            auth_method,
            request_timeout,
        }
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn tenancy(&self) -> &TenancyContext {
        &self.tenancy
    }

    pub fn auth_method(&self) -> AuthMethod {
        self.auth_method
    }

    /// Logical read. `Ok(None)` when the backend has no object at `path`.
    pub async fn read(&self, path: &str) -> Result<Option<SecretResponse>> {
        self.send(Operation::Read, Method::GET, path, None).await
    }

    /// Logical write. `Ok(None)` when the backend answers without a body.
    pub async fn write(&self, path: &str, body: &Value) -> Result<Option<SecretResponse>> {
        self.send(Operation::Write, Method::POST, path, Some(body)).await
    }

    /// Logical write issued to revoke a credential; errors are tagged as revoke.
    pub async fn revoke(&self, path: &str, body: &Value) -> Result<Option<SecretResponse>> {
        self.send(Operation::Revoke, Method::POST, path, Some(body)).await
    }

    async fn send(
        &self,
        operation: Operation,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Option<SecretResponse>> {
        let url = paths::api_url(&self.address, path);
        debug!(operation = %operation, method = %method, path = %path, "Backend request");

        let mut request = self
            .http
            .request(method, &url)
            .header(TOKEN_HEADER, self.token.expose_secret())
            .timeout(self.request_timeout);
        if let Some(body) = body {
            request = request.json(body);
        }

        let response =
            request.send().await.map_err(|e| Error::backend_transport(operation, path, e))?;
        let status = response.status();
        debug!(operation = %operation, path = %path, status = status.as_u16(), "Backend response");

        if status == StatusCode::NO_CONTENT
            || (status == StatusCode::NOT_FOUND && operation == Operation::Read)
        {
            return Ok(None);
        }

        let text =
            response.text().await.map_err(|e| Error::backend_transport(operation, path, e))?;

        if !status.is_success() {
            return Err(Error::backend(
                operation,
                path,
                Some(status.as_u16()),
                describe_failure(status, &text),
            ));
        }

        if text.trim().is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&text).map(Some).map_err(|e| Error::BackendRequest {
            operation,
            path: path.to_string(),
            status: Some(status.as_u16()),
            message: format!("malformed response body: {}", e),
            source: Some(Box::new(e)),
        })
    }
}

fn describe_failure(status: StatusCode, body: &str) -> String {
    let errors = serde_json::from_str::<ErrorResponse>(body)
        .map(|parsed| parsed.errors)
        .unwrap_or_default();

    if errors.is_empty() {
        format!("backend returned {}", status)
    } else {
        format!("backend returned {}: {}", status, errors.join("; "))
    }
}
