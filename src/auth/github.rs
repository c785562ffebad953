//! GitHub federated login.
//!
//! Exchanges a GitHub personal access token for a backend session token with a
//! single POST to the tenant-scoped GitHub auth mount.

use std::time::Duration;

use reqwest::{Client, StatusCode};
use serde::Deserialize;
use serde_json::json;
use tracing::{debug, error};

use crate::errors::{Error, Result};
use crate::paths::{self, GITHUB_AUTH_PROVIDER};
use crate::secrets::SecretString;

/// Upper bound for the whole login round trip.
pub const LOGIN_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Deserialize)]
struct LoginResponse {
    #[serde(default)]
    auth: Option<LoginAuth>,
}

#[derive(Deserialize)]
struct LoginAuth {
    #[serde(default)]
    client_token: Option<SecretString>,
}

/// Log in at `<address>/v1/auth/github/<namespace>/<organization>/login`.
pub async fn login(
    http: &Client,
    address: &str,
    namespace: &str,
    organization: &str,
    personal_access_token: &SecretString,
) -> Result<SecretString> {
    let url = paths::login_url(address, GITHUB_AUTH_PROVIDER, namespace, organization);
    debug!(url = %url, "Attempting GitHub login");

    let response = http
        .post(&url)
        .timeout(LOGIN_TIMEOUT)
        .json(&json!({ "token": personal_access_token.expose_secret() }))
        .send()
        .await
        .map_err(|e| {
            error!(error = %e, url = %url, "GitHub login request failed");
            Error::authentication_with_source(format!("GitHub login request to {} failed", url), e)
        })?;

    let status = response.status();
    if status != StatusCode::OK {
        error!(status = status.as_u16(), url = %url, "GitHub login rejected");
        return Err(Error::authentication_status(
            format!("GitHub login returned status {}", status.as_u16()),
            status.as_u16(),
        ));
    }

    let payload: LoginResponse = response.json().await.map_err(|e| {
        Error::authentication_with_source("GitHub login response could not be parsed", e)
    })?;

    payload
        .auth
        .and_then(|auth| auth.client_token)
        .filter(|token| !token.is_empty())
        .ok_or_else(|| Error::authentication("GitHub login response did not contain a client token"))
}
