//! # Session Authentication
//!
//! Produces the backend session token used for the remainder of a run.
//!
//! Two paths exist:
//!
//! - **Static token**: the configured token is used verbatim, no network call.
//! - **GitHub login**: when a personal access token is configured it is
//!   exchanged for a session token (see [`github::login`]). This path wins over
//!   a static token when both are present.
//!
//! Neither path producing a non-empty token is a configuration error.

pub mod github;

use std::fmt;

use reqwest::Client;
use serde::Serialize;
use tracing::{debug, error};

use crate::config::ProviderConfig;
use crate::errors::{Error, Result};
use crate::secrets::SecretString;

/// How the session token was obtained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    Token,
    Github,
}

impl fmt::Display for AuthMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthMethod::Token => write!(f, "token"),
            AuthMethod::Github => write!(f, "github"),
        }
    }
}

/// Credentials selected from the provider configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials<'a> {
    Static(&'a SecretString),
    Github { personal_access_token: &'a SecretString, organization: &'a str, namespace: &'a str },
}

/// Decide which authentication path applies.
pub fn select_credentials(config: &ProviderConfig) -> Result<Credentials<'_>> {
    if let Some(pat) = config.personal_access_token.as_ref().filter(|t| !t.is_empty()) {
        return match (non_empty(&config.github_org), non_empty(&config.namespace_domain)) {
            (Some(organization), Some(namespace)) => {
                Ok(Credentials::Github { personal_access_token: pat, organization, namespace })
            }
            _ => Err(Error::config(
                "missing personal_access_token, github_org or namespace_domain for GitHub login",
            )),
        };
    }

    match config.token.as_ref().filter(|t| !t.is_empty()) {
        Some(token) => Ok(Credentials::Static(token)),
        None => Err(Error::config("no authentication token was supplied")),
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Resolve the session token for `config` using the configured transport.
pub async fn authenticate(
    config: &ProviderConfig,
    http: &Client,
) -> Result<(SecretString, AuthMethod)> {
    match select_credentials(config)? {
        Credentials::Static(token) => {
            debug!("Using static backend token");
            Ok((token.clone(), AuthMethod::Token))
        }
        Credentials::Github { personal_access_token, organization, namespace } => {
            debug!(organization = %organization, namespace = %namespace, "Using GitHub login");
            let token = github::login(
                http,
                &config.address,
                namespace,
                organization,
                personal_access_token,
            )
            .await
            .inspect_err(|e| error!(error = %e, "GitHub login failed"))?;
            Ok((token, AuthMethod::Github))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> ProviderConfig {
        ProviderConfig::new("https://vault.test:8200")
    }

    #[test]
    fn test_static_token_selected() {
        let mut config = config();
        config.token = Some(SecretString::new("s.static"));

        match select_credentials(&config).unwrap() {
            Credentials::Static(token) => assert_eq!(token.expose_secret(), "s.static"),
            other => panic!("unexpected credentials: {:?}", other),
        }
    }

    #[test]
    fn test_github_wins_over_static_token() {
        let mut config = config();
        config.token = Some(SecretString::new("s.static"));
        config.personal_access_token = Some(SecretString::new("pat123"));
        config.github_org = Some("acme".into());
        config.namespace_domain = Some("acme.io".into());

        assert!(matches!(
            select_credentials(&config).unwrap(),
            Credentials::Github { organization: "acme", namespace: "acme.io", .. }
        ));
    }

    #[test]
    fn test_incomplete_github_config_is_rejected() {
        let mut config = config();
        config.token = Some(SecretString::new("s.static"));
        config.personal_access_token = Some(SecretString::new("pat123"));
        config.github_org = Some("acme".into());

        let err = select_credentials(&config).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_no_token_supplied() {
        let mut config = config();
        config.token = Some(SecretString::new(""));

        let err = select_credentials(&config).unwrap_err();
        assert_eq!(err.to_string(), "Configuration error: no authentication token was supplied");
    }

    #[test]
    fn test_auth_method_display() {
        assert_eq!(AuthMethod::Token.to_string(), "token");
        assert_eq!(AuthMethod::Github.to_string(), "github");
    }
}
