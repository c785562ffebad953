//! Shared fixtures for integration tests: a mock backend and sessions bound
//! to it.

#![allow(dead_code)]

use immutability_provider::config::ProviderConfig;
use immutability_provider::provider::MapAttributes;
use immutability_provider::secrets::SecretString;
use immutability_provider::Session;
use wiremock::MockServer;

pub const TOKEN: &str = "tok-test";
pub const ORG: &str = "acme";
pub const NAMESPACE: &str = "acme.io";

/// Start a fresh mock backend.
pub async fn backend() -> MockServer {
    MockServer::start().await
}

/// Provider configuration pointing at `server` with a static token.
pub fn provider_config(server: &MockServer) -> ProviderConfig {
    let mut config = ProviderConfig::new(server.uri());
    config.token = Some(SecretString::new(TOKEN));
    config.github_org = Some(ORG.to_string());
    config.namespace_domain = Some(NAMESPACE.to_string());
    config
}

/// Provider attribute bag equivalent to [`provider_config`].
pub fn provider_attributes(server: &MockServer) -> MapAttributes {
    MapAttributes::new()
        .with("address", server.uri())
        .with("token", TOKEN)
        .with("github_org", ORG)
        .with("namespace_domain", NAMESPACE)
}

/// Session authenticated with the static test token.
pub async fn session(server: &MockServer) -> Session {
    Session::establish(&provider_config(server)).await.expect("establish session")
}
