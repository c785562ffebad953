//! Session authentication against a mock backend.

mod common;

use common::{NAMESPACE, ORG};
use immutability_provider::auth::AuthMethod;
use immutability_provider::config::ProviderConfig;
use immutability_provider::errors::Error;
use immutability_provider::provider::{MapAttributes, Provider};
use immutability_provider::secrets::SecretString;
use immutability_provider::Session;
use serde_json::json;
use wiremock::matchers::{any, body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const LOGIN_PATH: &str = "/v1/auth/github/acme.io/acme/login";

fn github_config(server: &MockServer) -> ProviderConfig {
    let mut config = ProviderConfig::new(server.uri());
    config.personal_access_token = Some(SecretString::new("pat123"));
    config.github_org = Some(ORG.to_string());
    config.namespace_domain = Some(NAMESPACE.to_string());
    config
}

async fn mount_login(server: &MockServer, status: u16, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(LOGIN_PATH))
        .and(body_json(json!({"token": "pat123"})))
        .respond_with(ResponseTemplate::new(status).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn github_login_token_is_used_for_backend_calls() {
    let server = common::backend().await;
    mount_login(&server, 200, json!({"auth": {"client_token": "tok-xyz"}})).await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/app"))
        .and(header("X-Vault-Token", "tok-xyz"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!({"request_id": "req-1", "data": {"k": "v"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let session = Session::establish(&github_config(&server)).await.unwrap();
    assert_eq!(session.auth_method(), AuthMethod::Github);

    let response = session.read("secret/app").await.unwrap().unwrap();
    assert_eq!(response.data_str("k"), Some("v"));
}

#[tokio::test]
async fn github_login_wins_over_static_token() {
    let server = common::backend().await;
    mount_login(&server, 200, json!({"auth": {"client_token": "tok-xyz"}})).await;
    Mock::given(method("GET"))
        .and(path("/v1/secret/app"))
        .and(header("X-Vault-Token", "tok-xyz"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"data": {}})))
        .expect(1)
        .mount(&server)
        .await;

    let mut config = github_config(&server);
    config.token = Some(SecretString::new("s.static"));

    let session = Session::establish(&config).await.unwrap();
    assert_eq!(session.auth_method(), AuthMethod::Github);
    session.read("secret/app").await.unwrap();
}

#[tokio::test]
async fn static_token_makes_no_login_call() {
    let server = common::backend().await;
    Mock::given(any()).respond_with(ResponseTemplate::new(500)).expect(0).mount(&server).await;

    let session = common::session(&server).await;
    assert_eq!(session.auth_method(), AuthMethod::Token);
    assert_eq!(session.tenancy().organization, ORG);
}

#[tokio::test]
async fn non_200_login_is_authentication_error() {
    let server = common::backend().await;
    mount_login(&server, 403, json!({"errors": ["permission denied"]})).await;

    let err = Session::establish(&github_config(&server)).await.unwrap_err();
    assert!(matches!(err, Error::Authentication { status: Some(403), .. }));
    assert_eq!(err.status(), Some(403));
    assert!(err.is_configure_fatal());
}

#[tokio::test]
async fn login_without_client_token_is_authentication_error() {
    let server = common::backend().await;
    mount_login(&server, 200, json!({"auth": {"client_token": ""}})).await;

    let err = Session::establish(&github_config(&server)).await.unwrap_err();
    assert!(matches!(err, Error::Authentication { status: None, .. }));
}

#[tokio::test]
async fn unreachable_login_endpoint_is_authentication_error() {
    let mut config = ProviderConfig::new("http://127.0.0.1:1");
    config.personal_access_token = Some(SecretString::new("pat123"));
    config.github_org = Some(ORG.to_string());
    config.namespace_domain = Some(NAMESPACE.to_string());

    let err = Session::establish(&config).await.unwrap_err();
    assert!(matches!(err, Error::Authentication { .. }));
}

#[tokio::test]
async fn missing_token_is_configuration_error() {
    let server = common::backend().await;
    let mut config = ProviderConfig::new(server.uri());
    config.github_org = Some(ORG.to_string());

    let err = Session::establish(&config).await.unwrap_err();
    assert!(matches!(err, Error::Configuration { .. }));
    assert!(err.to_string().contains("no authentication token was supplied"));
}

#[tokio::test]
async fn provider_configure_from_attributes() {
    let server = common::backend().await;
    let provider = Provider::new();

    let session = provider.configure(&common::provider_attributes(&server)).await.unwrap();
    assert_eq!(session.address(), server.uri());
    assert_eq!(session.tenancy().namespace_domain, NAMESPACE);
}

#[tokio::test]
async fn provider_configure_rejects_invalid_address() {
    let provider = Provider::new();
    let bag = MapAttributes::new()
        .with("address", "not a url")
        .with("token", "s.static");

    let err = provider.configure(&bag).await.unwrap_err();
    assert!(matches!(err, Error::Configuration { .. }));
}

#[tokio::test]
async fn padded_org_logs_in_and_issues_under_same_tenant() {
    let server = common::backend().await;
    mount_login(&server, 200, json!({"auth": {"client_token": "tok-xyz"}})).await;
    Mock::given(method("GET"))
        .and(path("/v1/auth/approle/acme.io/acme/role/my-repo/role-id"))
        .and(header("X-Vault-Token", "tok-xyz"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"role_id": "role-123"}})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/auth/approle/acme.io/acme/role/my-repo/secret-id"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"data": {"secret_id": "sid-1"}})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let mut config = github_config(&server);
    config.github_org = Some(" acme ".to_string());
    config.namespace_domain = Some("acme.io ".to_string());

    let session = Session::establish(&config).await.unwrap();
    assert_eq!(session.tenancy().organization, ORG);
    assert_eq!(session.tenancy().namespace_domain, NAMESPACE);

    let provider = Provider::new();
    let handler = provider.resource("immutability_approle").unwrap();
    let mut bag = MapAttributes::new().with("repository", "my-repo");
    handler.create(&mut bag, &session).await.unwrap();
}
