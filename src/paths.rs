//! Backend path conventions.
//!
//! Every path the engine touches is derived here from the tenancy context and
//! caller-supplied names. Pure string construction: no I/O, no validation
//! beyond what the caller already did. Empty segments are kept as-is.

/// Auth provider segment used for GitHub federated login.
pub const GITHUB_AUTH_PROVIDER: &str = "github";

/// Auth provider segment used for AppRole login.
pub const APPROLE_AUTH_PROVIDER: &str = "approle";

/// `auth/approle/<namespace>/<organization>/role/<repository>`
pub fn approle_role_path(namespace: &str, organization: &str, repository: &str) -> String {
    format!("auth/{APPROLE_AUTH_PROVIDER}/{namespace}/{organization}/role/{repository}")
}

pub fn approle_role_id_path(role_path: &str) -> String {
    format!("{role_path}/role-id")
}

pub fn approle_secret_id_path(role_path: &str) -> String {
    format!("{role_path}/secret-id")
}

pub fn approle_secret_id_destroy_path(role_path: &str) -> String {
    format!("{role_path}/secret-id/destroy")
}

/// `<mount>/issue/<organization>`; the organization doubles as the PKI role.
pub fn pki_issue_path(mount: &str, organization: &str) -> String {
    format!("{mount}/issue/{organization}")
}

pub fn pki_revoke_path(mount: &str) -> String {
    format!("{mount}/revoke")
}

/// `auth/<provider>/<namespace>/<organization>/login`
pub fn login_path(provider: &str, namespace: &str, organization: &str) -> String {
    format!("auth/{provider}/{namespace}/{organization}/login")
}

/// `<address>/v1/<path>` without doubling a trailing slash on the address.
pub fn api_url(address: &str, path: &str) -> String {
    format!("{}/v1/{}", address.trim_end_matches('/'), path.trim_start_matches('/'))
}

/// Full URL a client application logs in against.
pub fn login_url(address: &str, provider: &str, namespace: &str, organization: &str) -> String {
    api_url(address, &login_path(provider, namespace, organization))
}
