//! # Command Line Interface
//!
//! A thin harness over the lifecycle contract: each subcommand configures a
//! session, runs one handler against an in-memory attribute bag and prints
//! the resulting attributes as JSON.

pub mod output;

use std::collections::BTreeMap;
use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{Args, Parser, Subcommand};
use serde_json::json;

use crate::client::Session;
use crate::config::LoggingConfig;
use crate::observability::init_logging;
use crate::paths;
use crate::provider::{AttributeBag, MapAttributes, Provider};
use crate::resources::{approle, generic_secret, pki};

#[derive(Parser)]
#[command(name = "immutability")]
#[command(about = "Issue and revoke short-lived credentials against a Vault backend")]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[command(flatten)]
    pub provider: ProviderArgs,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Provider configuration flags. Unset values fall back to the `VAULT_*`
/// environment variables.
#[derive(Args, Debug, Default)]
pub struct ProviderArgs {
    /// Backend address
    #[arg(long, global = true)]
    pub address: Option<String>,

    /// Static backend token
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// GitHub personal access token exchanged for a session token
    #[arg(long, global = true, env = "IMMUTABILITY_GITHUB_TOKEN", hide_env_values = true)]
    pub personal_access_token: Option<String>,

    /// GitHub organization
    #[arg(long, global = true, env = "IMMUTABILITY_GITHUB_ORG")]
    pub github_org: Option<String>,

    /// Namespace domain
    #[arg(long, global = true, env = "IMMUTABILITY_NAMESPACE_DOMAIN")]
    pub namespace_domain: Option<String>,

    /// PEM CA bundle to trust
    #[arg(long, global = true)]
    pub ca_cert_file: Option<PathBuf>,

    /// Directory of PEM CA certificates to trust
    #[arg(long, global = true)]
    pub ca_cert_dir: Option<PathBuf>,

    /// Client certificate for mutual TLS
    #[arg(long, global = true, requires = "client_key")]
    pub client_cert: Option<PathBuf>,

    /// Client private key for mutual TLS
    #[arg(long, global = true, requires = "client_cert")]
    pub client_key: Option<PathBuf>,

    /// Disable server certificate verification
    #[arg(long, global = true)]
    pub skip_tls_verify: bool,

    /// Backend request timeout in seconds
    #[arg(long, global = true)]
    pub timeout: Option<u64>,
}

impl ProviderArgs {
    /// Provider attribute bag for these flags.
    pub fn to_attributes(&self) -> MapAttributes {
        let mut bag = MapAttributes::new();
        let strings = [
            ("address", &self.address),
            ("token", &self.token),
            ("personal_access_token", &self.personal_access_token),
            ("github_org", &self.github_org),
            ("namespace_domain", &self.namespace_domain),
        ];
        for (name, value) in strings {
            if let Some(value) = value {
                bag.set(name, value.as_str().into());
            }
        }

        let paths = [("ca_cert_file", &self.ca_cert_file), ("ca_cert_dir", &self.ca_cert_dir)];
        for (name, value) in paths {
            if let Some(value) = value {
                bag.set(name, value.display().to_string().into());
            }
        }

        if let (Some(cert), Some(key)) = (&self.client_cert, &self.client_key) {
            let block = BTreeMap::from([
                ("cert_file".to_string(), cert.display().to_string()),
                ("key_file".to_string(), key.display().to_string()),
            ]);
            bag.set("client_auth", vec![block].into());
        }

        if self.skip_tls_verify {
            bag.set("skip_tls_verify", true.into());
        }
        if let Some(timeout) = self.timeout {
            bag.set("request_timeout_seconds", i64::try_from(timeout).unwrap_or(i64::MAX).into());
        }

        bag
    }
}

#[derive(Subcommand)]
pub enum Commands {
    /// Authenticate and report how the session was obtained
    Login,

    /// AppRole credential commands
    Approle {
        #[command(subcommand)]
        command: AppRoleCommands,
    },

    /// Certificate commands
    Cert {
        #[command(subcommand)]
        command: CertCommands,
    },

    /// Generic secret commands
    Secret {
        #[command(subcommand)]
        command: SecretCommands,
    },
}

#[derive(Subcommand)]
pub enum AppRoleCommands {
    /// Read the role id and generate a new secret id for a repository
    Create {
        #[arg(long)]
        repository: String,
    },

    /// Destroy a previously issued secret id
    Destroy {
        #[arg(long)]
        repository: String,

        #[arg(long, env = "IMMUTABILITY_SECRET_ID", hide_env_values = true)]
        secret_id: String,
    },
}

#[derive(Subcommand)]
pub enum CertCommands {
    /// Issue a certificate
    Issue {
        #[arg(long)]
        common_name: String,

        /// PKI mount path
        #[arg(long, default_value = pki::DEFAULT_PKI_MOUNT)]
        path: String,

        /// Comma-delimited DNS subject alternative names
        #[arg(long)]
        alt_names: Option<String>,

        /// Comma-delimited IP subject alternative names
        #[arg(long)]
        ip_sans: Option<String>,

        /// Requested TTL, e.g. "8760h"
        #[arg(long)]
        ttl: Option<String>,
    },

    /// Revoke a certificate by serial number
    Revoke {
        #[arg(long)]
        serial_number: String,

        /// PKI mount path
        #[arg(long, default_value = pki::DEFAULT_PKI_MOUNT)]
        path: String,
    },
}

#[derive(Subcommand)]
pub enum SecretCommands {
    /// Read a secret and print its flattened data and lease
    Read {
        #[arg(long)]
        path: String,
    },
}

/// Run CLI commands
pub async fn run_cli() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut logging = LoggingConfig::from_env();
    if cli.verbose {
        logging.log_level = "debug".to_string();
    }
    init_logging(&logging)?;

    let provider = Provider::new();
    let session = provider
        .configure(&cli.provider.to_attributes())
        .await
        .context("Failed to configure provider")?;

    match cli.command {
        Commands::Login => output::print_json(&json!({
            "address": session.address(),
            "auth_method": session.auth_method(),
            "tenancy": session.tenancy(),
        })),
        Commands::Approle { command } => handle_approle_command(command, &provider, &session).await,
        Commands::Cert { command } => handle_cert_command(command, &provider, &session).await,
        Commands::Secret { command } => handle_secret_command(command, &provider, &session).await,
    }
}

async fn handle_approle_command(
    command: AppRoleCommands,
    provider: &Provider,
    session: &Session,
) -> anyhow::Result<()> {
    let handler = provider
        .resource(approle::RESOURCE_TYPE)
        .ok_or_else(|| anyhow!("resource type {} is not registered", approle::RESOURCE_TYPE))?;

    match command {
        AppRoleCommands::Create { repository } => {
            let mut bag = MapAttributes::new().with("repository", repository.as_str());
            handler.create(&mut bag, session).await.context("Failed to create AppRole secret id")?;
            output::print_json(&bag)
        }
        AppRoleCommands::Destroy { repository, secret_id } => {
            let tenancy = session.tenancy();
            let role_path = paths::approle_role_path(
                &tenancy.namespace_domain,
                &tenancy.organization,
                &repository,
            );
            let mut bag = MapAttributes::new()
                .with_id(&role_path)
                .with("repository", repository.as_str())
                .with("secret_id", secret_id);
            handler.delete(&mut bag, session).await.context("Failed to destroy AppRole secret id")?;
            output::print_json(&json!({ "id": role_path, "destroyed": true }))
        }
    }
}

async fn handle_cert_command(
    command: CertCommands,
    provider: &Provider,
    session: &Session,
) -> anyhow::Result<()> {
    let handler = provider
        .resource(pki::RESOURCE_TYPE)
        .ok_or_else(|| anyhow!("resource type {} is not registered", pki::RESOURCE_TYPE))?;

    match command {
        CertCommands::Issue { common_name, path, alt_names, ip_sans, ttl } => {
            let mut bag = MapAttributes::new().with("common_name", common_name).with("path", path);
            let optional = [("alt_names", alt_names), ("ip_sans", ip_sans), ("ttl", ttl)];
            for (name, value) in optional {
                if let Some(value) = value {
                    bag.set(name, value.into());
                }
            }
            handler.create(&mut bag, session).await.context("Failed to issue certificate")?;
            output::print_json(&bag)
        }
        CertCommands::Revoke { serial_number, path } => {
            let mut bag = MapAttributes::new().with_id(&serial_number).with("path", path);
            handler.delete(&mut bag, session).await.context("Failed to revoke certificate")?;
            output::print_json(&bag)
        }
    }
}

async fn handle_secret_command(
    command: SecretCommands,
    provider: &Provider,
    session: &Session,
) -> anyhow::Result<()> {
    let handler = provider.data_source(generic_secret::DATA_SOURCE_TYPE).ok_or_else(|| {
        anyhow!("data source {} is not registered", generic_secret::DATA_SOURCE_TYPE)
    })?;

    match command {
        SecretCommands::Read { path } => {
            let mut bag = MapAttributes::new().with("path", path.as_str());
            handler
                .read(&mut bag, session)
                .await
                .with_context(|| format!("Failed to read secret at {}", path))?;
            output::print_json(&bag)
        }
    }
}
