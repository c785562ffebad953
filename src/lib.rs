//! # Immutability Provider
//!
//! Credential lifecycle engine for a Vault-compatible secrets backend. An
//! infrastructure orchestrator treats each credential as a declarative resource
//! and drives it through Configure, Create, Read and Delete; this crate does
//! the backend work behind those calls.
//!
//! ## Architecture
//!
//! ```text
//! Provider::configure ─→ Transport (TLS) ─→ Authenticator ─→ Session
//!                                                              │
//!        ResourceHandler / DataSourceHandler ←─────────────────┘
//!        (AppRole, Certificate, Generic secret)
//!                 │
//!            Path Resolver ─→ logical read / write on the backend
//! ```
//!
//! ## Core Components
//!
//! - **Transport**: reqwest client with custom trust roots and optional mutual TLS
//! - **Authenticator**: static token or GitHub personal-access-token login
//! - **Path Resolver**: pure functions deriving tenant-scoped backend paths
//! - **Controllers**: AppRole secret ids, PKI certificates, generic secret reads
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use immutability_provider::provider::{AttributeBag, MapAttributes, Provider};
//!
//! # async fn run() -> immutability_provider::Result<()> {
//! let provider = Provider::new();
//! let config = MapAttributes::new()
//!     .with("address", "https://vault.example.com:8200")
//!     .with("token", "s.example");
//! let session = provider.configure(&config).await?;
//!
//! let mut secret = MapAttributes::new().with("path", "secret/data/app");
//! if let Some(handler) = provider.data_source("immutability_secret") {
//!     handler.read(&mut secret, &session).await?;
//! }
//! println!("{:?}", secret.get_str("lease_id")?);
//! # Ok(())
//! # }
//! ```

pub mod auth;
pub mod cli;
pub mod client;
pub mod config;
pub mod errors;
pub mod observability;
pub mod paths;
pub mod provider;
pub mod resources;
pub mod secrets;

pub use client::Session;
pub use config::ProviderConfig;
pub use errors::{Error, Result};
pub use provider::Provider;

/// Application version from Cargo.toml
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Application name from Cargo.toml
pub const APP_NAME: &str = env!("CARGO_PKG_NAME");
