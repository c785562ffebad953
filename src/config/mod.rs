//! # Configuration Management
//!
//! Provider configuration resolved from the orchestrator's attribute bag with
//! fallbacks to the conventional `VAULT_*` environment variables.

pub mod settings;
pub mod tls;

pub use settings::{
    LoggingConfig, ProviderConfig, TenancyContext, DEFAULT_MAX_LEASE_TTL_SECONDS,
    DEFAULT_REQUEST_TIMEOUT_SECONDS,
};
pub use tls::{ClientAuth, TlsConfig};
