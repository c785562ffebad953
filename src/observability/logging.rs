//! # Structured Logging
//!
//! Subscriber setup and span macros built on the tracing ecosystem.
//!
//! Secret material (tokens, secret ids, private keys, secret payloads) is never
//! recorded as a field. Paths, identities and status codes are.

use tracing::subscriber::SetGlobalDefaultError;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::config::LoggingConfig;
use crate::errors::{Error, Result};

/// Create a tracing span for one lifecycle operation.
///
/// ```rust,ignore
/// let span = lifecycle_span!("immutability_ssl", "create", common_name = %cn);
/// ```
#[macro_export]
macro_rules! lifecycle_span {
    ($resource_type:expr, $operation:expr) => {
        tracing::info_span!(
            "lifecycle",
            resource_type = %$resource_type,
            operation = %$operation,
            operation_id = %uuid::Uuid::new_v4()
        )
    };
    ($resource_type:expr, $operation:expr, $($field:tt)*) => {
        tracing::info_span!(
            "lifecycle",
            resource_type = %$resource_type,
            operation = %$operation,
            operation_id = %uuid::Uuid::new_v4(),
            $($field)*
        )
    };
}

/// Filter from `RUST_LOG`, falling back to the configured level.
fn env_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => EnvFilter::try_new(&config.log_level).map_err(|e| {
            Error::config_with_source(format!("invalid log level '{}'", config.log_level), e)
        }),
    }
}

/// Install the global subscriber.
///
/// A subscriber that is already installed (integration tests, embedding
/// hosts) is left in place.
pub fn init_logging(config: &LoggingConfig) -> Result<()> {
    let filter = env_filter(config)?;

    let installed: std::result::Result<(), SetGlobalDefaultError> = if config.json_logging {
        tracing::subscriber::set_global_default(
            FmtSubscriber::builder()
                .json()
                .with_env_filter(filter)
                .with_current_span(true)
                .with_writer(std::io::stderr)
                .finish(),
        )
    } else {
        tracing::subscriber::set_global_default(
            FmtSubscriber::builder()
                .with_env_filter(filter)
                .with_target(false)
                .with_writer(std::io::stderr)
                .finish(),
        )
    };

    if installed.is_err() {
        tracing::debug!("Global tracing subscriber already installed");
    }
    Ok(())
}
