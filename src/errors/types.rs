//! # Error Types
//!
//! Error taxonomy for the credential lifecycle engine using `thiserror`.

use std::fmt;

/// Custom result type for provider operations
pub type Result<T> = std::result::Result<T, Error>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for the credential lifecycle engine.
///
/// Every variant is fatal to the call that produced it. Nothing is retried or
/// downgraded inside the crate; the orchestrator decides what to do next.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// Bad or conflicting transport/authentication configuration. Blocks Configure.
    #[error("Configuration error: {message}")]
    Configuration {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// Federated login failed. Blocks Configure.
    #[error("Authentication error: {message}")]
    Authentication {
        message: String,
        status: Option<u16>,
        #[source]
        source: Option<BoxError>,
    },

    /// A successful-looking backend response lacked an expected field.
    #[error("Credential lookup failed during {operation} at '{path}': {field} not found")]
    CredentialLookup { operation: Operation, path: String, field: String },

    /// Network failure or non-success status from a backend read/write/revoke.
    #[error("Backend request failed during {operation} at '{path}': {message}")]
    BackendRequest {
        operation: Operation,
        path: String,
        status: Option<u16>,
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    /// A read returned no object.
    #[error("Secret not found at '{path}'")]
    SecretNotFound { path: String },
}

/// The backend operation an error is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Read,
    Write,
    Revoke,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operation::Read => write!(f, "read"),
            Operation::Write => write!(f, "write"),
            Operation::Revoke => write!(f, "revoke"),
        }
    }
}

impl Error {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Configuration { message: message.into(), source: None }
    }

    /// Create a configuration error with source
    pub fn config_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: Into<BoxError>,
    {
        Self::Configuration { message: message.into(), source: Some(source.into()) }
    }

    /// Create an authentication error
    pub fn authentication<S: Into<String>>(message: S) -> Self {
        Self::Authentication { message: message.into(), status: None, source: None }
    }

    /// Create an authentication error carrying the HTTP status of the login call
    pub fn authentication_status<S: Into<String>>(message: S, status: u16) -> Self {
        Self::Authentication { message: message.into(), status: Some(status), source: None }
    }

    /// Create an authentication error with the underlying cause
    pub fn authentication_with_source<S, E>(message: S, source: E) -> Self
    where
        S: Into<String>,
        E: Into<BoxError>,
    {
        Self::Authentication { message: message.into(), status: None, source: Some(source.into()) }
    }

    /// Create a credential lookup error
    pub fn credential_lookup<P: Into<String>, F: Into<String>>(
        operation: Operation,
        path: P,
        field: F,
    ) -> Self {
        Self::CredentialLookup { operation, path: path.into(), field: field.into() }
    }

    /// Create a backend request error for a non-success response
    pub fn backend<P: Into<String>, M: Into<String>>(
        operation: Operation,
        path: P,
        status: Option<u16>,
        message: M,
    ) -> Self {
        Self::BackendRequest {
            operation,
            path: path.into(),
            status,
            message: message.into(),
            source: None,
        }
    }

    /// Create a backend request error for a transport failure
    pub fn backend_transport<P: Into<String>>(
        operation: Operation,
        path: P,
        source: reqwest::Error,
    ) -> Self {
        Self::BackendRequest {
            operation,
            path: path.into(),
            status: source.status().map(|s| s.as_u16()),
            message: source.to_string(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a secret not found error
    pub fn secret_not_found<P: Into<String>>(path: P) -> Self {
        Self::SecretNotFound { path: path.into() }
    }

    /// HTTP status attached to this error, if the backend produced one
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Authentication { status, .. } | Error::BackendRequest { status, .. } => *status,
            _ => None,
        }
    }

    /// Errors that block Configure
    pub fn is_configure_fatal(&self) -> bool {
        matches!(self, Error::Configuration { .. } | Error::Authentication { .. })
    }
}

impl From<super::TlsError> for Error {
    fn from(error: super::TlsError) -> Self {
        Self::Configuration { message: error.to_string(), source: Some(Box::new(error)) }
    }
}

impl From<validator::ValidationErrors> for Error {
    fn from(errors: validator::ValidationErrors) -> Self {
        let mut fields: Vec<String> = errors
            .field_errors()
            .iter()
            .map(|(field, field_errors)| {
                let error_messages: Vec<String> = field_errors
                    .iter()
                    .map(|e| e.message.as_ref().map_or("invalid value".to_string(), |m| m.to_string()))
                    .collect();
                format!("{}: {}", field, error_messages.join(", "))
            })
            .collect();
        fields.sort();

        Self::config(format!("Validation failed: {}", fields.join("; ")))
    }
}
