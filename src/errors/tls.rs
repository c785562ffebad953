use std::path::PathBuf;

use thiserror::Error;

/// TLS-specific error variants surfaced while building the backend transport.
#[derive(Debug, Error)]
pub enum TlsError {
    /// More than one client_auth block was configured.
    #[error("client auth block may appear only once")]
    DuplicateClientAuth,

    /// A client auth block lacks the certificate path, the key path, or both.
    #[error("client auth requires both cert_file and key_file")]
    IncompleteClientAuth,

    /// The CA certificate file could not be read.
    #[error("Failed to read CA certificate at {path}: {source}")]
    CaCertificateReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The CA certificate directory could not be listed.
    #[error("Failed to read CA certificate directory {path}: {source}")]
    CaDirectoryReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The client certificate file could not be read.
    #[error("Failed to read client certificate at {path}: {source}")]
    CertificateReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The client private key file could not be read.
    #[error("Failed to read client private key at {path}: {source}")]
    PrivateKeyReadError {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// No certificates were found in the supplied PEM file.
    #[error("Certificate file {path} does not contain any certificates")]
    EmptyCertificateBundle { path: PathBuf },

    /// The certificate PEM contents were invalid or unreadable.
    #[error("Certificate file {path} is not a valid PEM: {source}")]
    InvalidCertificatePem {
        path: PathBuf,
        #[source]
        source: reqwest::Error,
    },

    /// The client certificate and key could not be combined into an identity.
    #[error("Client certificate {cert_path} and key {key_path} are not a usable identity: {source}")]
    InvalidClientIdentity {
        cert_path: PathBuf,
        key_path: PathBuf,
        #[source]
        source: reqwest::Error,
    },

    /// The HTTP client could not be built from the TLS settings.
    #[error("Failed to build HTTPS client: {0}")]
    ClientBuild(#[source] reqwest::Error),
}
