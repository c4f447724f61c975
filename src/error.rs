//! Error types for the certificate reload check
//!
//! Every variant is fatal for the current run. Components return these to
//! [`crate::reconcile::run`] and only the binary decides how the process exits.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    /// A required configuration value is missing or blank
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// Listing replica pods failed
    #[error("Failed to list replica pods in namespace {namespace}: {source}")]
    DiscoveryError {
        namespace: String,
        #[source]
        source: kube::Error,
    },

    /// TLS dial, handshake or hostname verification against the public endpoint failed
    #[error("TLS probe of {host} failed: {message}")]
    ProbeError { host: String, message: String },

    /// Listing cert-manager certificates failed
    #[error("Failed to list certificates in namespace {namespace}: {source}")]
    LookupError {
        namespace: String,
        #[source]
        source: kube::Error,
    },

    /// No certificate resource matched the configured name
    #[error("Certificate {name} not found in namespace {namespace}")]
    CertificateNotFound { name: String, namespace: String },

    /// A replica rejected the graceful reload or could not be reached
    #[error("Failed to reload fluentd config on {address}: {message}")]
    ReloadError { address: String, message: String },

    /// Kubernetes client could not be constructed
    #[error("Kubernetes error: {0}")]
    KubeError(#[from] kube::Error),

    /// HTTP client could not be constructed
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// Logging or tracing could not be installed
    #[error("Telemetry error: {0}")]
    TelemetryError(String),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
