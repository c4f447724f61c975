//! Live TLS certificate probe
//!
//! Dials the public Fluentd endpoint, completes a verified TLS handshake and
//! reads the expiry and issuer of the leaf certificate actually being served.
//! One attempt per run; connection and handshake rely on the transport's own
//! timeouts.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use rustls::{ClientConfig, RootCertStore};
use rustls_pki_types::ServerName;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tracing::{debug, info, instrument};

use crate::config::PROBE_PORT;
use crate::error::{Error, Result};

/// What the endpoint is serving right now
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LiveCertificate {
    pub not_after: DateTime<Utc>,
    pub issuer: String,
}

impl LiveCertificate {
    /// Extract expiry and issuer from a DER-encoded X.509 certificate
    pub fn from_der(der: &[u8]) -> std::result::Result<Self, String> {
        use x509_parser::prelude::*;

        let (_, cert) = X509Certificate::from_der(der)
            .map_err(|e| format!("failed to parse leaf certificate: {e}"))?;

        let timestamp = cert.validity().not_after.timestamp();
        let not_after = DateTime::<Utc>::from_timestamp(timestamp, 0)
            .ok_or_else(|| format!("certificate expiry {timestamp} is out of range"))?;

        Ok(Self {
            not_after,
            issuer: cert.issuer().to_string(),
        })
    }

    /// Expiry in the `Monday, 02-Jan-06 15:04:05 UTC` style
    pub fn expiry_rfc850(&self) -> String {
        self.not_after.format("%A, %d-%b-%y %H:%M:%S UTC").to_string()
    }
}

#[async_trait]
pub trait CertificateProbe: Send + Sync {
    async fn probe(&self, host: &str) -> Result<LiveCertificate>;
}

/// [`CertificateProbe`] performing a real handshake with rustls
#[derive(Clone)]
pub struct TlsProbe {
    config: Arc<ClientConfig>,
    port: u16,
}

impl TlsProbe {
    /// Probe on port 443 trusting the Mozilla root program
    pub fn new() -> Result<Self> {
        let mut roots = RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        Self::with_roots(roots, PROBE_PORT)
    }

    pub fn with_roots(roots: RootCertStore, port: u16) -> Result<Self> {
        let provider = Arc::new(rustls::crypto::ring::default_provider());
        let config = ClientConfig::builder_with_provider(provider)
            .with_safe_default_protocol_versions()
            .map_err(|e| Error::ConfigError(format!("TLS client configuration: {e}")))?
            .with_root_certificates(roots)
            .with_no_client_auth();

        Ok(Self {
            config: Arc::new(config),
            port,
        })
    }
}

#[async_trait]
impl CertificateProbe for TlsProbe {
    #[instrument(skip(self))]
    async fn probe(&self, host: &str) -> Result<LiveCertificate> {
        let server_name = ServerName::try_from(host.to_string())
            .map_err(|e| probe_error(host, format!("invalid hostname: {e}")))?;

        let tcp = TcpStream::connect((host, self.port)).await.map_err(|e| {
            probe_error(host, format!("Server doesn't support SSL certificate: {e}"))
        })?;
        debug!("TCP connection established");

        // Chain and hostname are verified by rustls during the handshake
        let tls = TlsConnector::from(Arc::clone(&self.config))
            .connect(server_name, tcp)
            .await
            .map_err(|e| probe_error(host, describe_handshake_error(&e)))?;

        let (_, session) = tls.get_ref();
        let leaf = session
            .peer_certificates()
            .and_then(|chain| chain.first())
            .ok_or_else(|| probe_error(host, "peer presented no certificate".to_string()))?;

        let live = LiveCertificate::from_der(leaf.as_ref()).map_err(|e| probe_error(host, e))?;

        info!("Issuer: {}", live.issuer);
        info!("Expiry: {}", live.expiry_rfc850());

        Ok(live)
    }
}

fn probe_error(host: &str, message: String) -> Error {
    Error::ProbeError {
        host: host.to_string(),
        message,
    }
}

fn describe_handshake_error(err: &std::io::Error) -> String {
    match err
        .get_ref()
        .and_then(|inner| inner.downcast_ref::<rustls::Error>())
    {
        Some(rustls::Error::InvalidCertificate(rustls::CertificateError::NotValidForName)) => {
            format!("Hostname doesn't match with certificate: {err}")
        }
        _ => format!("TLS handshake failed: {err}"),
    }
}
