//! Fluentd graceful reload client
//!
//! Calls the Fluentd RPC endpoint `GET /api/config.gracefulReload` on a replica.
//! Any status of 400 or above counts as a failure. Response bodies are
//! free-form and only logged.

use std::net::{IpAddr, SocketAddr};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, instrument};

use crate::config::{RELOAD_PATH, RELOAD_PORT, RELOAD_TIMEOUT};
use crate::error::{Error, Result};

#[async_trait]
pub trait Reloader: Send + Sync {
    /// Trigger a graceful reload on `address`, returning the response body
    async fn reload(&self, address: &str) -> Result<String>;
}

/// [`Reloader`] speaking HTTP to the Fluentd RPC port
#[derive(Clone, Debug)]
pub struct HttpReloader {
    client: Client,
    port: u16,
}

impl HttpReloader {
    /// Reloader for the standard RPC port and 5 s request timeout
    pub fn new() -> Result<Self> {
        Self::with_port(RELOAD_PORT, RELOAD_TIMEOUT)
    }

    pub fn with_port(port: u16, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("fluentd-cert-reloader/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(Error::HttpError)?;

        Ok(Self { client, port })
    }

    /// IPv6 pod IPs are bracketed; anything unparsable is used verbatim
    pub fn reload_url(&self, address: &str) -> String {
        match address.parse::<IpAddr>() {
            Ok(ip) => format!("http://{}{}", SocketAddr::new(ip, self.port), RELOAD_PATH),
            Err(_) => format!("http://{}:{}{}", address, self.port, RELOAD_PATH),
        }
    }
}

#[async_trait]
impl Reloader for HttpReloader {
    #[instrument(skip(self))]
    async fn reload(&self, address: &str) -> Result<String> {
        info!("Reloading fluentd config on {}", address);

        let url = self.reload_url(address);
        debug!("GET {}", url);

        let reload_error = |message: String| Error::ReloadError {
            address: address.to_string(),
            message,
        };

        let resp = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| reload_error(format!("failed to send request: {e}")))?;

        let status = resp.status();
        if status.as_u16() >= 400 {
            return Err(reload_error(status.to_string()));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| reload_error(format!("failed to read response body: {e}")))?;

        info!("Response: {}", body);
        Ok(body)
    }
}
