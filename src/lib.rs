//! fluentd-cert-reloader: reload Fluentd when it serves a stale certificate
//!
//! cert-manager rotates the TLS certificate in place, but Fluentd keeps
//! serving the one it loaded at start-up. Each invocation of this job probes
//! the public endpoint, compares the served expiry with the Certificate
//! resource, and on mismatch asks every Fluentd replica to reload gracefully.

pub mod cluster;
pub mod config;
pub mod crd;
pub mod discovery;
pub mod error;
pub mod lookup;
pub mod probe;
pub mod reconcile;
pub mod reload;
pub mod telemetry;
#[cfg(test)]
mod testing;

pub use crate::cluster::{ClusterClient, KubeClusterClient};
pub use crate::config::Config;
pub use crate::error::{Error, Result};
pub use crate::probe::{CertificateProbe, LiveCertificate, TlsProbe};
pub use crate::reconcile::{run, RunOutcome, RunPhase};
pub use crate::reload::{HttpReloader, Reloader};
