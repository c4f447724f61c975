//! Run orchestration
//!
//! A run is a linear state machine:
//! Discovering -> Probing -> LookingUp -> Reconciling -> (Reloading | Done).
//! The first error in any phase ends the run; the next scheduled invocation
//! starts over from scratch.

use std::fmt;

use chrono::{DateTime, Utc};
use kube::ResourceExt;
use tracing::{info, info_span, warn, Instrument};

use crate::cluster::ClusterClient;
use crate::config::Config;
use crate::crd::Certificate;
use crate::discovery::discover_replicas;
use crate::error::Result;
use crate::lookup::find_certificate;
use crate::probe::{CertificateProbe, LiveCertificate};
use crate::reload::Reloader;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RunPhase {
    Discovering,
    Probing,
    LookingUp,
    Reconciling,
    Reloading,
    Done,
}

impl fmt::Display for RunPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunPhase::Discovering => "Discovering",
            RunPhase::Probing => "Probing",
            RunPhase::LookingUp => "LookingUp",
            RunPhase::Reconciling => "Reconciling",
            RunPhase::Reloading => "Reloading",
            RunPhase::Done => "Done",
        };
        write!(f, "{s}")
    }
}

/// How a successful run ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RunOutcome {
    /// The served certificate matches cert-manager's record
    CertificateValid { renewal_time: Option<DateTime<Utc>> },
    /// Every replica accepted a graceful reload
    Reloaded { replicas: usize },
    /// Mismatch detected in dry-run mode; nothing was contacted
    ReloadSkipped { replicas: usize },
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunOutcome::CertificateValid { .. } => write!(f, "Certificate is valid."),
            RunOutcome::Reloaded { replicas } => write!(f, "reloaded {replicas} replica(s)"),
            RunOutcome::ReloadSkipped { replicas } => {
                write!(f, "dry run, skipped reload of {replicas} replica(s)")
            }
        }
    }
}

/// Whether the served certificate differs from cert-manager's record
///
/// Timestamps are compared exactly. A record without `notAfter` never matches.
pub fn needs_reload(live: &LiveCertificate, record: &Certificate) -> bool {
    record.not_after() != Some(live.not_after)
}

/// Reload every replica one at a time, stopping at the first failure
pub async fn reload_all(reloader: &dyn Reloader, addresses: &[String]) -> Result<usize> {
    for address in addresses {
        reloader.reload(address).await?;
    }
    Ok(addresses.len())
}

fn enter(phase: RunPhase) {
    info!(%phase, "Entering phase");
}

/// Execute one full check against the cluster
pub async fn run(
    config: &Config,
    cluster: &dyn ClusterClient,
    probe: &dyn CertificateProbe,
    reloader: &dyn Reloader,
) -> Result<RunOutcome> {
    let span = info_span!(
        "run",
        namespace = %config.namespace,
        certificate = %config.certificate_name,
        host = %config.service_hostname,
    );

    async move {
        enter(RunPhase::Discovering);
        let addresses = discover_replicas(cluster, &config.namespace).await?;

        enter(RunPhase::Probing);
        let live = probe.probe(&config.service_hostname).await?;

        enter(RunPhase::LookingUp);
        let record = find_certificate(cluster, &config.namespace, &config.certificate_name).await?;
        if !record.is_ready() {
            warn!("Certificate {} is not Ready", record.name_any());
        }

        enter(RunPhase::Reconciling);
        info!("Certificate will expire on {}", live.not_after);

        if !needs_reload(&live, &record) {
            let renewal_time = record.renewal_time();
            match renewal_time {
                Some(t) => info!("Certificate will be renewed on {}", t),
                None => info!("Certificate renewal time is not recorded"),
            }
            let outcome = RunOutcome::CertificateValid { renewal_time };
            info!("{}", outcome);
            enter(RunPhase::Done);
            return Ok(outcome);
        }

        info!("Certificate is not valid");
        match record.not_after() {
            Some(recorded) => info!(
                "Certificate should expire on {} but it expires on {}",
                recorded, live.not_after
            ),
            None => warn!(
                "Certificate {} has no recorded expiry but {} expires on {}",
                record.name_any(),
                config.service_hostname,
                live.not_after
            ),
        }

        if config.dry_run {
            info!("Dry run: would reload fluentd config on {:?}", addresses);
            enter(RunPhase::Done);
            return Ok(RunOutcome::ReloadSkipped {
                replicas: addresses.len(),
            });
        }

        enter(RunPhase::Reloading);
        let replicas = reload_all(reloader, &addresses).await?;
        enter(RunPhase::Done);
        Ok(RunOutcome::Reloaded { replicas })
    }
    .instrument(span)
    .await
}
