//! Authoritative certificate lookup

use kube::ResourceExt;
use tracing::{info, instrument};

use crate::cluster::ClusterClient;
use crate::crd::Certificate;
use crate::error::{Error, Result};

/// Find the cert-manager Certificate named `name` (case-insensitive) in `namespace`
#[instrument(skip(cluster))]
pub async fn find_certificate(
    cluster: &dyn ClusterClient,
    namespace: &str,
    name: &str,
) -> Result<Certificate> {
    let certificates = cluster
        .list_certificates(namespace)
        .await
        .map_err(|source| Error::LookupError {
            namespace: namespace.to_string(),
            source,
        })?;

    select_certificate(certificates, name).ok_or_else(|| Error::CertificateNotFound {
        name: name.to_string(),
        namespace: namespace.to_string(),
    })
}

/// First certificate whose name equals `name` ignoring ASCII case
pub fn select_certificate(certificates: Vec<Certificate>, name: &str) -> Option<Certificate> {
    for cert in certificates {
        if !cert.name_any().eq_ignore_ascii_case(name) {
            info!("Certificate {} is not fluentd certificate", cert.name_any());
            continue;
        }

        info!("Found certificate {}", cert.name_any());
        return Some(cert);
    }
    None
}
