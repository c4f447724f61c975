//! Fluentd replica discovery

use k8s_openapi::api::core::v1::Pod;
use kube::ResourceExt;
use tracing::{info, instrument, warn};

use crate::cluster::ClusterClient;
use crate::config::{replica_selector, STATEFULSET_POD_LABEL};
use crate::error::{Error, Result};

/// Pod IPs of the StatefulSet-managed Fluentd replicas in `namespace`
///
/// Pods are selected by `app=<namespace>`; any match without the StatefulSet
/// pod-name label is skipped.
#[instrument(skip(cluster))]
pub async fn discover_replicas(
    cluster: &dyn ClusterClient,
    namespace: &str,
) -> Result<Vec<String>> {
    let pods = cluster
        .list_pods(namespace, &replica_selector(namespace))
        .await
        .map_err(|source| Error::DiscoveryError {
            namespace: namespace.to_string(),
            source,
        })?;

    let addresses = replica_addresses(&pods);
    info!("Discovered {} fluentd replica(s)", addresses.len());
    Ok(addresses)
}

/// Filter `pods` down to StatefulSet members, in list order
pub fn replica_addresses(pods: &[Pod]) -> Vec<String> {
    let mut addresses = Vec::with_capacity(pods.len());
    for pod in pods {
        if !pod.labels().contains_key(STATEFULSET_POD_LABEL) {
            info!("Pod is not from statefulset, skipping {}", pod.name_any());
            continue;
        }

        match pod.status.as_ref().and_then(|s| s.pod_ip.as_deref()) {
            Some(ip) if !ip.is_empty() => addresses.push(ip.to_string()),
            _ => warn!("Pod {} has no IP assigned yet, skipping", pod.name_any()),
        }
    }
    addresses
}
