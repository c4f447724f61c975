//! Cluster access
//!
//! The job only ever reads two collections from the API server. They are put
//! behind [`ClusterClient`] so the pipeline can be driven by an in-memory
//! cluster in tests.

use async_trait::async_trait;
use k8s_openapi::api::core::v1::Pod;
use kube::{
    api::{Api, ListParams},
    Client,
};
use tracing::{debug, instrument};

use crate::crd::Certificate;

/// Read-only view of the cluster needed by a run
#[async_trait]
pub trait ClusterClient: Send + Sync {
    /// List pods in `namespace` matching `label_selector`
    async fn list_pods(&self, namespace: &str, label_selector: &str)
        -> Result<Vec<Pod>, kube::Error>;

    /// List cert-manager certificates in `namespace`
    async fn list_certificates(&self, namespace: &str) -> Result<Vec<Certificate>, kube::Error>;
}

/// [`ClusterClient`] backed by the Kubernetes API server
#[derive(Clone)]
pub struct KubeClusterClient {
    client: Client,
}

impl KubeClusterClient {
    pub fn new(client: Client) -> Self {
        Self { client }
    }

    /// Connect using the ambient credentials (in-cluster service account or kubeconfig)
    pub async fn try_default() -> Result<Self, kube::Error> {
        Ok(Self::new(Client::try_default().await?))
    }
}

#[async_trait]
impl ClusterClient for KubeClusterClient {
    #[instrument(skip(self))]
    async fn list_pods(
        &self,
        namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<Pod>, kube::Error> {
        let pods: Api<Pod> = Api::namespaced(self.client.clone(), namespace);
        let list = pods
            .list(&ListParams::default().labels(label_selector))
            .await?;
        debug!("Listed {} pod(s)", list.items.len());
        Ok(list.items)
    }

    #[instrument(skip(self))]
    async fn list_certificates(&self, namespace: &str) -> Result<Vec<Certificate>, kube::Error> {
        let certificates: Api<Certificate> = Api::namespaced(self.client.clone(), namespace);
        let list = certificates.list(&ListParams::default()).await?;
        debug!("Listed {} certificate(s)", list.items.len());
        Ok(list.items)
    }
}
