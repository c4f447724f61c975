//! In-memory fakes shared by the unit tests

use std::collections::BTreeMap;
use std::sync::Mutex;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use k8s_openapi::api::core::v1::{Pod, PodStatus};
use k8s_openapi::apimachinery::pkg::apis::meta::v1::ObjectMeta;
use kube::core::ErrorResponse;

use crate::cluster::ClusterClient;
use crate::config::STATEFULSET_POD_LABEL;
use crate::crd::{Certificate, CertificateSpec, CertificateStatus};
use crate::reload::Reloader;

pub fn stateful_pod(name: &str, ip: &str) -> Pod {
    let mut labels = BTreeMap::new();
    labels.insert("app".to_string(), "fluentd".to_string());
    labels.insert(STATEFULSET_POD_LABEL.to_string(), name.to_string());
    pod(name, Some(ip), labels)
}

pub fn plain_pod(name: &str, ip: &str) -> Pod {
    let mut labels = BTreeMap::new();
    labels.insert("app".to_string(), "fluentd".to_string());
    pod(name, Some(ip), labels)
}

pub fn pod(name: &str, ip: Option<&str>, labels: BTreeMap<String, String>) -> Pod {
    Pod {
        metadata: ObjectMeta {
            name: Some(name.to_string()),
            namespace: Some("fluentd".to_string()),
            labels: Some(labels),
            ..Default::default()
        },
        status: Some(PodStatus {
            pod_ip: ip.map(str::to_string),
            ..Default::default()
        }),
        ..Default::default()
    }
}

pub fn certificate(name: &str, not_after: Option<DateTime<Utc>>) -> Certificate {
    let mut cert = Certificate::new(name, CertificateSpec::default());
    cert.metadata.namespace = Some("fluentd".to_string());
    cert.status = Some(CertificateStatus {
        not_after,
        renewal_time: not_after.map(|t| t - chrono::Duration::days(30)),
        ..Default::default()
    });
    cert
}

pub fn api_error(code: u16, reason: &str) -> kube::Error {
    kube::Error::Api(ErrorResponse {
        status: "Failure".to_string(),
        message: format!("{reason} for test"),
        reason: reason.to_string(),
        code,
    })
}

/// Cluster whose list calls return canned data or fail with an API error
#[derive(Default)]
pub struct FakeCluster {
    pub pods: Vec<Pod>,
    pub certificates: Vec<Certificate>,
    pub pods_error: Option<u16>,
    pub certificates_error: Option<u16>,
    pub selectors: Mutex<Vec<String>>,
}

#[async_trait]
impl ClusterClient for FakeCluster {
    async fn list_pods(
        &self,
        _namespace: &str,
        label_selector: &str,
    ) -> Result<Vec<Pod>, kube::Error> {
        self.selectors
            .lock()
            .unwrap()
            .push(label_selector.to_string());
        match self.pods_error {
            Some(code) => Err(api_error(code, "Forbidden")),
            None => Ok(self.pods.clone()),
        }
    }

    async fn list_certificates(&self, _namespace: &str) -> Result<Vec<Certificate>, kube::Error> {
        match self.certificates_error {
            Some(code) => Err(api_error(code, "NotFound")),
            None => Ok(self.certificates.clone()),
        }
    }
}

/// Reloader that records every address it is asked to reload
#[derive(Default)]
pub struct RecordingReloader {
    pub calls: Mutex<Vec<String>>,
    /// Addresses that answer with 503
    pub failing: Vec<String>,
}

impl RecordingReloader {
    pub fn failing_on(address: &str) -> Self {
        Self {
            failing: vec![address.to_string()],
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl Reloader for RecordingReloader {
    async fn reload(&self, address: &str) -> crate::Result<String> {
        self.calls.lock().unwrap().push(address.to_string());
        if self.failing.iter().any(|a| a == address) {
            return Err(crate::Error::ReloadError {
                address: address.to_string(),
                message: "503 Service Unavailable".to_string(),
            });
        }
        Ok("done".to_string())
    }
}
