//! Client-side models of third-party custom resources
//!
//! Only the fields this job reads are modelled; the CRDs themselves are
//! installed and owned by cert-manager.

mod certificate;

pub use certificate::{
    Certificate, CertificateCondition, CertificateIssuerRef, CertificateSpec, CertificateStatus,
};
