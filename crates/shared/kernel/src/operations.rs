//! The certificate-operations collaborator consulted after authorization succeeds.

use crate::certificate::CertificateEntry;
use crate::registry::RegistryConfig;
use serde::Serialize;
use std::borrow::Cow;
use std::future::Future;
use std::pin::Pin;

pub type OperationFuture<'a> =
    Pin<Box<dyn Future<Output = Result<CertificateOutput, OperationError>> + Send + 'a>>;

/// Performs issuance work for a validated certificate entry.
///
/// Every call receives the registry snapshot the request was authorized against, and must
/// take settings and credentials from it alone. `entry` belongs to that snapshot.
///
/// Object safe so the HTTP state can hold an `Arc<dyn CertificateOperations>`.
pub trait CertificateOperations: Send + Sync + 'static {
    fn issue<'a>(
        &'a self,
        registry: &'a RegistryConfig,
        entry: &'a CertificateEntry,
    ) -> OperationFuture<'a>;

    fn renew<'a>(
        &'a self,
        registry: &'a RegistryConfig,
        entry: &'a CertificateEntry,
    ) -> OperationFuture<'a>;

    fn read<'a>(
        &'a self,
        registry: &'a RegistryConfig,
        entry: &'a CertificateEntry,
    ) -> OperationFuture<'a>;
}

/// Result of a successful operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[cfg_attr(feature = "server", derive(utoipa::ToSchema))]
pub struct CertificateOutput {
    /// Certificate key
    pub key: String,
    /// Location of the full chain on disk
    pub path: String,
    /// PEM body for reads, tool output for issue and renew
    pub body: String,
}

#[creg_derive::registry_error]
pub enum OperationError {
    #[error("Certificate '{key}' has not been issued yet")]
    NotIssued { key: String },

    #[error("Command '{program}' failed with status {status}: {stderr}")]
    Command { program: String, status: String, stderr: String },

    #[error("I/O error{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Internal error{}: {message}", format_context(.context))]
    Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}
