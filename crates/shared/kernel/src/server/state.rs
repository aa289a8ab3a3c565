use crate::operations::CertificateOperations;
use crate::registry::{RegistryConfig, RegistryHandle};
use axum::extract::FromRef;
use std::borrow::Cow;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use std::time::Instant;

#[creg_derive::registry_error]
pub enum ApiStateError {
    #[error("State validation error{}: {message}", format_context(.context))]
    Validation { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
}

pub struct ApiStateInner {
    pub registry: RegistryHandle,
    pub operations: Arc<dyn CertificateOperations>,
    started: Instant,
}

impl fmt::Debug for ApiStateInner {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiStateInner").field("registry", &self.registry).finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct ApiState {
    inner: Arc<ApiStateInner>,
}

impl ApiState {
    #[must_use]
    pub fn builder() -> ApiStateBuilder {
        ApiStateBuilder::default()
    }

    /// Snapshot of the active registry. Hold it for the whole request.
    #[must_use]
    pub fn registry(&self) -> Arc<RegistryConfig> {
        self.inner.registry.current()
    }

    #[must_use]
    pub fn uptime_secs(&self) -> u64 {
        self.inner.started.elapsed().as_secs()
    }
}

impl Deref for ApiState {
    type Target = ApiStateInner;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl FromRef<ApiState> for RegistryHandle {
    fn from_ref(state: &ApiState) -> Self {
        state.inner.registry.clone()
    }
}

#[derive(Default)]
#[must_use]
pub struct ApiStateBuilder {
    registry: Option<RegistryHandle>,
    operations: Option<Arc<dyn CertificateOperations>>,
}

impl fmt::Debug for ApiStateBuilder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiStateBuilder")
            .field("registry", &self.registry)
            .field("operations", &self.operations.is_some())
            .finish()
    }
}

impl ApiStateBuilder {
    pub fn registry(mut self, registry: RegistryHandle) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn operations(mut self, operations: Arc<dyn CertificateOperations>) -> Self {
        self.operations = Some(operations);
        self
    }

    pub fn build(self) -> Result<ApiState, ApiStateError> {
        let registry = self.registry.ok_or_else(|| ApiStateError::Validation {
            message: "RegistryHandle not provided".into(),
            context: None,
        })?;
        let operations = self.operations.ok_or_else(|| ApiStateError::Validation {
            message: "CertificateOperations not provided".into(),
            context: None,
        })?;

        Ok(ApiState {
            inner: Arc::new(ApiStateInner { registry, operations, started: Instant::now() }),
        })
    }
}
