pub use crate::certificate::CertificateEntry;
pub use crate::config::{CloudCredentials, ConfigError, SecretResolutionError};
pub use crate::env::Env;
pub use crate::operations::{CertificateOperations, CertificateOutput, OperationError, OperationFuture};
pub use crate::registry::{RegistryConfig, RegistryHandle, RegistryLoader};
pub use crate::security::{AuthDecision, DenyReason};
pub use crate::validation::ValidationError;
pub use creg_domain::actions::{Action, ActionSet};
pub use creg_domain::settings::{LogLevel, Settings};
