use crate::validation::ValidationError;
use std::borrow::Cow;
use std::path::PathBuf;

/// A token's `env_ref` names a variable that is unset or empty.
///
/// Kept apart from [`ValidationError`]: the file is well-formed, the deployment is missing a
/// secret.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Field '{field}' references environment variable '{variable}' which is not set or empty")]
pub struct SecretResolutionError {
    field: String,
    variable: String,
}

impl SecretResolutionError {
    pub fn new(field: impl Into<String>, variable: impl Into<String>) -> Self {
        Self { field: field.into(), variable: variable.into() }
    }

    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    /// Name of the unresolved environment variable.
    #[must_use]
    pub fn variable(&self) -> &str {
        &self.variable
    }

    #[must_use]
    pub fn nested(mut self, parent: &str) -> Self {
        self.field = crate::validation::join_path(parent, &self.field);
        self
    }
}

#[creg_derive::registry_error]
pub enum ConfigError {
    #[error("Invalid LOG_LEVEL={value}, allowed choices: {}", .allowed.join(", "))]
    InvalidLogLevel { value: String, allowed: &'static [&'static str] },

    #[error("Missing required environment variables: {}", .names.join(", "))]
    MissingEnv { names: Vec<&'static str> },

    #[error("Config file not found: {}", .path.display())]
    FileNotFound { path: PathBuf },

    #[error("Failed to read config file{}: {source}", format_context(.context))]
    Io { source: std::io::Error, context: Option<Cow<'static, str>> },

    #[error("Invalid YAML{}: {source}", format_context(.context))]
    Syntax { source: serde_yaml::Error, context: Option<Cow<'static, str>> },

    #[error("Invalid environment settings{}: {source}", format_context(.context))]
    Settings { source: config::ConfigError, context: Option<Cow<'static, str>> },

    #[error("Invalid configuration{}: {source}", format_context(.context))]
    Validation { source: ValidationError, context: Option<Cow<'static, str>> },

    #[error("Unresolved secret{}: {source}", format_context(.context))]
    Secret { source: SecretResolutionError, context: Option<Cow<'static, str>> },

    #[error(
        "Field 'certs[{index}].key' value '{key}' is duplicated, first declared at certs[{first}]{}",
        format_context(.context)
    )]
    DuplicateKey { key: String, index: usize, first: usize, context: Option<Cow<'static, str>> },
}

impl ConfigError {
    /// Prefixes the field path carried by a validation or secret failure.
    #[must_use]
    pub fn nested(self, parent: &str) -> Self {
        match self {
            Self::Validation { source, context } => {
                Self::Validation { source: source.nested(parent), context }
            }
            Self::Secret { source, context } => Self::Secret { source: source.nested(parent), context },
            other => other,
        }
    }

    /// Field path of the violation, when the error is attributable to one.
    #[must_use]
    pub fn field(&self) -> Option<Cow<'_, str>> {
        match self {
            Self::Validation { source, .. } => Some(Cow::Borrowed(source.field())),
            Self::Secret { source, .. } => Some(Cow::Borrowed(source.field())),
            Self::DuplicateKey { index, .. } => Some(Cow::Owned(format!("certs[{index}].key"))),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nesting_rewrites_paths_of_attributable_errors() {
        let err: ConfigError = ValidationError::new("domains[0]", "is required").into();
        let err = err.nested("certs[2]");
        assert_eq!(err.field().as_deref(), Some("certs[2].domains[0]"));

        let err: ConfigError = SecretResolutionError::new("env_ref", "API_TOKEN").into();
        let err = err.nested("tokens[1]");
        assert_eq!(err.field().as_deref(), Some("tokens[1].env_ref"));
        assert!(err.to_string().contains("'API_TOKEN'"));
    }

    #[test]
    fn messages_list_every_name() {
        let err = ConfigError::MissingEnv { names: vec!["AWS_ACCESS_KEY_ID", "AWS_SECRET_ACCESS_KEY"] };
        assert_eq!(
            err.to_string(),
            "Missing required environment variables: AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY"
        );

        let err = ConfigError::DuplicateKey { key: "dup".into(), index: 1, first: 0, context: None }
            .with_context("config.yaml");
        assert_eq!(
            err.to_string(),
            "Field 'certs[1].key' value 'dup' is duplicated, first declared at certs[0] (config.yaml)"
        );
    }
}
