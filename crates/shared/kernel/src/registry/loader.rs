use super::RegistryConfig;
use crate::certificate::{CertificateEntry, parse_certificate_entry};
use crate::config::{ConfigError, ConfigErrorExt, load_settings};
use crate::env::Env;
use crate::security::{Scope, Token, parse_token};
use crate::validation::{ValidationError, indexed, require};
use fxhash::FxHashMap;
use serde_yaml::{Mapping, Value};
use std::path::PathBuf;
use tracing::{debug, info};

/// Builds a [`RegistryConfig`] from an environment snapshot and the declarative file.
#[derive(Debug, Default)]
#[must_use]
pub struct RegistryLoader {
    env: Option<Env>,
    file: Option<PathBuf>,
}

impl RegistryLoader {
    /// Environment to read settings and secrets from. Defaults to the process environment.
    pub fn env(mut self, env: Env) -> Self {
        self.env = Some(env);
        self
    }

    /// Overrides `CONF_FILE`.
    pub fn file(mut self, path: impl Into<PathBuf>) -> Self {
        self.file = Some(path.into());
        self
    }

    /// Runs every loading step. The first violation aborts the load.
    pub fn load(self) -> Result<RegistryConfig, ConfigError> {
        let env = self.env.unwrap_or_else(Env::from_process);
        let (mut settings, credentials) = load_settings(&env)?;
        if let Some(file) = self.file {
            settings.conf_file = file;
        }

        let path = require::file_exists("CONF_FILE", &settings.conf_file)
            .map_err(|_| ConfigError::FileNotFound { path: settings.conf_file.clone() })?;
        let shown = path.display().to_string();
        debug!(path = %shown, "Reading configuration file");

        let text = std::fs::read_to_string(&path).context(shown.clone())?;
        let document: Value = serde_yaml::from_str(&text).context(shown.clone())?;

        let (certificates, index, tokens) =
            parse_document(&document, &env).map_err(|e| e.with_context(shown.clone()))?;

        info!(
            path = %shown,
            certificates = certificates.len(),
            tokens = tokens.len(),
            "Configuration loaded"
        );

        Ok(RegistryConfig { settings, credentials, certificates, index, tokens })
    }
}

type Parsed = (Vec<CertificateEntry>, FxHashMap<String, usize>, Vec<Token>);

fn parse_document(document: &Value, env: &Env) -> Result<Parsed, ConfigError> {
    let empty = Mapping::new();
    let root = match document {
        Value::Null => &empty,
        other => require::mapping("config", other)?,
    };

    let (certificates, index) = parse_certificates(root.get("certs"))?;
    let tokens = parse_tokens(root.get("tokens"), env, &index)?;
    Ok((certificates, index, tokens))
}

fn items<'v>(field: &str, value: Option<&'v Value>) -> Result<&'v [Value], ValidationError> {
    match value {
        None | Some(Value::Null) => Ok(&[]),
        Some(value) => require::list(field, value),
    }
}

fn parse_certificates(
    raw: Option<&Value>,
) -> Result<(Vec<CertificateEntry>, FxHashMap<String, usize>), ConfigError> {
    let raw = items("certs", raw)?;
    let mut certificates = Vec::with_capacity(raw.len());
    let mut index = FxHashMap::default();

    for (i, item) in raw.iter().enumerate() {
        let field = indexed("certs", i);
        let item = require::mapping(&field, item)?;

        if let Some(key) = item.get("key").and_then(Value::as_str)
            && let Some(&first) = index.get(key)
        {
            return Err(ConfigError::DuplicateKey { key: key.to_owned(), index: i, first, context: None });
        }

        let entry = parse_certificate_entry(item).map_err(|e| e.nested(&field))?;
        index.insert(entry.key().to_owned(), i);
        certificates.push(entry);
    }

    Ok((certificates, index))
}

fn parse_tokens(
    raw: Option<&Value>,
    env: &Env,
    certificates: &FxHashMap<String, usize>,
) -> Result<Vec<Token>, ConfigError> {
    let raw = items("tokens", raw)?;
    let mut tokens: Vec<Token> = Vec::with_capacity(raw.len());

    for (i, item) in raw.iter().enumerate() {
        let field = indexed("tokens", i);
        let item = require::mapping(&field, item)?;
        let token = parse_token(item, env).map_err(|e| e.nested(&field))?;

        let seen: Vec<&str> = tokens.iter().map(Token::env_ref).collect();
        require::not_one_of("env_ref", token.env_ref(), seen.as_slice()).map_err(|e| e.nested(&field))?;
        if let Some(first) = tokens.iter().position(|t| t.digest() == token.digest()) {
            return Err(ValidationError::new(
                "env_ref",
                format!(
                    "value '{}' resolves to the same secret as tokens[{first}]",
                    token.env_ref()
                ),
            )
            .nested(&field)
            .into());
        }

        for (j, permission) in token.permissions().iter().enumerate() {
            if let Scope::Certificate(key) = permission.scope()
                && !certificates.contains_key(key)
            {
                return Err(ValidationError::new(
                    indexed("permissions", j),
                    format!("value '{permission}' references undeclared certificate '{key}'"),
                )
                .nested(&field)
                .into());
            }
        }

        tokens.push(token);
    }

    Ok(tokens)
}
