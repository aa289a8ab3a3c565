//! Validated certificate declarations.

use crate::validation::{ValidationError, indexed, require};
use creg_domain::constants::ALLOWED_PLUGINS;
use regex::Regex;
use serde::Serialize;
use serde_yaml::Mapping;
use std::sync::LazyLock;

static KEY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z0-9][A-Za-z0-9._-]{0,254}$")
        .unwrap_or_else(|e| unreachable!("key pattern is a literal: {e}"))
});

/// One declared certificate. Built only through [`parse_certificate_entry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CertificateEntry {
    key: String,
    email: String,
    domains: Vec<String>,
    plugin: String,
}

impl CertificateEntry {
    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    #[must_use]
    pub fn email(&self) -> &str {
        &self.email
    }

    #[must_use]
    pub fn domains(&self) -> &[String] {
        &self.domains
    }

    #[must_use]
    pub fn plugin(&self) -> &str {
        &self.plugin
    }
}

/// Validates one `certs[]` item.
///
/// Cross-entry uniqueness of `key` is the loader's concern; this only looks at the record.
/// Field paths in the returned error are relative to the record (`domains[1]`).
pub fn parse_certificate_entry(raw: &Mapping) -> Result<CertificateEntry, ValidationError> {
    let key = require::present("key", raw.get("key"))?;
    let email = require::present("email", raw.get("email"))?;
    let domains = require::present("domains", raw.get("domains"))?;
    let plugin = require::present("plugin", raw.get("plugin"))?;

    let key = require::string("key", key)?;
    require::matches("key", key, &KEY).map_err(|e| {
        e.with_message(format!(
            "value '{key}' is not a valid certificate key, use letters, digits, '.', '_' or '-'"
        ))
    })?;

    let email = require::string("email", email)?;
    require::email("email", email)?;

    let plugin = require::string("plugin", plugin)?;
    require::one_of("plugin", plugin, ALLOWED_PLUGINS)?;

    let domains = require::list("domains", domains)?;
    if domains.is_empty() {
        return Err(ValidationError::new("domains", "must contain at least one domain"));
    }
    let domains = domains
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let field = indexed("domains", i);
            let domain = require::string(&field, value)?;
            require::domain(&field, domain)?;
            Ok(domain.to_owned())
        })
        .collect::<Result<Vec<_>, ValidationError>>()?;

    Ok(CertificateEntry {
        key: key.to_owned(),
        email: email.to_owned(),
        domains,
        plugin: plugin.to_owned(),
    })
}
