use super::error::ConfigError;
use crate::env::Env;
use crate::validation::{ValidationError, require};
use config::{Config, Environment};
use creg_domain::settings::{LogLevel, Settings};
use serde::Deserialize;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use strum::VariantNames;
use tracing::debug;
use zeroize::Zeroizing;

/// Environment variables read into [`Settings`].
pub const SETTINGS_VARS: &[&str] = &[
    "LOG_LEVEL",
    "ACME_SERVER",
    "CERTS_DIR",
    "LOGS_DIR",
    "CONF_FILE",
    "CERTBOT_BIN",
    "CERTBOT_LOCK_FILE",
    "BIND_IP",
    "BIND_PORT",
];

pub const AWS_ACCESS_KEY_ID: &str = "AWS_ACCESS_KEY_ID";
pub const AWS_SECRET_ACCESS_KEY: &str = "AWS_SECRET_ACCESS_KEY";

/// Variables that must be set and non-empty.
pub const REQUIRED_VARS: &[&str] = &[AWS_ACCESS_KEY_ID, AWS_SECRET_ACCESS_KEY];

#[derive(Deserialize)]
#[serde(default)]
struct RawSettings {
    log_level: String,
    acme_server: String,
    certs_dir: PathBuf,
    logs_dir: PathBuf,
    conf_file: String,
    certbot_bin: PathBuf,
    certbot_lock_file: PathBuf,
    bind_ip: String,
    bind_port: i64,
}

impl Default for RawSettings {
    fn default() -> Self {
        let defaults = Settings::default();
        Self {
            log_level: defaults.log_level.to_string(),
            acme_server: defaults.acme_server,
            certs_dir: defaults.certs_dir,
            logs_dir: defaults.logs_dir,
            conf_file: Settings::DEFAULT_CONF_FILE.to_owned(),
            certbot_bin: defaults.certbot_bin,
            certbot_lock_file: defaults.certbot_lock_file,
            bind_ip: Settings::DEFAULT_BIND_IP.to_string(),
            bind_port: i64::from(Settings::DEFAULT_BIND_PORT),
        }
    }
}

/// Credential pair handed to the DNS plugin.
#[derive(Clone)]
pub struct CloudCredentials {
    access_key_id: Zeroizing<String>,
    secret_access_key: Zeroizing<String>,
}

impl CloudCredentials {
    pub fn new(access_key_id: impl Into<String>, secret_access_key: impl Into<String>) -> Self {
        Self {
            access_key_id: Zeroizing::new(access_key_id.into()),
            secret_access_key: Zeroizing::new(secret_access_key.into()),
        }
    }

    /// `(name, value)` pairs to export into a child process environment.
    #[must_use]
    pub fn env_pairs(&self) -> [(&'static str, &str); 2] {
        [
            (AWS_ACCESS_KEY_ID, self.access_key_id.as_str()),
            (AWS_SECRET_ACCESS_KEY, self.secret_access_key.as_str()),
        ]
    }
}

impl fmt::Debug for CloudCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CloudCredentials")
            .field("access_key_id", &"[REDACTED]")
            .field("secret_access_key", &"[REDACTED]")
            .finish()
    }
}

/// Reads scalar settings from `env`, falling back to defaults, then checks the log level and
/// required credentials.
pub fn load_settings(env: &Env) -> Result<(Settings, CloudCredentials), ConfigError> {
    let vars: config::Map<String, String> = SETTINGS_VARS
        .iter()
        .filter_map(|name| env.get(name).map(|value| ((*name).to_owned(), value.to_owned())))
        .collect();
    debug!(vars = ?vars.keys().collect::<Vec<_>>(), "Reading settings from environment");

    let raw = Config::builder()
        .add_source(Environment::default().source(Some(vars)))
        .build()?
        .try_deserialize::<RawSettings>()?;

    let log_level = raw.log_level.trim().to_ascii_uppercase();
    let log_level = log_level
        .parse::<LogLevel>()
        .map_err(|_| ConfigError::InvalidLogLevel { value: log_level, allowed: LogLevel::VARIANTS })?;

    let missing: Vec<&'static str> =
        REQUIRED_VARS.iter().copied().filter(|name| env.non_empty(name).is_none()).collect();
    let (Some(access_key_id), Some(secret_access_key)) =
        (env.non_empty(AWS_ACCESS_KEY_ID), env.non_empty(AWS_SECRET_ACCESS_KEY))
    else {
        return Err(ConfigError::MissingEnv { names: missing });
    };

    let bind_ip = raw.bind_ip.trim().parse::<IpAddr>().map_err(|e| {
        ValidationError::new("BIND_IP", format!("value '{}' is not a valid IP address, details: {e}", raw.bind_ip))
    })?;
    let bind_port = require::port("BIND_PORT", raw.bind_port)?;
    let conf_file = require::file_path("CONF_FILE", &raw.conf_file)?;

    let settings = Settings {
        log_level,
        acme_server: raw.acme_server,
        certs_dir: raw.certs_dir,
        logs_dir: raw.logs_dir,
        conf_file,
        certbot_bin: raw.certbot_bin,
        certbot_lock_file: raw.certbot_lock_file,
        bind: SocketAddr::new(bind_ip, bind_port),
    };

    Ok((settings, CloudCredentials::new(access_key_id, secret_access_key)))
}
