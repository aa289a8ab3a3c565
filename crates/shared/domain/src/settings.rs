use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use strum_macros::{AsRefStr, Display, EnumString, VariantNames};

/// Verbosity accepted in `LOG_LEVEL`.
#[derive(
    Debug,
    Default,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumString,
    VariantNames,
)]
#[serde(rename_all = "UPPERCASE")]
#[strum(serialize_all = "UPPERCASE", ascii_case_insensitive)]
pub enum LogLevel {
    Debug,
    #[default]
    Info,
    Warning,
    Error,
    Critical,
}

/// Scalar process settings, fully typed.
///
/// Cloud credentials are deliberately absent: they are secrets and live next to the
/// token material in the kernel.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub log_level: LogLevel,
    pub acme_server: String,
    pub certs_dir: PathBuf,
    pub logs_dir: PathBuf,
    pub conf_file: PathBuf,
    pub certbot_bin: PathBuf,
    pub certbot_lock_file: PathBuf,
    pub bind: SocketAddr,
}

impl Settings {
    pub const DEFAULT_ACME_SERVER: &'static str = "https://acme-v02.api.letsencrypt.org/directory";
    pub const DEFAULT_CERTS_DIR: &'static str = "/certs";
    pub const DEFAULT_LOGS_DIR: &'static str = "/logs";
    pub const DEFAULT_CONF_FILE: &'static str = "/config/config.yaml";
    pub const DEFAULT_CERTBOT_BIN: &'static str = "/usr/bin/certbot";
    pub const DEFAULT_CERTBOT_LOCK_FILE: &'static str = "/locks/certbot.lock";
    pub const DEFAULT_BIND_IP: IpAddr = IpAddr::V4(Ipv4Addr::UNSPECIFIED);
    pub const DEFAULT_BIND_PORT: u16 = 8080;
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            acme_server: Self::DEFAULT_ACME_SERVER.to_owned(),
            certs_dir: PathBuf::from(Self::DEFAULT_CERTS_DIR),
            logs_dir: PathBuf::from(Self::DEFAULT_LOGS_DIR),
            conf_file: PathBuf::from(Self::DEFAULT_CONF_FILE),
            certbot_bin: PathBuf::from(Self::DEFAULT_CERTBOT_BIN),
            certbot_lock_file: PathBuf::from(Self::DEFAULT_CERTBOT_LOCK_FILE),
            bind: SocketAddr::new(Self::DEFAULT_BIND_IP, Self::DEFAULT_BIND_PORT),
        }
    }
}
