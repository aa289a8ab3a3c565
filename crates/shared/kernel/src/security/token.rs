use super::permission::{Permission, parse_permission};
use crate::config::{ConfigError, SecretResolutionError};
use crate::env::Env;
use crate::validation::{indexed, require};
use ipnet::IpNet;
use serde_yaml::Mapping;
use sha2::{Digest, Sha256};
use std::fmt;
use std::net::IpAddr;
use subtle::ConstantTimeEq;

const ENV_REF: &str = "env_ref";
const ENV_REF_ALIAS: &str = "env";

pub(crate) type SecretDigest = [u8; 32];

pub(crate) fn digest(secret: &[u8]) -> SecretDigest {
    Sha256::digest(secret).into()
}

/// An API credential with its network allow-list and grants.
///
/// Only the SHA-256 digest of the secret is kept.
pub struct Token {
    env_ref: String,
    digest: SecretDigest,
    networks: Vec<IpNet>,
    permissions: Vec<Permission>,
}

impl Token {
    /// Name of the environment variable the secret was resolved from.
    #[must_use]
    pub fn env_ref(&self) -> &str {
        &self.env_ref
    }

    #[must_use]
    pub fn networks(&self) -> &[IpNet] {
        &self.networks
    }

    #[must_use]
    pub fn permissions(&self) -> &[Permission] {
        &self.permissions
    }

    pub(crate) const fn digest(&self) -> &SecretDigest {
        &self.digest
    }

    /// Constant-time comparison of a presented digest against this token's secret.
    pub(crate) fn matches_digest(&self, presented: &SecretDigest) -> bool {
        self.digest[..].ct_eq(&presented[..]).into()
    }

    /// Whether `caller` falls within any allowed network. An empty allow-list admits nobody.
    #[must_use]
    pub fn admits(&self, caller: IpAddr) -> bool {
        let caller = caller.to_canonical();
        self.networks.iter().any(|net| net.contains(&caller))
    }
}

impl fmt::Debug for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Token")
            .field("env_ref", &self.env_ref)
            .field("networks", &self.networks)
            .field("permissions", &self.permissions)
            .finish_non_exhaustive()
    }
}

/// Validates one `tokens[]` item and resolves its secret from `env`.
///
/// Gates run in order and the first failure wins: presence of `env_ref`, `allowed_ips` and
/// `permissions`; secret resolution; each network; each permission. Field paths are relative
/// to the record.
///
/// Surrounding whitespace is stripped from the secret, matching how presented credentials are
/// read. A secret that is empty after trimming counts as unresolved.
pub fn parse_token(raw: &Mapping, env: &Env) -> Result<Token, ConfigError> {
    let env_ref = require::present(ENV_REF, raw.get(ENV_REF).or_else(|| raw.get(ENV_REF_ALIAS)))?;
    let allowed_ips = require::present("allowed_ips", raw.get("allowed_ips"))?;
    let permissions = require::present("permissions", raw.get("permissions"))?;

    let env_ref = require::string(ENV_REF, env_ref)?;
    let secret = env
        .non_empty(env_ref)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .ok_or_else(|| SecretResolutionError::new(ENV_REF, env_ref))?;

    let networks = require::list("allowed_ips", allowed_ips)?
        .iter()
        .enumerate()
        .map(|(i, value)| {
            let field = indexed("allowed_ips", i);
            require::ip_network(&field, require::string(&field, value)?)
        })
        .collect::<Result<Vec<_>, _>>()?;

    let permissions = require::list("permissions", permissions)?
        .iter()
        .enumerate()
        .map(|(i, value)| parse_permission(i, require::string(&indexed("permissions", i), value)?))
        .collect::<Result<Vec<_>, _>>()?;

    Ok(Token {
        env_ref: env_ref.to_owned(),
        digest: digest(secret.as_bytes()),
        networks,
        permissions,
    })
}
