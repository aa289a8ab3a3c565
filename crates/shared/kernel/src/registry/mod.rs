//! The validated, immutable registry and the handle that swaps it on reload.

mod handle;
mod loader;

pub use handle::RegistryHandle;
pub use loader::RegistryLoader;

use crate::certificate::CertificateEntry;
use crate::config::CloudCredentials;
use crate::security::token::{Token, digest};
use crate::security::{AuthDecision, DenyReason, authorize};
use creg_domain::actions::Action;
use creg_domain::settings::Settings;
use fxhash::FxHashMap;
use std::net::IpAddr;
use tracing::debug;

/// Settings, certificates and tokens, validated as a whole.
///
/// Built only by [`RegistryLoader`]; never mutated afterwards. Reloading builds a new value.
#[derive(Debug)]
pub struct RegistryConfig {
    settings: Settings,
    credentials: CloudCredentials,
    certificates: Vec<CertificateEntry>,
    index: FxHashMap<String, usize>,
    tokens: Vec<Token>,
}

impl RegistryConfig {
    #[must_use]
    pub fn loader() -> RegistryLoader {
        RegistryLoader::default()
    }

    #[must_use]
    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    #[must_use]
    pub const fn credentials(&self) -> &CloudCredentials {
        &self.credentials
    }

    /// Certificates in declaration order.
    #[must_use]
    pub fn certificates(&self) -> &[CertificateEntry] {
        &self.certificates
    }

    #[must_use]
    pub fn certificate(&self, key: &str) -> Option<&CertificateEntry> {
        self.index.get(key).and_then(|&i| self.certificates.get(i))
    }

    #[must_use]
    pub fn tokens(&self) -> &[Token] {
        &self.tokens
    }

    /// Finds the token whose secret equals `credential`.
    ///
    /// The credential is hashed and compared against every token in constant time, without
    /// stopping at the first hit.
    #[must_use]
    pub fn authenticate(&self, credential: &str) -> Option<&Token> {
        if credential.is_empty() {
            return None;
        }
        let presented = digest(credential.as_bytes());
        self.tokens.iter().fold(None, |found, token| {
            let hit = token.matches_digest(&presented);
            found.or(hit.then_some(token))
        })
    }

    /// Authenticates `credential` and runs both authorization gates.
    #[must_use]
    pub fn authorize(
        &self,
        credential: &str,
        caller: IpAddr,
        cert_key: Option<&str>,
        action: Action,
    ) -> AuthDecision {
        let decision = self
            .authenticate(credential)
            .map_or(AuthDecision::Deny(DenyReason::UnknownCredential), |token| {
                authorize(token, caller, cert_key, action)
            });
        if let AuthDecision::Deny(reason) = decision {
            debug!(%caller, cert_key, %action, %reason, "Request denied");
        }
        decision
    }
}
