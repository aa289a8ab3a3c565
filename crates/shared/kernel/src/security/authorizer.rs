use super::token::Token;
use creg_domain::actions::Action;
use serde::Serialize;
use std::fmt;
use std::net::IpAddr;

/// Outcome of an authorization check. Denial is an ordinary value, not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthDecision {
    Allow,
    Deny(DenyReason),
}

impl AuthDecision {
    #[must_use]
    pub const fn is_allowed(self) -> bool {
        matches!(self, Self::Allow)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DenyReason {
    /// No configured token matches the presented credential.
    UnknownCredential,
    NetworkNotAllowed,
    PermissionMissing,
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::UnknownCredential => "unknown credential",
            Self::NetworkNotAllowed => "caller network is not allowed for this token",
            Self::PermissionMissing => "token lacks permission for this action",
        })
    }
}

/// Decides whether `token` may perform `action` on `cert_key` when presented from `caller`.
///
/// Both gates must pass. `cert_key` is `None` for registry-wide requests; only wildcard-scoped
/// permissions reach those.
#[must_use]
pub fn authorize(token: &Token, caller: IpAddr, cert_key: Option<&str>, action: Action) -> AuthDecision {
    if !token.admits(caller) {
        return AuthDecision::Deny(DenyReason::NetworkNotAllowed);
    }
    if token.permissions().iter().any(|p| p.grants(cert_key, action)) {
        AuthDecision::Allow
    } else {
        AuthDecision::Deny(DenyReason::PermissionMissing)
    }
}
