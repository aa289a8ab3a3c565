use super::response::ApiError;
use crate::registry::RegistryConfig;
use crate::security::{AuthDecision, DenyReason};
use axum::extract::{ConnectInfo, FromRequestParts};
use axum::http::request::Parts;
use creg_domain::actions::Action;
use creg_domain::constants::TOKEN_HEADER;
use std::fmt;
use std::net::{IpAddr, SocketAddr};
use zeroize::Zeroizing;

/// Credential and peer address of the current request.
///
/// A missing header yields an empty credential, which no token matches.
pub struct Caller {
    credential: Zeroizing<String>,
    address: IpAddr,
}

impl Caller {
    #[must_use]
    pub const fn address(&self) -> IpAddr {
        self.address
    }

    /// Maps the registry's decision onto HTTP semantics: an unknown credential is 401, every
    /// other denial is 403.
    pub fn authorize(
        &self,
        registry: &RegistryConfig,
        cert_key: Option<&str>,
        action: Action,
    ) -> Result<(), ApiError> {
        match registry.authorize(&self.credential, self.address, cert_key, action) {
            AuthDecision::Allow => Ok(()),
            AuthDecision::Deny(reason @ DenyReason::UnknownCredential) => {
                Err(ApiError::Unauthorized { reason })
            }
            AuthDecision::Deny(reason) => Err(ApiError::Forbidden { reason }),
        }
    }
}

impl fmt::Debug for Caller {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Caller").field("address", &self.address).finish_non_exhaustive()
    }
}

impl<S> FromRequestParts<S> for Caller
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let credential = parts
            .headers
            .get(TOKEN_HEADER)
            .and_then(|value| value.to_str().ok())
            .map(str::trim)
            .unwrap_or_default();
        let credential = Zeroizing::new(credential.to_owned());

        let ConnectInfo(peer) = ConnectInfo::<SocketAddr>::from_request_parts(parts, state)
            .await
            .map_err(|_| ApiError::from("peer address is unavailable"))?;

        Ok(Self { credential, address: peer.ip().to_canonical() })
    }
}
