//! Literal values shared between the loader, the authorization engine, and the HTTP layer.

/// Wildcard accepted as a permission scope or action.
pub const WILDCARD: &str = "*";

/// Issuance plugins a certificate entry may request.
pub const ALLOWED_PLUGINS: &[&str] = &["dns-route53"];

/// Request header carrying the bearer credential.
pub const TOKEN_HEADER: &str = "x-api-token";

/// `OpenAPI` tag for liveness endpoints.
pub const SYSTEM_TAG: &str = "System";

/// `OpenAPI` tag for certificate endpoints.
pub const CERTS_TAG: &str = "Certificates";
