//! Certificates feature slice.
//!
//! [`router`] exposes read, issue and renew for declared certificates. Every route
//! authorizes the caller against the active registry before it looks the key up, so a token
//! scoped to one certificate cannot probe for the existence of others.
//! [`CertbotOperations`] is the production collaborator behind those routes.

mod certbot;
mod routes;

pub use certbot::CertbotOperations;
pub use routes::router;
