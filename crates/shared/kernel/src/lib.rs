//! Policy core of the certificate registry.
//!
//! Raw configuration flows one way: environment and YAML are checked by the [`validation`]
//! guards, turned into [`certificate`] entries and [`security`] tokens, and frozen into a
//! [`registry::RegistryConfig`]. Every request is then decided by
//! [`RegistryConfig::authorize`](registry::RegistryConfig::authorize), a pure function over
//! that immutable value.
//!
//! ```rust,ignore
//! use creg_kernel::prelude::*;
//!
//! let registry = RegistryConfig::loader().env(Env::from_process()).load()?;
//! let decision = registry.authorize(credential, caller, Some("api.example.com"), Action::Renew);
//! ```
pub mod certificate;
pub mod config;
pub mod env;
pub mod operations;
pub mod prelude;
pub mod registry;
pub mod security;
#[cfg(feature = "server")]
pub mod server;
pub mod validation;

pub use creg_domain as domain;
