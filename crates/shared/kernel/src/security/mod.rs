//! Credentials, grants and the decision function over them.

pub mod authorizer;
pub mod permission;
pub mod token;

pub use authorizer::{AuthDecision, DenyReason, authorize};
pub use permission::{Permission, Scope, parse_permission};
pub use token::{Token, parse_token};
