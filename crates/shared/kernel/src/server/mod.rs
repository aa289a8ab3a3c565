//! HTTP building blocks shared by the server binary and feature slices.

mod caller;
mod health;
pub mod response;
pub mod router;
mod state;

pub use caller::Caller;
pub use response::{ApiError, Envelope};
pub use state::{ApiState, ApiStateBuilder, ApiStateError, ApiStateInner};
