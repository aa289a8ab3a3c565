//! # Domain Models
//!
//! Pure types shared by every crate in the registry: the closed action vocabulary, log
//! levels, and the scalar settings read from the environment.
//! Keep it lean: no I/O, networking, or validation here, only data and simple helpers.

pub mod actions;
pub mod constants;
pub mod settings;
