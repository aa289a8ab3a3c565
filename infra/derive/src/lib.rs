#![allow(unreachable_pub)]
#![allow(clippy::needless_pass_by_value)]

//! # Macros
//!
//! Procedural macros for the registry workspace.
//!
//! The only macro currently exported is [`registry_error`], which every crate uses to declare
//! its error enum so that context propagation and source conversions look the same everywhere.

mod error;

use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

/// Attribute macro for declaring domain error enums.
///
/// # Injected behaviour
///
/// * **Derives**: `Debug` and `thiserror::Error` unless already derived.
/// * **Context trait**: a companion `<Name>Ext` trait adding `.context(...)` to
///   `Result<T, Name>` and to `Result<T, Source>` for every wrapped source type.
/// * **Conversions**: `From<Source>` for each variant holding a `source` field (or a field
///   marked `#[source]`/`#[from]`), so `?` works on upstream errors.
/// * **`with_context`**: an inherent method replacing the context of an already built error.
/// * **Internal fallback**: `From<&'static str>` and `From<String>` when an `Internal` variant
///   exists.
///
/// # Requirements
///
/// 1. Only enums are accepted, and every variant must use named fields.
/// 2. A `context` field must be `Option<Cow<'static, str>>`.
/// 3. A variant wrapping a source must also carry `context`, and nothing else besides them.
///
/// # Example
///
/// ```rust,ignore
/// use creg_derive::registry_error;
/// use std::borrow::Cow;
///
/// #[registry_error]
/// pub enum LoaderError {
///     #[error("I/O error{}: {source}", format_context(.context))]
///     Io { source: std::io::Error, context: Option<Cow<'static, str>> },
///
///     #[error("Internal fault{}: {message}", format_context(.context))]
///     Internal { message: Cow<'static, str>, context: Option<Cow<'static, str>> },
/// }
///
/// fn read(path: &std::path::Path) -> Result<String, LoaderError> {
///     std::fs::read_to_string(path).context("Reading registry file")
/// }
/// ```
#[proc_macro_attribute]
pub fn registry_error(_args: TokenStream, item: TokenStream) -> TokenStream {
    let input = parse_macro_input!(item as DeriveInput);
    error::expand(input).into()
}
