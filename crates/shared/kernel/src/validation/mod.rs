//! Field-level validation for dynamic configuration input.
//!
//! Every check in [`require`] reports failures as a [`ValidationError`] carrying the dotted
//! field path (`certs[2].domains[0]`) and a message naming the offending value. Parsers nest
//! child errors under their parent path with [`ValidationError::nested`], so the loader never
//! has to rebuild paths by hand.

pub mod require;

use std::fmt;

/// A single field-level contract violation.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Field '{field}' {message}")]
pub struct ValidationError {
    field: String,
    message: String,
}

impl ValidationError {
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self { field: field.into(), message: message.into() }
    }

    #[must_use]
    pub fn field(&self) -> &str {
        &self.field
    }

    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Prefixes the field path with `parent`.
    #[must_use]
    pub fn nested(mut self, parent: &str) -> Self {
        self.field = join_path(parent, &self.field);
        self
    }

    /// Swaps the generated message for a caller-supplied one, keeping the path.
    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }
}

/// Joins two path segments, gluing index segments (`[3]`) without a dot.
#[must_use]
pub fn join_path(parent: &str, child: &str) -> String {
    match (parent.is_empty(), child.is_empty()) {
        (true, _) => child.to_owned(),
        (_, true) => parent.to_owned(),
        _ if child.starts_with('[') => format!("{parent}{child}"),
        _ => format!("{parent}.{child}"),
    }
}

/// Formats `name[index]`.
#[must_use]
pub fn indexed(name: &str, index: usize) -> String {
    format!("{name}[{index}]")
}

/// Runtime shape of a value parsed from the declarative file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Kind {
    Null,
    Bool,
    Number,
    String,
    List,
    Mapping,
}

impl Kind {
    #[must_use]
    pub fn of(value: &serde_yaml::Value) -> Self {
        use serde_yaml::Value;
        match value {
            Value::Null => Self::Null,
            Value::Bool(_) => Self::Bool,
            Value::Number(_) => Self::Number,
            Value::String(_) => Self::String,
            Value::Sequence(_) => Self::List,
            Value::Mapping(_) => Self::Mapping,
            Value::Tagged(tagged) => Self::of(&tagged.value),
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Null => "null",
            Self::Bool => "boolean",
            Self::Number => "number",
            Self::String => "string",
            Self::List => "list",
            Self::Mapping => "mapping",
        })
    }
}
