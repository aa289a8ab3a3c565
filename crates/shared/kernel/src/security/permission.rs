use crate::validation::{ValidationError, indexed, require};
use creg_domain::actions::{Action, ActionSet};
use creg_domain::constants::WILDCARD;
use regex::Regex;
use std::fmt;
use std::sync::LazyLock;
use strum::VariantNames;

// Greedy scope, so the action is always taken after the last colon.
static PERMISSION: LazyLock<Regex> = LazyLock::new(|| {
    let actions: Vec<String> = Action::VARIANTS.iter().map(|a| regex::escape(a)).collect();
    Regex::new(&format!(r"^(.+):(\*|{})$", actions.join("|")))
        .unwrap_or_else(|e| unreachable!("permission pattern is built from literals: {e}"))
});

/// Which certificates a permission reaches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Scope {
    Any,
    Certificate(String),
}

impl Scope {
    /// `target` is `None` for registry-wide requests, which only a wildcard scope covers.
    #[must_use]
    pub fn covers(&self, target: Option<&str>) -> bool {
        match (self, target) {
            (Self::Any, _) => true,
            (Self::Certificate(key), Some(target)) => key == target,
            (Self::Certificate(_), None) => false,
        }
    }

    #[must_use]
    pub fn certificate(&self) -> Option<&str> {
        match self {
            Self::Any => None,
            Self::Certificate(key) => Some(key),
        }
    }
}

impl From<&str> for Scope {
    fn from(s: &str) -> Self {
        if s == WILDCARD { Self::Any } else { Self::Certificate(s.to_owned()) }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str(WILDCARD),
            Self::Certificate(key) => f.write_str(key),
        }
    }
}

/// A single `(scope, action)` grant.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Permission {
    scope: Scope,
    actions: ActionSet,
}

impl Permission {
    #[must_use]
    pub const fn scope(&self) -> &Scope {
        &self.scope
    }

    #[must_use]
    pub const fn actions(&self) -> ActionSet {
        self.actions
    }

    #[must_use]
    pub fn grants(&self, target: Option<&str>, action: Action) -> bool {
        self.scope.covers(target) && self.actions.allows(action)
    }
}

impl fmt::Display for Permission {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.scope, self.actions)
    }
}

/// Parses `<scope>:<action>` found at `permissions[index]`.
pub fn parse_permission(index: usize, raw: &str) -> Result<Permission, ValidationError> {
    let field = indexed("permissions", index);
    let raw = raw.trim();

    let caps = require::matches(&field, raw, &PERMISSION).map_err(|e| {
        e.with_message(format!(
            "value '{raw}' is invalid, value needs to be provided in following format: \
             '(*|<cert_key>):(*|{})'",
            Action::VARIANTS.join("|")
        ))
    })?;
    let scope = caps.get(1).map_or("", |m| m.as_str());
    let action = caps.get(2).map_or("", |m| m.as_str());

    let mut allowed: Vec<&str> = Action::VARIANTS.to_vec();
    allowed.push(WILDCARD);
    require::one_of(&field, action, &allowed)?;

    let actions = ActionSet::parse(action)
        .ok_or_else(|| ValidationError::new(&field, format!("value '{action}' is not an action")))?;

    Ok(Permission { scope: Scope::from(scope), actions })
}
