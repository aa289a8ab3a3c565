use crate::constants::WILDCARD;
use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString, VariantNames};

/// A single operation a token may be allowed to perform.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    AsRefStr,
    Display,
    EnumIter,
    EnumString,
    VariantNames,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Action {
    Read,
    Issue,
    Renew,
    Health,
}

bitflags! {
    /// The set of actions granted by one permission.
    ///
    /// A wildcard grant is represented as [`ActionSet::ALL`].
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct ActionSet: u8 {
        const READ = 1 << 0;
        const ISSUE = 1 << 1;
        const RENEW = 1 << 2;
        const HEALTH = 1 << 3;

        const ALL = Self::READ.bits() | Self::ISSUE.bits() | Self::RENEW.bits() | Self::HEALTH.bits();
    }
}

impl From<Action> for ActionSet {
    fn from(action: Action) -> Self {
        match action {
            Action::Read => Self::READ,
            Action::Issue => Self::ISSUE,
            Action::Renew => Self::RENEW,
            Action::Health => Self::HEALTH,
        }
    }
}

impl ActionSet {
    /// Parses `*` or a single action name. Anything else yields `None`.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        if s == WILDCARD {
            return Some(Self::ALL);
        }
        s.parse::<Action>().ok().map(Self::from)
    }

    #[must_use]
    pub fn allows(self, action: Action) -> bool {
        self.contains(Self::from(action))
    }
}

impl std::fmt::Display for ActionSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if *self == Self::ALL {
            return f.write_str(WILDCARD);
        }
        let mut first = true;
        for (name, _) in self.iter_names() {
            if !first {
                f.write_str("|")?;
            }
            f.write_str(&name.to_ascii_lowercase())?;
            first = false;
        }
        Ok(())
    }
}
