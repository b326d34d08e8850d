//! Named permissions checked by the permission evaluator

use crate::errors::Error;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A single named permission such as `write:news`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Capability {
    ReadNews,
    WriteNews,
    DeleteNews,
    ReadEvents,
    WriteEvents,
    DeleteEvents,
    RegisterEvents,
    ReadConferences,
    WriteConferences,
    DeleteConferences,
    ReadProfile,
    WriteProfile,
    ManageUsers,
    ManageRoles,
}

impl Capability {
    /// Every capability the gate knows about
    pub const ALL: [Capability; 14] = [
        Self::ReadNews,
        Self::WriteNews,
        Self::DeleteNews,
        Self::ReadEvents,
        Self::WriteEvents,
        Self::DeleteEvents,
        Self::RegisterEvents,
        Self::ReadConferences,
        Self::WriteConferences,
        Self::DeleteConferences,
        Self::ReadProfile,
        Self::WriteProfile,
        Self::ManageUsers,
        Self::ManageRoles,
    ];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::ReadNews => "read:news",
            Self::WriteNews => "write:news",
            Self::DeleteNews => "delete:news",
            Self::ReadEvents => "read:events",
            Self::WriteEvents => "write:events",
            Self::DeleteEvents => "delete:events",
            Self::RegisterEvents => "register:events",
            Self::ReadConferences => "read:conferences",
            Self::WriteConferences => "write:conferences",
            Self::DeleteConferences => "delete:conferences",
            Self::ReadProfile => "read:profile",
            Self::WriteProfile => "write:profile",
            Self::ManageUsers => "manage:users",
            Self::ManageRoles => "manage:roles",
        }
    }

    /// The action half of the name (`write` in `write:news`)
    #[must_use]
    pub fn action(&self) -> &'static str {
        let name = self.as_str();
        name.split_once(':').map_or(name, |(action, _)| action)
    }

    /// The resource half of the name (`news` in `write:news`)
    #[must_use]
    pub fn resource(&self) -> &'static str {
        let name = self.as_str();
        name.split_once(':').map_or(name, |(_, resource)| resource)
    }
}

impl fmt::Display for Capability {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Capability {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|cap| cap.as_str() == s.trim())
            .ok_or_else(|| Error::invalid_value("capability", s))
    }
}

impl TryFrom<String> for Capability {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Capability> for String {
    fn from(cap: Capability) -> Self {
        cap.as_str().to_string()
    }
}
