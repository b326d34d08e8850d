//! Closed set of principal roles

use serde::{Deserialize, Serialize};
use std::fmt;

/// Role carried by a principal
///
/// Role names a credential may carry that are not part of the closed set
/// collapse to [`Role::Unknown`], which owns no capabilities.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Role {
    Admin,
    Editor,
    User,
    Anonymous,
    Unknown,
}

impl Role {
    /// Roles that may be granted capabilities
    pub const KNOWN: [Role; 4] = [Self::Admin, Self::Editor, Self::User, Self::Anonymous];

    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Editor => "editor",
            Self::User => "user",
            Self::Anonymous => "anonymous",
            Self::Unknown => "unknown",
        }
    }

    /// Parse a role name, falling back to [`Role::Unknown`]
    #[must_use]
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "admin" => Self::Admin,
            "editor" => Self::Editor,
            "user" => Self::User,
            "anonymous" => Self::Anonymous,
            _ => Self::Unknown,
        }
    }

    #[must_use]
    pub const fn is_known(&self) -> bool {
        !matches!(self, Self::Unknown)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for Role {
    fn from(name: &str) -> Self {
        Self::parse(name)
    }
}

impl From<String> for Role {
    fn from(name: String) -> Self {
        Self::parse(&name)
    }
}

impl From<Role> for String {
    fn from(role: Role) -> Self {
        role.as_str().to_string()
    }
}
