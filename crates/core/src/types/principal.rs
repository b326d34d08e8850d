//! The identity making a request

use super::role::Role;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::IpAddr;

/// Who a principal is: an authenticated user, or an anonymous network source
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum PrincipalId {
    User(String),
    Source(IpAddr),
}

impl PrincipalId {
    /// Key under which rate windows and private cache entries are stored
    #[must_use]
    pub fn partition_key(&self) -> String {
        match self {
            Self::User(id) => format!("user:{id}"),
            Self::Source(addr) => format!("source:{addr}"),
        }
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User(id) => write!(f, "{id}"),
            Self::Source(addr) => write!(f, "{addr}"),
        }
    }
}

/// Resolved identity for a single request; never outlives it
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Principal {
    id: PrincipalId,
    email: Option<String>,
    role: Role,
}

impl Principal {
    /// Principal decoded from a verified credential
    #[must_use]
    pub fn authenticated(id: impl Into<String>, email: impl Into<String>, role: Role) -> Self {
        Self {
            id: PrincipalId::User(id.into()),
            email: Some(email.into()),
            role,
        }
    }

    /// Principal for a request that carried no credential
    #[must_use]
    pub fn anonymous(source: IpAddr) -> Self {
        Self {
            id: PrincipalId::Source(source),
            email: None,
            role: Role::Anonymous,
        }
    }

    #[must_use]
    pub fn id(&self) -> &PrincipalId {
        &self.id
    }

    #[must_use]
    pub fn email(&self) -> Option<&str> {
        self.email.as_deref()
    }

    #[must_use]
    pub fn role(&self) -> Role {
        self.role
    }

    #[must_use]
    pub fn is_anonymous(&self) -> bool {
        matches!(self.id, PrincipalId::Source(_))
    }
}

impl fmt::Display for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.role, self.id)
    }
}
