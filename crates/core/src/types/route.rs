//! Static description of a gated endpoint

use super::capability::Capability;
use super::rate::RouteClass;
use super::role::Role;
use std::fmt;
use std::time::Duration;

/// Whether an operation reads or mutates its collection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AccessKind {
    Read,
    Write,
}

/// Whether a credential must be present
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthRequirement {
    /// Anonymous callers are let through as the `anonymous` role
    Public,
    /// A valid credential is mandatory
    Authenticated,
}

/// Authorization needed to perform an operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Requirement {
    /// No authorization beyond the authentication requirement
    None,
    /// One specific capability
    Capability(Capability),
    /// At least one of the capabilities
    AnyOf(Vec<Capability>),
    /// Every one of the capabilities
    AllOf(Vec<Capability>),
    /// The principal's role must be one of these
    RoleIn(Vec<Role>),
}

impl fmt::Display for Requirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join<T: fmt::Display>(items: &[T], sep: &str) -> String {
            items
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(sep)
        }

        match self {
            Self::None => f.write_str("none"),
            Self::Capability(cap) => write!(f, "{cap}"),
            Self::AnyOf(caps) => write!(f, "any of [{}]", join(caps, ", ")),
            Self::AllOf(caps) => write!(f, "all of [{}]", join(caps, ", ")),
            Self::RoleIn(roles) => write!(f, "role in [{}]", join(roles, ", ")),
        }
    }
}

/// Who a cached response may be served to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheScope {
    /// One entry serves every caller
    Shared,
    /// Entries are partitioned per principal
    Private,
}

/// Caching behaviour of a read route
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CachePolicy {
    pub scope: CacheScope,
    /// Explicit TTL; `None` falls back to the configured per-prefix TTL
    pub ttl: Option<Duration>,
}

impl CachePolicy {
    #[must_use]
    pub const fn shared() -> Self {
        Self {
            scope: CacheScope::Shared,
            ttl: None,
        }
    }

    #[must_use]
    pub const fn private() -> Self {
        Self {
            scope: CacheScope::Private,
            ttl: None,
        }
    }

    #[must_use]
    pub const fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }
}

/// A gated endpoint and everything the pipeline needs to know about it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    /// Stable name used in logs, e.g. `news.create`
    pub name: String,
    /// Collection the endpoint belongs to, e.g. `/api/news`
    pub collection: String,
    pub access: AccessKind,
    pub auth: AuthRequirement,
    pub requirement: Requirement,
    /// `None` exempts the route from rate limiting
    pub route_class: Option<RouteClass>,
    /// `None` disables caching; ignored for write routes
    pub cache: Option<CachePolicy>,
}

impl Route {
    /// Public, unthrottled, uncached read route
    #[must_use]
    pub fn read(name: impl Into<String>, collection: impl Into<String>) -> Self {
        Self::new(name, collection, AccessKind::Read)
    }

    /// Authenticated, unthrottled write route
    #[must_use]
    pub fn write(name: impl Into<String>, collection: impl Into<String>) -> Self {
        Self::new(name, collection, AccessKind::Write).authenticated()
    }

    fn new(name: impl Into<String>, collection: impl Into<String>, access: AccessKind) -> Self {
        Self {
            name: name.into(),
            collection: collection.into(),
            access,
            auth: AuthRequirement::Public,
            requirement: Requirement::None,
            route_class: None,
            cache: None,
        }
    }

    #[must_use]
    pub fn authenticated(mut self) -> Self {
        self.auth = AuthRequirement::Authenticated;
        self
    }

    #[must_use]
    pub fn public(mut self) -> Self {
        self.auth = AuthRequirement::Public;
        self
    }

    #[must_use]
    pub fn requires(mut self, capability: Capability) -> Self {
        self.requirement = Requirement::Capability(capability);
        self
    }

    #[must_use]
    pub fn requires_any(mut self, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        self.requirement = Requirement::AnyOf(capabilities.into_iter().collect());
        self
    }

    #[must_use]
    pub fn requires_all(mut self, capabilities: impl IntoIterator<Item = Capability>) -> Self {
        self.requirement = Requirement::AllOf(capabilities.into_iter().collect());
        self
    }

    #[must_use]
    pub fn requires_role(mut self, roles: impl IntoIterator<Item = Role>) -> Self {
        self.requirement = Requirement::RoleIn(roles.into_iter().collect());
        self
    }

    #[must_use]
    pub fn rate_limited(mut self, class: RouteClass) -> Self {
        self.route_class = Some(class);
        self
    }

    #[must_use]
    pub fn cached(mut self, policy: CachePolicy) -> Self {
        self.cache = Some(policy);
        self
    }

    #[must_use]
    pub fn requires_authentication(&self) -> bool {
        self.auth == AuthRequirement::Authenticated
    }

    #[must_use]
    pub fn is_write(&self) -> bool {
        self.access == AccessKind::Write
    }

    /// Cache policy, only ever present on read routes
    #[must_use]
    pub fn cache_policy(&self) -> Option<CachePolicy> {
        match self.access {
            AccessKind::Read => self.cache,
            AccessKind::Write => None,
        }
    }
}
