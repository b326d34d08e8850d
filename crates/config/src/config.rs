//! Gate configuration with defaults and validation

use gatehouse_core::{
    constants::{
        API_RATE_LIMIT, DEFAULT_CACHE_MAX_ENTRIES, DEFAULT_CACHE_TTL_SECS,
        DEFAULT_SWEEP_INTERVAL_SECS, DEFAULT_TOKEN_TTL_SECS, LOGIN_RATE_LIMIT,
        REGISTER_RATE_LIMIT,
    },
    Capability, Error, Result, Role, RouteClass,
};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Fixed-window policy for one route class
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitPolicy {
    /// Requests allowed per window
    pub limit: u32,
    /// Window size in milliseconds
    pub window_ms: u64,
}

impl RateLimitPolicy {
    #[must_use]
    pub const fn new(limit: u32, window_ms: u64) -> Self {
        Self { limit, window_ms }
    }

    #[must_use]
    pub const fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }
}

impl From<(u32, u64)> for RateLimitPolicy {
    fn from((limit, window_ms): (u32, u64)) -> Self {
        Self::new(limit, window_ms)
    }
}

/// Response cache settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheSettings {
    /// TTL used when no route prefix matches
    pub default_ttl_secs: u64,
    /// Upper bound on live entries; the oldest entry is evicted beyond it
    pub max_entries: usize,
    /// TTL per path prefix; the longest matching prefix wins
    pub route_ttls: BTreeMap<String, u64>,
    /// Period of the background sweep of dead windows and entries
    pub sweep_interval_secs: u64,
}

impl Default for CacheSettings {
    fn default() -> Self {
        let route_ttls = [
            ("/api/news", DEFAULT_CACHE_TTL_SECS),
            ("/api/events", DEFAULT_CACHE_TTL_SECS),
            ("/api/conferences", DEFAULT_CACHE_TTL_SECS),
            ("/api/health", 60),
        ]
        .into_iter()
        .map(|(prefix, ttl)| (prefix.to_string(), ttl))
        .collect();

        Self {
            default_ttl_secs: DEFAULT_CACHE_TTL_SECS,
            max_entries: DEFAULT_CACHE_MAX_ENTRIES,
            route_ttls,
            sweep_interval_secs: DEFAULT_SWEEP_INTERVAL_SECS,
        }
    }
}

impl CacheSettings {
    /// Resolve the TTL for a request path
    #[must_use]
    pub fn ttl_for(&self, path: &str) -> Duration {
        let secs = self
            .route_ttls
            .iter()
            .filter(|(prefix, _)| path_has_prefix(path, prefix))
            .max_by_key(|(prefix, _)| prefix.len())
            .map_or(self.default_ttl_secs, |(_, ttl)| *ttl);
        Duration::from_secs(secs)
    }

    #[must_use]
    pub const fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }
}

/// `/api/news` matches `/api/news` and `/api/news/7` but not `/api/newsletter`
fn path_has_prefix(path: &str, prefix: &str) -> bool {
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/') || prefix.ends_with('/'),
        None => false,
    }
}

/// Hex-encoded ed25519 seed that never shows up in debug output
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SigningKeyHex(String);

impl SigningKeyHex {
    #[must_use]
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }

    /// Decode into a 32-byte seed
    pub fn seed(&self) -> Result<[u8; 32]> {
        let bytes = hex::decode(self.0.trim())
            .map_err(|e| Error::crypto("decode signing key", format!("not valid hex: {e}")))?;
        bytes.try_into().map_err(|bytes: Vec<u8>| {
            Error::crypto(
                "decode signing key",
                format!("expected 32 bytes, got {}", bytes.len()),
            )
        })
    }
}

impl fmt::Debug for SigningKeyHex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SigningKeyHex([redacted])")
    }
}

/// Everything the gate pipeline is configured with
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GateConfig {
    /// Seed for the credential authority; absent means an ephemeral key
    pub signing_key: Option<SigningKeyHex>,
    /// Lifetime of issued credentials
    pub token_ttl_secs: u64,
    /// Rate limit policy per route class
    pub rate_limits: BTreeMap<RouteClass, RateLimitPolicy>,
    /// Per-role capability overrides replacing the built-in table entry
    pub roles: BTreeMap<Role, BTreeSet<Capability>>,
    pub cache: CacheSettings,
}

impl Default for GateConfig {
    fn default() -> Self {
        let rate_limits = [
            (RouteClass::Login, LOGIN_RATE_LIMIT.into()),
            (RouteClass::Register, REGISTER_RATE_LIMIT.into()),
            (RouteClass::Api, API_RATE_LIMIT.into()),
        ]
        .into_iter()
        .collect();

        Self {
            signing_key: None,
            token_ttl_secs: DEFAULT_TOKEN_TTL_SECS,
            rate_limits,
            roles: BTreeMap::new(),
            cache: CacheSettings::default(),
        }
    }
}

impl GateConfig {
    #[must_use]
    pub fn rate_limit(&self, class: RouteClass) -> Option<RateLimitPolicy> {
        self.rate_limits.get(&class).copied()
    }

    #[must_use]
    pub const fn token_ttl(&self) -> Duration {
        Duration::from_secs(self.token_ttl_secs)
    }

    /// Decoded signing seed, if one is configured
    pub fn signing_seed(&self) -> Result<Option<[u8; 32]>> {
        self.signing_key.as_ref().map(SigningKeyHex::seed).transpose()
    }

    /// Reject configurations the gate cannot enforce
    pub fn validate(&self) -> Result<()> {
        if self.token_ttl_secs == 0 {
            return Err(Error::configuration("token_ttl_secs must be greater than 0"));
        }

        for (class, policy) in &self.rate_limits {
            if policy.limit == 0 {
                return Err(Error::configuration(format!(
                    "rate limit for '{class}' must allow at least one request"
                )));
            }
            if policy.window_ms == 0 {
                return Err(Error::configuration(format!(
                    "rate window for '{class}' must be greater than 0"
                )));
            }
        }

        if self.roles.contains_key(&Role::Unknown) {
            return Err(Error::configuration(
                "capabilities cannot be granted to unknown roles",
            ));
        }

        let cache = &self.cache;
        if cache.default_ttl_secs == 0 {
            return Err(Error::configuration("cache.default_ttl_secs must be greater than 0"));
        }
        if cache.max_entries == 0 {
            return Err(Error::configuration("cache.max_entries must be greater than 0"));
        }
        if cache.sweep_interval_secs == 0 {
            return Err(Error::configuration(
                "cache.sweep_interval_secs must be greater than 0",
            ));
        }
        if let Some((prefix, _)) = cache.route_ttls.iter().find(|(_, ttl)| **ttl == 0) {
            return Err(Error::configuration(format!(
                "cache TTL for '{prefix}' must be greater than 0"
            )));
        }

        self.signing_seed()?;
        Ok(())
    }
}

/// Where the effective configuration came from, highest precedence last applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Built-in defaults
    Default,
    /// Configuration file
    ConfigFile(PathBuf),
    /// Environment variables
    EnvironmentVariable(String),
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Default => f.write_str("defaults"),
            Self::ConfigFile(path) => write!(f, "file {}", path.display()),
            Self::EnvironmentVariable(name) => write!(f, "environment {name}"),
        }
    }
}

/// Builder for assembling configurations in code and tests
#[derive(Debug, Default)]
pub struct GateConfigBuilder {
    config: GateConfig,
}

impl GateConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_signing_key(mut self, hex: impl Into<String>) -> Self {
        self.config.signing_key = Some(SigningKeyHex::new(hex));
        self
    }

    pub fn with_token_ttl(mut self, ttl: Duration) -> Self {
        self.config.token_ttl_secs = ttl.as_secs();
        self
    }

    pub fn with_rate_limit(mut self, class: RouteClass, limit: u32, window: Duration) -> Self {
        #[allow(clippy::cast_possible_truncation)]
        let window_ms = window.as_millis() as u64;
        self.config
            .rate_limits
            .insert(class, RateLimitPolicy::new(limit, window_ms));
        self
    }

    pub fn with_role(
        mut self,
        role: Role,
        capabilities: impl IntoIterator<Item = Capability>,
    ) -> Self {
        self.config
            .roles
            .insert(role, capabilities.into_iter().collect());
        self
    }

    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.config.cache.default_ttl_secs = ttl.as_secs();
        self
    }

    pub fn with_route_ttl(mut self, prefix: impl Into<String>, ttl: Duration) -> Self {
        self.config
            .cache
            .route_ttls
            .insert(prefix.into(), ttl.as_secs());
        self
    }

    pub fn with_cache_capacity(mut self, max_entries: usize) -> Self {
        self.config.cache.max_entries = max_entries;
        self
    }

    /// Validate and return the configuration
    pub fn build(self) -> Result<GateConfig> {
        self.config.validate()?;
        Ok(self.config)
    }
}
