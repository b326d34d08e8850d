//! What the gate hands back for an admitted request

use gatehouse_cache::{CacheKey, CachedResponse};
use gatehouse_core::{Principal, RateStatus};
use serde::Serialize;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

/// Stages a request passes through, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Identity,
    Permission,
    Rate,
    Cache,
    Handler,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Identity => "identity",
            Self::Permission => "permission",
            Self::Rate => "rate",
            Self::Cache => "cache",
            Self::Handler => "handler",
        })
    }
}

/// A request that passed identity, permission and rate checks
#[derive(Debug, Clone)]
pub struct Admission {
    pub principal: Principal,
    /// Quota after this request, absent on exempt routes
    pub rate: Option<RateStatus>,
    /// Clock reading taken once for the whole request
    pub now_ms: u64,
}

/// Cache flag reported on cacheable routes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum CacheStatus {
    Hit,
    Miss,
}

impl CacheStatus {
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Hit => "HIT",
            Self::Miss => "MISS",
        }
    }
}

impl fmt::Display for CacheStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cache metadata for one response
#[derive(Debug, Clone, PartialEq)]
pub struct CacheOutcome {
    pub status: CacheStatus,
    pub key: CacheKey,
    /// Freshness left on the stored entry; zero when nothing was stored
    pub max_age: Duration,
}

/// An allowed response with its rate and cache metadata
#[derive(Debug, Clone)]
pub struct GateResponse {
    pub response: Arc<CachedResponse>,
    pub principal: Principal,
    pub rate: Option<RateStatus>,
    pub cache: Option<CacheOutcome>,
}

impl GateResponse {
    #[must_use]
    pub fn status(&self) -> u16 {
        self.response.status
    }

    #[must_use]
    pub fn body(&self) -> &serde_json::Value {
        &self.response.body
    }

    #[must_use]
    pub fn cache_status(&self) -> Option<CacheStatus> {
        self.cache.as_ref().map(|outcome| outcome.status)
    }
}
