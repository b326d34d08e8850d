//! The request gate: identity, permission, rate and cache stages in order

use crate::response::{Admission, CacheOutcome, CacheStatus, GateResponse, Stage};
use gatehouse_cache::{CacheKey, CachedResponse, ResponseCache};
use gatehouse_config::{GateConfig, RateLimitPolicy};
use gatehouse_core::{
    Clock, GateError, GateRequest, Principal, RateStatus, Result, Route, RouteClass, SystemClock,
};
use gatehouse_security::{
    CredentialAuthority, IdentityResolver, PermissionEvaluator, RateLimiter, RoleTable,
};
use gatehouse_utils::tracing::{cache_event, gate_decision, rate_event, request_span};
use std::collections::BTreeMap;
use std::fmt::Display;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, Instrument};

/// How many dead entries one sweep reclaimed
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub windows: usize,
    pub entries: usize,
}

/// The gate every request passes before reaching its handler
///
/// The rate window store and the response cache are owned by the gate and
/// shared by reference; nothing here is global.
#[derive(Debug)]
pub struct Gate {
    identity: IdentityResolver,
    permissions: PermissionEvaluator,
    limiter: Arc<RateLimiter>,
    cache: Arc<ResponseCache>,
    rate_limits: BTreeMap<RouteClass, RateLimitPolicy>,
    sweep_interval: Duration,
    clock: Arc<dyn Clock>,
}

impl Gate {
    /// Gate with stores and authority built from configuration
    pub fn from_config(config: &GateConfig, clock: Arc<dyn Clock>) -> Result<Self> {
        GateBuilder::new(config.clone()).with_clock(clock).build()
    }

    #[must_use]
    pub fn builder(config: GateConfig) -> GateBuilder {
        GateBuilder::new(config)
    }

    /// Run identity, permission and rate checks for a request
    pub fn admit(&self, route: &Route, request: &GateRequest) -> Result<Admission, GateError> {
        let now_ms = self.clock.now_ms();

        let principal = self.identity.resolve(
            route.auth,
            request.authorization.as_deref(),
            request.source,
            now_ms,
        )?;
        debug!(stage = %Stage::Identity, %principal, "identity resolved");

        self.permissions.check(&principal, &route.requirement)?;
        debug!(stage = %Stage::Permission, requirement = %route.requirement, "permission granted");

        let rate = self.count_request(route, &principal, now_ms)?;
        debug!(stage = %Stage::Rate, "rate checked");

        Ok(Admission {
            principal,
            rate,
            now_ms,
        })
    }

    fn count_request(
        &self,
        route: &Route,
        principal: &Principal,
        now_ms: u64,
    ) -> Result<Option<RateStatus>, GateError> {
        let Some(class) = route.route_class else {
            return Ok(None);
        };
        let Some(policy) = self.rate_limits.get(&class).copied() else {
            debug!(route = %route.name, %class, "no rate policy configured for route class");
            return Ok(None);
        };

        let key = principal.id().partition_key();
        let status = self.limiter.check(&key, class, policy, now_ms)?;
        rate_event(&key, class.as_str(), status.remaining);
        Ok(Some(status))
    }

    /// Gate a request and, once admitted, serve it from cache or the handler
    ///
    /// The handler receives the resolved principal. Its error becomes
    /// [`GateError::Internal`] and is never cached. A successful write
    /// invalidates every cached read of the route's collection.
    pub async fn handle<F, Fut, E>(
        &self,
        route: &Route,
        request: &GateRequest,
        handler: F,
    ) -> Result<GateResponse, GateError>
    where
        F: FnOnce(Principal) -> Fut,
        Fut: Future<Output = std::result::Result<CachedResponse, E>>,
        E: Display,
    {
        let span = request_span(&route.name, &request.path);
        let result = self.serve(route, request, handler).instrument(span).await;

        match &result {
            Ok(response) => gate_decision(&route.name, &response.principal, None),
            Err(err) => gate_decision(&route.name, &request.source, Some(err)),
        }
        result
    }

    async fn serve<F, Fut, E>(
        &self,
        route: &Route,
        request: &GateRequest,
        handler: F,
    ) -> Result<GateResponse, GateError>
    where
        F: FnOnce(Principal) -> Fut,
        Fut: Future<Output = std::result::Result<CachedResponse, E>>,
        E: Display,
    {
        let Admission {
            principal,
            rate,
            now_ms,
        } = self.admit(route, request)?;

        let Some(policy) = route.cache_policy() else {
            let response = invoke(handler, principal.clone()).await?;
            if route.is_write() && response.is_cacheable() {
                self.cache.invalidate_collection(&route.collection);
            }
            return Ok(GateResponse {
                response: Arc::new(response),
                principal,
                rate,
                cache: None,
            });
        };

        let key = CacheKey::derive(&request.path, &request.query, policy.scope, &principal);
        if let Some(entry) = self.cache.lookup(&key, now_ms) {
            cache_event(key.as_str(), true);
            debug!(stage = %Stage::Cache, "served from cache");
            return Ok(GateResponse {
                response: entry.response.clone(),
                principal,
                rate,
                cache: Some(CacheOutcome {
                    status: CacheStatus::Hit,
                    max_age: entry.remaining_ttl(now_ms),
                    key,
                }),
            });
        }
        cache_event(key.as_str(), false);

        // a write landing while the handler runs makes this result stale
        let generation = self.cache.generation(&route.collection);
        let response = invoke(handler, principal.clone()).await?;
        let stored_at = self.clock.now_ms();
        let ttl = self.cache.ttl_for(&request.path, policy.ttl);
        let (response, max_age) = match self.cache.insert_at_generation(
            key.clone(),
            route.collection.clone(),
            response,
            ttl,
            stored_at,
            generation,
        ) {
            Ok(entry) => (entry.response.clone(), entry.remaining_ttl(stored_at)),
            Err(refused) => (Arc::new(refused), Duration::ZERO),
        };

        Ok(GateResponse {
            response,
            principal,
            rate,
            cache: Some(CacheOutcome {
                status: CacheStatus::Miss,
                key,
                max_age,
            }),
        })
    }

    /// Reclaim closed rate windows and expired cache entries
    pub fn sweep(&self) -> SweepReport {
        let now_ms = self.clock.now_ms();
        let report = SweepReport {
            windows: self.limiter.sweep_expired(now_ms),
            entries: self.cache.sweep_expired(now_ms),
        };
        debug!(windows = report.windows, entries = report.entries, "swept gate stores");
        report
    }

    #[must_use]
    pub fn authority(&self) -> &Arc<CredentialAuthority> {
        self.identity.authority()
    }

    #[must_use]
    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    #[must_use]
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }

    #[must_use]
    pub fn role_table(&self) -> &RoleTable {
        self.permissions.table()
    }

    #[must_use]
    pub fn rate_limit(&self, class: RouteClass) -> Option<RateLimitPolicy> {
        self.rate_limits.get(&class).copied()
    }

    #[must_use]
    pub fn clock(&self) -> &Arc<dyn Clock> {
        &self.clock
    }

    #[must_use]
    pub const fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }
}

async fn invoke<F, Fut, E>(handler: F, principal: Principal) -> Result<CachedResponse, GateError>
where
    F: FnOnce(Principal) -> Fut,
    Fut: Future<Output = std::result::Result<CachedResponse, E>>,
    E: Display,
{
    debug!(stage = %Stage::Handler, "invoking handler");
    handler(principal)
        .await
        .map_err(|e| GateError::internal(e.to_string()))
}

/// Assembles a [`Gate`], letting callers inject stores, authority and clock
#[derive(Debug)]
pub struct GateBuilder {
    config: GateConfig,
    authority: Option<Arc<CredentialAuthority>>,
    roles: Option<RoleTable>,
    limiter: Option<Arc<RateLimiter>>,
    cache: Option<Arc<ResponseCache>>,
    clock: Option<Arc<dyn Clock>>,
}

impl GateBuilder {
    pub fn new(config: GateConfig) -> Self {
        Self {
            config,
            authority: None,
            roles: None,
            limiter: None,
            cache: None,
            clock: None,
        }
    }

    pub fn with_authority(mut self, authority: Arc<CredentialAuthority>) -> Self {
        self.authority = Some(authority);
        self
    }

    pub fn with_roles(mut self, roles: RoleTable) -> Self {
        self.roles = Some(roles);
        self
    }

    pub fn with_limiter(mut self, limiter: Arc<RateLimiter>) -> Self {
        self.limiter = Some(limiter);
        self
    }

    pub fn with_cache(mut self, cache: Arc<ResponseCache>) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn build(self) -> Result<Gate> {
        let config = self.config;
        config.validate()?;

        let authority = match self.authority {
            Some(authority) => authority,
            None => Arc::new(CredentialAuthority::from_config(&config)?),
        };
        let roles = self
            .roles
            .unwrap_or_else(|| RoleTable::from_config(&config));
        let cache = self
            .cache
            .unwrap_or_else(|| Arc::new(ResponseCache::new(config.cache.clone())));

        info!(
            key_id = %authority.key_id(),
            cache_capacity = config.cache.max_entries,
            "gate ready"
        );

        Ok(Gate {
            identity: IdentityResolver::new(authority),
            permissions: PermissionEvaluator::new(roles),
            limiter: self.limiter.unwrap_or_default(),
            cache,
            sweep_interval: config.cache.sweep_interval(),
            rate_limits: config.rate_limits,
            clock: self.clock.unwrap_or_else(|| Arc::new(SystemClock)),
        })
    }
}
