//! Send a burst of requests through a real gate, the way a load check would

use gatehouse_cache::{CacheStats, CachedResponse};
use gatehouse_config::GateConfig;
use gatehouse_core::{Clock, Error, GateError, GateRequest, RateStatus, Result, SystemClock};
use gatehouse_pipeline::{CacheStatus, Gate, GateResponse, RouteCatalog};
use serde_json::json;
use std::collections::BTreeMap;
use std::convert::Infallible;
use std::fmt;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::warn;

/// Tally of what the gate decided for each simulated request
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SimulationReport {
    pub route: String,
    pub requests: u32,
    pub allowed: u32,
    pub cache_hits: u32,
    /// Denials by error code
    pub denied: BTreeMap<&'static str, u32>,
    /// Quota state after the last request that reported one
    pub last_rate: Option<RateStatus>,
    /// Cache counters once the burst is over
    pub cache: CacheStats,
}

impl SimulationReport {
    fn new(route: &str, requests: u32) -> Self {
        Self {
            route: route.to_string(),
            requests,
            ..Self::default()
        }
    }

    fn record(&mut self, outcome: std::result::Result<GateResponse, GateError>) {
        match outcome {
            Ok(response) => {
                self.allowed += 1;
                if response.cache_status() == Some(CacheStatus::Hit) {
                    self.cache_hits += 1;
                }
                if response.rate.is_some() {
                    self.last_rate = response.rate;
                }
            }
            Err(err) => {
                *self.denied.entry(err.code().as_str()).or_default() += 1;
                if let Some(rate) = err.rate_status() {
                    self.last_rate = Some(*rate);
                }
            }
        }
    }

    #[must_use]
    pub fn denied_total(&self) -> u32 {
        self.denied.values().sum()
    }

    pub fn to_json(&self) -> Result<String> {
        let document = json!({
            "route": self.route,
            "requests": self.requests,
            "allowed": self.allowed,
            "cache_hits": self.cache_hits,
            "cache_hit_rate": self.cache.hit_rate(),
            "denied": self.denied,
            "remaining": self.last_rate.map(|rate| rate.remaining),
            "reset_secs": self.last_rate.map(|rate| rate.reset_secs()),
        });
        serde_json::to_string_pretty(&document)
            .map_err(|e| Error::serialization("simulation report", e))
    }
}

impl fmt::Display for SimulationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "route:    {}", self.route)?;
        writeln!(f, "requests: {}", self.requests)?;
        writeln!(
            f,
            "allowed:  {} ({} from cache, {:.0}% hit rate)",
            self.allowed,
            self.cache_hits,
            self.cache.hit_rate() * 100.0
        )?;
        write!(f, "denied:   {}", self.denied_total())?;
        for (code, count) in &self.denied {
            write!(f, "\n  {code}: {count}")?;
        }
        if let Some(rate) = &self.last_rate {
            write!(
                f,
                "\nquota:    {}/{} left, resets in {}s",
                rate.remaining,
                rate.limit,
                rate.reset_secs()
            )?;
        }
        Ok(())
    }
}

pub async fn run(
    config: &GateConfig,
    route: &str,
    requests: u32,
    token: Option<&str>,
    source: IpAddr,
) -> Result<SimulationReport> {
    run_with_clock(config, route, requests, token, source, Arc::new(SystemClock)).await
}

/// Run the simulation against a gate driven by `clock`
pub async fn run_with_clock(
    config: &GateConfig,
    route_name: &str,
    requests: u32,
    token: Option<&str>,
    source: IpAddr,
    clock: Arc<dyn Clock>,
) -> Result<SimulationReport> {
    let catalog = RouteCatalog::default();
    let route = catalog
        .get(route_name)
        .ok_or_else(|| Error::invalid_value("route", route_name))?;

    if token.is_some() && config.signing_key.is_none() {
        warn!("no signing key configured, the supplied token cannot verify");
    }

    let gate = Gate::from_config(config, clock)?;
    let mut request = GateRequest::new(route.collection.clone(), source);
    if let Some(token) = token {
        request = request.with_bearer(token);
    }

    let mut report = SimulationReport::new(route_name, requests);
    for _ in 0..requests {
        let outcome = gate
            .handle(route, &request, |principal| async move {
                Ok::<_, Infallible>(CachedResponse::ok(json!({
                    "success": true,
                    "principal": principal.to_string(),
                })))
            })
            .await;
        report.record(outcome);
    }
    report.cache = gate.cache().stats(gate.clock().now_ms());
    Ok(report)
}
