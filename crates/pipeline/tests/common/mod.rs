#![allow(dead_code)]
//! Shared fixture for gate integration tests

use gatehouse_cache::CachedResponse;
use gatehouse_config::{GateConfig, GateConfigBuilder};
use gatehouse_core::{GateRequest, ManualClock, Principal, Role, Route};
use gatehouse_pipeline::{Gate, RouteCatalog};
use serde_json::{json, Value};
use std::convert::Infallible;
use std::future::{ready, Ready};
use std::net::IpAddr;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

/// Aligned to both the 15 minute and the 1 hour window
pub const T0: u64 = 1_699_999_200_000;

pub const SIGNING_KEY: &str = "4c0883a69102937d6231471b5dbb6204fe5129617082792ae468d01a3f362318";

pub struct Harness {
    pub gate: Arc<Gate>,
    pub clock: Arc<ManualClock>,
    pub catalog: RouteCatalog,
}

impl Harness {
    pub fn new() -> Self {
        Self::with_config(
            GateConfigBuilder::new()
                .with_signing_key(SIGNING_KEY)
                .build()
                .unwrap(),
        )
    }

    pub fn with_config(config: GateConfig) -> Self {
        let clock = Arc::new(ManualClock::new(T0));
        let gate = Gate::from_config(&config, clock.clone()).unwrap();
        Self {
            gate: Arc::new(gate),
            clock,
            catalog: RouteCatalog::default(),
        }
    }

    pub fn route(&self, name: &str) -> &Route {
        self.catalog.get(name).unwrap()
    }

    /// Bearer token for a user with the given role, issued now
    pub fn token(&self, id: &str, role: Role) -> String {
        self.gate
            .authority()
            .issue(id, format!("{id}@giip.info"), role, self.clock_now())
            .unwrap()
            .token
    }

    pub fn clock_now(&self) -> u64 {
        use gatehouse_core::Clock;
        self.clock.now_ms()
    }

    pub fn anonymous(&self, path: &str) -> GateRequest {
        GateRequest::new(path, source())
    }

    pub fn as_user(&self, path: &str, id: &str, role: Role) -> GateRequest {
        GateRequest::new(path, source()).with_bearer(&self.token(id, role))
    }
}

pub fn source() -> IpAddr {
    IpAddr::from([203, 0, 113, 7])
}

type Reply = Ready<Result<CachedResponse, Infallible>>;

/// Handler that always answers 200 with `body`
pub fn reply(body: Value) -> impl FnOnce(Principal) -> Reply {
    move |_| ready(Ok(CachedResponse::ok(body)))
}

/// Handler that answers with a given status
pub fn reply_status(status: u16, body: Value) -> impl FnOnce(Principal) -> Reply {
    move |_| ready(Ok(CachedResponse { status, body }))
}

/// Handler that fails inside the business layer
pub fn fail(message: &'static str) -> impl FnOnce(Principal) -> Ready<Result<CachedResponse, String>> {
    move |_| ready(Err(message.to_string()))
}

/// Backing data whose version moves on every write
#[derive(Default)]
pub struct Versioned {
    version: AtomicU32,
}

impl Versioned {
    pub fn read(&self) -> impl FnOnce(Principal) -> Reply + '_ {
        move |_| {
            let version = self.version.load(Ordering::SeqCst);
            ready(Ok(CachedResponse::ok(json!({ "success": true, "version": version }))))
        }
    }

    pub fn write(&self) -> impl FnOnce(Principal) -> Reply + '_ {
        move |_| {
            let version = self.version.fetch_add(1, Ordering::SeqCst) + 1;
            ready(Ok(CachedResponse {
                status: 201,
                body: json!({ "success": true, "version": version }),
            }))
        }
    }
}
