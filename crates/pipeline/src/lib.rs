//! The gatehouse request gate
//!
//! Every request runs identity resolution, then the permission check, then
//! rate limiting, then (for cacheable reads) the response cache, before its
//! handler is invoked. Each stage can end the request with a [`GateError`].
//!
//! [`GateError`]: gatehouse_core::GateError

pub mod gate;
pub mod http;
pub mod response;
pub mod routes;
pub mod sweeper;

pub use gate::{Gate, GateBuilder, SweepReport};
pub use http::{gate_request, respond, GateRejection};
pub use response::{Admission, CacheOutcome, CacheStatus, GateResponse, Stage};
pub use routes::{default_routes, RouteCatalog};
pub use sweeper::{spawn_sweeper, SweeperHandle};
