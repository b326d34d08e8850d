//! Domain types shared by every stage of the gate

mod capability;
mod principal;
mod rate;
mod request;
mod role;
mod route;

pub use capability::Capability;
pub use principal::{Principal, PrincipalId};
pub use rate::{RateStatus, RouteClass};
pub use request::GateRequest;
pub use role::Role;
pub use route::{AccessKind, AuthRequirement, CachePolicy, CacheScope, Requirement, Route};
