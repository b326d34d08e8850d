//! Core domain types, errors, and constants for the gatehouse request gate.
//!
//! ## Key Components
//!
//! - **`errors`**: the infrastructure `Error` enum with its `Result` alias, and
//!   `GateError`, the per-request denial taxonomy every stage reports through.
//! - **`types`**: principals, roles, capabilities, route descriptions and the
//!   transport-independent `GateRequest`.
//! - **`clock`**: the injectable time source shared by all stages.
//! - **`constants`**: environment variable names, defaults and header names.

pub mod clock;
pub mod constants;
pub mod errors;
pub mod types;

pub use self::{
    clock::{Clock, ManualClock, SystemClock},
    constants::*,
    errors::{Error, ErrorBody, ErrorCode, GateError, RecoveryHint, Result},
    types::*,
};
