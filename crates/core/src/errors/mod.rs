//! Error types for gatehouse operations

mod builders;
mod conversions;
mod display;
mod gate;
mod types;

pub use builders::*;
pub use gate::{ErrorBody, ErrorCode, ErrorPayload, GateError, RecoveryHint};
pub use types::{Error, Result};
