//! Per-request denial taxonomy
//!
//! Every failure a request can meet on its way through the gate is one of
//! these variants. None of them are fatal to the process and none are retried
//! by the gate itself; the caller decides what to do using the code, the
//! status and the recovery hint.

use crate::types::{RateStatus, RouteClass};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Stable machine-readable error code surfaced in denial payloads
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    MissingCredential,
    InvalidCredential,
    ExpiredCredential,
    InsufficientCapability,
    RateLimitExceeded,
    Internal,
}

impl ErrorCode {
    /// Code as it appears on the wire
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::MissingCredential => "MissingCredential",
            Self::InvalidCredential => "InvalidCredential",
            Self::ExpiredCredential => "ExpiredCredential",
            Self::InsufficientCapability => "InsufficientCapability",
            Self::RateLimitExceeded => "RateLimitExceeded",
            Self::Internal => "Internal",
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// What a caller can do to get past a denial
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryHint {
    /// Obtain a fresh credential and retry
    Reauthenticate,
    /// The principal will never be allowed this operation
    RequestDifferentResource,
    /// Wait for the current rate window to close
    RetryAfter { after: Duration },
    /// Failure inside the delegated handler
    ContactAdmin,
}

/// A request denied by one of the gate stages, or a handler failure passed through
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GateError {
    #[error("No authorization token provided")]
    MissingCredential,

    #[error("Invalid authentication token: {reason}")]
    InvalidCredential { reason: String },

    #[error("Authentication token has expired")]
    ExpiredCredential { expired_at_ms: u64 },

    #[error("Access denied. Required permission: {required}")]
    InsufficientCapability { required: String },

    #[error("Too many requests for {route_class}. Please try again later.")]
    RateLimitExceeded {
        route_class: RouteClass,
        status: RateStatus,
    },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl GateError {
    /// Create an invalid credential error
    #[must_use]
    pub fn invalid_credential(reason: impl Into<String>) -> Self {
        Self::InvalidCredential {
            reason: reason.into(),
        }
    }

    /// Create an insufficient capability error naming what was required
    #[must_use]
    pub fn insufficient_capability(required: impl Into<String>) -> Self {
        Self::InsufficientCapability {
            required: required.into(),
        }
    }

    /// Create an internal error for a failed handler
    #[must_use]
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    #[must_use]
    pub const fn code(&self) -> ErrorCode {
        match self {
            Self::MissingCredential => ErrorCode::MissingCredential,
            Self::InvalidCredential { .. } => ErrorCode::InvalidCredential,
            Self::ExpiredCredential { .. } => ErrorCode::ExpiredCredential,
            Self::InsufficientCapability { .. } => ErrorCode::InsufficientCapability,
            Self::RateLimitExceeded { .. } => ErrorCode::RateLimitExceeded,
            Self::Internal { .. } => ErrorCode::Internal,
        }
    }

    /// HTTP-equivalent status for this denial
    #[must_use]
    pub const fn status_code(&self) -> u16 {
        match self {
            Self::MissingCredential
            | Self::InvalidCredential { .. }
            | Self::ExpiredCredential { .. } => 401,
            Self::InsufficientCapability { .. } => 403,
            Self::RateLimitExceeded { .. } => 429,
            Self::Internal { .. } => 500,
        }
    }

    /// Time until the caller may retry, only set for throttled requests
    #[must_use]
    pub fn retry_after(&self) -> Option<Duration> {
        match self {
            Self::RateLimitExceeded { status, .. } => Some(status.reset_after),
            _ => None,
        }
    }

    /// Rate metadata carried by a throttled request
    #[must_use]
    pub fn rate_status(&self) -> Option<&RateStatus> {
        match self {
            Self::RateLimitExceeded { status, .. } => Some(status),
            _ => None,
        }
    }

    #[must_use]
    pub fn recovery_hint(&self) -> RecoveryHint {
        match self {
            Self::MissingCredential
            | Self::InvalidCredential { .. }
            | Self::ExpiredCredential { .. } => RecoveryHint::Reauthenticate,
            Self::InsufficientCapability { .. } => RecoveryHint::RequestDifferentResource,
            Self::RateLimitExceeded { status, .. } => RecoveryHint::RetryAfter {
                after: status.reset_after,
            },
            Self::Internal { .. } => RecoveryHint::ContactAdmin,
        }
    }

    /// Credential failures are the only ones a new token can fix
    #[must_use]
    pub const fn is_authentication_failure(&self) -> bool {
        matches!(
            self,
            Self::MissingCredential | Self::InvalidCredential { .. } | Self::ExpiredCredential { .. }
        )
    }

    /// Build the JSON body sent back with the denial
    #[must_use]
    pub fn to_body(&self) -> ErrorBody {
        ErrorBody {
            success: false,
            error: ErrorPayload {
                code: self.code(),
                message: self.to_string(),
                retry_after_secs: self.rate_status().map(RateStatus::reset_secs),
            },
        }
    }
}

/// Envelope for denial payloads: `{ success: false, error: { code, message } }`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorBody {
    pub success: bool,
    pub error: ErrorPayload,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorPayload {
    pub code: ErrorCode,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub retry_after_secs: Option<u64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn throttled() -> GateError {
        GateError::RateLimitExceeded {
            route_class: RouteClass::Api,
            status: RateStatus {
                limit: 100,
                remaining: 0,
                reset_after: Duration::from_millis(1_500),
            },
        }
    }

    #[test]
    fn test_status_codes_by_category() {
        assert_eq!(GateError::MissingCredential.status_code(), 401);
        assert_eq!(GateError::invalid_credential("bad").status_code(), 401);
        assert_eq!(
            GateError::ExpiredCredential { expired_at_ms: 1 }.status_code(),
            401
        );
        assert_eq!(
            GateError::insufficient_capability("write:news").status_code(),
            403
        );
        assert_eq!(throttled().status_code(), 429);
        assert_eq!(GateError::internal("db down").status_code(), 500);
    }

    #[test]
    fn test_invalid_and_expired_are_distinguishable() {
        let invalid = GateError::invalid_credential("bad signature");
        let expired = GateError::ExpiredCredential { expired_at_ms: 10 };
        assert_eq!(invalid.status_code(), expired.status_code());
        assert_ne!(invalid.code(), expired.code());
    }

    #[test]
    fn test_only_credential_failures_ask_for_a_new_token() {
        assert!(GateError::MissingCredential.is_authentication_failure());
        assert!(GateError::invalid_credential("bad").is_authentication_failure());
        assert!(GateError::ExpiredCredential { expired_at_ms: 1 }.is_authentication_failure());
        assert!(!GateError::insufficient_capability("write:news").is_authentication_failure());
        assert!(!throttled().is_authentication_failure());
        assert!(!GateError::internal("db down").is_authentication_failure());
    }

    #[test]
    fn test_retry_after_only_for_throttling() {
        assert_eq!(throttled().retry_after(), Some(Duration::from_millis(1_500)));
        assert_eq!(GateError::MissingCredential.retry_after(), None);
        assert_eq!(
            throttled().recovery_hint(),
            RecoveryHint::RetryAfter {
                after: Duration::from_millis(1_500)
            }
        );
    }

    #[test]
    fn test_body_shape() {
        let body = serde_json::to_value(throttled().to_body()).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"]["code"], "RateLimitExceeded");
        assert_eq!(body["error"]["retry_after_secs"], 2);

        let body = serde_json::to_value(GateError::MissingCredential.to_body()).unwrap();
        assert_eq!(body["error"]["code"], "MissingCredential");
        assert_eq!(body["error"]["message"], "No authorization token provided");
        assert!(body["error"].get("retry_after_secs").is_none());
    }
}
