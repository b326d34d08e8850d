//! Claims carried inside a bearer credential

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Signed body of a credential
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CredentialClaims {
    /// Unique credential identifier
    pub token_id: String,
    /// Authority that signed the credential
    pub issuer: String,
    /// Stable user identifier
    pub subject: String,
    pub email: String,
    /// Role name as issued; unrecognised names resolve to the unknown role
    pub role: String,
    /// Issuance timestamp (Unix milliseconds)
    pub issued_at: u64,
    /// Expiration timestamp (Unix milliseconds)
    pub expires_at: u64,
}

impl CredentialClaims {
    /// A credential is expired from `expires_at` onwards
    #[must_use]
    pub const fn is_expired_at(&self, now_ms: u64) -> bool {
        now_ms >= self.expires_at
    }

    /// Time left before expiry, zero once expired
    #[must_use]
    pub const fn remaining_at(&self, now_ms: u64) -> Duration {
        Duration::from_millis(self.expires_at.saturating_sub(now_ms))
    }
}

/// A freshly signed credential and the claims it encodes
#[derive(Debug, Clone)]
pub struct IssuedCredential {
    /// Opaque bearer text: `base64url(claims).base64url(signature)`
    pub token: String,
    pub claims: CredentialClaims,
}
