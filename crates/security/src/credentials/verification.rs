//! Credential verification

use crate::credentials::authority::{CredentialAuthority, TOKEN_SEPARATOR};
use crate::credentials::claims::CredentialClaims;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ed25519_dalek::{Signature, Verifier};
use gatehouse_core::GateError;

impl CredentialAuthority {
    /// Verify bearer text and return its claims
    ///
    /// The signature is checked before expiry, so a forged credential is always
    /// reported as invalid, never as expired.
    pub fn verify(&self, token: &str, now_ms: u64) -> Result<CredentialClaims, GateError> {
        let (claims_part, signature_part) = token
            .split_once(TOKEN_SEPARATOR)
            .ok_or_else(|| GateError::invalid_credential("malformed token"))?;

        let claim_bytes = URL_SAFE_NO_PAD
            .decode(claims_part)
            .map_err(|_| GateError::invalid_credential("malformed token encoding"))?;
        let signature_bytes = URL_SAFE_NO_PAD
            .decode(signature_part)
            .map_err(|_| GateError::invalid_credential("malformed signature encoding"))?;

        let signature = Signature::from_slice(&signature_bytes)
            .map_err(|_| GateError::invalid_credential("malformed signature"))?;
        self.verifying_key
            .verify(&claim_bytes, &signature)
            .map_err(|_| GateError::invalid_credential("signature mismatch"))?;

        let claims: CredentialClaims = bincode::deserialize(&claim_bytes)
            .map_err(|_| GateError::invalid_credential("unreadable claims"))?;

        if claims.issuer != self.issuer {
            return Err(GateError::invalid_credential("unknown issuer"));
        }

        if claims.is_expired_at(now_ms) {
            return Err(GateError::ExpiredCredential {
                expired_at_ms: claims.expires_at,
            });
        }

        Ok(claims)
    }
}
