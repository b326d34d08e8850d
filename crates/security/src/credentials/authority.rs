//! Credential authority for issuing bearer tokens

use crate::credentials::claims::{CredentialClaims, IssuedCredential};
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use ed25519_dalek::{Signer, SigningKey, VerifyingKey};
use gatehouse_config::GateConfig;
use gatehouse_core::{constants::TOKEN_ISSUER, Error, Result, Role};
use rand::rngs::OsRng;
use sha2::{Digest, Sha256};
use std::time::Duration;
use tracing::{debug, warn};

/// Separates the encoded claims from the encoded signature
pub(crate) const TOKEN_SEPARATOR: char = '.';

/// Signs and verifies bearer credentials with a single ed25519 key
#[derive(Debug)]
pub struct CredentialAuthority {
    /// Ed25519 signing key for signing credentials
    signing_key: SigningKey,
    /// Ed25519 verifying key
    pub(crate) verifying_key: VerifyingKey,
    /// Issuer name stamped into every credential
    pub(crate) issuer: String,
    /// Lifetime given to issued credentials
    ttl: Duration,
}

impl CredentialAuthority {
    /// Authority with a freshly generated key; its credentials die with the process
    pub fn generate(ttl: Duration) -> Self {
        let mut csprng = OsRng;
        Self::from_signing_key(SigningKey::generate(&mut csprng), ttl)
    }

    /// Authority from a 32-byte ed25519 seed
    #[must_use]
    pub fn from_seed(seed: &[u8; 32], ttl: Duration) -> Self {
        Self::from_signing_key(SigningKey::from_bytes(seed), ttl)
    }

    /// Load authority from existing signing key
    #[must_use]
    pub fn from_signing_key(signing_key: SigningKey, ttl: Duration) -> Self {
        let verifying_key = signing_key.verifying_key();
        Self {
            signing_key,
            verifying_key,
            issuer: TOKEN_ISSUER.to_string(),
            ttl,
        }
    }

    /// Authority for the configured seed, or an ephemeral one when none is set
    pub fn from_config(config: &GateConfig) -> Result<Self> {
        match config.signing_seed()? {
            Some(seed) => {
                let authority = Self::from_seed(&seed, config.token_ttl());
                debug!(key_id = %authority.key_id(), "loaded configured signing key");
                Ok(authority)
            }
            None => {
                let authority = Self::generate(config.token_ttl());
                warn!(
                    key_id = %authority.key_id(),
                    "no signing key configured, using an ephemeral key; credentials will not survive a restart"
                );
                Ok(authority)
            }
        }
    }

    /// Issue a credential with the authority's default lifetime
    pub fn issue(
        &self,
        subject: impl Into<String>,
        email: impl Into<String>,
        role: Role,
        now_ms: u64,
    ) -> Result<IssuedCredential> {
        self.issue_with_ttl(subject, email, role.as_str(), self.ttl, now_ms)
    }

    /// Issue a credential with an explicit lifetime and raw role name
    pub fn issue_with_ttl(
        &self,
        subject: impl Into<String>,
        email: impl Into<String>,
        role: impl Into<String>,
        ttl: Duration,
        now_ms: u64,
    ) -> Result<IssuedCredential> {
        let ttl_ms = u64::try_from(ttl.as_millis())
            .map_err(|_| Error::configuration("credential lifetime is too large"))?;

        let claims = CredentialClaims {
            token_id: uuid::Uuid::new_v4().to_string(),
            issuer: self.issuer.clone(),
            subject: subject.into(),
            email: email.into(),
            role: role.into(),
            issued_at: now_ms,
            expires_at: now_ms.saturating_add(ttl_ms),
        };

        let token = self.sign(&claims)?;
        debug!(token_id = %claims.token_id, subject = %claims.subject, "issued credential");
        Ok(IssuedCredential { token, claims })
    }

    /// Encode and sign claims into bearer text
    pub(crate) fn sign(&self, claims: &CredentialClaims) -> Result<String> {
        let claim_bytes = bincode::serialize(claims)
            .map_err(|e| Error::serialization("credential claims", e))?;
        let signature = self.signing_key.sign(&claim_bytes);

        Ok(format!(
            "{}{TOKEN_SEPARATOR}{}",
            URL_SAFE_NO_PAD.encode(&claim_bytes),
            URL_SAFE_NO_PAD.encode(signature.to_bytes())
        ))
    }

    /// Get authority public key
    #[must_use]
    pub fn public_key(&self) -> [u8; 32] {
        self.verifying_key.to_bytes()
    }

    /// Short fingerprint of the public key, safe to log
    #[must_use]
    pub fn key_id(&self) -> String {
        let digest = Sha256::digest(self.verifying_key.as_bytes());
        hex::encode(&digest[..8])
    }

    #[must_use]
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    #[must_use]
    pub const fn ttl(&self) -> Duration {
        self.ttl
    }
}
