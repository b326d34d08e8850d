//! Signed bearer credentials
//!
//! A credential is `base64url(bincode(claims)).base64url(signature)` where the
//! signature is ed25519 over the encoded claims. Verification checks the
//! signature first, then the issuer, then expiry.

mod authority;
mod claims;
mod verification;

#[cfg(test)]
mod tests;

pub use authority::CredentialAuthority;
pub use claims::{CredentialClaims, IssuedCredential};
