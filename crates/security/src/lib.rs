//! Request security for gatehouse
//!
//! This crate provides the identity, permission and rate stages of the gate,
//! along with the credentials the identity stage verifies:
//! - Signed bearer credentials and the authority that issues them
//! - Identity resolution from the `Authorization` header
//! - The role to capability table and permission checks
//! - Fixed-window rate limiting per identity and route class

pub mod credentials;
pub mod identity;
pub mod limiting;
pub mod permissions;

pub use credentials::{CredentialAuthority, CredentialClaims, IssuedCredential};
pub use identity::{parse_bearer, IdentityResolver};
pub use limiting::{RateLimiter, RateWindow};
pub use permissions::{default_capabilities, PermissionEvaluator, RoleTable};
