//! Identity resolution from the `Authorization` header

use crate::credentials::CredentialAuthority;
use gatehouse_core::{constants::BEARER_SCHEME, AuthRequirement, GateError, Principal, Role};
use std::net::IpAddr;
use std::sync::Arc;
use tracing::debug;

/// Extract the bearer token from a raw header value
///
/// Returns `Ok(None)` for an absent or blank header, or a bearer scheme with
/// no token. Any other shape is an invalid credential.
pub fn parse_bearer(header: Option<&str>) -> Result<Option<&str>, GateError> {
    let Some(header) = header.map(str::trim).filter(|h| !h.is_empty()) else {
        return Ok(None);
    };

    let (scheme, token) = header.split_once(char::is_whitespace).unwrap_or((header, ""));
    if !scheme.eq_ignore_ascii_case(BEARER_SCHEME) {
        return Err(GateError::invalid_credential("unsupported authorization scheme"));
    }

    let token = token.trim();
    if token.is_empty() {
        return Ok(None);
    }
    if token.contains(char::is_whitespace) {
        return Err(GateError::invalid_credential("malformed bearer token"));
    }
    Ok(Some(token))
}

/// Turns a request's credential into a principal
#[derive(Debug, Clone)]
pub struct IdentityResolver {
    authority: Arc<CredentialAuthority>,
}

impl IdentityResolver {
    pub fn new(authority: Arc<CredentialAuthority>) -> Self {
        Self { authority }
    }

    /// Resolve the principal for one request
    ///
    /// Public routes fall back to the anonymous principal for the source
    /// address, but a credential that is present is always validated.
    pub fn resolve(
        &self,
        auth: AuthRequirement,
        authorization: Option<&str>,
        source: IpAddr,
        now_ms: u64,
    ) -> Result<Principal, GateError> {
        let token = match parse_bearer(authorization)? {
            Some(token) => token,
            None => {
                return match auth {
                    AuthRequirement::Authenticated => Err(GateError::MissingCredential),
                    AuthRequirement::Public => Ok(Principal::anonymous(source)),
                };
            }
        };

        let claims = self.authority.verify(token, now_ms)?;
        let role = Role::parse(&claims.role);
        if !role.is_known() {
            debug!(role = %claims.role, subject = %claims.subject, "credential carries an unrecognised role");
        }

        Ok(Principal::authenticated(claims.subject, claims.email, role))
    }

    #[must_use]
    pub fn authority(&self) -> &Arc<CredentialAuthority> {
        &self.authority
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use gatehouse_core::{ErrorCode, PrincipalId};
    use std::time::Duration;

    fn source() -> IpAddr {
        "192.0.2.10".parse().unwrap()
    }

    fn resolver() -> IdentityResolver {
        IdentityResolver::new(Arc::new(CredentialAuthority::from_seed(
            &[1u8; 32],
            Duration::from_secs(3600),
        )))
    }

    #[test]
    fn test_parse_bearer_shapes() {
        assert_eq!(parse_bearer(None).unwrap(), None);
        assert_eq!(parse_bearer(Some("   ")).unwrap(), None);
        assert_eq!(parse_bearer(Some("Bearer")).unwrap(), None);
        assert_eq!(parse_bearer(Some("Bearer abc")).unwrap(), Some("abc"));
        assert_eq!(parse_bearer(Some("bearer   abc ")).unwrap(), Some("abc"));
        assert!(parse_bearer(Some("Basic dXNlcjpwYXNz")).is_err());
        assert!(parse_bearer(Some("abc.def")).is_err());
        assert!(parse_bearer(Some("Bearer a b")).is_err());
    }

    #[test]
    fn test_missing_credential_on_authenticated_route() {
        let err = resolver()
            .resolve(AuthRequirement::Authenticated, None, source(), 0)
            .unwrap_err();
        assert_eq!(err, GateError::MissingCredential);
    }

    #[test]
    fn test_public_route_without_credential_is_anonymous() {
        let principal = resolver()
            .resolve(AuthRequirement::Public, None, source(), 0)
            .unwrap();
        assert!(principal.is_anonymous());
        assert_eq!(principal.id(), &PrincipalId::Source(source()));
    }

    #[test]
    fn test_public_route_still_validates_supplied_credential() {
        let err = resolver()
            .resolve(AuthRequirement::Public, Some("Bearer forged.token"), source(), 0)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::InvalidCredential);
    }

    #[test]
    fn test_valid_credential_resolves_principal() {
        let resolver = resolver();
        let issued = resolver
            .authority()
            .issue("7", "admin@giip.info", Role::Admin, 0)
            .unwrap();
        let header = format!("Bearer {}", issued.token);

        let principal = resolver
            .resolve(AuthRequirement::Authenticated, Some(&header), source(), 10)
            .unwrap();
        assert_eq!(principal.id(), &PrincipalId::User("7".into()));
        assert_eq!(principal.email(), Some("admin@giip.info"));
        assert_eq!(principal.role(), Role::Admin);
    }

    #[test]
    fn test_expired_credential() {
        let resolver = resolver();
        let issued = resolver
            .authority()
            .issue("7", "u@giip.info", Role::User, 0)
            .unwrap();
        let header = format!("Bearer {}", issued.token);

        let err = resolver
            .resolve(AuthRequirement::Authenticated, Some(&header), source(), 3_600_000)
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ExpiredCredential);
    }
}
