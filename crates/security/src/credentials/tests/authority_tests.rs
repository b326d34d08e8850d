//! Tests for the credential authority

use crate::credentials::CredentialAuthority;
use gatehouse_config::GateConfigBuilder;
use gatehouse_core::Role;
use std::time::Duration;

const SEED: [u8; 32] = [7u8; 32];

#[test]
fn test_issue_sets_lifetime_and_identity() {
    let authority = CredentialAuthority::from_seed(&SEED, Duration::from_secs(3600));

    let issued = authority
        .issue("42", "editor@giip.info", Role::Editor, 1_000)
        .unwrap();

    assert_eq!(issued.claims.subject, "42");
    assert_eq!(issued.claims.email, "editor@giip.info");
    assert_eq!(issued.claims.role, "editor");
    assert_eq!(issued.claims.issued_at, 1_000);
    assert_eq!(issued.claims.expires_at, 1_000 + 3_600_000);
    assert_eq!(issued.token.matches('.').count(), 1);
}

#[test]
fn test_token_ids_are_unique() {
    let authority = CredentialAuthority::generate(Duration::from_secs(60));
    let a = authority.issue("1", "a@giip.info", Role::User, 0).unwrap();
    let b = authority.issue("1", "a@giip.info", Role::User, 0).unwrap();
    assert_ne!(a.claims.token_id, b.claims.token_id);
    assert_ne!(a.token, b.token);
}

#[test]
fn test_same_seed_same_key() {
    let a = CredentialAuthority::from_seed(&SEED, Duration::from_secs(60));
    let b = CredentialAuthority::from_seed(&SEED, Duration::from_secs(60));
    assert_eq!(a.public_key(), b.public_key());
    assert_eq!(a.key_id(), b.key_id());
    assert_eq!(a.key_id().len(), 16);

    let other = CredentialAuthority::generate(Duration::from_secs(60));
    assert_ne!(a.public_key(), other.public_key());
}

#[test]
fn test_from_config_uses_seed_and_ttl() {
    let config = GateConfigBuilder::new()
        .with_signing_key(hex::encode(SEED))
        .with_token_ttl(Duration::from_secs(120))
        .build()
        .unwrap();

    let authority = CredentialAuthority::from_config(&config).unwrap();
    let expected = CredentialAuthority::from_seed(&SEED, Duration::from_secs(120));
    assert_eq!(authority.public_key(), expected.public_key());
    assert_eq!(authority.ttl(), Duration::from_secs(120));
}

#[test]
fn test_from_config_without_seed_is_ephemeral() {
    let config = GateConfigBuilder::new().build().unwrap();
    let a = CredentialAuthority::from_config(&config).unwrap();
    let b = CredentialAuthority::from_config(&config).unwrap();
    assert_ne!(a.public_key(), b.public_key());
}
