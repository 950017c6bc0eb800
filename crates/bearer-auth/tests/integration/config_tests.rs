//! Configuration to running authenticator
//!
//! Loads `BEARER_*` variables through `AuthConfig::from_vars`, builds an
//! authenticator, and checks that the settings take effect (or that startup
//! fails with the right error).

use bearer_auth::config::*;
use bearer_auth::{AuthConfig, BearerAuthenticator, ConfigError, FailureKind};
use bearer_auth_test_utils::*;
use std::collections::HashMap;

fn vars(pairs: &[(&str, &str)]) -> HashMap<String, String> {
    pairs
        .iter()
        .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
        .collect()
}

fn build(pairs: &[(&str, &str)]) -> Result<BearerAuthenticator, ConfigError> {
    let config = AuthConfig::from_vars(&vars(pairs))?;
    BearerAuthenticator::builder(config)
        .clock(ManualClock::new(FIXED_NOW))
        .build()
}

#[test]
fn test_secret_key_from_env_accepts_hmac_tokens() -> Result<(), anyhow::Error> {
    let secret = test_secret_key_base64();
    let auth = build(&[
        (ENV_SECRET_KEY, &secret),
        (ENV_ISSUER, TEST_ISSUER),
        (ENV_AUDIENCE, TEST_AUDIENCE),
        (ENV_REALM_AUTHENTICATION, "false"),
        (ENV_REALM_NAME, TEST_REALM),
    ])?;
    assert_eq!(auth.realm_name(), TEST_REALM);

    let token = TestTokenBuilder::scenario(FIXED_NOW).with_roles(&[ROLE_USER]).sign_hs256();
    auth.authenticate(Some(&bearer_header(&token))).assert_roles(&[ROLE_USER]);

    let wrong_issuer = TestTokenBuilder::scenario(FIXED_NOW).issued_by(TEST_UNTRUSTED_ISSUER).sign_hs256();
    auth.authenticate(Some(&bearer_header(&wrong_issuer)))
        .assert_rejected_with(FailureKind::IssuerMismatch);
    Ok(())
}

#[test]
fn test_public_key_from_env_accepts_rsa_tokens() -> Result<(), anyhow::Error> {
    let auth = build(&[
        (ENV_PUBLIC_KEY, TEST_RSA_PUBLIC_KEY_SPKI),
        (ENV_PUBLIC_KEY_ALGORITHM, "rsa"),
        (ENV_REALM_AUTHENTICATION, "no"),
    ])?;

    let token = TestTokenBuilder::at(FIXED_NOW).sign_rs256();
    auth.authenticate(Some(&bearer_header(&token))).assert_accepted();
    Ok(())
}

#[test]
fn test_roles_and_skew_from_env() -> Result<(), anyhow::Error> {
    let secret = test_secret_key_base64();
    let auth = build(&[
        (ENV_SECRET_KEY, &secret),
        (ENV_REALM_AUTHENTICATION, "0"),
        (ENV_ROLES_CLAIM, "groups"),
        (ENV_CLOCK_SKEW_SECONDS, "0"),
    ])?;

    let token = TestTokenBuilder::at(FIXED_NOW)
        .with_claim("groups", serde_json::json!("ops, dev"))
        .sign_hs256();
    auth.authenticate(Some(&bearer_header(&token))).assert_roles(&["dev", "ops"]);

    let just_expired = TestTokenBuilder::at(FIXED_NOW).expires_at(FIXED_NOW - 1).sign_hs256();
    auth.authenticate(Some(&bearer_header(&just_expired)))
        .assert_rejected_with(FailureKind::TokenExpired);
    Ok(())
}

#[test]
fn test_key_errors_fail_startup() {
    let secret = test_secret_key_base64();

    assert!(matches!(
        build(&[(ENV_REALM_AUTHENTICATION, "false")]),
        Err(ConfigError::MissingKey)
    ));
    assert!(matches!(
        build(&[
            (ENV_SECRET_KEY, &secret),
            (ENV_PUBLIC_KEY, TEST_RSA_PUBLIC_KEY_SPKI),
            (ENV_REALM_AUTHENTICATION, "false"),
        ]),
        Err(ConfigError::ConflictingKeys)
    ));
    assert!(matches!(
        build(&[(ENV_SECRET_KEY, "not base64!"), (ENV_REALM_AUTHENTICATION, "false")]),
        Err(ConfigError::InvalidSecretKey(_))
    ));
    assert!(matches!(
        build(&[(ENV_PUBLIC_KEY, "c2VjcmV0"), (ENV_REALM_AUTHENTICATION, "false")]),
        Err(ConfigError::InvalidPublicKey(_))
    ));
    assert!(matches!(
        build(&[
            (ENV_PUBLIC_KEY, TEST_RSA_PUBLIC_KEY_SPKI),
            (ENV_PUBLIC_KEY_ALGORITHM, "EC"),
            (ENV_REALM_AUTHENTICATION, "false"),
        ]),
        Err(ConfigError::UnsupportedPublicKeyAlgorithm(_))
    ));
}

#[test]
fn test_value_errors_fail_startup() {
    let secret = test_secret_key_base64();

    assert!(matches!(
        build(&[(ENV_SECRET_KEY, &secret), (ENV_CLOCK_SKEW_SECONDS, "601")]),
        Err(ConfigError::InvalidClockSkew(_))
    ));
    assert!(matches!(
        build(&[(ENV_SECRET_KEY, &secret), (ENV_TOKEN_CACHE_SIZE, "-1")]),
        Err(ConfigError::InvalidCacheSize(_))
    ));
    assert!(matches!(
        build(&[(ENV_SECRET_KEY, &secret), (ENV_TOKEN_CACHE_MAX_TTL_SECONDS, "soon")]),
        Err(ConfigError::InvalidCacheTtl(_))
    ));
    assert!(matches!(
        build(&[(ENV_SECRET_KEY, &secret), (ENV_TOKEN_CACHE_MAX_TTL_SECONDS, "-30")]),
        Err(ConfigError::InvalidCacheTtl(_))
    ));
    assert!(matches!(
        build(&[(ENV_SECRET_KEY, &secret), (ENV_REALM_AUTHENTICATION, "maybe")]),
        Err(ConfigError::InvalidBoolean { .. })
    ));
}

/// Realm authentication is on by default and needs a store
#[test]
fn test_default_realm_authentication_requires_store() {
    let secret = test_secret_key_base64();

    assert!(matches!(
        build(&[(ENV_SECRET_KEY, &secret)]),
        Err(ConfigError::MissingIdentityStore)
    ));
}

#[test]
fn test_config_debug_redacts_keys() -> Result<(), anyhow::Error> {
    let secret = test_secret_key_base64();
    let config = AuthConfig::from_vars(&vars(&[(ENV_SECRET_KEY, &secret)]))?;

    let debug = format!("{config:?}");
    assert!(debug.contains("[REDACTED]"));
    assert!(!debug.contains(&secret));
    Ok(())
}
