//! Algorithm handling tests
//!
//! The configured key decides the algorithm family. A token naming the
//! other family, an unsupported algorithm, or no algorithm at all must
//! never be accepted.

use bearer_auth::{Algorithm, AuthConfig, BearerAuthenticator, FailureKind};
use bearer_auth_test_utils::*;
use serde_json::json;

// ============================================================================
// Algorithm confusion
// ============================================================================

/// RSA-signed tokens are rejected by an HMAC-configured authenticator
#[test]
fn test_rsa_token_against_hmac_key() {
    let auth = hmac_authenticator(ManualClock::new(FIXED_NOW));

    for algorithm in [Algorithm::RS256, Algorithm::RS384, Algorithm::RS512] {
        let token = TestTokenBuilder::at(FIXED_NOW).sign(algorithm);
        auth.authenticate(Some(&bearer_header(&token)))
            .assert_rejected_with(FailureKind::InvalidSignature);
    }
}

/// HMAC-signed tokens are rejected by an RSA-configured authenticator
#[test]
fn test_hmac_token_against_rsa_key() {
    let auth = rsa_authenticator(ManualClock::new(FIXED_NOW));

    for algorithm in [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512] {
        let token = TestTokenBuilder::at(FIXED_NOW).sign(algorithm);
        auth.authenticate(Some(&bearer_header(&token)))
            .assert_rejected_with(FailureKind::InvalidSignature);
    }
}

/// Classic confusion attack: HS256 keyed with the published RSA public key
#[test]
fn test_hs256_keyed_with_public_key_is_rejected() -> Result<(), anyhow::Error> {
    let auth = rsa_authenticator(ManualClock::new(FIXED_NOW));
    let builder = TestTokenBuilder::at(FIXED_NOW).with_roles(&[ROLE_ADMIN]);

    let spki_keyed = builder.sign_hmac(Algorithm::HS256, TEST_RSA_PUBLIC_KEY_SPKI.as_bytes())?;
    auth.authenticate(Some(&bearer_header(&spki_keyed)))
        .assert_rejected_with(FailureKind::InvalidSignature);

    let pem_keyed = builder.sign_hmac(Algorithm::HS256, test_rsa_public_key_pem().as_bytes())?;
    auth.authenticate(Some(&bearer_header(&pem_keyed)))
        .assert_rejected_with(FailureKind::InvalidSignature);
    Ok(())
}

// ============================================================================
// Unsupported algorithms
// ============================================================================

#[test]
fn test_alg_none_is_unsupported() {
    let auth = hmac_authenticator(ManualClock::new(FIXED_NOW));
    let builder = TestTokenBuilder::at(FIXED_NOW);

    for name in ["none", "None", "NONE"] {
        let token = builder.sign_hs256_with_header(&json!({"alg": name, "typ": "JWT"}));
        auth.authenticate(Some(&bearer_header(&token)))
            .assert_rejected_with(FailureKind::UnsupportedAlgorithm);
    }

    // Unsigned form with an empty signature segment never reaches the
    // algorithm check.
    let unsigned = format!(
        "{}.",
        encode_signing_input(&json!({"alg": "none"}), &builder.claims())
    );
    auth.authenticate(Some(&bearer_header(&unsigned)))
        .assert_rejected_with(FailureKind::MalformedToken);
}

#[test]
fn test_missing_alg_is_unsupported() {
    let auth = hmac_authenticator(ManualClock::new(FIXED_NOW));
    let token = TestTokenBuilder::at(FIXED_NOW).sign_hs256_with_header(&json!({"typ": "JWT"}));

    auth.authenticate(Some(&bearer_header(&token)))
        .assert_rejected_with(FailureKind::UnsupportedAlgorithm);
}

#[test]
fn test_other_algorithms_are_unsupported() {
    let auth = hmac_authenticator(ManualClock::new(FIXED_NOW));
    let builder = TestTokenBuilder::at(FIXED_NOW);

    for name in ["ES256", "PS256", "EdDSA", "hs256", "HS1024"] {
        let token = builder.sign_hs256_with_header(&json!({"alg": name}));
        auth.authenticate(Some(&bearer_header(&token)))
            .assert_rejected_with(FailureKind::UnsupportedAlgorithm);
    }

    let non_string = builder.sign_hs256_with_header(&json!({"alg": 256}));
    auth.authenticate(Some(&bearer_header(&non_string)))
        .assert_rejected_with(FailureKind::UnsupportedAlgorithm);
}

/// A correct HS256 tag under a header that names HS512 does not verify
#[test]
fn test_header_algorithm_drives_verification() {
    let auth = hmac_authenticator(ManualClock::new(FIXED_NOW));
    let token = TestTokenBuilder::at(FIXED_NOW).sign_hs256_with_header(&json!({"alg": "HS512"}));

    auth.authenticate(Some(&bearer_header(&token)))
        .assert_rejected_with(FailureKind::InvalidSignature);
}

// ============================================================================
// Wrong keys
// ============================================================================

#[test]
fn test_wrong_hmac_secret() -> Result<(), anyhow::Error> {
    let auth = hmac_authenticator(ManualClock::new(FIXED_NOW));
    let token = TestTokenBuilder::at(FIXED_NOW).sign_hmac(Algorithm::HS256, OTHER_HMAC_SECRET)?;

    auth.authenticate(Some(&bearer_header(&token)))
        .assert_rejected_with(FailureKind::InvalidSignature);
    Ok(())
}

#[test]
fn test_wrong_rsa_key() -> Result<(), anyhow::Error> {
    let auth = rsa_authenticator(ManualClock::new(FIXED_NOW));
    let token = TestTokenBuilder::at(FIXED_NOW).sign_rsa(Algorithm::RS256, OTHER_RSA_PRIVATE_KEY_PEM)?;

    auth.authenticate(Some(&bearer_header(&token)))
        .assert_rejected_with(FailureKind::InvalidSignature);

    let other_auth = BearerAuthenticator::builder(AuthConfig {
        realm_authentication: false,
        ..AuthConfig::with_public_key(OTHER_RSA_PUBLIC_KEY_SPKI)
    })
    .clock(ManualClock::new(FIXED_NOW))
    .build()?;
    other_auth
        .authenticate(Some(&bearer_header(&token)))
        .assert_accepted();
    Ok(())
}

/// Keys under 2048 bits load (with a warning) but never verify
#[test]
fn test_undersized_rsa_key_never_verifies() -> Result<(), anyhow::Error> {
    let auth = BearerAuthenticator::builder(AuthConfig {
        realm_authentication: false,
        ..AuthConfig::with_public_key(SMALL_RSA_PUBLIC_KEY_SPKI)
    })
    .clock(ManualClock::new(FIXED_NOW))
    .build()?;
    let token = TestTokenBuilder::at(FIXED_NOW).sign_rsa(Algorithm::RS256, SMALL_RSA_PRIVATE_KEY_PEM)?;

    auth.authenticate(Some(&bearer_header(&token)))
        .assert_rejected_with(FailureKind::InvalidSignature);
    Ok(())
}
