//! End-to-end decision scenarios
//!
//! Covers the accept/reject paths through the full decision engine with
//! real signatures, a manual clock, and the standard fixtures.

use bearer_auth::{Algorithm, AuthConfig, BearerAuthenticator, FailureKind};
use bearer_auth_test_utils::*;

// ============================================================================
// Helper Functions
// ============================================================================

/// HMAC authenticator requiring the standard issuer and audience
fn strict_hmac_authenticator(clock: std::sync::Arc<ManualClock>) -> Result<BearerAuthenticator, anyhow::Error> {
    Ok(BearerAuthenticator::builder(AuthConfig {
        issuer: Some(TEST_ISSUER.to_string()),
        audience: Some(TEST_AUDIENCE.to_string()),
        ..hmac_config()
    })
    .clock(clock)
    .build()?)
}

// ============================================================================
// Reference scenario
// ============================================================================

/// Fixed 32-byte secret, user1 with roles [user, admin], matching iss/aud
#[test]
fn test_reference_scenario_accepted() -> Result<(), anyhow::Error> {
    let auth = strict_hmac_authenticator(ManualClock::new(FIXED_NOW))?;
    let token = TestTokenBuilder::scenario(FIXED_NOW)
        .for_subject("user1")
        .with_roles(&["user", "admin"])
        .expires_in(3600)
        .sign_hs256();

    auth.authenticate(Some(&bearer_header(&token)))
        .assert_accepted()
        .assert_subject("user1")
        .assert_roles(&["admin", "user"]);

    assert_eq!(auth.authenticate(Some(&bearer_header(&token))).identity().scheme, "BEARER");
    Ok(())
}

#[test]
fn test_reference_scenario_expired() -> Result<(), anyhow::Error> {
    let auth = strict_hmac_authenticator(ManualClock::new(FIXED_NOW))?;
    let token = TestTokenBuilder::scenario(FIXED_NOW)
        .with_roles(&["user", "admin"])
        .expires_in(-3600)
        .sign_hs256();

    auth.authenticate(Some(&bearer_header(&token)))
        .assert_rejected_with(FailureKind::TokenExpired);
    Ok(())
}

#[test]
fn test_reference_scenario_issuer_mismatch() -> Result<(), anyhow::Error> {
    let auth = strict_hmac_authenticator(ManualClock::new(FIXED_NOW))?;
    let token = TestTokenBuilder::scenario(FIXED_NOW)
        .with_roles(&["user", "admin"])
        .issued_by(TEST_UNTRUSTED_ISSUER)
        .sign_hs256();

    auth.authenticate(Some(&bearer_header(&token)))
        .assert_rejected_with(FailureKind::IssuerMismatch);
    Ok(())
}

#[test]
fn test_audience_checks() -> Result<(), anyhow::Error> {
    let auth = strict_hmac_authenticator(ManualClock::new(FIXED_NOW))?;

    let in_list = TestTokenBuilder::scenario(FIXED_NOW)
        .for_audiences(&[TEST_OTHER_AUDIENCE, TEST_AUDIENCE])
        .sign_hs256();
    auth.authenticate(Some(&bearer_header(&in_list))).assert_accepted();

    let wrong = TestTokenBuilder::scenario(FIXED_NOW)
        .for_audience(TEST_OTHER_AUDIENCE)
        .sign_hs256();
    auth.authenticate(Some(&bearer_header(&wrong)))
        .assert_rejected_with(FailureKind::AudienceMismatch);

    let missing = TestTokenBuilder::scenario(FIXED_NOW).without_claim("aud").sign_hs256();
    auth.authenticate(Some(&bearer_header(&missing)))
        .assert_rejected_with(FailureKind::AudienceMismatch);
    Ok(())
}

// ============================================================================
// Round trip
// ============================================================================

/// Every supported algorithm round-trips subject and roles
#[test]
fn test_round_trip_all_algorithms() {
    let clock = ManualClock::new(FIXED_NOW);
    let hmac = hmac_authenticator(clock.clone());
    let rsa = rsa_authenticator(clock);

    for algorithm in Algorithm::ALL {
        let token = TestTokenBuilder::at(FIXED_NOW)
            .for_subject(TEST_SUBJECT_ALICE)
            .with_roles(&[ROLE_USER, ROLE_BILLING])
            .sign(algorithm);
        let authenticator = if algorithm.as_str().starts_with("HS") { &hmac } else { &rsa };

        authenticator
            .authenticate(Some(&bearer_header(&token)))
            .assert_accepted()
            .assert_subject(TEST_SUBJECT_ALICE)
            .assert_roles(&[ROLE_BILLING, ROLE_USER]);
    }
}

#[test]
fn test_public_key_formats_accepted() -> Result<(), anyhow::Error> {
    let token = TestTokenBuilder::at(FIXED_NOW).sign_rs256();

    for public_key in [
        TEST_RSA_PUBLIC_KEY_SPKI.to_string(),
        TEST_RSA_PUBLIC_KEY_PKCS1.to_string(),
        test_rsa_public_key_pem(),
    ] {
        let auth = BearerAuthenticator::builder(AuthConfig {
            realm_authentication: false,
            ..AuthConfig::with_public_key(public_key)
        })
        .clock(ManualClock::new(FIXED_NOW))
        .build()?;

        auth.authenticate(Some(&bearer_header(&token))).assert_accepted();
    }
    Ok(())
}

// ============================================================================
// Time boundaries
// ============================================================================

#[test]
fn test_expiry_boundary_default_skew() {
    let auth = hmac_authenticator(ManualClock::new(FIXED_NOW));

    let just_expired = TestTokenBuilder::at(FIXED_NOW).expires_at(FIXED_NOW - 60 - 1).sign_hs256();
    auth.authenticate(Some(&bearer_header(&just_expired)))
        .assert_rejected_with(FailureKind::TokenExpired);

    let within_skew = TestTokenBuilder::at(FIXED_NOW).expires_at(FIXED_NOW - 60).sign_hs256();
    auth.authenticate(Some(&bearer_header(&within_skew))).assert_accepted();

    let about_to_expire = TestTokenBuilder::at(FIXED_NOW).expires_at(FIXED_NOW + 1).sign_hs256();
    auth.authenticate(Some(&bearer_header(&about_to_expire))).assert_accepted();
}

#[test]
fn test_expiry_boundary_custom_skew() -> Result<(), anyhow::Error> {
    let auth = BearerAuthenticator::builder(AuthConfig {
        clock_skew_seconds: 5,
        ..hmac_config()
    })
    .clock(ManualClock::new(FIXED_NOW))
    .build()?;

    let expired = TestTokenBuilder::at(FIXED_NOW).expires_at(FIXED_NOW - 6).sign_hs256();
    auth.authenticate(Some(&bearer_header(&expired)))
        .assert_rejected_with(FailureKind::TokenExpired);

    let within = TestTokenBuilder::at(FIXED_NOW).expires_at(FIXED_NOW - 5).sign_hs256();
    auth.authenticate(Some(&bearer_header(&within))).assert_accepted();
    Ok(())
}

#[test]
fn test_not_before() {
    let auth = hmac_authenticator(ManualClock::new(FIXED_NOW));

    let future = TestTokenBuilder::at(FIXED_NOW).not_before_in(61).sign_hs256();
    auth.authenticate(Some(&bearer_header(&future)))
        .assert_rejected_with(FailureKind::TokenNotYetValid);

    let within_skew = TestTokenBuilder::at(FIXED_NOW).not_before_in(60).sign_hs256();
    auth.authenticate(Some(&bearer_header(&within_skew))).assert_accepted();
}

#[test]
fn test_missing_exp_is_expired() {
    let auth = hmac_authenticator(ManualClock::new(FIXED_NOW));
    let token = TestTokenBuilder::at(FIXED_NOW).without_exp().sign_hs256();

    auth.authenticate(Some(&bearer_header(&token)))
        .assert_rejected_with(FailureKind::TokenExpired);
}

#[test]
fn test_fractional_exp_is_malformed() {
    let auth = hmac_authenticator(ManualClock::new(FIXED_NOW));
    let token = TestTokenBuilder::at(FIXED_NOW)
        .with_claim("exp", serde_json::json!(FIXED_NOW as f64 + 3600.5))
        .sign_hs256();

    auth.authenticate(Some(&bearer_header(&token)))
        .assert_rejected_with(FailureKind::MalformedToken);
}

// ============================================================================
// Subject and roles
// ============================================================================

#[test]
fn test_missing_or_empty_subject() {
    let auth = hmac_authenticator(ManualClock::new(FIXED_NOW));

    let missing = TestTokenBuilder::at(FIXED_NOW).without_subject().sign_hs256();
    auth.authenticate(Some(&bearer_header(&missing)))
        .assert_rejected_with(FailureKind::MissingSubject);

    let empty = TestTokenBuilder::at(FIXED_NOW).for_subject("").sign_hs256();
    auth.authenticate(Some(&bearer_header(&empty)))
        .assert_rejected_with(FailureKind::MissingSubject);
}

#[test]
fn test_role_claim_forms() -> Result<(), anyhow::Error> {
    let auth = hmac_authenticator(ManualClock::new(FIXED_NOW));

    let delimited = TestTokenBuilder::at(FIXED_NOW).with_roles_string("user,admin billing").sign_hs256();
    auth.authenticate(Some(&bearer_header(&delimited)))
        .assert_roles(&[ROLE_ADMIN, ROLE_BILLING, ROLE_USER]);

    let absent = TestTokenBuilder::at(FIXED_NOW).sign_hs256();
    auth.authenticate(Some(&bearer_header(&absent))).assert_roles(&[]);

    let custom = BearerAuthenticator::builder(AuthConfig {
        roles_claim: "groups".to_string(),
        ..hmac_config()
    })
    .clock(ManualClock::new(FIXED_NOW))
    .build()?;
    let token = TestTokenBuilder::at(FIXED_NOW)
        .with_roles(&[ROLE_ADMIN])
        .with_claim("groups", serde_json::json!(["ops"]))
        .sign_hs256();
    custom.authenticate(Some(&bearer_header(&token))).assert_roles(&["ops"]);

    let disabled = BearerAuthenticator::builder(AuthConfig {
        extract_roles_from_token: false,
        ..hmac_config()
    })
    .clock(ManualClock::new(FIXED_NOW))
    .build()?;
    let token = TestTokenBuilder::at(FIXED_NOW).with_roles(&[ROLE_ADMIN]).sign_hs256();
    disabled.authenticate(Some(&bearer_header(&token))).assert_roles(&[]);
    Ok(())
}

// ============================================================================
// Header handling
// ============================================================================

#[test]
fn test_header_shapes() {
    let auth = hmac_authenticator(ManualClock::new(FIXED_NOW));
    let token = TestTokenBuilder::at(FIXED_NOW).sign_hs256();

    auth.authenticate(None).assert_rejected_with(FailureKind::MissingCredentials);
    auth.authenticate(Some("")).assert_rejected_with(FailureKind::MissingCredentials);
    auth.authenticate(Some("   ")).assert_rejected_with(FailureKind::MissingCredentials);
    auth.authenticate(Some("Basic dXNlcjpwYXNz"))
        .assert_rejected_with(FailureKind::MalformedHeader);
    auth.authenticate(Some(&format!("bearer {token}")))
        .assert_rejected_with(FailureKind::MalformedHeader);
    auth.authenticate(Some(&token)).assert_rejected_with(FailureKind::MalformedHeader);
    auth.authenticate(Some("Bearer")).assert_rejected_with(FailureKind::MalformedToken);
    auth.authenticate(Some("Bearer a.b")).assert_rejected_with(FailureKind::MalformedToken);
    auth.authenticate(Some("Bearer a..c")).assert_rejected_with(FailureKind::MalformedToken);

    auth.authenticate(Some(&format!("  Bearer   {token}  "))).assert_accepted();
}

#[test]
fn test_oversized_token_is_malformed() {
    let auth = hmac_authenticator(ManualClock::new(FIXED_NOW));
    let token = TestTokenBuilder::at(FIXED_NOW)
        .with_claim("padding", serde_json::json!("x".repeat(9000)))
        .sign_hs256();

    auth.authenticate(Some(&bearer_header(&token)))
        .assert_rejected_with(FailureKind::MalformedToken);
}
