//! # Bearer Auth Test Utilities
//!
//! Shared test utilities for the bearer-auth crate.
//!
//! This crate provides:
//! - Deterministic crypto fixtures (fixed HMAC secrets and RSA key pairs)
//! - Test token builders (TestTokenBuilder)
//! - Test doubles for the clock, identity store and signature verifier
//! - Fixed test values (subjects, issuers, timestamps)
//! - Custom assertions (DecisionAssertions, TokenAssertions traits)
//!
//! ## Usage
//!
//! ```rust,ignore
//! use bearer_auth_test_utils::*;
//!
//! #[test]
//! fn test_example() {
//!     let clock = ManualClock::new(FIXED_NOW);
//!     let authenticator = hmac_authenticator(clock.clone());
//!
//!     let token = TestTokenBuilder::at(FIXED_NOW)
//!         .for_subject("alice")
//!         .with_roles(&["admin"])
//!         .sign_hs256();
//!
//!     authenticator
//!         .authenticate(Some(&bearer_header(&token)))
//!         .assert_accepted()
//!         .assert_roles(&["admin"]);
//! }
//! ```

pub mod assertions;
pub mod crypto_fixtures;
pub mod doubles;
pub mod test_ids;
pub mod token_builders;

// Re-export commonly used items
pub use assertions::*;
pub use crypto_fixtures::*;
pub use doubles::*;
pub use test_ids::*;
pub use token_builders::*;

use bearer_auth::{AuthConfig, BearerAuthenticator};
use std::sync::Arc;

/// HMAC configuration with the standard test secret, no identity store
pub fn hmac_config() -> AuthConfig {
    AuthConfig {
        realm_authentication: false,
        realm_name: TEST_REALM.to_string(),
        ..AuthConfig::with_secret_key(test_secret_key_base64())
    }
}

/// RSA configuration with the standard test public key, no identity store
pub fn rsa_config() -> AuthConfig {
    AuthConfig {
        realm_authentication: false,
        realm_name: TEST_REALM.to_string(),
        ..AuthConfig::with_public_key(TEST_RSA_PUBLIC_KEY_SPKI)
    }
}

/// Authenticator over [`hmac_config`] driven by `clock`
pub fn hmac_authenticator(clock: Arc<ManualClock>) -> BearerAuthenticator {
    BearerAuthenticator::builder(hmac_config())
        .clock(clock)
        .build()
        .expect("test HMAC configuration is valid")
}

/// Authenticator over [`rsa_config`] driven by `clock`
pub fn rsa_authenticator(clock: Arc<ManualClock>) -> BearerAuthenticator {
    BearerAuthenticator::builder(rsa_config())
        .clock(clock)
        .build()
        .expect("test RSA configuration is valid")
}
