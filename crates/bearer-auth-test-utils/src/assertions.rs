//! Custom test assertions for expressive tests
//!
//! Provides trait-based assertions for decisions and raw tokens.

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use bearer_auth::{AuthenticatedIdentity, Decision, FailureKind};
use serde_json::Value;
use std::collections::BTreeSet;

/// Custom assertions for authentication decisions
///
/// # Example
/// ```rust,ignore
/// authenticator
///     .authenticate(Some(&header))
///     .assert_accepted()
///     .assert_subject("user1")
///     .assert_roles(&["admin", "user"]);
/// ```
pub trait DecisionAssertions {
    /// Assert that the request was accepted
    fn assert_accepted(&self) -> &Self;

    /// Assert that the request was rejected with `kind`
    fn assert_rejected_with(&self, kind: FailureKind) -> &Self;

    /// Assert the accepted identity's subject
    fn assert_subject(&self, subject: &str) -> &Self;

    /// Assert the accepted identity's exact role set
    fn assert_roles(&self, roles: &[&str]) -> &Self;

    /// The accepted identity (panics on rejection)
    fn identity(&self) -> &AuthenticatedIdentity;
}

impl DecisionAssertions for Decision {
    fn assert_accepted(&self) -> &Self {
        assert!(
            self.is_accepted(),
            "Expected the request to be accepted, got {:?}",
            self
        );
        self
    }

    fn assert_rejected_with(&self, kind: FailureKind) -> &Self {
        match self {
            Decision::Rejected(rejection) => assert_eq!(
                rejection.kind, kind,
                "Expected rejection {kind}, got {}",
                rejection.kind
            ),
            Decision::Accepted(identity) => {
                panic!("Expected rejection {kind}, but request was accepted: {identity:?}")
            }
        }
        self
    }

    fn assert_subject(&self, subject: &str) -> &Self {
        assert_eq!(self.identity().subject, subject, "Unexpected subject");
        self
    }

    fn assert_roles(&self, roles: &[&str]) -> &Self {
        let expected: BTreeSet<String> = roles.iter().map(ToString::to_string).collect();
        assert_eq!(self.identity().roles, expected, "Unexpected roles");
        self
    }

    fn identity(&self) -> &AuthenticatedIdentity {
        match self {
            Decision::Accepted(identity) => identity,
            Decision::Rejected(rejection) => {
                panic!("Expected an accepted identity, got rejection {rejection}")
            }
        }
    }
}

/// Custom assertions for raw compact tokens
pub trait TokenAssertions {
    /// Assert that the token is three base64url segments with JSON header
    /// and payload
    fn assert_valid_jwt(&self) -> &Self;

    /// Assert the header's `alg`
    fn assert_algorithm(&self, algorithm: &str) -> &Self;

    /// Assert the payload's `sub`
    fn assert_for_subject(&self, subject: &str) -> &Self;
}

fn decode_segment(token: &str, index: usize) -> Value {
    let segment = token
        .split('.')
        .nth(index)
        .unwrap_or_else(|| panic!("JWT has no segment {index}"));
    let bytes = URL_SAFE_NO_PAD
        .decode(segment)
        .unwrap_or_else(|e| panic!("Failed to base64 decode JWT segment {index}: {e}"));
    serde_json::from_slice(&bytes)
        .unwrap_or_else(|e| panic!("Failed to parse JWT segment {index} JSON: {e}"))
}

impl TokenAssertions for String {
    fn assert_valid_jwt(&self) -> &Self {
        let parts: Vec<_> = self.split('.').collect();
        assert_eq!(
            parts.len(),
            3,
            "JWT must have 3 parts (header.payload.signature), got {}",
            parts.len()
        );
        assert!(decode_segment(self, 0).is_object(), "JWT header is not an object");
        assert!(decode_segment(self, 1).is_object(), "JWT payload is not an object");
        self
    }

    fn assert_algorithm(&self, algorithm: &str) -> &Self {
        assert_eq!(decode_segment(self, 0)["alg"], algorithm, "Unexpected alg");
        self
    }

    fn assert_for_subject(&self, subject: &str) -> &Self {
        assert_eq!(decode_segment(self, 1)["sub"], subject, "Unexpected subject");
        self
    }
}
