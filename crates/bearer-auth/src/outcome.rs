//! Decision results handed back to the hosting pipeline.
//!
//! Subjects are redacted in every Debug implementation here.

use crate::error::{FailureKind, Rejection};
use std::collections::BTreeSet;
use std::fmt;

/// Authentication scheme reported on every identity.
pub const BEARER_SCHEME: &str = "BEARER";

/// The identity of an accepted request.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthenticatedIdentity {
    /// Token subject (`sub`).
    pub subject: String,
    /// Token roles unioned with identity-store roles.
    pub roles: BTreeSet<String>,
    /// Always [`BEARER_SCHEME`].
    pub scheme: &'static str,
}

impl AuthenticatedIdentity {
    #[must_use]
    pub fn new(subject: impl Into<String>, roles: BTreeSet<String>) -> Self {
        Self {
            subject: subject.into(),
            roles,
            scheme: BEARER_SCHEME,
        }
    }

    /// Whether the identity carries `role`.
    #[must_use]
    pub fn has_role(&self, role: &str) -> bool {
        self.roles.contains(role)
    }
}

impl fmt::Debug for AuthenticatedIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthenticatedIdentity")
            .field("subject", &"[REDACTED]")
            .field("roles", &self.roles)
            .field("scheme", &self.scheme)
            .finish()
    }
}

/// Result of validating one raw token.
///
/// Immutable once built. Only accepted outcomes are ever cached.
#[derive(Clone, PartialEq, Eq)]
pub struct ValidationOutcome {
    pub accepted: bool,
    pub subject: Option<String>,
    pub roles: BTreeSet<String>,
    /// Token `exp` for accepted outcomes.
    pub expires_at: Option<i64>,
    pub failure: Option<FailureKind>,
}

impl ValidationOutcome {
    #[must_use]
    pub fn accepted(subject: impl Into<String>, roles: BTreeSet<String>, expires_at: i64) -> Self {
        Self {
            accepted: true,
            subject: Some(subject.into()),
            roles,
            expires_at: Some(expires_at),
            failure: None,
        }
    }

    #[must_use]
    pub fn rejected(kind: FailureKind) -> Self {
        Self {
            accepted: false,
            subject: None,
            roles: BTreeSet::new(),
            expires_at: None,
            failure: Some(kind),
        }
    }

    /// Convert into the externally visible decision.
    #[must_use]
    pub fn to_decision(&self) -> Decision {
        match (self.accepted, self.subject.as_deref()) {
            (true, Some(subject)) => Decision::Accepted(AuthenticatedIdentity::new(subject, self.roles.clone())),
            _ => Decision::Rejected(Rejection::new(self.failure.unwrap_or(FailureKind::InvalidSignature))),
        }
    }
}

impl fmt::Debug for ValidationOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ValidationOutcome")
            .field("accepted", &self.accepted)
            .field("subject", &self.subject.as_ref().map(|_| "[REDACTED]"))
            .field("roles", &self.roles)
            .field("expires_at", &self.expires_at)
            .field("failure", &self.failure)
            .finish()
    }
}

/// Terminal state of the decision engine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Accepted(AuthenticatedIdentity),
    Rejected(Rejection),
}

impl Decision {
    #[must_use]
    pub fn is_accepted(&self) -> bool {
        matches!(self, Decision::Accepted(_))
    }

    /// The failure kind of a rejection.
    #[must_use]
    pub fn failure_kind(&self) -> Option<FailureKind> {
        match self {
            Decision::Accepted(_) => None,
            Decision::Rejected(rejection) => Some(rejection.kind),
        }
    }

    /// Convert into a `Result` for `?`-style callers.
    ///
    /// # Errors
    ///
    /// Returns the `Rejection` for a rejected decision.
    pub fn into_result(self) -> Result<AuthenticatedIdentity, Rejection> {
        match self {
            Decision::Accepted(identity) => Ok(identity),
            Decision::Rejected(rejection) => Err(rejection),
        }
    }
}
