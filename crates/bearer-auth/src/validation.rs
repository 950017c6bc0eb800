//! Claims validation.
//!
//! Checks run in a fixed order and the first failure wins:
//!
//! 1. `exp` present and `now <= exp + skew`
//! 2. `nbf` (if present) satisfies `now >= nbf - skew`
//! 3. `iss` equals the configured issuer (if one is configured)
//! 4. `aud` contains the configured audience (if one is configured)
//! 5. `sub` present and non-empty

use crate::claims::Claims;
use crate::error::FailureKind;

/// Default clock skew tolerance in seconds.
pub const DEFAULT_CLOCK_SKEW_SECONDS: i64 = 60;

/// Maximum accepted clock skew tolerance in seconds (10 minutes).
///
/// Guards against misconfiguration that would make expiry meaningless.
pub const MAX_CLOCK_SKEW_SECONDS: i64 = 600;

/// Identity-related expectations for a token.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClaimsPolicy {
    /// Required `iss`; `None` disables the check.
    pub issuer: Option<String>,
    /// Required `aud` member; `None` disables the check.
    pub audience: Option<String>,
    /// Tolerance applied to `exp` and `nbf`.
    pub clock_skew_seconds: i64,
}

impl Default for ClaimsPolicy {
    fn default() -> Self {
        Self {
            issuer: None,
            audience: None,
            clock_skew_seconds: DEFAULT_CLOCK_SKEW_SECONDS,
        }
    }
}

/// Validate claims against `policy` at time `now` (Unix epoch seconds).
///
/// On success returns the subject and the token expiry.
///
/// # Errors
///
/// Returns the `FailureKind` of the first failing check.
pub fn validate_claims_at<'c>(
    claims: &'c Claims,
    policy: &ClaimsPolicy,
    now: i64,
) -> Result<(&'c str, i64), FailureKind> {
    let skew = policy.clock_skew_seconds;

    let Some(expires_at) = claims.expires_at else {
        tracing::debug!(target: "bearer.auth.claims", "Token rejected: no exp claim");
        return Err(FailureKind::TokenExpired);
    };
    if now > expires_at.saturating_add(skew) {
        tracing::debug!(
            target: "bearer.auth.claims",
            exp = expires_at,
            now,
            clock_skew_seconds = skew,
            "Token rejected: expired"
        );
        return Err(FailureKind::TokenExpired);
    }

    if let Some(not_before) = claims.not_before {
        if now < not_before.saturating_sub(skew) {
            tracing::debug!(
                target: "bearer.auth.claims",
                nbf = not_before,
                now,
                clock_skew_seconds = skew,
                "Token rejected: not yet valid"
            );
            return Err(FailureKind::TokenNotYetValid);
        }
    }

    if let Some(expected) = policy.issuer.as_deref().filter(|iss| !iss.is_empty()) {
        if claims.issuer.as_deref() != Some(expected) {
            tracing::debug!(
                target: "bearer.auth.claims",
                iss = ?claims.issuer,
                "Token rejected: issuer mismatch"
            );
            return Err(FailureKind::IssuerMismatch);
        }
    }

    if let Some(expected) = policy.audience.as_deref().filter(|aud| !aud.is_empty()) {
        let matches = claims
            .audience
            .as_ref()
            .is_some_and(|audience| audience.contains(expected));
        if !matches {
            tracing::debug!(
                target: "bearer.auth.claims",
                aud = ?claims.audience,
                "Token rejected: audience mismatch"
            );
            return Err(FailureKind::AudienceMismatch);
        }
    }

    match claims.subject.as_deref() {
        Some(subject) if !subject.is_empty() => Ok((subject, expires_at)),
        _ => {
            tracing::debug!(target: "bearer.auth.claims", "Token rejected: missing subject");
            Err(FailureKind::MissingSubject)
        }
    }
}
