//! Error types for bearer authentication.
//!
//! Two families live here and must never be confused:
//!
//! - [`FailureKind`] / [`Rejection`]: per-request outcomes. Every parsing or
//!   cryptographic failure is mapped to one of these locally, so the hosting
//!   pipeline always gets a 401, never a fault.
//! - [`ConfigError`]: startup-time problems with key material or settings.
//!   These are fatal for the process that loads the configuration.
//!
//! Client-facing descriptions are fixed per kind. The underlying cause
//! (decoder error text, ring error, store error) only reaches the
//! server-side logs.

use std::fmt;
use thiserror::Error;

/// Why a request was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureKind {
    /// No `Authorization` header (or an empty one).
    MissingCredentials,
    /// A header was present but did not use the `Bearer` scheme.
    MalformedHeader,
    /// The token is not a well-formed compact JWT.
    MalformedToken,
    /// The header's `alg` is missing or not one of the six supported values.
    UnsupportedAlgorithm,
    /// Signature mismatch, key-kind mismatch, or unusable key.
    InvalidSignature,
    /// `exp` is missing or lies beyond the clock skew tolerance.
    TokenExpired,
    /// `nbf` lies in the future beyond the clock skew tolerance.
    TokenNotYetValid,
    /// `iss` does not equal the configured issuer.
    IssuerMismatch,
    /// `aud` does not contain the configured audience.
    AudienceMismatch,
    /// `sub` is missing or empty.
    MissingSubject,
    /// The identity store does not know the subject.
    UnknownSubject,
    /// The identity store could not be reached.
    IdentityStoreUnavailable,
}

impl FailureKind {
    /// Every kind, in declaration order.
    pub const ALL: [FailureKind; 12] = [
        FailureKind::MissingCredentials,
        FailureKind::MalformedHeader,
        FailureKind::MalformedToken,
        FailureKind::UnsupportedAlgorithm,
        FailureKind::InvalidSignature,
        FailureKind::TokenExpired,
        FailureKind::TokenNotYetValid,
        FailureKind::IssuerMismatch,
        FailureKind::AudienceMismatch,
        FailureKind::MissingSubject,
        FailureKind::UnknownSubject,
        FailureKind::IdentityStoreUnavailable,
    ];

    /// Stable label used for log fields and metric labels.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            FailureKind::MissingCredentials => "missing_credentials",
            FailureKind::MalformedHeader => "malformed_header",
            FailureKind::MalformedToken => "malformed_token",
            FailureKind::UnsupportedAlgorithm => "unsupported_algorithm",
            FailureKind::InvalidSignature => "invalid_signature",
            FailureKind::TokenExpired => "token_expired",
            FailureKind::TokenNotYetValid => "token_not_yet_valid",
            FailureKind::IssuerMismatch => "issuer_mismatch",
            FailureKind::AudienceMismatch => "audience_mismatch",
            FailureKind::MissingSubject => "missing_subject",
            FailureKind::UnknownSubject => "unknown_subject",
            FailureKind::IdentityStoreUnavailable => "identity_store_unavailable",
        }
    }

    /// Generic, client-safe description of the failure.
    #[must_use]
    pub fn description(self) -> &'static str {
        match self {
            FailureKind::MissingCredentials => "No bearer token was presented",
            FailureKind::MalformedHeader => "The Authorization header does not use the Bearer scheme",
            FailureKind::MalformedToken => "The access token is malformed",
            FailureKind::UnsupportedAlgorithm => "The access token uses an unsupported algorithm",
            FailureKind::InvalidSignature => "The access token signature is invalid",
            FailureKind::TokenExpired => "The access token has expired",
            FailureKind::TokenNotYetValid => "The access token is not yet valid",
            FailureKind::IssuerMismatch => "The access token was issued by an untrusted issuer",
            FailureKind::AudienceMismatch => "The access token was not issued for this audience",
            FailureKind::MissingSubject => "The access token does not name a subject",
            FailureKind::UnknownSubject => "The token subject is not known to this realm",
            FailureKind::IdentityStoreUnavailable => "The identity store is unavailable",
        }
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A rejected authentication attempt.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{kind}: {description}")]
pub struct Rejection {
    /// The failure category.
    pub kind: FailureKind,
    /// Client-facing description (safe to put in a challenge header).
    pub description: String,
}

impl Rejection {
    /// Build a rejection with the kind's standard description.
    #[must_use]
    pub fn new(kind: FailureKind) -> Self {
        Self {
            kind,
            description: kind.description().to_string(),
        }
    }
}

impl From<FailureKind> for Rejection {
    fn from(kind: FailureKind) -> Self {
        Rejection::new(kind)
    }
}

/// Configuration errors surfaced at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Exactly one of the secret key or the public key must be configured; neither is set")]
    MissingKey,

    #[error("Exactly one of the secret key or the public key must be configured; both are set")]
    ConflictingKeys,

    #[error("Invalid secret key: {0}")]
    InvalidSecretKey(String),

    #[error("Invalid public key: {0}")]
    InvalidPublicKey(String),

    #[error("Unsupported public key algorithm: {0}")]
    UnsupportedPublicKeyAlgorithm(String),

    #[error("Invalid clock skew configuration: {0}")]
    InvalidClockSkew(String),

    #[error("Invalid token cache size: {0}")]
    InvalidCacheSize(String),

    #[error("Invalid token cache TTL cap: {0}")]
    InvalidCacheTtl(String),

    #[error("Invalid boolean for {name}: {value}")]
    InvalidBoolean { name: String, value: String },

    #[error("Realm authentication is enabled but no identity store was provided")]
    MissingIdentityStore,
}

/// Failure reported by an external identity store.
#[derive(Debug, Clone, Error)]
pub enum IdentityStoreError {
    /// The store could not be reached or timed out.
    #[error("Identity store unavailable: {0}")]
    Unavailable(String),

    /// The store answered with something it should not have.
    #[error("Identity store error: {0}")]
    Internal(String),
}
