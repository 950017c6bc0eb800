//! Typed view of a token payload.
//!
//! Only the registered claims the validator cares about get typed fields.
//! Everything else, including the configurable roles claim, stays available
//! through [`Claims::get`]. The `sub` field is redacted in Debug output to
//! prevent exposure in logs.

use crate::error::FailureKind;
use serde_json::{Map, Value};
use std::fmt;

/// The `aud` claim: either a single string or a list of strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    Single(String),
    Many(Vec<String>),
}

impl Audience {
    /// Whether `expected` is (one of) the audience value(s).
    #[must_use]
    pub fn contains(&self, expected: &str) -> bool {
        match self {
            Audience::Single(aud) => aud == expected,
            Audience::Many(auds) => auds.iter().any(|aud| aud == expected),
        }
    }
}

/// Claims extracted from a decoded payload.
#[derive(Clone, PartialEq)]
pub struct Claims {
    /// `sub` - redacted in Debug output.
    pub subject: Option<String>,
    /// `exp` (Unix epoch seconds).
    pub expires_at: Option<i64>,
    /// `iat` (Unix epoch seconds).
    pub issued_at: Option<i64>,
    /// `nbf` (Unix epoch seconds).
    pub not_before: Option<i64>,
    /// `iss`.
    pub issuer: Option<String>,
    /// `aud`.
    pub audience: Option<Audience>,
    all: Map<String, Value>,
}

impl fmt::Debug for Claims {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Claims")
            .field("subject", &self.subject.as_ref().map(|_| "[REDACTED]"))
            .field("expires_at", &self.expires_at)
            .field("issued_at", &self.issued_at)
            .field("not_before", &self.not_before)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("claim_count", &self.all.len())
            .finish()
    }
}

impl Claims {
    /// Build typed claims from a payload object.
    ///
    /// Time claims must be non-negative integers. Fractional, negative,
    /// out-of-range or non-numeric values make the whole token malformed
    /// rather than merely invalid.
    ///
    /// # Errors
    ///
    /// Returns `FailureKind::MalformedToken` when a recognized claim has the
    /// wrong JSON type.
    pub fn from_payload(payload: Map<String, Value>) -> Result<Self, FailureKind> {
        Ok(Self {
            subject: string_claim(&payload, "sub")?,
            expires_at: time_claim(&payload, "exp")?,
            issued_at: time_claim(&payload, "iat")?,
            not_before: time_claim(&payload, "nbf")?,
            issuer: string_claim(&payload, "iss")?,
            audience: audience_claim(&payload)?,
            all: payload,
        })
    }

    /// Raw access to any claim, recognized or not.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.all.get(name)
    }
}

fn string_claim(payload: &Map<String, Value>, name: &'static str) -> Result<Option<String>, FailureKind> {
    match payload.get(name) {
        None => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.clone())),
        Some(other) => {
            tracing::debug!(target: "bearer.auth.claims", claim = name, kind = json_kind(other), "Claim has wrong type");
            Err(FailureKind::MalformedToken)
        }
    }
}

fn time_claim(payload: &Map<String, Value>, name: &'static str) -> Result<Option<i64>, FailureKind> {
    let Some(value) = payload.get(name) else {
        return Ok(None);
    };

    match value.as_i64() {
        Some(seconds) if seconds >= 0 => Ok(Some(seconds)),
        _ => {
            tracing::debug!(
                target: "bearer.auth.claims",
                claim = name,
                kind = json_kind(value),
                "Time claim is not a non-negative integer"
            );
            Err(FailureKind::MalformedToken)
        }
    }
}

fn audience_claim(payload: &Map<String, Value>) -> Result<Option<Audience>, FailureKind> {
    match payload.get("aud") {
        None => Ok(None),
        Some(Value::String(aud)) => Ok(Some(Audience::Single(aud.clone()))),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_str().map(ToString::to_string))
            .collect::<Option<Vec<_>>>()
            .map(|auds| Some(Audience::Many(auds)))
            .ok_or_else(|| {
                tracing::debug!(target: "bearer.auth.claims", "Audience list contains a non-string entry");
                FailureKind::MalformedToken
            }),
        Some(other) => {
            tracing::debug!(target: "bearer.auth.claims", claim = "aud", kind = json_kind(other), "Claim has wrong type");
            Err(FailureKind::MalformedToken)
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
