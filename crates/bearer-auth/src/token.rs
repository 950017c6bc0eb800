//! Token decoder.
//!
//! Turns the raw `Authorization` header value into a structurally decoded
//! compact JWT: header, payload object and raw signature bytes. Nothing here
//! touches key material or the clock.
//!
//! # Security
//!
//! - Tokens are size-checked BEFORE any base64 or JSON work
//! - The algorithm comes from a closed set; `none` and anything else is
//!   rejected as unsupported
//! - Failures carry no detail beyond the [`FailureKind`]; the decoder error
//!   text is logged at debug level only

use crate::error::FailureKind;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use serde_json::{Map, Value};
use std::fmt;

/// Maximum accepted token length in bytes (8KB).
///
/// Typical tokens are a few hundred bytes. Anything larger is rejected
/// before decoding so oversized headers cannot burn CPU or memory.
pub const MAX_JWT_SIZE_BYTES: usize = 8192;

/// Authentication scheme prefix, including the separating space.
pub const BEARER_PREFIX: &str = "Bearer ";

/// Supported signing algorithms.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Algorithm {
    HS256,
    HS384,
    HS512,
    RS256,
    RS384,
    RS512,
}

impl Algorithm {
    /// Every supported algorithm.
    pub const ALL: [Algorithm; 6] = [
        Algorithm::HS256,
        Algorithm::HS384,
        Algorithm::HS512,
        Algorithm::RS256,
        Algorithm::RS384,
        Algorithm::RS512,
    ];

    /// Parse the JOSE `alg` name. Matching is exact.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "HS256" => Some(Algorithm::HS256),
            "HS384" => Some(Algorithm::HS384),
            "HS512" => Some(Algorithm::HS512),
            "RS256" => Some(Algorithm::RS256),
            "RS384" => Some(Algorithm::RS384),
            "RS512" => Some(Algorithm::RS512),
            _ => None,
        }
    }

    /// The JOSE `alg` name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Algorithm::HS256 => "HS256",
            Algorithm::HS384 => "HS384",
            Algorithm::HS512 => "HS512",
            Algorithm::RS256 => "RS256",
            Algorithm::RS384 => "RS384",
            Algorithm::RS512 => "RS512",
        }
    }
}

impl fmt::Display for Algorithm {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decoded JOSE header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedHeader {
    pub algorithm: Algorithm,
    /// The `typ` header, if present.
    pub token_type: Option<String>,
}

/// A structurally valid compact JWT.
///
/// Borrows the raw token so the signing input can be verified without
/// re-encoding anything.
#[derive(Debug, Clone)]
pub struct DecodedToken<'a> {
    raw: &'a str,
    signing_input: &'a str,
    pub header: DecodedHeader,
    pub payload: Map<String, Value>,
    pub signature: Vec<u8>,
}

impl<'a> DecodedToken<'a> {
    /// The token exactly as received.
    #[must_use]
    pub fn raw(&self) -> &'a str {
        self.raw
    }

    /// `segment1 + "." + segment2`, the bytes covered by the signature.
    #[must_use]
    pub fn signing_input(&self) -> &'a [u8] {
        self.signing_input.as_bytes()
    }
}

/// Extract the raw token from an `Authorization` header value.
///
/// # Errors
///
/// - `MissingCredentials` when the header is absent or blank
/// - `MalformedHeader` when the scheme is not `Bearer` (case-sensitive)
/// - `MalformedToken` when the scheme is right but no token follows
pub fn extract_bearer_token(header: Option<&str>) -> Result<&str, FailureKind> {
    let value = match header.map(str::trim) {
        None | Some("") => return Err(FailureKind::MissingCredentials),
        Some(value) => value,
    };

    if value == BEARER_PREFIX.trim_end() {
        tracing::debug!(target: "bearer.auth.token", "Bearer scheme without a token");
        return Err(FailureKind::MalformedToken);
    }

    let token = value.strip_prefix(BEARER_PREFIX).ok_or_else(|| {
        tracing::debug!(target: "bearer.auth.token", "Authorization header is not a Bearer credential");
        FailureKind::MalformedHeader
    })?;

    Ok(token.trim_start())
}

/// Decode a compact JWT into header, payload and signature.
///
/// # Errors
///
/// - `MalformedToken` for size, segment count, base64 or JSON problems
/// - `UnsupportedAlgorithm` when `alg` is absent or not supported
pub fn decode_token(raw: &str) -> Result<DecodedToken<'_>, FailureKind> {
    if raw.len() > MAX_JWT_SIZE_BYTES {
        tracing::debug!(
            target: "bearer.auth.token",
            token_size = raw.len(),
            max_size = MAX_JWT_SIZE_BYTES,
            "Token rejected: size exceeds maximum allowed"
        );
        return Err(FailureKind::MalformedToken);
    }

    let mut parts = raw.split('.');
    let (Some(header_part), Some(payload_part), Some(signature_part), None) =
        (parts.next(), parts.next(), parts.next(), parts.next())
    else {
        tracing::debug!(target: "bearer.auth.token", "Token rejected: expected three segments");
        return Err(FailureKind::MalformedToken);
    };

    if header_part.is_empty() || payload_part.is_empty() || signature_part.is_empty() {
        tracing::debug!(target: "bearer.auth.token", "Token rejected: empty segment");
        return Err(FailureKind::MalformedToken);
    }

    let header_json = decode_json_object(header_part, "header")?;
    let payload = decode_json_object(payload_part, "payload")?;

    let signature = URL_SAFE_NO_PAD.decode(signature_part).map_err(|e| {
        tracing::debug!(target: "bearer.auth.token", error = %e, "Failed to decode JWT signature base64");
        FailureKind::MalformedToken
    })?;

    let algorithm = header_json
        .get("alg")
        .and_then(Value::as_str)
        .and_then(Algorithm::from_name)
        .ok_or_else(|| {
            tracing::debug!(
                target: "bearer.auth.token",
                alg = ?header_json.get("alg"),
                "Token rejected: missing or unsupported algorithm"
            );
            FailureKind::UnsupportedAlgorithm
        })?;

    let token_type = header_json
        .get("typ")
        .and_then(Value::as_str)
        .map(ToString::to_string);

    // Header and payload segments are non-empty, so the last '.' separates
    // the signing input from the signature.
    let signing_input = raw
        .rsplit_once('.')
        .map(|(input, _)| input)
        .ok_or(FailureKind::MalformedToken)?;

    Ok(DecodedToken {
        raw,
        signing_input,
        header: DecodedHeader {
            algorithm,
            token_type,
        },
        payload,
        signature,
    })
}

fn decode_json_object(segment: &str, which: &'static str) -> Result<Map<String, Value>, FailureKind> {
    let bytes = URL_SAFE_NO_PAD.decode(segment).map_err(|e| {
        tracing::debug!(target: "bearer.auth.token", segment = which, error = %e, "Failed to decode JWT segment base64");
        FailureKind::MalformedToken
    })?;

    match serde_json::from_slice::<Value>(&bytes) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(_) => {
            tracing::debug!(target: "bearer.auth.token", segment = which, "JWT segment is not a JSON object");
            Err(FailureKind::MalformedToken)
        }
        Err(e) => {
            tracing::debug!(target: "bearer.auth.token", segment = which, error = %e, "Failed to parse JWT segment JSON");
            Err(FailureKind::MalformedToken)
        }
    }
}
