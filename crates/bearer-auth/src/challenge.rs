//! `WWW-Authenticate` challenge for rejected requests (RFC 6750 §3).

use crate::error::{FailureKind, Rejection};

/// Build the challenge header value for `rejection`.
///
/// `MissingCredentials` only names the realm; every other kind adds
/// `error="invalid_token"` and the rejection's description.
#[must_use]
pub fn www_authenticate(realm: &str, rejection: &Rejection) -> String {
    let realm = quote(realm);
    if rejection.kind == FailureKind::MissingCredentials {
        return format!("Bearer realm={realm}");
    }

    format!(
        "Bearer realm={realm}, error=\"invalid_token\", error_description={}",
        quote(&rejection.description)
    )
}

/// Quoted-string with `"` and `\` escaped.
fn quote(value: &str) -> String {
    let mut quoted = String::with_capacity(value.len() + 2);
    quoted.push('"');
    for c in value.chars() {
        if c == '"' || c == '\\' {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}
