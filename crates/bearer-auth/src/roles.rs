//! Role extraction from token claims.

use crate::claims::Claims;
use serde_json::Value;
use std::collections::BTreeSet;

/// Default name of the claim that carries roles.
pub const DEFAULT_ROLES_CLAIM: &str = "roles";

/// Reads roles out of a configurable claim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoleResolver {
    claim_name: String,
    extract_from_token: bool,
}

impl Default for RoleResolver {
    fn default() -> Self {
        Self::new(DEFAULT_ROLES_CLAIM, true)
    }
}

impl RoleResolver {
    #[must_use]
    pub fn new(claim_name: impl Into<String>, extract_from_token: bool) -> Self {
        Self {
            claim_name: claim_name.into(),
            extract_from_token,
        }
    }

    #[must_use]
    pub fn claim_name(&self) -> &str {
        &self.claim_name
    }

    /// Roles carried by the token.
    ///
    /// Empty when extraction is disabled or the claim is absent. A list
    /// contributes its string elements; a string is split on commas and
    /// whitespace. Any other JSON type yields no roles.
    #[must_use]
    pub fn token_roles(&self, claims: &Claims) -> BTreeSet<String> {
        if !self.extract_from_token {
            return BTreeSet::new();
        }

        match claims.get(&self.claim_name) {
            None => BTreeSet::new(),
            Some(Value::Array(items)) => items
                .iter()
                .filter_map(Value::as_str)
                .filter(|role| !role.is_empty())
                .map(ToString::to_string)
                .collect(),
            Some(Value::String(joined)) => split_roles(joined),
            Some(_) => {
                tracing::debug!(
                    target: "bearer.auth.roles",
                    claim = %self.claim_name,
                    "Roles claim is neither a list nor a string; ignoring"
                );
                BTreeSet::new()
            }
        }
    }
}

/// Split a delimited role string ("user, admin" or "user admin").
fn split_roles(joined: &str) -> BTreeSet<String> {
    joined
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|role| !role.is_empty())
        .map(ToString::to_string)
        .collect()
}

/// Union of token roles and identity-store roles.
#[must_use]
pub fn merge_roles(token_roles: BTreeSet<String>, store_roles: &[String]) -> BTreeSet<String> {
    let mut merged = token_roles;
    merged.extend(store_roles.iter().filter(|role| !role.is_empty()).cloned());
    merged
}
