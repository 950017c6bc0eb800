//! Authentication decision engine.
//!
//! One call per request:
//!
//! ```text
//! header checked -> cache consulted -> structure decoded -> signature verified
//!   -> claims validated -> roles resolved -> identity confirmed -> decided
//! ```
//!
//! Any failing step short-circuits to a rejection. Only accepted outcomes,
//! after identity-store confirmation, are cached, so a cache hit always
//! implies that confirmation already succeeded for that raw token.

use crate::cache::{CacheLookup, CacheStats, ValidationCache};
use crate::claims::Claims;
use crate::clock::{Clock, SystemClock};
use crate::config::AuthConfig;
use crate::error::{ConfigError, FailureKind};
use crate::identity_store::IdentityStore;
use crate::observability::metrics;
use crate::outcome::{Decision, ValidationOutcome};
use crate::roles::{merge_roles, RoleResolver};
use crate::signature::{KeyVerifier, SignatureVerifier};
use crate::token::{decode_token, extract_bearer_token};
use crate::validation::{validate_claims_at, ClaimsPolicy};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::instrument;

/// Validates bearer tokens and decides accept/reject.
///
/// Safe to share across threads; the cache is the only mutable state.
pub struct BearerAuthenticator {
    verifier: Arc<dyn SignatureVerifier>,
    policy: ClaimsPolicy,
    roles: RoleResolver,
    identity_store: Option<Arc<dyn IdentityStore>>,
    realm_authentication: bool,
    realm_name: String,
    cache: ValidationCache,
    cache_max_ttl_seconds: Option<i64>,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for BearerAuthenticator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BearerAuthenticator")
            .field("policy", &self.policy)
            .field("roles", &self.roles)
            .field("identity_store", &self.identity_store.is_some())
            .field("realm_authentication", &self.realm_authentication)
            .field("realm_name", &self.realm_name)
            .field("cache", &self.cache)
            .field("cache_max_ttl_seconds", &self.cache_max_ttl_seconds)
            .finish_non_exhaustive()
    }
}

/// Builder for [`BearerAuthenticator`].
pub struct BearerAuthenticatorBuilder {
    config: AuthConfig,
    identity_store: Option<Arc<dyn IdentityStore>>,
    verifier: Option<Arc<dyn SignatureVerifier>>,
    clock: Arc<dyn Clock>,
}

impl BearerAuthenticatorBuilder {
    /// Identity store consulted when realm authentication is enabled.
    #[must_use]
    pub fn identity_store(mut self, store: Arc<dyn IdentityStore>) -> Self {
        self.identity_store = Some(store);
        self
    }

    /// Replace the key-based verifier. Exactly one key must still be
    /// configured, but it is not decoded at build time.
    #[must_use]
    pub fn verifier(mut self, verifier: Arc<dyn SignatureVerifier>) -> Self {
        self.verifier = Some(verifier);
        self
    }

    #[must_use]
    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Validate the configuration and build the authenticator.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for invalid settings or key material, or
    /// `MissingIdentityStore` when realm authentication is enabled without
    /// an identity store.
    pub fn build(self) -> Result<BearerAuthenticator, ConfigError> {
        let config = self.config;
        config.validate()?;
        config.check_single_key()?;

        if config.realm_authentication && self.identity_store.is_none() {
            return Err(ConfigError::MissingIdentityStore);
        }

        let verifier: Arc<dyn SignatureVerifier> = match self.verifier {
            Some(verifier) => verifier,
            None => {
                let key = config.key_material()?;
                tracing::info!(target: "bearer.auth.config", key_kind = key.kind(), "Configured verification key");
                Arc::new(KeyVerifier::new(key))
            }
        };

        tracing::info!(
            target: "bearer.auth.engine",
            realm = %config.realm_name,
            realm_authentication = config.realm_authentication,
            token_cache_size = config.token_cache_size,
            "Bearer authenticator ready"
        );

        Ok(BearerAuthenticator {
            verifier,
            policy: config.claims_policy(),
            roles: config.role_resolver(),
            identity_store: self.identity_store,
            realm_authentication: config.realm_authentication,
            realm_name: config.realm_name,
            cache: ValidationCache::new(config.token_cache_size),
            cache_max_ttl_seconds: config.token_cache_max_ttl_seconds,
            clock: self.clock,
        })
    }
}

impl BearerAuthenticator {
    /// Start building an authenticator from `config`.
    #[must_use]
    pub fn builder(config: AuthConfig) -> BearerAuthenticatorBuilder {
        BearerAuthenticatorBuilder {
            config,
            identity_store: None,
            verifier: None,
            clock: Arc::new(SystemClock),
        }
    }

    /// Realm reported in challenge headers.
    #[must_use]
    pub fn realm_name(&self) -> &str {
        &self.realm_name
    }

    /// Decide on the raw `Authorization` header value of one request.
    ///
    /// Never fails: every problem becomes `Decision::Rejected`.
    #[instrument(skip_all, name = "bearer.auth.authenticate")]
    pub fn authenticate(&self, authorization: Option<&str>) -> Decision {
        let decision = self.decide(authorization);
        metrics::record_decision(decision.failure_kind());
        if let Decision::Rejected(rejection) = &decision {
            tracing::debug!(target: "bearer.auth.engine", failure = rejection.kind.as_str(), "Request rejected");
        }
        decision
    }

    fn decide(&self, authorization: Option<&str>) -> Decision {
        let raw_token = match extract_bearer_token(authorization) {
            Ok(token) => token,
            Err(kind) => return ValidationOutcome::rejected(kind).to_decision(),
        };

        let now = self.clock.now();
        let lookup = self.cache.lookup(raw_token, now);
        metrics::record_cache_lookup(&lookup);
        if let CacheLookup::Hit(entry) = lookup {
            tracing::trace!(target: "bearer.auth.cache", "Served validation outcome from cache");
            return entry.outcome.to_decision();
        }

        let started = Instant::now();
        let outcome = self.validate_token_at(raw_token, now);
        metrics::record_validation_duration(started.elapsed());

        if let (true, Some(token_exp)) = (outcome.accepted, outcome.expires_at) {
            let cache_until = match self.cache_max_ttl_seconds {
                Some(ttl) => token_exp.min(now.saturating_add(ttl)),
                None => token_exp,
            };
            let decision = outcome.to_decision();
            self.cache.store(raw_token, Arc::new(outcome), now, cache_until);
            return decision;
        }

        outcome.to_decision()
    }

    /// Fully validate `raw_token` at time `now`, bypassing the cache.
    #[must_use]
    pub fn validate_token_at(&self, raw_token: &str, now: i64) -> ValidationOutcome {
        match self.run_pipeline(raw_token, now) {
            Ok(outcome) => outcome,
            Err(kind) => ValidationOutcome::rejected(kind),
        }
    }

    fn run_pipeline(&self, raw_token: &str, now: i64) -> Result<ValidationOutcome, FailureKind> {
        let decoded = decode_token(raw_token)?;
        let algorithm = decoded.header.algorithm;

        self.verifier
            .verify(decoded.signing_input(), &decoded.signature, algorithm)
            .map_err(|e| {
                tracing::debug!(target: "bearer.auth.signature", %algorithm, error = %e, "Signature verification failed");
                FailureKind::InvalidSignature
            })?;

        let claims = Claims::from_payload(decoded.payload)?;
        let (subject, expires_at) = validate_claims_at(&claims, &self.policy, now)?;
        let token_roles = self.roles.token_roles(&claims);

        let roles = if self.realm_authentication {
            let store = self.identity_store.as_ref().ok_or_else(|| {
                tracing::warn!(target: "bearer.auth.engine", "Realm authentication enabled without an identity store");
                FailureKind::IdentityStoreUnavailable
            })?;
            let record = store.confirm(subject).map_err(|e| {
                tracing::warn!(target: "bearer.auth.engine", error = %e, "Identity store lookup failed");
                FailureKind::IdentityStoreUnavailable
            })?;
            if !record.exists {
                tracing::debug!(target: "bearer.auth.engine", "Subject not known to identity store");
                return Err(FailureKind::UnknownSubject);
            }
            merge_roles(token_roles, &record.roles)
        } else {
            token_roles
        };

        Ok(ValidationOutcome::accepted(subject, roles, expires_at))
    }

    /// Number of cached outcomes (including not-yet-collected stale ones).
    #[must_use]
    pub fn cache_len(&self) -> usize {
        self.cache.len()
    }

    /// Drop every cached outcome, e.g. after a configuration reload.
    pub fn clear_cache(&self) {
        self.cache.clear();
        tracing::info!(target: "bearer.auth.cache", "Validation cache cleared");
    }

    #[must_use]
    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }
}
