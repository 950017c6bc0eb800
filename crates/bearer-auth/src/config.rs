//! Authenticator configuration.
//!
//! Loaded from `BEARER_*` environment variables or built in code. Key
//! material is redacted in Debug output and decoded into [`KeyMaterial`]
//! once at startup, so malformed keys fail fast instead of per request.

use crate::cache::DEFAULT_TOKEN_CACHE_SIZE;
use crate::error::ConfigError;
use crate::roles::{RoleResolver, DEFAULT_ROLES_CLAIM};
use crate::signature::KeyMaterial;
use crate::validation::{ClaimsPolicy, DEFAULT_CLOCK_SKEW_SECONDS, MAX_CLOCK_SKEW_SECONDS};
use secrecy::{ExposeSecret, SecretString};
use std::collections::HashMap;
use std::env;
use std::fmt;

/// Default realm reported in challenge headers.
pub const DEFAULT_REALM_NAME: &str = "bearer";

/// The only supported public key algorithm.
pub const DEFAULT_PUBLIC_KEY_ALGORITHM: &str = "RSA";

pub const ENV_SECRET_KEY: &str = "BEARER_SECRET_KEY";
pub const ENV_PUBLIC_KEY: &str = "BEARER_PUBLIC_KEY";
pub const ENV_PUBLIC_KEY_ALGORITHM: &str = "BEARER_PUBLIC_KEY_ALGORITHM";
pub const ENV_ISSUER: &str = "BEARER_ISSUER";
pub const ENV_AUDIENCE: &str = "BEARER_AUDIENCE";
pub const ENV_CLOCK_SKEW_SECONDS: &str = "BEARER_CLOCK_SKEW_SECONDS";
pub const ENV_TOKEN_CACHE_SIZE: &str = "BEARER_TOKEN_CACHE_SIZE";
pub const ENV_TOKEN_CACHE_MAX_TTL_SECONDS: &str = "BEARER_TOKEN_CACHE_MAX_TTL_SECONDS";
pub const ENV_ROLES_CLAIM: &str = "BEARER_ROLES_CLAIM";
pub const ENV_REALM_AUTHENTICATION: &str = "BEARER_REALM_AUTHENTICATION";
pub const ENV_EXTRACT_ROLES_FROM_TOKEN: &str = "BEARER_EXTRACT_ROLES_FROM_TOKEN";
pub const ENV_REALM_NAME: &str = "BEARER_REALM_NAME";

/// Bearer authenticator settings.
///
/// Exactly one of `secret_key` and `public_key` must be set.
#[derive(Clone)]
pub struct AuthConfig {
    /// Base64 symmetric key for HS256/HS384/HS512.
    pub secret_key: Option<SecretString>,

    /// Base64 DER (SPKI or PKCS#1) RSA public key for RS256/RS384/RS512.
    pub public_key: Option<String>,

    /// Algorithm of `public_key` (default: "RSA").
    pub public_key_algorithm: String,

    /// Required `iss` value.
    pub issuer: Option<String>,

    /// Required `aud` member.
    pub audience: Option<String>,

    /// Tolerance for `exp`/`nbf` checks (default: 60, max: 600).
    pub clock_skew_seconds: i64,

    /// Maximum cached outcomes (default: 1000, 0 disables caching).
    pub token_cache_size: usize,

    /// Upper bound on how long one cached outcome is reused. `None` keeps
    /// it until the token expires.
    pub token_cache_max_ttl_seconds: Option<i64>,

    /// Claim carrying roles (default: "roles").
    pub roles_claim: String,

    /// Confirm every subject with the identity store (default: true).
    pub realm_authentication: bool,

    /// Read roles from the token (default: true).
    pub extract_roles_from_token: bool,

    /// Realm reported in the `WWW-Authenticate` challenge (default: "bearer").
    pub realm_name: String,
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            public_key: None,
            public_key_algorithm: DEFAULT_PUBLIC_KEY_ALGORITHM.to_string(),
            issuer: None,
            audience: None,
            clock_skew_seconds: DEFAULT_CLOCK_SKEW_SECONDS,
            token_cache_size: DEFAULT_TOKEN_CACHE_SIZE,
            token_cache_max_ttl_seconds: None,
            roles_claim: DEFAULT_ROLES_CLAIM.to_string(),
            realm_authentication: true,
            extract_roles_from_token: true,
            realm_name: DEFAULT_REALM_NAME.to_string(),
        }
    }
}

/// Custom Debug implementation that redacts key material.
impl fmt::Debug for AuthConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthConfig")
            .field("secret_key", &self.secret_key.as_ref().map(|_| "[REDACTED]"))
            .field("public_key", &self.public_key.as_ref().map(|_| "[REDACTED]"))
            .field("public_key_algorithm", &self.public_key_algorithm)
            .field("issuer", &self.issuer)
            .field("audience", &self.audience)
            .field("clock_skew_seconds", &self.clock_skew_seconds)
            .field("token_cache_size", &self.token_cache_size)
            .field("token_cache_max_ttl_seconds", &self.token_cache_max_ttl_seconds)
            .field("roles_claim", &self.roles_claim)
            .field("realm_authentication", &self.realm_authentication)
            .field("extract_roles_from_token", &self.extract_roles_from_token)
            .field("realm_name", &self.realm_name)
            .finish()
    }
}

impl AuthConfig {
    /// Symmetric-key configuration with defaults for everything else.
    #[must_use]
    pub fn with_secret_key(secret_key_base64: impl Into<String>) -> Self {
        Self {
            secret_key: Some(SecretString::from(secret_key_base64.into())),
            ..Self::default()
        }
    }

    /// RSA public key configuration with defaults for everything else.
    #[must_use]
    pub fn with_public_key(public_key_base64: impl Into<String>) -> Self {
        Self {
            public_key: Some(public_key_base64.into()),
            ..Self::default()
        }
    }

    /// Load configuration from environment variables.
    ///
    /// # Errors
    ///
    /// See [`AuthConfig::from_vars`].
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_vars(&env::vars().collect())
    }

    /// Load configuration from a HashMap (for testing).
    ///
    /// Empty values are treated as unset.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for unparseable numbers or booleans and for
    /// out-of-range values. Key material is checked by
    /// [`AuthConfig::key_material`], not here.
    pub fn from_vars(vars: &HashMap<String, String>) -> Result<Self, ConfigError> {
        let get = |name: &str| {
            vars.get(name)
                .map(|value| value.trim())
                .filter(|value| !value.is_empty())
        };

        let mut config = Self {
            secret_key: get(ENV_SECRET_KEY).map(|value| SecretString::from(value.to_string())),
            public_key: get(ENV_PUBLIC_KEY).map(ToString::to_string),
            issuer: get(ENV_ISSUER).map(ToString::to_string),
            audience: get(ENV_AUDIENCE).map(ToString::to_string),
            ..Self::default()
        };

        if let Some(value) = get(ENV_PUBLIC_KEY_ALGORITHM) {
            config.public_key_algorithm = value.to_string();
        }

        if let Some(value_str) = get(ENV_CLOCK_SKEW_SECONDS) {
            config.clock_skew_seconds = value_str.parse().map_err(|e| {
                ConfigError::InvalidClockSkew(format!(
                    "{ENV_CLOCK_SKEW_SECONDS} must be a valid integer, got '{value_str}': {e}"
                ))
            })?;
        }

        if let Some(value_str) = get(ENV_TOKEN_CACHE_SIZE) {
            config.token_cache_size = value_str.parse().map_err(|e| {
                ConfigError::InvalidCacheSize(format!(
                    "{ENV_TOKEN_CACHE_SIZE} must be a non-negative integer, got '{value_str}': {e}"
                ))
            })?;
        }

        if let Some(value_str) = get(ENV_TOKEN_CACHE_MAX_TTL_SECONDS) {
            let value: i64 = value_str.parse().map_err(|e| {
                ConfigError::InvalidCacheTtl(format!(
                    "{ENV_TOKEN_CACHE_MAX_TTL_SECONDS} must be a valid integer, got '{value_str}': {e}"
                ))
            })?;
            config.token_cache_max_ttl_seconds = Some(value);
        }

        if let Some(value) = get(ENV_ROLES_CLAIM) {
            config.roles_claim = value.to_string();
        }

        if let Some(value) = get(ENV_REALM_AUTHENTICATION) {
            config.realm_authentication = parse_bool(ENV_REALM_AUTHENTICATION, value)?;
        }

        if let Some(value) = get(ENV_EXTRACT_ROLES_FROM_TOKEN) {
            config.extract_roles_from_token = parse_bool(ENV_EXTRACT_ROLES_FROM_TOKEN, value)?;
        }

        if let Some(value) = get(ENV_REALM_NAME) {
            config.realm_name = value.to_string();
        }

        config.validate()?;

        tracing::info!(
            target: "bearer.auth.config",
            key_kind = if config.secret_key.is_some() { "secret" } else { "public" },
            issuer = ?config.issuer,
            audience = ?config.audience,
            clock_skew_seconds = config.clock_skew_seconds,
            token_cache_size = config.token_cache_size,
            realm_authentication = config.realm_authentication,
            "Loaded bearer authentication configuration"
        );

        Ok(config)
    }

    /// Check value ranges.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` for a clock skew outside `0..=600`, a
    /// non-positive cache TTL cap, or an unsupported public key algorithm.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0..=MAX_CLOCK_SKEW_SECONDS).contains(&self.clock_skew_seconds) {
            return Err(ConfigError::InvalidClockSkew(format!(
                "clock skew must be between 0 and {MAX_CLOCK_SKEW_SECONDS} seconds, got {}",
                self.clock_skew_seconds
            )));
        }

        if let Some(ttl) = self.token_cache_max_ttl_seconds {
            if ttl <= 0 {
                return Err(ConfigError::InvalidCacheTtl(format!(
                    "cache TTL cap must be positive, got {ttl}"
                )));
            }
        }

        if !self.public_key_algorithm.eq_ignore_ascii_case(DEFAULT_PUBLIC_KEY_ALGORITHM) {
            return Err(ConfigError::UnsupportedPublicKeyAlgorithm(
                self.public_key_algorithm.clone(),
            ));
        }

        Ok(())
    }

    /// Check that exactly one of `secret_key` and `public_key` is set.
    ///
    /// # Errors
    ///
    /// `MissingKey` when neither is set, `ConflictingKeys` when both are.
    pub fn check_single_key(&self) -> Result<(), ConfigError> {
        match (&self.secret_key, &self.public_key) {
            (None, None) => Err(ConfigError::MissingKey),
            (Some(_), Some(_)) => Err(ConfigError::ConflictingKeys),
            _ => Ok(()),
        }
    }

    /// Decode the configured key.
    ///
    /// # Errors
    ///
    /// - `MissingKey` / `ConflictingKeys` unless exactly one key is set
    /// - `InvalidSecretKey` / `InvalidPublicKey` for undecodable keys
    /// - `UnsupportedPublicKeyAlgorithm` for anything but RSA
    pub fn key_material(&self) -> Result<KeyMaterial, ConfigError> {
        self.check_single_key()?;
        match (&self.secret_key, &self.public_key) {
            (None, None) => Err(ConfigError::MissingKey),
            (Some(secret), _) => KeyMaterial::from_secret_base64(secret.expose_secret()),
            (None, Some(public_key)) => {
                if !self.public_key_algorithm.eq_ignore_ascii_case(DEFAULT_PUBLIC_KEY_ALGORITHM) {
                    return Err(ConfigError::UnsupportedPublicKeyAlgorithm(
                        self.public_key_algorithm.clone(),
                    ));
                }
                KeyMaterial::from_rsa_public_key_base64(public_key)
            }
        }
    }

    /// Issuer, audience and skew expectations for the claims validator.
    #[must_use]
    pub fn claims_policy(&self) -> ClaimsPolicy {
        ClaimsPolicy {
            issuer: self.issuer.clone(),
            audience: self.audience.clone(),
            clock_skew_seconds: self.clock_skew_seconds,
        }
    }

    #[must_use]
    pub fn role_resolver(&self) -> RoleResolver {
        RoleResolver::new(self.roles_claim.clone(), self.extract_roles_from_token)
    }
}

fn parse_bool(name: &str, value: &str) -> Result<bool, ConfigError> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Ok(true),
        "false" | "0" | "no" => Ok(false),
        _ => Err(ConfigError::InvalidBoolean {
            name: name.to_string(),
            value: value.to_string(),
        }),
    }
}
