//! Builder patterns for test token construction
//!
//! HMAC tokens are signed with `jsonwebtoken`. RSA tokens are signed with
//! the `rsa` crate, which (unlike ring and jsonwebtoken) also signs with the
//! undersized fixture key.

use crate::crypto_fixtures::{FixtureError, TEST_HMAC_SECRET, TEST_RSA_PRIVATE_KEY_PEM};
use crate::test_ids::{TEST_AUDIENCE, TEST_ISSUER, TEST_SUBJECT};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use bearer_auth::Algorithm;
use chrono::Utc;
use jsonwebtoken::{EncodingKey, Header};
use ring::hmac;
use rsa::pkcs8::DecodePrivateKey;
use rsa::sha2::{Sha256, Sha384, Sha512};
use rsa::signature::{SignatureEncoding, Signer};
use rsa::RsaPrivateKey;
use serde_json::{json, Map, Value};

/// Builder for test JWT claims and signed tokens
///
/// Defaults: subject [`TEST_SUBJECT`], issued now, expiring in one hour,
/// no issuer, audience or roles.
///
/// # Example
/// ```rust,ignore
/// let token = TestTokenBuilder::at(FIXED_NOW)
///     .for_subject("user1")
///     .with_roles(&["user", "admin"])
///     .issued_by(TEST_ISSUER)
///     .expires_in(3600)
///     .sign_hs256();
/// ```
#[derive(Debug, Clone)]
pub struct TestTokenBuilder {
    now: i64,
    claims: Map<String, Value>,
}

impl TestTokenBuilder {
    /// Create a new token builder relative to the wall clock
    pub fn new() -> Self {
        Self::at(Utc::now().timestamp())
    }

    /// Create a new token builder relative to `now` (Unix epoch seconds)
    pub fn at(now: i64) -> Self {
        let mut claims = Map::new();
        claims.insert("sub".to_string(), json!(TEST_SUBJECT));
        claims.insert("iat".to_string(), json!(now));
        claims.insert("exp".to_string(), json!(now + 3600));
        Self { now, claims }
    }

    /// Builder preloaded with the standard issuer and audience
    pub fn scenario(now: i64) -> Self {
        Self::at(now).issued_by(TEST_ISSUER).for_audience(TEST_AUDIENCE)
    }

    /// Set the subject
    pub fn for_subject(self, subject: &str) -> Self {
        self.with_claim("sub", json!(subject))
    }

    /// Remove the subject
    pub fn without_subject(self) -> Self {
        self.without_claim("sub")
    }

    /// Set `roles` to a list
    pub fn with_roles(self, roles: &[&str]) -> Self {
        self.with_claim("roles", json!(roles))
    }

    /// Set `roles` to a delimited string
    pub fn with_roles_string(self, roles: &str) -> Self {
        self.with_claim("roles", json!(roles))
    }

    /// Set the issuer
    pub fn issued_by(self, issuer: &str) -> Self {
        self.with_claim("iss", json!(issuer))
    }

    /// Set a single audience
    pub fn for_audience(self, audience: &str) -> Self {
        self.with_claim("aud", json!(audience))
    }

    /// Set an audience list
    pub fn for_audiences(self, audiences: &[&str]) -> Self {
        self.with_claim("aud", json!(audiences))
    }

    /// Set expiration in seconds from the builder's `now` (negative for past)
    pub fn expires_in(self, seconds: i64) -> Self {
        let exp = self.now + seconds;
        self.with_claim("exp", json!(exp))
    }

    /// Set an absolute expiration
    pub fn expires_at(self, timestamp: i64) -> Self {
        self.with_claim("exp", json!(timestamp))
    }

    /// Remove the expiration
    pub fn without_exp(self) -> Self {
        self.without_claim("exp")
    }

    /// Set not-before in seconds from the builder's `now`
    pub fn not_before_in(self, seconds: i64) -> Self {
        let nbf = self.now + seconds;
        self.with_claim("nbf", json!(nbf))
    }

    /// Set any claim
    pub fn with_claim(mut self, name: &str, value: Value) -> Self {
        self.claims.insert(name.to_string(), value);
        self
    }

    /// Remove any claim
    pub fn without_claim(mut self, name: &str) -> Self {
        self.claims.remove(name);
        self
    }

    /// Build the claims as a JSON value
    pub fn claims(&self) -> Value {
        Value::Object(self.claims.clone())
    }

    /// Sign with an HMAC algorithm via `jsonwebtoken`
    pub fn sign_hmac(&self, algorithm: Algorithm, secret: &[u8]) -> Result<String, FixtureError> {
        let jwt_algorithm = match algorithm {
            Algorithm::HS256 => jsonwebtoken::Algorithm::HS256,
            Algorithm::HS384 => jsonwebtoken::Algorithm::HS384,
            Algorithm::HS512 => jsonwebtoken::Algorithm::HS512,
            other => {
                return Err(FixtureError::Crypto(format!(
                    "{other} is not an HMAC algorithm"
                )))
            }
        };

        jsonwebtoken::encode(
            &Header::new(jwt_algorithm),
            &self.claims(),
            &EncodingKey::from_secret(secret),
        )
        .map_err(|e| FixtureError::Encoding(e.to_string()))
    }

    /// Sign with an RSA algorithm (PKCS#1 v1.5) using a PKCS#8 PEM private key
    pub fn sign_rsa(&self, algorithm: Algorithm, private_key_pem: &str) -> Result<String, FixtureError> {
        let private_key = RsaPrivateKey::from_pkcs8_pem(private_key_pem)
            .map_err(|e| FixtureError::Crypto(format!("invalid RSA private key: {e}")))?;

        let header = json!({"alg": algorithm.as_str(), "typ": "JWT"});
        let signing_input = encode_signing_input(&header, &self.claims());

        let signature = match algorithm {
            Algorithm::RS256 => rsa::pkcs1v15::SigningKey::<Sha256>::new(private_key)
                .sign(signing_input.as_bytes())
                .to_vec(),
            Algorithm::RS384 => rsa::pkcs1v15::SigningKey::<Sha384>::new(private_key)
                .sign(signing_input.as_bytes())
                .to_vec(),
            Algorithm::RS512 => rsa::pkcs1v15::SigningKey::<Sha512>::new(private_key)
                .sign(signing_input.as_bytes())
                .to_vec(),
            other => {
                return Err(FixtureError::Crypto(format!(
                    "{other} is not an RSA algorithm"
                )))
            }
        };

        Ok(format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(signature)))
    }

    /// HS256 with [`TEST_HMAC_SECRET`]
    pub fn sign_hs256(&self) -> String {
        self.sign_hmac(Algorithm::HS256, TEST_HMAC_SECRET)
            .expect("HS256 signing with the test secret")
    }

    /// RS256 with [`TEST_RSA_PRIVATE_KEY_PEM`]
    pub fn sign_rs256(&self) -> String {
        self.sign_rsa(Algorithm::RS256, TEST_RSA_PRIVATE_KEY_PEM)
            .expect("RS256 signing with the test key")
    }

    /// Sign with whatever family `algorithm` belongs to, using the standard
    /// test keys
    pub fn sign(&self, algorithm: Algorithm) -> String {
        match algorithm {
            Algorithm::HS256 | Algorithm::HS384 | Algorithm::HS512 => self
                .sign_hmac(algorithm, TEST_HMAC_SECRET)
                .expect("HMAC signing with the test secret"),
            Algorithm::RS256 | Algorithm::RS384 | Algorithm::RS512 => self
                .sign_rsa(algorithm, TEST_RSA_PRIVATE_KEY_PEM)
                .expect("RSA signing with the test key"),
        }
    }

    /// HS256 over an arbitrary header (e.g. `alg: none`, missing `alg`)
    pub fn sign_hs256_with_header(&self, header: &Value) -> String {
        let signing_input = encode_signing_input(header, &self.claims());
        let tag = hmac::sign(
            &hmac::Key::new(hmac::HMAC_SHA256, TEST_HMAC_SECRET),
            signing_input.as_bytes(),
        );
        format!("{signing_input}.{}", URL_SAFE_NO_PAD.encode(tag.as_ref()))
    }
}

impl Default for TestTokenBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// `base64url(header) + "." + base64url(claims)`
pub fn encode_signing_input(header: &Value, claims: &Value) -> String {
    let header = URL_SAFE_NO_PAD.encode(serde_json::to_vec(header).expect("header serializes"));
    let claims = URL_SAFE_NO_PAD.encode(serde_json::to_vec(claims).expect("claims serialize"));
    format!("{header}.{claims}")
}

/// `Authorization` header value for `token`
pub fn bearer_header(token: &str) -> String {
    format!("Bearer {token}")
}
