//! Signature verification for the HMAC and RSA algorithm families.
//!
//! Key material is configured once and never chosen per token: a token whose
//! algorithm family does not match the configured key kind is rejected
//! before any cryptographic work (algorithm-confusion defence).
//!
//! Verification is stateless. It never consults the validation cache.

use crate::error::ConfigError;
use crate::token::Algorithm;
use base64::{engine::general_purpose::STANDARD, Engine};
use ring::{hmac, signature};
use rsa::pkcs1::{DecodeRsaPublicKey, EncodeRsaPublicKey};
use rsa::pkcs8::DecodePublicKey;
use rsa::traits::PublicKeyParts;
use rsa::RsaPublicKey;
use secrecy::{ExposeSecret, SecretBox};
use std::fmt;
use thiserror::Error;

/// Digest size of an algorithm.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashSize {
    Sha256,
    Sha384,
    Sha512,
}

/// Algorithm family, dispatched through a single verification function.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmFamily {
    Hmac(HashSize),
    Rsa(HashSize),
}

impl Algorithm {
    /// The family and digest size of this algorithm.
    #[must_use]
    pub fn family(self) -> AlgorithmFamily {
        match self {
            Algorithm::HS256 => AlgorithmFamily::Hmac(HashSize::Sha256),
            Algorithm::HS384 => AlgorithmFamily::Hmac(HashSize::Sha384),
            Algorithm::HS512 => AlgorithmFamily::Hmac(HashSize::Sha512),
            Algorithm::RS256 => AlgorithmFamily::Rsa(HashSize::Sha256),
            Algorithm::RS384 => AlgorithmFamily::Rsa(HashSize::Sha384),
            Algorithm::RS512 => AlgorithmFamily::Rsa(HashSize::Sha512),
        }
    }
}

/// Configured verification key. Exactly one kind per deployment.
pub enum KeyMaterial {
    /// Symmetric secret for HS256/HS384/HS512.
    Secret(SecretBox<Vec<u8>>),
    /// RSA public key for RS256/RS384/RS512, held as PKCS#1 DER.
    RsaPublicKey { pkcs1_der: Vec<u8>, modulus_bits: usize },
}

impl fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyMaterial::Secret(_) => f.debug_tuple("Secret").field(&"[REDACTED]").finish(),
            KeyMaterial::RsaPublicKey { modulus_bits, .. } => f
                .debug_struct("RsaPublicKey")
                .field("modulus_bits", modulus_bits)
                .finish_non_exhaustive(),
        }
    }
}

impl KeyMaterial {
    /// Build a symmetric key from raw bytes.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidSecretKey` for an empty secret.
    pub fn from_secret_bytes(secret: Vec<u8>) -> Result<Self, ConfigError> {
        if secret.is_empty() {
            return Err(ConfigError::InvalidSecretKey("secret key is empty".to_string()));
        }
        Ok(KeyMaterial::Secret(SecretBox::new(Box::new(secret))))
    }

    /// Build a symmetric key from its standard base64 encoding.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidSecretKey` if decoding fails or the key
    /// is empty. The decoder error is included; the key itself never is.
    pub fn from_secret_base64(encoded: &str) -> Result<Self, ConfigError> {
        let bytes = STANDARD
            .decode(encoded.trim())
            .map_err(|e| ConfigError::InvalidSecretKey(format!("not valid base64: {e}")))?;
        Self::from_secret_bytes(bytes)
    }

    /// Build an RSA public key from base64 DER.
    ///
    /// Accepts an X.509 SubjectPublicKeyInfo or a bare PKCS#1 RSAPublicKey.
    /// PEM header/footer lines and line breaks are stripped first, so a PEM
    /// file body can be pasted as-is.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidPublicKey` if the text is not base64 or
    /// the DER is not an RSA public key.
    pub fn from_rsa_public_key_base64(encoded: &str) -> Result<Self, ConfigError> {
        let b64: String = encoded
            .lines()
            .filter(|line| !line.starts_with("-----"))
            .flat_map(|line| line.chars().filter(|c| !c.is_whitespace()))
            .collect();

        let der = STANDARD
            .decode(b64)
            .map_err(|e| ConfigError::InvalidPublicKey(format!("not valid base64: {e}")))?;

        let public_key = RsaPublicKey::from_public_key_der(&der)
            .or_else(|_| RsaPublicKey::from_pkcs1_der(&der))
            .map_err(|e| ConfigError::InvalidPublicKey(format!("not an RSA public key: {e}")))?;

        let pkcs1_der = public_key
            .to_pkcs1_der()
            .map_err(|e| ConfigError::InvalidPublicKey(format!("cannot re-encode RSA key: {e}")))?
            .as_bytes()
            .to_vec();

        let modulus_bits = public_key.size() * 8;
        if modulus_bits < 2048 {
            // Still loads; ring refuses such keys per request
            tracing::warn!(
                target: "bearer.auth.config",
                modulus_bits,
                "RSA public key is shorter than 2048 bits; every RSA token will be rejected"
            );
        }

        Ok(KeyMaterial::RsaPublicKey {
            pkcs1_der,
            modulus_bits,
        })
    }

    /// Short name of the key kind, for logs.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            KeyMaterial::Secret(_) => "secret",
            KeyMaterial::RsaPublicKey { .. } => "rsa_public_key",
        }
    }
}

/// Why verification failed. Every variant surfaces as `InvalidSignature`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("token algorithm {algorithm} does not match the configured {key_kind} key")]
    KeyKindMismatch {
        algorithm: Algorithm,
        key_kind: &'static str,
    },

    #[error("signature does not match")]
    Mismatch,
}

/// Verify `signature` over `signing_input` with the configured key.
///
/// HMAC comparison is constant-time (`ring::hmac::verify`). RSA uses
/// PKCS#1 v1.5 with 2048 to 8192 bit moduli; smaller keys fail here.
///
/// # Errors
///
/// - `KeyKindMismatch` if the algorithm family differs from the key kind
/// - `Mismatch` for any cryptographic failure
pub fn verify_signature(
    signing_input: &[u8],
    signature_bytes: &[u8],
    algorithm: Algorithm,
    key: &KeyMaterial,
) -> Result<(), SignatureError> {
    match (algorithm.family(), key) {
        (AlgorithmFamily::Hmac(hash), KeyMaterial::Secret(secret)) => {
            let hmac_algorithm = match hash {
                HashSize::Sha256 => hmac::HMAC_SHA256,
                HashSize::Sha384 => hmac::HMAC_SHA384,
                HashSize::Sha512 => hmac::HMAC_SHA512,
            };
            let hmac_key = hmac::Key::new(hmac_algorithm, secret.expose_secret());
            hmac::verify(&hmac_key, signing_input, signature_bytes).map_err(|_| SignatureError::Mismatch)
        }
        (AlgorithmFamily::Rsa(hash), KeyMaterial::RsaPublicKey { pkcs1_der, .. }) => {
            let parameters: &'static signature::RsaParameters = match hash {
                HashSize::Sha256 => &signature::RSA_PKCS1_2048_8192_SHA256,
                HashSize::Sha384 => &signature::RSA_PKCS1_2048_8192_SHA384,
                HashSize::Sha512 => &signature::RSA_PKCS1_2048_8192_SHA512,
            };
            signature::UnparsedPublicKey::new(parameters, pkcs1_der.as_slice())
                .verify(signing_input, signature_bytes)
                .map_err(|_| SignatureError::Mismatch)
        }
        (_, key) => Err(SignatureError::KeyKindMismatch {
            algorithm,
            key_kind: key.kind(),
        }),
    }
}

/// Seam between the decision engine and the cryptography.
///
/// The production implementation is [`KeyVerifier`]; tests wrap it to
/// observe how often verification actually runs.
pub trait SignatureVerifier: Send + Sync {
    /// Verify a decoded token's signature.
    ///
    /// # Errors
    ///
    /// Returns a `SignatureError` for any failure.
    fn verify(
        &self,
        signing_input: &[u8],
        signature_bytes: &[u8],
        algorithm: Algorithm,
    ) -> Result<(), SignatureError>;
}

/// Verifies against one statically configured key.
#[derive(Debug)]
pub struct KeyVerifier {
    key: KeyMaterial,
}

impl KeyVerifier {
    #[must_use]
    pub fn new(key: KeyMaterial) -> Self {
        Self { key }
    }

    #[must_use]
    pub fn key(&self) -> &KeyMaterial {
        &self.key
    }
}

impl SignatureVerifier for KeyVerifier {
    fn verify(
        &self,
        signing_input: &[u8],
        signature_bytes: &[u8],
        algorithm: Algorithm,
    ) -> Result<(), SignatureError> {
        verify_signature(signing_input, signature_bytes, algorithm, &self.key)
    }
}
