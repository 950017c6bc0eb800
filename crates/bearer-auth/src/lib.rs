//! Bearer token authentication.
//!
//! Validates JWTs presented as `Authorization: Bearer <token>`, decides
//! accept/reject, derives an authenticated identity (subject + roles) and
//! caches accepted outcomes so repeated requests skip the cryptography.
//!
//! # Components
//!
//! - [`token`]: header parsing and compact JWT decoding
//! - [`signature`]: HMAC and RSA verification against one configured key
//! - [`validation`]: time and identity claim checks
//! - [`cache`]: bounded, TTL-aware memo of accepted outcomes
//! - [`roles`]: role extraction and merging
//! - [`authenticator`]: the decision engine tying them together
//!
//! The hosting pipeline sees [`BearerAuthenticator::authenticate`], the
//! [`challenge`] header builder and the axum [`middleware`].
//!
//! # Example
//!
//! ```rust,ignore
//! let config = AuthConfig::from_env()?;
//! let authenticator = BearerAuthenticator::builder(config)
//!     .identity_store(Arc::new(store))
//!     .build()?;
//!
//! match authenticator.authenticate(Some("Bearer eyJ...")) {
//!     Decision::Accepted(identity) => { /* forward */ }
//!     Decision::Rejected(rejection) => { /* 401 + challenge */ }
//! }
//! ```

#![warn(clippy::pedantic)]

pub mod authenticator;
pub mod cache;
pub mod challenge;
pub mod claims;
pub mod clock;
pub mod config;
pub mod error;
pub mod identity_store;
pub mod middleware;
pub mod observability;
pub mod outcome;
pub mod roles;
pub mod signature;
pub mod token;
pub mod validation;

pub use authenticator::{BearerAuthenticator, BearerAuthenticatorBuilder};
pub use cache::CacheStats;
pub use clock::{Clock, SystemClock};
pub use config::AuthConfig;
pub use error::{ConfigError, FailureKind, IdentityStoreError, Rejection};
pub use identity_store::{IdentityStore, InMemoryIdentityStore, SubjectRecord};
pub use outcome::{AuthenticatedIdentity, Decision, ValidationOutcome};
pub use signature::{KeyMaterial, KeyVerifier, SignatureError, SignatureVerifier};
pub use token::Algorithm;
