//! Observability for the bearer authenticator.
//!
//! # Privacy by Default
//!
//! The decision call uses `#[instrument(skip_all)]`. Fields fall into:
//! - **SAFE**: failure labels, algorithm names, cache results, timings
//! - **NEVER**: raw tokens, subjects, key material
//!
//! Metric labels only ever carry SAFE values.

pub mod metrics;
