//! Metrics definitions for the bearer authenticator.
//!
//! All metrics follow Prometheus naming conventions:
//! - `bearer_auth_` prefix
//! - `_total` suffix for counters
//! - `_seconds` suffix for duration histograms
//!
//! # Cardinality
//!
//! Labels are bounded to prevent cardinality explosion:
//! - `outcome`: 2 values (accepted, rejected)
//! - `failure`: 13 values (one per failure kind, plus none)
//! - `result`: 4 values (hit, miss, stale, disabled)
//!
//! No exporter is installed here; the hosting process installs one.

use crate::cache::CacheLookup;
use crate::error::FailureKind;
use metrics::{counter, histogram};
use std::time::Duration;

/// Record one authentication decision.
///
/// Metric: `bearer_auth_decisions_total`
/// Labels: `outcome`, `failure`
pub fn record_decision(failure: Option<FailureKind>) {
    let (outcome, failure) = match failure {
        None => ("accepted", "none"),
        Some(kind) => ("rejected", kind.as_str()),
    };

    counter!("bearer_auth_decisions_total",
        "outcome" => outcome,
        "failure" => failure
    )
    .increment(1);
}

/// Record a validation cache lookup.
///
/// Metric: `bearer_auth_cache_lookups_total`
/// Labels: `result`
pub fn record_cache_lookup(lookup: &CacheLookup) {
    counter!("bearer_auth_cache_lookups_total", "result" => lookup.as_str()).increment(1);
}

/// Record the cost of a full validation (cache misses only).
///
/// Metric: `bearer_auth_validation_duration_seconds`
pub fn record_validation_duration(duration: Duration) {
    histogram!("bearer_auth_validation_duration_seconds").record(duration.as_secs_f64());
}
