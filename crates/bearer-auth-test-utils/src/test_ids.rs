//! Fixed test values for deterministic tests
//!
//! Using fixed subjects, issuers and timestamps prevents flaky tests caused
//! by random data or wall-clock drift.

/// Fixed "now" for clock-driven tests (2023-11-14T22:13:20Z)
pub const FIXED_NOW: i64 = 1_700_000_000;

// Subjects
pub const TEST_SUBJECT: &str = "user1";
pub const TEST_SUBJECT_ALICE: &str = "alice";
pub const TEST_SUBJECT_BOB: &str = "bob";
pub const TEST_SUBJECT_UNKNOWN: &str = "ghost";

// Issuers and audiences
pub const TEST_ISSUER: &str = "https://issuer.test.example";
pub const TEST_UNTRUSTED_ISSUER: &str = "https://evil.test.example";
pub const TEST_AUDIENCE: &str = "orders-api";
pub const TEST_OTHER_AUDIENCE: &str = "billing-api";

// Roles
pub const ROLE_USER: &str = "user";
pub const ROLE_ADMIN: &str = "admin";
pub const ROLE_BILLING: &str = "billing";

/// Realm name used in challenge assertions
pub const TEST_REALM: &str = "orders";
