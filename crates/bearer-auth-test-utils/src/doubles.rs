//! Test doubles for the authenticator's injection seams
//!
//! - [`ManualClock`]: time only moves when the test says so
//! - [`ScriptedIdentityStore`]: in-memory store that counts lookups
//! - [`FailingIdentityStore`]: always unavailable
//! - [`CountingVerifier`]: wraps the real verifier and counts invocations

use bearer_auth::error::IdentityStoreError;
use bearer_auth::{
    Algorithm, Clock, IdentityStore, KeyMaterial, KeyVerifier, SignatureError, SignatureVerifier,
    SubjectRecord,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

/// Clock that is set and advanced explicitly
#[derive(Debug)]
pub struct ManualClock {
    now: AtomicI64,
}

impl ManualClock {
    pub fn new(now: i64) -> Arc<Self> {
        Arc::new(Self {
            now: AtomicI64::new(now),
        })
    }

    pub fn set(&self, now: i64) {
        self.now.store(now, Ordering::SeqCst);
    }

    pub fn advance(&self, seconds: i64) {
        self.now.fetch_add(seconds, Ordering::SeqCst);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> i64 {
        self.now.load(Ordering::SeqCst)
    }
}

/// Identity store with a fixed subject table and a lookup counter
#[derive(Debug, Default)]
pub struct ScriptedIdentityStore {
    subjects: Mutex<HashMap<String, Vec<String>>>,
    lookups: AtomicUsize,
}

impl ScriptedIdentityStore {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Builder-style: add a known subject with extra roles
    pub fn with_subject(subjects: &[(&str, &[&str])]) -> Arc<Self> {
        let store = Self::default();
        {
            let mut table = store.subjects.lock().unwrap();
            for (subject, roles) in subjects {
                table.insert(
                    (*subject).to_string(),
                    roles.iter().map(ToString::to_string).collect(),
                );
            }
        }
        Arc::new(store)
    }

    pub fn forget(&self, subject: &str) {
        self.subjects.lock().unwrap().remove(subject);
    }

    /// Number of `confirm` calls so far
    pub fn lookups(&self) -> usize {
        self.lookups.load(Ordering::SeqCst)
    }
}

impl IdentityStore for ScriptedIdentityStore {
    fn confirm(&self, subject: &str) -> Result<SubjectRecord, IdentityStoreError> {
        self.lookups.fetch_add(1, Ordering::SeqCst);
        let table = self.subjects.lock().unwrap();
        Ok(match table.get(subject) {
            Some(roles) => SubjectRecord::known(roles.clone()),
            None => SubjectRecord::unknown(),
        })
    }
}

/// Identity store that is always unreachable
#[derive(Debug, Default)]
pub struct FailingIdentityStore;

impl IdentityStore for FailingIdentityStore {
    fn confirm(&self, _subject: &str) -> Result<SubjectRecord, IdentityStoreError> {
        Err(IdentityStoreError::Unavailable(
            "connection refused".to_string(),
        ))
    }
}

/// Real verifier wrapped with an invocation counter
#[derive(Debug)]
pub struct CountingVerifier {
    inner: KeyVerifier,
    calls: AtomicUsize,
}

impl CountingVerifier {
    pub fn new(key: KeyMaterial) -> Arc<Self> {
        Arc::new(Self {
            inner: KeyVerifier::new(key),
            calls: AtomicUsize::new(0),
        })
    }

    /// Number of signature verifications so far
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl SignatureVerifier for CountingVerifier {
    fn verify(
        &self,
        signing_input: &[u8],
        signature_bytes: &[u8],
        algorithm: Algorithm,
    ) -> Result<(), SignatureError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.verify(signing_input, signature_bytes, algorithm)
    }
}
