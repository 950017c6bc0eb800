//! External identity store ("realm") capability.
//!
//! The decision engine only sees the [`IdentityStore`] trait. Database or
//! remote implementations live in the hosting application.

use crate::error::IdentityStoreError;
use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

/// Answer from an identity store about one subject.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SubjectRecord {
    pub exists: bool,
    /// Additional roles granted by the store.
    pub roles: Vec<String>,
}

impl SubjectRecord {
    #[must_use]
    pub fn known(roles: Vec<String>) -> Self {
        Self { exists: true, roles }
    }

    #[must_use]
    pub fn unknown() -> Self {
        Self::default()
    }
}

/// Confirms that a subject exists and supplies extra roles.
///
/// Called synchronously from the decision path; implementations that talk
/// to a remote system own their own timeouts.
pub trait IdentityStore: Send + Sync {
    /// Look up `subject`.
    ///
    /// # Errors
    ///
    /// Returns `IdentityStoreError` when the store cannot answer. The engine
    /// treats this as a rejection, never as acceptance.
    fn confirm(&self, subject: &str) -> Result<SubjectRecord, IdentityStoreError>;
}

/// Identity store backed by a map of subject to roles.
#[derive(Debug, Default)]
pub struct InMemoryIdentityStore {
    subjects: RwLock<HashMap<String, Vec<String>>>,
}

impl InMemoryIdentityStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a subject.
    pub fn insert(&self, subject: impl Into<String>, roles: Vec<String>) {
        self.subjects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(subject.into(), roles);
    }

    /// Remove a subject. Returns whether it was present.
    pub fn remove(&self, subject: &str) -> bool {
        self.subjects
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(subject)
            .is_some()
    }

    /// Builder-style insert.
    #[must_use]
    pub fn with_subject(self, subject: impl Into<String>, roles: &[&str]) -> Self {
        self.insert(subject, roles.iter().map(ToString::to_string).collect());
        self
    }
}

impl IdentityStore for InMemoryIdentityStore {
    fn confirm(&self, subject: &str) -> Result<SubjectRecord, IdentityStoreError> {
        let subjects = self.subjects.read().unwrap_or_else(PoisonError::into_inner);
        Ok(subjects
            .get(subject)
            .map_or_else(SubjectRecord::unknown, |roles| SubjectRecord::known(roles.clone())))
    }
}
