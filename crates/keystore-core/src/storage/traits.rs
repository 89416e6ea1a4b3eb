//! Storage trait definitions

use async_trait::async_trait;

use crate::credential::{CredentialKey, CredentialValue};

/// Raw status reported by a backend
///
/// Only ever logged; callers see the collapsed `StorageFailure` kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackendStatus {
    /// Backend-specific status code
    pub code: i32,
    /// Backend-specific message
    pub message: String,
}

impl BackendStatus {
    pub fn new(code: i32, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for BackendStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "status {}: {}", self.code, self.message)
    }
}

/// What a lookup found under a key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoredPayload {
    /// A byte blob, the only shape this crate writes
    Bytes(CredentialValue),
    /// Something that is not a byte blob
    Unrecognized { description: String },
}

/// Result of an exact-match lookup
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FindOutcome {
    Found(StoredPayload),
    NotFound,
    Failure(BackendStatus),
}

/// Result of an update-in-place
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated,
    NotFound,
    Failure(BackendStatus),
}

/// Result of inserting a new entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InsertOutcome {
    Inserted,
    Failure(BackendStatus),
}

/// Platform protected-storage primitives
///
/// Implementations must honor exact-match semantics for a key: at most one
/// entry per `(service, account)`.
#[async_trait]
pub trait SecureStorageBackend: Send + Sync {
    /// Look up the single entry for `key`
    async fn find(&self, key: &CredentialKey) -> FindOutcome;

    /// Replace the payload of an existing entry
    async fn update(&self, key: &CredentialKey, value: &CredentialValue) -> UpdateOutcome;

    /// Add a new entry
    async fn insert(&self, key: &CredentialKey, value: &CredentialValue) -> InsertOutcome;

    /// Remove the entry for `key`; absence is success
    async fn remove(&self, key: &CredentialKey) -> Result<(), BackendStatus>;

    /// Get a human-readable name for this storage backend
    fn backend_name(&self) -> &'static str;
}
