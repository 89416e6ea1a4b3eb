//! Credential store: upsert, retrieve and delete over a storage backend

use std::ffi::OsStr;
use std::sync::Arc;

use tracing::{debug, info, warn};

use super::types::{CredentialKey, CredentialValue};
use crate::error::{CredentialError, EncodingError, Result};
use crate::storage::{FindOutcome, InsertOutcome, SecureStorageBackend, StoredPayload, UpdateOutcome};

/// Credential store
///
/// Holds no cached state: every call is a fresh round trip to the backend,
/// which is the only source of truth for an entry.
#[derive(Clone)]
pub struct CredentialStore {
    /// Storage backend
    backend: Arc<dyn SecureStorageBackend>,
    /// Surface backend failures from `delete` instead of logging them
    strict_delete: bool,
}

impl CredentialStore {
    /// Create a new credential store over `backend`
    pub fn new(backend: Arc<dyn SecureStorageBackend>) -> Self {
        Self {
            backend,
            strict_delete: false,
        }
    }

    /// Report backend failures during `delete` as `StorageFailure`
    pub fn with_strict_delete(mut self, strict: bool) -> Self {
        self.strict_delete = strict;
        self
    }

    /// Name of the underlying backend
    pub fn backend_name(&self) -> &'static str {
        self.backend.backend_name()
    }

    /// Store `value` under `key`, replacing any existing entry
    ///
    /// Tries an update first and inserts only when the backend reports the
    /// entry is absent, so there is never more than one entry per key.
    pub async fn save(&self, key: &CredentialKey, value: impl Into<CredentialValue>) -> Result<()> {
        let value = value.into();

        match self.backend.update(key, &value).await {
            UpdateOutcome::Updated => {
                debug!("Updated credential: {}", key);
                Ok(())
            }
            UpdateOutcome::NotFound => match self.backend.insert(key, &value).await {
                InsertOutcome::Inserted => {
                    info!("Added credential: {}", key);
                    Ok(())
                }
                InsertOutcome::Failure(status) => {
                    warn!("Insert failed for {} ({}): {}", key, self.backend_name(), status);
                    Err(CredentialError::StorageFailure)
                }
            },
            UpdateOutcome::Failure(status) => {
                warn!("Update failed for {} ({}): {}", key, self.backend_name(), status);
                Err(CredentialError::StorageFailure)
            }
        }
    }

    /// Store a string as UTF-8 bytes
    pub async fn save_text(&self, key: &CredentialKey, text: &str) -> Result<()> {
        self.save(key, CredentialValue::from_text(text)).await
    }

    /// Store an OS string, which must be valid Unicode
    ///
    /// Fails with `EncodingFailure` without touching the backend otherwise.
    pub async fn save_os_str(&self, key: &CredentialKey, text: &OsStr) -> Result<()> {
        let bytes = text.as_encoded_bytes().to_vec();
        let value = String::from_utf8(bytes).map_err(|e| {
            let source = e.utf8_error();
            EncodingError::new(e.into_bytes(), source)
        })?;
        self.save(key, value).await
    }

    /// Retrieve the raw payload stored under `key`
    pub async fn get(&self, key: &CredentialKey) -> Result<CredentialValue> {
        match self.backend.find(key).await {
            FindOutcome::Found(StoredPayload::Bytes(value)) => Ok(value),
            FindOutcome::Found(StoredPayload::Unrecognized { description }) => {
                warn!("Unexpected payload for {}: {}", key, description);
                Err(CredentialError::UnexpectedData)
            }
            FindOutcome::NotFound => {
                debug!("Credential not found: {}", key);
                Err(CredentialError::NotFound)
            }
            FindOutcome::Failure(status) => {
                warn!("Lookup failed for {} ({}): {}", key, self.backend_name(), status);
                Err(CredentialError::StorageFailure)
            }
        }
    }

    /// Retrieve the payload as UTF-8 text
    ///
    /// A payload that is not valid UTF-8 yields `EncodingFailure` carrying
    /// the stored bytes, distinct from every backend-level error.
    pub async fn get_text(&self, key: &CredentialKey) -> Result<String> {
        let value = self.get(key).await?;
        Ok(value.into_text()?)
    }

    /// Check whether an entry exists for `key`
    pub async fn exists(&self, key: &CredentialKey) -> Result<bool> {
        match self.backend.find(key).await {
            FindOutcome::Found(_) => Ok(true),
            FindOutcome::NotFound => Ok(false),
            FindOutcome::Failure(status) => {
                warn!("Lookup failed for {} ({}): {}", key, self.backend_name(), status);
                Err(CredentialError::StorageFailure)
            }
        }
    }

    /// Remove the entry for `key`
    ///
    /// Removing an absent key succeeds.
    pub async fn delete(&self, key: &CredentialKey) -> Result<()> {
        match self.backend.remove(key).await {
            Ok(()) => {
                info!("Deleted credential: {}", key);
                Ok(())
            }
            Err(status) if self.strict_delete => {
                warn!("Delete failed for {} ({}): {}", key, self.backend_name(), status);
                Err(CredentialError::StorageFailure)
            }
            Err(status) => {
                warn!("Ignoring delete failure for {}: {}", key, status);
                Ok(())
            }
        }
    }
}
