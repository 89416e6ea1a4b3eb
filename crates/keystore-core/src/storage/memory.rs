//! In-process storage backend
//!
//! Behaves like a platform keychain (inserting over an existing entry is a
//! duplicate-item failure) so the store's upsert logic can be exercised
//! without an OS keychain. Nothing survives the process, so this suits
//! tests and embedders that want a throwaway store.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::traits::{
    BackendStatus, FindOutcome, InsertOutcome, SecureStorageBackend, StoredPayload, UpdateOutcome,
};
use crate::credential::{CredentialKey, CredentialValue};

/// Status code reported when inserting over an existing entry
pub const DUPLICATE_ITEM: i32 = -25299;

/// Backend primitive, used to target injected failures
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Find,
    Update,
    Insert,
    Remove,
}

#[derive(Default)]
struct MemoryState {
    entries: HashMap<CredentialKey, StoredPayload>,
    faults: HashMap<Operation, BackendStatus>,
}

impl MemoryState {
    /// Take the pending fault for `op`, if any
    fn fault(&mut self, op: Operation) -> Option<BackendStatus> {
        self.faults.remove(&op)
    }
}

/// In-memory storage backend
#[derive(Default)]
pub struct MemoryBackend {
    state: RwLock<MemoryState>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Place an arbitrary payload under `key`, bypassing the store
    pub async fn plant(&self, key: CredentialKey, payload: StoredPayload) {
        self.state.write().await.entries.insert(key, payload);
    }

    /// Make the next call of `op` fail with `status`
    pub async fn fail_next(&self, op: Operation, status: BackendStatus) {
        self.state.write().await.faults.insert(op, status);
    }

    /// Number of entries held
    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }
}

#[async_trait]
impl SecureStorageBackend for MemoryBackend {
    async fn find(&self, key: &CredentialKey) -> FindOutcome {
        let mut state = self.state.write().await;
        if let Some(status) = state.fault(Operation::Find) {
            return FindOutcome::Failure(status);
        }

        match state.entries.get(key) {
            Some(payload) => FindOutcome::Found(payload.clone()),
            None => FindOutcome::NotFound,
        }
    }

    async fn update(&self, key: &CredentialKey, value: &CredentialValue) -> UpdateOutcome {
        let mut state = self.state.write().await;
        if let Some(status) = state.fault(Operation::Update) {
            return UpdateOutcome::Failure(status);
        }

        match state.entries.get_mut(key) {
            Some(payload) => {
                *payload = StoredPayload::Bytes(value.clone());
                debug!("Updated entry in memory: {}", key);
                UpdateOutcome::Updated
            }
            None => UpdateOutcome::NotFound,
        }
    }

    async fn insert(&self, key: &CredentialKey, value: &CredentialValue) -> InsertOutcome {
        let mut state = self.state.write().await;
        if let Some(status) = state.fault(Operation::Insert) {
            return InsertOutcome::Failure(status);
        }

        if state.entries.contains_key(key) {
            return InsertOutcome::Failure(BackendStatus::new(
                DUPLICATE_ITEM,
                "The specified item already exists",
            ));
        }

        state
            .entries
            .insert(key.clone(), StoredPayload::Bytes(value.clone()));
        debug!("Inserted entry in memory: {}", key);
        InsertOutcome::Inserted
    }

    async fn remove(&self, key: &CredentialKey) -> Result<(), BackendStatus> {
        let mut state = self.state.write().await;
        if let Some(status) = state.fault(Operation::Remove) {
            return Err(status);
        }

        state.entries.remove(key);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "In-memory"
    }
}
