//! Storage backends for secure credential persistence
//!
//! This module provides two storage backends:
//! 1. OS Keychain (hardware-backed where available)
//! 2. In-memory (tests and ephemeral use)

mod traits;
mod keychain;
mod memory;

pub use traits::{
    BackendStatus, FindOutcome, InsertOutcome, SecureStorageBackend, StoredPayload, UpdateOutcome,
};
pub use keychain::{status as keychain_status, KeychainBackend};
pub use memory::{MemoryBackend, Operation, DUPLICATE_ITEM};
