//! # keystore-core
//!
//! Secure credential storage keyed by `(service, account)`:
//! - Upsert / retrieve / delete over a pluggable platform backend
//! - OS keychain backend, plus an in-memory backend for tests
//! - Stable, closed error taxonomy independent of platform status codes
//! - Completion-handler adapter for hosts that cannot await
//! - Zeroize-on-drop secret payloads

pub mod credential;
pub mod error;
pub mod settings;
pub mod storage;

pub use credential::{CompletionAdapter, CredentialKey, CredentialStore, CredentialValue};
pub use error::{CredentialError, EncodingError, ErrorKind, Result, SettingsError};
pub use settings::{BackendKind, SettingsManager, StoreSettings};
pub use storage::{
    BackendStatus, FindOutcome, InsertOutcome, KeychainBackend, MemoryBackend, SecureStorageBackend,
    StoredPayload, UpdateOutcome,
};
