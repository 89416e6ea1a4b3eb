//! OS Keychain storage backend
//!
//! Uses the system keychain for secure storage:
//! - macOS: Keychain
//! - Windows: Credential Manager (DPAPI)
//! - Linux: Secret Service (GNOME Keyring, KWallet)

use async_trait::async_trait;
use base64::Engine;
use keyring::Entry;
use tracing::debug;
use zeroize::Zeroizing;

use super::traits::{
    BackendStatus, FindOutcome, InsertOutcome, SecureStorageBackend, StoredPayload, UpdateOutcome,
};
use crate::credential::{CredentialKey, CredentialValue};

/// Status codes for keyring failures
pub mod status {
    pub const PLATFORM_FAILURE: i32 = -1;
    pub const NO_STORAGE_ACCESS: i32 = -2;
    pub const TOO_LONG: i32 = -3;
    pub const INVALID: i32 = -4;
    pub const AMBIGUOUS: i32 = -5;
    pub const TASK_FAILED: i32 = -6;
    pub const OTHER: i32 = -99;
}

/// OS Keychain storage backend
pub struct KeychainBackend {
    /// Prefix prepended to every service name (for namespacing)
    prefix: String,
}

impl KeychainBackend {
    /// Create a new keychain backend with optional service prefix
    pub fn new(prefix: Option<&str>) -> Self {
        let prefix = prefix.map(|p| format!("{}.", p)).unwrap_or_default();
        Self { prefix }
    }

    /// Get a keyring entry for a key
    fn entry(&self, key: &CredentialKey) -> Result<Entry, BackendStatus> {
        let service = format!("{}{}", self.prefix, key.service);
        Entry::new(&service, &key.account).map_err(|e| keyring_status(&e))
    }

    /// Read the stored text for `key`
    async fn read(
        &self,
        key: &CredentialKey,
    ) -> Result<Result<Zeroizing<String>, keyring::Error>, BackendStatus> {
        let entry = self.entry(key)?;
        blocking(move || entry.get_password().map(Zeroizing::new)).await
    }

    async fn write(&self, key: &CredentialKey, value: &CredentialValue) -> Result<(), BackendStatus> {
        let entry = self.entry(key)?;
        // Keychain stores strings
        let encoded = Zeroizing::new(encode_payload(value));
        blocking(move || entry.set_password(&encoded))
            .await?
            .map_err(|e| keyring_status(&e))
    }
}

#[async_trait]
impl SecureStorageBackend for KeychainBackend {
    async fn find(&self, key: &CredentialKey) -> FindOutcome {
        let result = match self.read(key).await {
            Ok(result) => result,
            Err(status) => return FindOutcome::Failure(status),
        };

        match result {
            Ok(encoded) => {
                debug!("Retrieved key from keychain: {}", key);
                FindOutcome::Found(decode_payload(&encoded))
            }
            Err(keyring::Error::NoEntry) => {
                debug!("Key not found in keychain: {}", key);
                FindOutcome::NotFound
            }
            Err(keyring::Error::BadEncoding(_)) => FindOutcome::Found(StoredPayload::Unrecognized {
                description: "stored secret is not UTF-8 text".to_string(),
            }),
            Err(e) => FindOutcome::Failure(keyring_status(&e)),
        }
    }

    async fn update(&self, key: &CredentialKey, value: &CredentialValue) -> UpdateOutcome {
        // keyring's set_password is itself an upsert, so presence is checked first
        match self.read(key).await {
            Ok(Ok(_)) | Ok(Err(keyring::Error::BadEncoding(_))) => {}
            Ok(Err(keyring::Error::NoEntry)) => return UpdateOutcome::NotFound,
            Ok(Err(e)) => return UpdateOutcome::Failure(keyring_status(&e)),
            Err(status) => return UpdateOutcome::Failure(status),
        }

        match self.write(key, value).await {
            Ok(()) => {
                debug!("Updated key in keychain: {}", key);
                UpdateOutcome::Updated
            }
            Err(status) => UpdateOutcome::Failure(status),
        }
    }

    async fn insert(&self, key: &CredentialKey, value: &CredentialValue) -> InsertOutcome {
        match self.write(key, value).await {
            Ok(()) => {
                debug!("Stored key in keychain: {}", key);
                InsertOutcome::Inserted
            }
            Err(status) => InsertOutcome::Failure(status),
        }
    }

    async fn remove(&self, key: &CredentialKey) -> Result<(), BackendStatus> {
        let entry = self.entry(key)?;

        match blocking(move || entry.delete_password()).await? {
            Ok(()) => {
                debug!("Deleted key from keychain: {}", key);
                Ok(())
            }
            // Key doesn't exist, that's fine
            Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(keyring_status(&e)),
        }
    }

    fn backend_name(&self) -> &'static str {
        #[cfg(target_os = "macos")]
        return "macOS Keychain";

        #[cfg(target_os = "windows")]
        return "Windows Credential Manager";

        #[cfg(target_os = "linux")]
        return "Linux Secret Service";

        #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
        return "System Keychain";
    }
}

/// Run a blocking keyring call off the async runtime
async fn blocking<T, F>(f: F) -> Result<T, BackendStatus>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| BackendStatus::new(status::TASK_FAILED, format!("keyring task failed: {e}")))
}

/// Map a keyring error to a backend status
fn keyring_status(e: &keyring::Error) -> BackendStatus {
    let code = match e {
        keyring::Error::PlatformFailure(_) => status::PLATFORM_FAILURE,
        keyring::Error::NoStorageAccess(_) => status::NO_STORAGE_ACCESS,
        keyring::Error::TooLong(_, _) => status::TOO_LONG,
        keyring::Error::Invalid(_, _) => status::INVALID,
        keyring::Error::Ambiguous(_) => status::AMBIGUOUS,
        _ => status::OTHER,
    };
    BackendStatus::new(code, e.to_string())
}

/// Base64 encode the payload
fn encode_payload(value: &CredentialValue) -> String {
    base64::engine::general_purpose::STANDARD.encode(value.expose())
}

/// Base64 decode stored text; anything else is not one of our blobs
fn decode_payload(encoded: &str) -> StoredPayload {
    match base64::engine::general_purpose::STANDARD.decode(encoded) {
        Ok(bytes) => StoredPayload::Bytes(CredentialValue::new(bytes)),
        Err(e) => StoredPayload::Unrecognized {
            description: format!("stored secret is not base64: {}", e),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payload_roundtrip() {
        let value = CredentialValue::new(vec![0, 1, 2, 0xff, 0xfe]);
        let encoded = encode_payload(&value);
        assert_eq!(decode_payload(&encoded), StoredPayload::Bytes(value));
    }

    #[test]
    fn test_empty_payload_roundtrip() {
        let value = CredentialValue::new(Vec::new());
        assert_eq!(encode_payload(&value), "");
        assert_eq!(decode_payload(""), StoredPayload::Bytes(value));
    }

    #[test]
    fn test_foreign_text_is_unrecognized() {
        // Written by some other tool as a plain password
        assert!(matches!(
            decode_payload("not base64!"),
            StoredPayload::Unrecognized { .. }
        ));
    }

    #[test]
    fn test_status_mapping() {
        let mapped = keyring_status(&keyring::Error::TooLong("service".to_string(), 255));
        assert_eq!(mapped.code, status::TOO_LONG);

        let mapped = keyring_status(&keyring::Error::Invalid(
            "account".to_string(),
            "empty".to_string(),
        ));
        assert_eq!(mapped.code, status::INVALID);
    }

    #[test]
    fn test_service_prefix() {
        let backend = KeychainBackend::new(Some("com.example"));
        assert_eq!(backend.prefix, "com.example.");

        let backend = KeychainBackend::new(None);
        assert_eq!(backend.prefix, "");
    }

    /// Run against keyring's in-process mock store
    ///
    /// Mock entries do not share state, so every lookup starts empty.
    fn mock_backend() -> KeychainBackend {
        keyring::set_default_credential_builder(keyring::mock::default_credential_builder());
        KeychainBackend::new(Some("test"))
    }

    #[tokio::test]
    async fn test_find_absent_entry() {
        let backend = mock_backend();
        let key = CredentialKey::new("app.token", "user1");
        assert_eq!(backend.find(&key).await, FindOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_update_absent_entry_is_not_found() {
        let backend = mock_backend();
        let key = CredentialKey::new("app.token", "user1");

        let outcome = backend.update(&key, &CredentialValue::from("abc")).await;
        assert_eq!(outcome, UpdateOutcome::NotFound);
    }

    #[tokio::test]
    async fn test_insert_and_remove() {
        let backend = mock_backend();
        let key = CredentialKey::new("app.token", "user1");

        let outcome = backend.insert(&key, &CredentialValue::from("abc")).await;
        assert_eq!(outcome, InsertOutcome::Inserted);
        assert!(backend.remove(&key).await.is_ok());
    }

    #[tokio::test]
    async fn test_read_hands_back_zeroizing_text() {
        let backend = mock_backend();
        let key = CredentialKey::new("app.token", "user1");

        let read: Result<Result<Zeroizing<String>, keyring::Error>, BackendStatus> =
            backend.read(&key).await;
        assert!(matches!(read, Ok(Err(keyring::Error::NoEntry))));
    }
}
