//! Credential type definitions

use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::error::EncodingError;

/// Lookup key for a stored credential
///
/// Both parts are opaque to this crate; the backend treats the pair as an
/// exact-match key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct CredentialKey {
    /// Service name (e.g., "app.token")
    pub service: String,

    /// Account within the service (e.g., "user1")
    pub account: String,
}

impl CredentialKey {
    /// Create a new key
    pub fn new(service: impl Into<String>, account: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            account: account.into(),
        }
    }
}

impl std::fmt::Display for CredentialKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{}", self.service, self.account)
    }
}

/// Secret payload - automatically zeroed when dropped
#[derive(Clone, Default, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct CredentialValue {
    bytes: Vec<u8>,
}

impl CredentialValue {
    /// Wrap raw bytes
    pub fn new(bytes: Vec<u8>) -> Self {
        Self { bytes }
    }

    /// Encode a string as UTF-8
    pub fn from_text(text: &str) -> Self {
        Self {
            bytes: text.as_bytes().to_vec(),
        }
    }

    /// Get the secret bytes (use carefully - avoid copying)
    pub fn expose(&self) -> &[u8] {
        &self.bytes
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Consume and return the inner bytes
    pub fn into_bytes(mut self) -> Vec<u8> {
        std::mem::take(&mut self.bytes)
    }

    /// Decode the payload as UTF-8 text
    ///
    /// On failure the error still carries the original bytes.
    pub fn into_text(self) -> Result<String, EncodingError> {
        String::from_utf8(self.into_bytes()).map_err(|e| {
            let source = e.utf8_error();
            EncodingError::new(e.into_bytes(), source)
        })
    }
}

impl From<Vec<u8>> for CredentialValue {
    fn from(bytes: Vec<u8>) -> Self {
        Self::new(bytes)
    }
}

impl From<&[u8]> for CredentialValue {
    fn from(bytes: &[u8]) -> Self {
        Self::new(bytes.to_vec())
    }
}

impl From<&str> for CredentialValue {
    fn from(text: &str) -> Self {
        Self::from_text(text)
    }
}

impl From<String> for CredentialValue {
    fn from(text: String) -> Self {
        Self::new(text.into_bytes())
    }
}

impl std::fmt::Debug for CredentialValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialValue")
            .field("bytes", &"[REDACTED]")
            .field("len", &self.bytes.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_key_display() {
        let key = CredentialKey::new("app.token", "user1");
        assert_eq!(key.to_string(), "app.token/user1");
    }

    #[test]
    fn test_value_text_roundtrip() {
        let value = CredentialValue::from("pässwörd ✓");
        assert_eq!(value.into_text().unwrap(), "pässwörd ✓");
    }

    #[test]
    fn test_value_empty() {
        let value = CredentialValue::new(Vec::new());
        assert!(value.is_empty());
        assert_eq!(value.into_text().unwrap(), "");
    }

    #[test]
    fn test_value_invalid_text_keeps_bytes() {
        let value = CredentialValue::new(vec![0xc3, 0x28]);
        let err = value.into_text().unwrap_err();
        assert_eq!(err.valid_up_to(), 0);
        assert_eq!(err.raw_bytes(), &[0xc3, 0x28]);
    }

    #[test]
    fn test_debug_redacted() {
        let value = CredentialValue::from("hunter2");
        let debug = format!("{:?}", value);
        assert!(debug.contains("REDACTED"));
        assert!(!debug.contains("hunter2"));
    }
}
