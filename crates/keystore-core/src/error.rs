//! Error types for keystore-core

use std::str::Utf8Error;

use thiserror::Error;
use zeroize::Zeroizing;

/// Result type alias for credential store operations
pub type Result<T> = std::result::Result<T, CredentialError>;

/// Closed set of failure classes reported to callers.
///
/// Codes and descriptions are stable across platforms; raw backend status
/// codes never leak through this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// No entry exists for the given key
    NotFound,
    /// An entry exists but its payload is not a byte blob
    UnexpectedData,
    /// The backend reported a status other than success or not-found
    StorageFailure,
    /// Caller input or stored bytes could not be converted to/from text
    EncodingFailure,
}

impl ErrorKind {
    /// Human-readable description, suitable for logs and display
    pub fn description(&self) -> &'static str {
        match self {
            ErrorKind::NotFound => "No data found",
            ErrorKind::UnexpectedData => "Unexpected data found",
            ErrorKind::StorageFailure => "Secure storage failure",
            ErrorKind::EncodingFailure => "Credential is not valid UTF-8 text",
        }
    }

    /// Stable numeric code
    pub fn code(&self) -> i32 {
        match self {
            ErrorKind::StorageFailure => -1,
            ErrorKind::NotFound => 1,
            ErrorKind::UnexpectedData => 2,
            ErrorKind::EncodingFailure => 3,
        }
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.description())
    }
}

/// Credential store error
#[derive(Error, Debug)]
pub enum CredentialError {
    #[error("No data found")]
    NotFound,

    #[error("Unexpected data found")]
    UnexpectedData,

    #[error("Secure storage failure")]
    StorageFailure,

    #[error("Credential is not valid UTF-8 text")]
    EncodingFailure(#[source] EncodingError),
}

impl CredentialError {
    /// The taxonomy class of this error
    pub fn kind(&self) -> ErrorKind {
        match self {
            CredentialError::NotFound => ErrorKind::NotFound,
            CredentialError::UnexpectedData => ErrorKind::UnexpectedData,
            CredentialError::StorageFailure => ErrorKind::StorageFailure,
            CredentialError::EncodingFailure(_) => ErrorKind::EncodingFailure,
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CredentialError::NotFound)
    }
}

impl From<EncodingError> for CredentialError {
    fn from(e: EncodingError) -> Self {
        CredentialError::EncodingFailure(e)
    }
}

/// Bytes that failed UTF-8 conversion.
///
/// Keeps the offending bytes so a caller can still get at what was stored.
/// The buffer is zeroed on drop and never printed.
#[derive(Error)]
#[error("invalid UTF-8 sequence at byte {}", .source.valid_up_to())]
pub struct EncodingError {
    raw: Zeroizing<Vec<u8>>,
    source: Utf8Error,
}

impl EncodingError {
    pub(crate) fn new(raw: Vec<u8>, source: Utf8Error) -> Self {
        Self {
            raw: Zeroizing::new(raw),
            source,
        }
    }

    /// The bytes that could not be decoded
    pub fn raw_bytes(&self) -> &[u8] {
        &self.raw
    }

    /// Consume the error and take the bytes
    pub fn into_raw(mut self) -> Vec<u8> {
        std::mem::take(&mut *self.raw)
    }

    /// Length of the valid UTF-8 prefix
    pub fn valid_up_to(&self) -> usize {
        self.source.valid_up_to()
    }
}

impl std::fmt::Debug for EncodingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EncodingError")
            .field("raw", &"[REDACTED]")
            .field("valid_up_to", &self.source.valid_up_to())
            .finish()
    }
}

/// Errors loading or saving settings
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Could not determine settings directory")]
    NoSettingsDir,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
