//! Credential storage: keys, values, and the store operations

mod completion;
mod store;
mod types;

pub use completion::CompletionAdapter;
pub use store::CredentialStore;
pub use types::*;
